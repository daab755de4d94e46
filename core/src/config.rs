//! Connection settings for the hosted record store.

use reqwest::Url;
use serde::Deserialize;

use crate::error::ConfigError;

pub const URL_VAR: &str = "TASK_STORE_URL";
pub const KEY_VAR: &str = "TASK_STORE_KEY";
pub const TABLE_VAR: &str = "TASK_STORE_TABLE";

/// Where the `tasks` table lives and how to authenticate against it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_table")]
    pub table: String,
}

fn default_table() -> String {
    "tasks".to_string()
}

impl StoreConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            table: default_table(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Read `TASK_STORE_URL`, `TASK_STORE_KEY` and optionally `TASK_STORE_TABLE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(URL_VAR).ok_or(ConfigError::Missing(URL_VAR))?;
        let api_key = lookup(KEY_VAR).ok_or(ConfigError::Missing(KEY_VAR))?;
        let mut config = Self::new(base_url, api_key);
        if let Some(table) = lookup(TABLE_VAR).filter(|t| !t.trim().is_empty()) {
            config.table = table;
        }
        config.validate()?;
        Ok(config)
    }

    /// The base URL must parse, use http or https, and name a host.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidUrl {
            url: self.base_url.clone(),
            reason,
        };
        let url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(invalid("missing host".to_string()));
        }
        Ok(())
    }
}
