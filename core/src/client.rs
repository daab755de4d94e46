//! Stateless HTTP request builder and response parser for the `tasks` table.
//!
//! # Design
//! `TaskApi` holds only connection settings and carries no mutable state
//! between calls. Each store operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. A `Transport` executes the actual round-trip.
//!
//! The hosted store speaks a PostgREST dialect: rows are filtered with
//! `column=eq.value` query parameters and mutations echo the affected rows
//! back as a JSON array when asked with `prefer: return=representation`.

use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{NewTask, SortOrder, Task, TaskPatch};

const REST_PREFIX: &str = "rest/v1";

/// Synchronous, stateless client for the record store's REST surface.
#[derive(Debug, Clone)]
pub struct TaskApi {
    table_url: String,
    api_key: String,
}

impl TaskApi {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            table_url: format!(
                "{}/{REST_PREFIX}/{}",
                config.base_url.trim_end_matches('/'),
                config.table
            ),
            api_key: config.api_key.clone(),
        }
    }

    pub fn build_select_all(&self, order: SortOrder) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}?select=*&order={}", self.table_url, order.to_query_value()),
            headers: self.auth_headers(),
            body: None,
        }
    }

    pub fn build_insert(&self, task: &NewTask) -> Result<HttpRequest, StoreError> {
        let body =
            serde_json::to_string(task).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.table_url.clone(),
            headers: self.mutation_headers(),
            body: Some(body),
        })
    }

    pub fn build_update(&self, id: Uuid, patch: &TaskPatch) -> Result<HttpRequest, StoreError> {
        let body =
            serde_json::to_string(patch).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Patch,
            path: self.row_url(id),
            headers: self.mutation_headers(),
            body: Some(body),
        })
    }

    pub fn build_delete(&self, id: Uuid) -> HttpRequest {
        let mut headers = self.auth_headers();
        headers.push(("prefer".to_string(), "return=representation".to_string()));
        HttpRequest {
            method: HttpMethod::Delete,
            path: self.row_url(id),
            headers,
            body: None,
        }
    }

    pub fn parse_select_all(&self, response: HttpResponse) -> Result<Vec<Task>, StoreError> {
        check_status(&response, 200)?;
        decode(&response.body)
    }

    pub fn parse_insert(&self, response: HttpResponse) -> Result<Task, StoreError> {
        check_status(&response, 201)?;
        single_row(decode(&response.body)?)
    }

    pub fn parse_update(&self, response: HttpResponse) -> Result<Task, StoreError> {
        check_status(&response, 200)?;
        single_row(decode(&response.body)?)
    }

    pub fn parse_delete(&self, response: HttpResponse) -> Result<(), StoreError> {
        check_status(&response, 200)?;
        single_row(decode(&response.body)?).map(|_| ())
    }

    fn row_url(&self, id: Uuid) -> String {
        format!("{}?id=eq.{id}", self.table_url)
    }

    fn auth_headers(&self) -> Vec<(String, String)> {
        vec![
            ("apikey".to_string(), self.api_key.clone()),
            ("authorization".to_string(), format!("Bearer {}", self.api_key)),
        ]
    }

    fn mutation_headers(&self) -> Vec<(String, String)> {
        let mut headers = self.auth_headers();
        headers.push(("content-type".to_string(), "application/json".to_string()));
        headers.push(("prefer".to_string(), "return=representation".to_string()));
        headers
    }
}

/// Map non-success status codes to the appropriate `StoreError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), StoreError> {
    if response.status == expected {
        return Ok(());
    }
    if response.status == 404 {
        return Err(StoreError::NotFound);
    }
    Err(StoreError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, StoreError> {
    serde_json::from_str(body).map_err(|e| StoreError::Deserialization(e.to_string()))
}

/// A mutation echoes the rows it touched; exactly one is expected.
fn single_row(mut rows: Vec<Task>) -> Result<Task, StoreError> {
    match rows.len() {
        0 => Err(StoreError::NotFound),
        1 => Ok(rows.remove(0)),
        n => Err(StoreError::Deserialization(format!("expected a single row, got {n}"))),
    }
}
