//! Error types for the record store and the task synchronizer.
//!
//! # Design
//! `StoreError` describes why a single remote operation failed. `NotFound`
//! gets a dedicated variant because callers frequently distinguish "no row
//! matched" from "the server returned an unexpected status."
//!
//! `SyncError` is what the synchronizer hands to the presentation layer. Each
//! remote variant names the operation that failed and keeps the underlying
//! `StoreError` as its source for diagnostics.

use thiserror::Error;

use crate::notice::Notice;

/// Errors returned by `RecordStore` implementations and `TaskApi` parse methods.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The server returned 404, or a mutation matched no row.
    #[error("record not found")]
    NotFound,

    /// The server returned a status other than the one expected.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Injected by `MemoryStore` to simulate a remote failure.
    #[error("simulated store failure")]
    Unavailable,
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Transport(e.to_string())
    }
}

/// Errors surfaced by `TaskSynchronizer` commands.
///
/// Local state is untouched whenever one of these is returned.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Rejected locally; the store was never contacted.
    #[error("invalid task: {0}")]
    Validation(String),

    /// An update with no fields left to send; the store was never contacted.
    #[error("update carries no fields")]
    EmptyUpdate,

    #[error("failed to load tasks: {0}")]
    Fetch(#[source] StoreError),

    #[error("failed to create task: {0}")]
    Create(#[source] StoreError),

    #[error("failed to update task: {0}")]
    Update(#[source] StoreError),

    #[error("failed to delete task: {0}")]
    Delete(#[source] StoreError),
}

impl SyncError {
    /// The underlying store error, if the failure was remote.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            SyncError::Validation(_) | SyncError::EmptyUpdate => None,
            SyncError::Fetch(e)
            | SyncError::Create(e)
            | SyncError::Update(e)
            | SyncError::Delete(e) => Some(e),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, SyncError::Validation(_) | SyncError::EmptyUpdate)
    }

    /// Short message suitable for a transient notification.
    pub fn user_message(&self) -> &'static str {
        match self {
            SyncError::Validation(_) => "Task title is required",
            SyncError::EmptyUpdate => "Nothing to update",
            SyncError::Fetch(_) => "Failed to load tasks",
            SyncError::Create(_) => "Failed to create task",
            SyncError::Update(_) => "Failed to update task",
            SyncError::Delete(_) => "Failed to delete task",
        }
    }

    pub fn notice(&self) -> Notice {
        Notice::error(self.user_message())
    }
}

/// Errors loading a `StoreConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("invalid store URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_error_keeps_store_source() {
        let err = SyncError::Update(StoreError::NotFound);
        assert!(matches!(err.store_error(), Some(StoreError::NotFound)));
        assert_eq!(err.to_string(), "failed to update task: record not found");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn validation_has_no_store_error() {
        let err = SyncError::Validation("title is empty".to_string());
        assert!(err.is_validation());
        assert!(err.store_error().is_none());
        assert_eq!(err.user_message(), "Task title is required");
    }

    #[test]
    fn user_messages_name_the_operation() {
        let message = |e: SyncError| e.user_message();
        assert_eq!(message(SyncError::Fetch(StoreError::Unavailable)), "Failed to load tasks");
        assert_eq!(message(SyncError::Create(StoreError::Unavailable)), "Failed to create task");
        assert_eq!(message(SyncError::Delete(StoreError::Unavailable)), "Failed to delete task");
        assert_eq!(message(SyncError::EmptyUpdate), "Nothing to update");
    }

    #[test]
    fn empty_update_counts_as_local_rejection() {
        assert!(SyncError::EmptyUpdate.is_validation());
        assert!(SyncError::EmptyUpdate.store_error().is_none());
    }

    #[test]
    fn http_error_display() {
        let err = StoreError::Http {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 500: boom");
    }
}
