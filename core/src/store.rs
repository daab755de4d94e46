//! The record store contract and its HTTP implementation.
//!
//! # Design
//! `RecordStore` is the narrow seam between the synchronizer and whatever
//! actually persists tasks. `HttpStore` pairs the stateless `TaskApi` with a
//! `Transport`, so the request/response logic stays testable without I/O and
//! the network code stays swappable.

use async_trait::async_trait;
use log::debug;
use uuid::Uuid;

use crate::client::TaskApi;
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{NewTask, SortOrder, Task, TaskPatch};

/// Table-like CRUD over the `tasks` collection.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every record, in the requested order.
    async fn select_all(&self, order: SortOrder) -> Result<Vec<Task>, StoreError>;

    /// Persist a new record. The store assigns `id` and both timestamps.
    async fn insert(&self, task: &NewTask) -> Result<Task, StoreError>;

    /// Apply `patch` to the record with `id` and return it as stored.
    /// The store refreshes `updated_at`.
    async fn update(&self, id: Uuid, patch: &TaskPatch) -> Result<Task, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Executes a plain-data request against the network.
///
/// Implementations return non-2xx responses as data; only failures that
/// produce no response at all are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, StoreError>;
}

/// `RecordStore` over the hosted store's REST surface.
#[derive(Debug, Clone)]
pub struct HttpStore<T> {
    api: TaskApi,
    transport: T,
}

impl<T: Transport> HttpStore<T> {
    pub fn new(config: &StoreConfig, transport: T) -> Self {
        Self {
            api: TaskApi::new(config),
            transport,
        }
    }

    async fn round_trip(&self, request: HttpRequest) -> Result<HttpResponse, StoreError> {
        debug!("{:?} {}", request.method, request.path);
        let response = self.transport.execute(request).await?;
        debug!("-> {}", response.status);
        Ok(response)
    }
}

#[async_trait]
impl<T: Transport> RecordStore for HttpStore<T> {
    async fn select_all(&self, order: SortOrder) -> Result<Vec<Task>, StoreError> {
        let response = self.round_trip(self.api.build_select_all(order)).await?;
        self.api.parse_select_all(response)
    }

    async fn insert(&self, task: &NewTask) -> Result<Task, StoreError> {
        let response = self.round_trip(self.api.build_insert(task)?).await?;
        self.api.parse_insert(response)
    }

    async fn update(&self, id: Uuid, patch: &TaskPatch) -> Result<Task, StoreError> {
        let response = self.round_trip(self.api.build_update(id, patch)?).await?;
        self.api.parse_update(response)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let response = self.round_trip(self.api.build_delete(id)).await?;
        self.api.parse_delete(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use std::sync::Mutex;

    /// Replays canned responses and records the requests it was given.
    struct Scripted {
        responses: Mutex<Vec<HttpResponse>>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl Scripted {
        fn new(responses: Vec<HttpResponse>) -> Self {
            Self {
                responses: Mutex::new(responses),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, StoreError> {
            self.seen.lock().unwrap().push(request);
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(StoreError::Transport("connection refused".to_string()));
            }
            Ok(responses.remove(0))
        }
    }

    const ROW: &str = r#"[{"id":"00000000-0000-0000-0000-000000000007","title":"Walk dog","completed":true,"created_at":"2024-05-01T10:00:00Z","updated_at":"2024-05-02T10:00:00Z"}]"#;

    fn store(responses: Vec<HttpResponse>) -> HttpStore<Scripted> {
        HttpStore::new(&StoreConfig::new("http://store.test", "key"), Scripted::new(responses))
    }

    #[tokio::test]
    async fn update_sends_patch_and_returns_server_row() {
        let store = store(vec![HttpResponse::new(200, ROW)]);
        let task = store.update(Uuid::nil(), &TaskPatch::completed(true)).await.unwrap();
        assert!(task.completed);
        assert_eq!(task.title, "Walk dog");

        let seen = store.transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, HttpMethod::Patch);
    }

    #[tokio::test]
    async fn transport_failure_surfaces_as_store_error() {
        let store = store(Vec::new());
        let err = store.select_all(SortOrder::newest_first()).await.unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)));
    }

    #[tokio::test]
    async fn delete_of_missing_row_is_not_found() {
        let store = store(vec![HttpResponse::new(404, "")]);
        let err = store.delete(Uuid::nil()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }
}
