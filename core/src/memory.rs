//! In-process `RecordStore` with server semantics.
//!
//! # Design
//! Behaves like the hosted store: it assigns ids and timestamps, orders
//! listings on request and reports `NotFound` for unknown ids. Clones share
//! the same rows, so a test can keep a handle to inspect or sabotage the
//! store after handing it to a synchronizer.
//!
//! Timestamps come from the wall clock but never repeat: each new stamp is at
//! least one microsecond after the previous one, so `updated_at` strictly
//! increases across mutations even within a single clock tick.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::RecordStore;
use crate::types::{Direction, NewTask, SortColumn, SortOrder, Task, TaskPatch};

/// Names a `RecordStore` operation, for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    SelectAll,
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Default)]
struct Inner {
    rows: HashMap<Uuid, Task>,
    last_stamp: Option<DateTime<Utc>>,
    fail_next: Vec<StoreOp>,
    fail_all: bool,
    calls: HashMap<StoreOp, usize>,
}

impl Inner {
    fn stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }

    /// Count the call, then decide whether it should fail.
    fn enter(&mut self, op: StoreOp) -> Result<(), StoreError> {
        *self.calls.entry(op).or_default() += 1;
        if self.fail_all {
            return Err(StoreError::Unavailable);
        }
        if let Some(pos) = self.fail_next.iter().position(|o| *o == op) {
            self.fail_next.remove(pos);
            return Err(StoreError::Unavailable);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed row as-is, bypassing id and timestamp assignment.
    pub async fn seed(&self, task: Task) {
        let mut inner = self.inner.write().await;
        if inner.last_stamp.map_or(true, |last| task.updated_at > last) {
            inner.last_stamp = Some(task.updated_at);
        }
        inner.rows.insert(task.id, task);
    }

    /// The next call of `op` fails with `StoreError::Unavailable`.
    pub async fn fail_next(&self, op: StoreOp) {
        self.inner.write().await.fail_next.push(op);
    }

    /// While set, every operation fails with `StoreError::Unavailable`.
    pub async fn fail_all(&self, fail: bool) {
        self.inner.write().await.fail_all = fail;
    }

    /// How many times `op` has been invoked, failed calls included.
    pub async fn calls(&self, op: StoreOp) -> usize {
        self.inner.read().await.calls.get(&op).copied().unwrap_or(0)
    }

    pub async fn get(&self, id: Uuid) -> Option<Task> {
        self.inner.read().await.rows.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn sort(tasks: &mut [Task], order: SortOrder) {
    tasks.sort_by(|a, b| {
        let ord = match order.column {
            SortColumn::CreatedAt => a.created_at.cmp(&b.created_at),
            SortColumn::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortColumn::Title => a.title.cmp(&b.title),
        };
        match order.direction {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        }
    });
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select_all(&self, order: SortOrder) -> Result<Vec<Task>, StoreError> {
        let mut inner = self.inner.write().await;
        inner.enter(StoreOp::SelectAll)?;
        let mut tasks: Vec<Task> = inner.rows.values().cloned().collect();
        sort(&mut tasks, order);
        Ok(tasks)
    }

    async fn insert(&self, task: &NewTask) -> Result<Task, StoreError> {
        let mut inner = self.inner.write().await;
        inner.enter(StoreOp::Insert)?;
        let now = inner.stamp();
        let row = Task {
            id: Uuid::new_v4(),
            title: task.title.clone(),
            description: task.description.clone(),
            completed: task.completed,
            created_at: now,
            updated_at: now,
        };
        inner.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: Uuid, patch: &TaskPatch) -> Result<Task, StoreError> {
        let mut inner = self.inner.write().await;
        inner.enter(StoreOp::Update)?;
        if !inner.rows.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        let now = inner.stamp();
        let row = inner.rows.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(title) = &patch.title {
            row.title = title.clone();
        }
        if let Some(description) = &patch.description {
            row.description = description.clone();
        }
        if let Some(completed) = patch.completed {
            row.completed = completed;
        }
        row.updated_at = now;
        Ok(row.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.enter(StoreOp::Delete)?;
        inner.rows.remove(&id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_assigns_id_and_timestamps() {
        let store = MemoryStore::new();
        let task = store.insert(&NewTask::new("Buy milk")).await.unwrap();
        assert_eq!(task.title, "Buy milk");
        assert!(!task.completed);
        assert_eq!(task.created_at, task.updated_at);
        assert_eq!(store.get(task.id).await, Some(task));
    }

    #[tokio::test]
    async fn update_refreshes_updated_at_strictly() {
        let store = MemoryStore::new();
        let task = store.insert(&NewTask::new("a")).await.unwrap();
        let first = store.update(task.id, &TaskPatch::completed(true)).await.unwrap();
        let second = store.update(task.id, &TaskPatch::completed(false)).await.unwrap();
        assert!(first.updated_at > task.updated_at);
        assert!(second.updated_at > first.updated_at);
        assert_eq!(second.created_at, task.created_at);
    }

    #[tokio::test]
    async fn select_all_orders_by_requested_column() {
        let store = MemoryStore::new();
        for title in ["b", "c", "a"] {
            store.insert(&NewTask::new(title)).await.unwrap();
        }
        let newest: Vec<String> = store
            .select_all(SortOrder::newest_first())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(newest, ["a", "c", "b"]);

        let by_title: Vec<String> = store
            .select_all(SortOrder::new(SortColumn::Title, Direction::Ascending))
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(by_title, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(
            store.update(id, &TaskPatch::title("x")).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(store.delete(id).await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn fail_next_fails_once_and_counts_calls() {
        let store = MemoryStore::new();
        store.fail_next(StoreOp::Insert).await;
        assert!(matches!(store.insert(&NewTask::new("a")).await, Err(StoreError::Unavailable)));
        assert!(store.is_empty().await);
        assert!(store.insert(&NewTask::new("a")).await.is_ok());
        assert_eq!(store.calls(StoreOp::Insert).await, 2);
        assert_eq!(store.calls(StoreOp::Delete).await, 0);
    }

    #[tokio::test]
    async fn clones_share_rows() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store.insert(&NewTask::new("shared")).await.unwrap();
        assert_eq!(handle.len().await, 1);
    }
}
