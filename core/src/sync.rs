//! Local mirror of the remote `tasks` table.
//!
//! # Design
//! `TaskSynchronizer` owns the only copy of local task state. Every command
//! performs one remote round-trip and touches local state only after the
//! store confirms it, using the row the store returned rather than a locally
//! merged guess. A failed command leaves local state exactly as it was.
//!
//! Commands take `&mut self`, so one synchronizer never runs two commands at
//! once.

use log::{debug, error, warn};
use uuid::Uuid;

use crate::error::SyncError;
use crate::store::RecordStore;
use crate::types::{NewTask, SortOrder, Task, TaskPatch};

/// Counts shown alongside the task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub remaining: usize,
}

pub struct TaskSynchronizer<S> {
    store: S,
    tasks: Vec<Task>,
    loading: bool,
}

impl<S: RecordStore> TaskSynchronizer<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            tasks: Vec::new(),
            loading: true,
        }
    }

    /// Newest-created first.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// True until the first `load` settles, successfully or not.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn pending(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| !t.completed)
    }

    pub fn completed(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| t.completed)
    }

    pub fn stats(&self) -> TaskStats {
        let completed = self.completed().count();
        TaskStats {
            total: self.tasks.len(),
            completed,
            remaining: self.tasks.len() - completed,
        }
    }

    /// Replace local state with every remote record, newest first.
    pub async fn load(&mut self) -> Result<&[Task], SyncError> {
        let result = self.store.select_all(SortOrder::newest_first()).await;
        self.loading = false;
        match result {
            Ok(tasks) => {
                debug!("loaded {} tasks", tasks.len());
                self.tasks = tasks;
                Ok(self.tasks.as_slice())
            }
            Err(e) => {
                error!("Error fetching tasks: {e}");
                Err(SyncError::Fetch(e))
            }
        }
    }

    /// Create a task and prepend the stored record.
    ///
    /// The title is trimmed and must not be empty; a blank description is
    /// treated as none. Validation failures never reach the store.
    pub async fn create(
        &mut self,
        title: &str,
        description: Option<&str>,
    ) -> Result<&Task, SyncError> {
        let title = normalize_title(title)?;
        let input = NewTask {
            title,
            description: description.and_then(normalize_description),
            completed: false,
        };

        let task = self.store.insert(&input).await.map_err(|e| {
            error!("Error adding task: {e}");
            SyncError::Create(e)
        })?;
        debug!("created task {}", task.id);
        self.tasks.insert(0, task);
        Ok(&self.tasks[0])
    }

    /// Apply `patch` remotely and replace the local entry with the stored row.
    ///
    /// A blank description in `patch` leaves the stored one alone; clear it
    /// with `TaskPatch::with_description(None)`. A patch with nothing left to
    /// send is rejected without contacting the store.
    ///
    /// Returns `Ok(None)` when the store accepted the change but no local
    /// entry has that id.
    pub async fn update(&mut self, id: Uuid, patch: TaskPatch) -> Result<Option<&Task>, SyncError> {
        let patch = normalize_patch(patch)?;
        if patch.is_empty() {
            warn!("rejected empty update of task {id}");
            return Err(SyncError::EmptyUpdate);
        }

        let task = self.store.update(id, &patch).await.map_err(|e| {
            error!("Error updating task {id}: {e}");
            SyncError::Update(e)
        })?;

        match self.tasks.iter().position(|t| t.id == id) {
            Some(idx) => {
                debug!("updated task {id}");
                self.tasks[idx] = task;
                Ok(Some(&self.tasks[idx]))
            }
            None => {
                warn!("updated task {id} has no local entry");
                Ok(None)
            }
        }
    }

    /// Delete remotely, then drop the local entry.
    pub async fn delete(&mut self, id: Uuid) -> Result<(), SyncError> {
        self.store.delete(id).await.map_err(|e| {
            error!("Error deleting task {id}: {e}");
            SyncError::Delete(e)
        })?;
        debug!("deleted task {id}");
        self.tasks.retain(|t| t.id != id);
        Ok(())
    }

    /// Flip `completed` on the local entry with `id`.
    ///
    /// Without a local entry nothing is sent and `Ok(None)` is returned.
    pub async fn toggle_complete(&mut self, id: Uuid) -> Result<Option<&Task>, SyncError> {
        let Some(current) = self.get(id).map(|t| t.completed) else {
            warn!("toggle of unknown task {id} ignored");
            return Ok(None);
        };
        self.update(id, TaskPatch::completed(!current)).await
    }
}

fn normalize_title(title: &str) -> Result<String, SyncError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        warn!("rejected task with blank title");
        return Err(SyncError::Validation("title must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

fn normalize_description(description: &str) -> Option<String> {
    let trimmed = description.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn normalize_patch(mut patch: TaskPatch) -> Result<TaskPatch, SyncError> {
    if let Some(title) = patch.title.take() {
        patch.title = Some(normalize_title(&title)?);
    }
    // Some(None) clears; a blank replacement is dropped from the patch.
    patch.description = match patch.description.take() {
        Some(Some(text)) => normalize_description(&text).map(Some),
        other => other,
    };
    Ok(patch)
}
