//! Transient user-facing notifications.
//!
//! The synchronizer emits no events. A presentation layer turns the outcome
//! of each command into a `Notice` with `Notice::for_outcome` and shows it
//! briefly.

use crate::error::SyncError;

/// The synchronizer command a notice reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Load,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// Notice for a settled command. A successful load shows nothing.
    pub fn for_outcome<T>(action: Action, outcome: &Result<T, SyncError>) -> Option<Self> {
        match (outcome, action) {
            (Err(e), _) => Some(e.notice()),
            (Ok(_), Action::Load) => None,
            (Ok(_), Action::Create) => Some(Self::success("Task created successfully!")),
            (Ok(_), Action::Update) => Some(Self::success("Task updated successfully!")),
            (Ok(_), Action::Delete) => Some(Self::success("Task deleted successfully!")),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[test]
    fn success_notices_match_operations() {
        let ok: Result<(), SyncError> = Ok(());
        let created = Notice::for_outcome(Action::Create, &ok).unwrap();
        assert_eq!(created.message, "Task created successfully!");
        assert_eq!(created.level, NoticeLevel::Success);
        let updated = Notice::for_outcome(Action::Update, &ok).unwrap();
        assert_eq!(updated.message, "Task updated successfully!");
        let deleted = Notice::for_outcome(Action::Delete, &ok).unwrap();
        assert_eq!(deleted.message, "Task deleted successfully!");
    }

    #[test]
    fn successful_load_is_silent() {
        let ok: Result<Vec<u8>, SyncError> = Ok(Vec::new());
        assert!(Notice::for_outcome(Action::Load, &ok).is_none());
    }

    #[test]
    fn failed_outcome_uses_error_notice() {
        let failed: Result<(), SyncError> = Err(SyncError::Fetch(StoreError::Unavailable));
        let notice = Notice::for_outcome(Action::Load, &failed).unwrap();
        assert!(notice.is_error());
        assert_eq!(notice.message, "Failed to load tasks");
    }

    #[test]
    fn sync_errors_become_error_notices() {
        let notice = SyncError::Update(StoreError::NotFound).notice();
        assert!(notice.is_error());
        assert_eq!(notice.message, "Failed to update task");
    }
}
