//! Revision taps implemented by the hosting application.

use async_trait::async_trait;

use crate::models::{EntryDraft, EntryVersion};

/// Outcome of a pre-operation tap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreCheck {
    /// Let the operation continue.
    Proceed,
    /// Stop the operation. The reason is logged.
    Abort(String),
}

impl PreCheck {
    /// Abort with a reason.
    pub fn abort(reason: impl Into<String>) -> Self {
        Self::Abort(reason.into())
    }

    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Abort(_))
    }
}

/// Named extension points around revision operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TapEvent {
    DraftPresave,
    DraftSave,
    DraftPrepublish,
    DraftPublish,
    DraftPredelete,
    DraftDelete,
    EntryRevert,
}

impl TapEvent {
    /// Tap name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DraftPresave => "tap_draft_presave",
            Self::DraftSave => "tap_draft_save",
            Self::DraftPrepublish => "tap_draft_prepublish",
            Self::DraftPublish => "tap_draft_publish",
            Self::DraftPredelete => "tap_draft_predelete",
            Self::DraftDelete => "tap_draft_delete",
            Self::EntryRevert => "tap_entry_revert",
        }
    }
}

impl std::fmt::Display for TapEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handler for revision taps.
///
/// Every method has a no-op default, so implementors only override the
/// taps they care about. Pre taps may change the draft before the
/// operation goes ahead.
#[async_trait]
pub trait RevisionTap: Send + Sync {
    /// Handler name used in logs.
    fn name(&self) -> &str;

    /// Ordering weight (lower = called first).
    fn weight(&self) -> i32 {
        0
    }

    async fn before_save_draft(&self, _draft: &mut EntryDraft, _is_new: bool) -> PreCheck {
        PreCheck::Proceed
    }

    async fn after_save_draft(&self, _draft: &EntryDraft, _is_new: bool) {}

    async fn before_publish_draft(&self, _draft: &mut EntryDraft) -> PreCheck {
        PreCheck::Proceed
    }

    async fn after_publish_draft(&self, _draft: &EntryDraft) {}

    async fn before_delete_draft(&self, _draft: &EntryDraft) -> PreCheck {
        PreCheck::Proceed
    }

    async fn after_delete_draft(&self, _draft: &EntryDraft) {}

    async fn after_revert_entry_to_version(&self, _version: &EntryVersion) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tap_names() {
        assert_eq!(TapEvent::DraftPresave.as_str(), "tap_draft_presave");
        assert_eq!(TapEvent::EntryRevert.to_string(), "tap_entry_revert");
    }

    #[test]
    fn abort_helper() {
        let check = PreCheck::abort("locked");
        assert!(check.is_abort());
        assert_eq!(check, PreCheck::Abort("locked".to_string()));
        assert!(!PreCheck::Proceed.is_abort());
    }
}
