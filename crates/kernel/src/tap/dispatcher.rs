//! Tap dispatcher - invokes revision taps in weight order.
//!
//! Pre taps run until the first one aborts; later handlers are skipped.
//! Post taps always run for every handler.

use std::sync::Arc;

use tracing::{debug, info};

use super::{PreCheck, TapEvent, TapRegistry};
use crate::models::{EntryDraft, EntryVersion};

/// Dispatcher for invoking revision taps.
#[derive(Debug, Clone, Default)]
pub struct TapDispatcher {
    registry: Arc<TapRegistry>,
}

impl TapDispatcher {
    /// Create a new tap dispatcher.
    pub fn new(registry: Arc<TapRegistry>) -> Self {
        Self { registry }
    }

    /// Get the tap registry for handler introspection.
    pub fn registry(&self) -> &TapRegistry {
        &self.registry
    }

    pub async fn before_save_draft(&self, draft: &mut EntryDraft, is_new: bool) -> PreCheck {
        for handler in self.registry.handlers() {
            let check = handler.tap.before_save_draft(draft, is_new).await;
            if let Some(aborted) = aborted(TapEvent::DraftPresave, handler.tap.name(), check) {
                return aborted;
            }
        }
        self.done(TapEvent::DraftPresave);
        PreCheck::Proceed
    }

    pub async fn after_save_draft(&self, draft: &EntryDraft, is_new: bool) {
        for handler in self.registry.handlers() {
            handler.tap.after_save_draft(draft, is_new).await;
        }
        self.done(TapEvent::DraftSave);
    }

    pub async fn before_publish_draft(&self, draft: &mut EntryDraft) -> PreCheck {
        for handler in self.registry.handlers() {
            let check = handler.tap.before_publish_draft(draft).await;
            if let Some(aborted) = aborted(TapEvent::DraftPrepublish, handler.tap.name(), check) {
                return aborted;
            }
        }
        self.done(TapEvent::DraftPrepublish);
        PreCheck::Proceed
    }

    pub async fn after_publish_draft(&self, draft: &EntryDraft) {
        for handler in self.registry.handlers() {
            handler.tap.after_publish_draft(draft).await;
        }
        self.done(TapEvent::DraftPublish);
    }

    pub async fn before_delete_draft(&self, draft: &EntryDraft) -> PreCheck {
        for handler in self.registry.handlers() {
            let check = handler.tap.before_delete_draft(draft).await;
            if let Some(aborted) = aborted(TapEvent::DraftPredelete, handler.tap.name(), check) {
                return aborted;
            }
        }
        self.done(TapEvent::DraftPredelete);
        PreCheck::Proceed
    }

    pub async fn after_delete_draft(&self, draft: &EntryDraft) {
        for handler in self.registry.handlers() {
            handler.tap.after_delete_draft(draft).await;
        }
        self.done(TapEvent::DraftDelete);
    }

    pub async fn after_revert_entry_to_version(&self, version: &EntryVersion) {
        for handler in self.registry.handlers() {
            handler.tap.after_revert_entry_to_version(version).await;
        }
        self.done(TapEvent::EntryRevert);
    }

    fn done(&self, event: TapEvent) {
        debug!(
            tap = %event,
            handlers = self.registry.handler_count(),
            "dispatch complete"
        );
    }
}

fn aborted(event: TapEvent, handler: &str, check: PreCheck) -> Option<PreCheck> {
    match check {
        PreCheck::Proceed => None,
        PreCheck::Abort(reason) => {
            info!(tap = %event, handler = %handler, reason = %reason, "operation aborted by tap");
            Some(PreCheck::Abort(reason))
        }
    }
}
