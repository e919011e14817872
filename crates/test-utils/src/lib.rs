//! Revisio test utilities.
//!
//! Helpers for integration testing: entry fixtures, an in-memory entry
//! store, and taps that record or veto revision events.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use revisio_kernel::content::EntryStore;
use revisio_kernel::models::{
    EditableEntry, Entry, EntryContent, EntryDraft, EntryVersion, Section, SectionKind,
    StructurePosition,
};
use revisio_kernel::permissions::{ADMINISTER_SITE, UserContext};
use revisio_kernel::tap::{PreCheck, RevisionTap, TapEvent};

/// Create a test entry with default values.
pub fn test_entry(title: &str) -> TestEntry {
    TestEntry {
        id: Uuid::now_v7(),
        site_id: Uuid::nil(),
        section_id: Uuid::now_v7(),
        structure: None,
        content: EntryContent {
            type_id: Uuid::nil(),
            title: title.to_string(),
            slug: slugify(title),
            enabled: true,
            ..Default::default()
        },
    }
}

/// A test entry builder for creating test fixtures.
#[derive(Debug, Clone)]
pub struct TestEntry {
    pub id: Uuid,
    pub site_id: Uuid,
    pub section_id: Uuid,
    pub structure: Option<StructurePosition>,
    pub content: EntryContent,
}

impl TestEntry {
    /// Set a custom ID.
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Set the site.
    pub fn on_site(mut self, site_id: Uuid) -> Self {
        self.site_id = site_id;
        self
    }

    /// Set the section.
    pub fn in_section(mut self, section_id: Uuid) -> Self {
        self.section_id = section_id;
        self
    }

    /// Set the author.
    pub fn with_author(mut self, author_id: Uuid) -> Self {
        self.content.author_id = Some(author_id);
        self
    }

    /// Set a custom field value by handle.
    pub fn with_field(mut self, handle: &str, value: JsonValue) -> Self {
        self.content.fields.insert(handle.to_string(), value);
        self
    }

    /// Set revision notes.
    pub fn with_notes(mut self, notes: &str) -> Self {
        self.content.revision_notes = Some(notes.to_string());
        self
    }

    /// Place the entry in a structure at the given level.
    pub fn at_level(mut self, level: i32) -> Self {
        self.structure = Some(StructurePosition {
            root: Uuid::nil(),
            lft: level,
            rgt: level + 1,
            level,
        });
        self
    }

    /// Set as disabled.
    pub fn disabled(mut self) -> Self {
        self.content.enabled = false;
        self
    }

    /// Build the entry.
    pub fn build(self) -> Entry {
        Entry {
            id: self.id,
            site_id: self.site_id,
            section_id: self.section_id,
            content: self.content,
            structure: self.structure,
        }
    }
}

/// Create a section fixture.
pub fn test_section(name: &str, kind: SectionKind) -> Section {
    Section {
        id: Uuid::now_v7(),
        name: name.to_string(),
        kind,
    }
}

/// Create an authenticated user with the given permissions.
pub fn test_user(permissions: &[&str]) -> UserContext {
    UserContext::authenticated(
        Uuid::now_v7(),
        permissions.iter().map(|p| p.to_string()).collect(),
    )
}

/// Create a site administrator.
pub fn admin_user() -> UserContext {
    test_user(&[ADMINISTER_SITE])
}

fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

// ============================================================================
// Entry store
// ============================================================================

/// An entry as handed to [`MemoryEntryStore::save_entry`].
#[derive(Debug, Clone, PartialEq)]
pub struct SavedEntry {
    pub entry_id: Uuid,
    pub site_id: Uuid,
    pub content: EntryContent,
    pub structure: Option<StructurePosition>,
}

#[derive(Default)]
struct EntryStoreState {
    entries: HashMap<(Uuid, Uuid), Entry>,
    sections: HashMap<Uuid, Section>,
    saved: Vec<SavedEntry>,
    reject_saves: bool,
    fail_saves: bool,
}

/// Entry store held in memory.
///
/// Saves overwrite the stored entry's content and are logged so tests can
/// inspect what reached the live entry.
#[derive(Clone, Default)]
pub struct MemoryEntryStore {
    state: Arc<Mutex<EntryStoreState>>,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry.
    pub fn insert_entry(&self, entry: Entry) {
        self.state
            .lock()
            .entries
            .insert((entry.id, entry.site_id), entry);
    }

    /// Add or replace a section.
    pub fn insert_section(&self, section: Section) {
        self.state.lock().sections.insert(section.id, section);
    }

    /// Current state of an entry.
    pub fn entry(&self, id: Uuid, site_id: Uuid) -> Option<Entry> {
        self.state.lock().entries.get(&(id, site_id)).cloned()
    }

    /// Every successful save, oldest first.
    pub fn saved(&self) -> Vec<SavedEntry> {
        self.state.lock().saved.clone()
    }

    /// The most recent successful save.
    pub fn last_saved(&self) -> Option<SavedEntry> {
        self.state.lock().saved.last().cloned()
    }

    /// Make saves return Ok(false), as a failed validation would.
    pub fn reject_saves(&self, reject: bool) {
        self.state.lock().reject_saves = reject;
    }

    /// Make saves return an error.
    pub fn fail_saves(&self, fail: bool) {
        self.state.lock().fail_saves = fail;
    }
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn get_entry_by_id(&self, id: Uuid, site_id: Uuid) -> Result<Option<Entry>> {
        Ok(self.entry(id, site_id))
    }

    async fn save_entry(&self, entry: &dyn EditableEntry) -> Result<bool> {
        let mut state = self.state.lock();
        if state.fail_saves {
            bail!("entry store unavailable");
        }
        if state.reject_saves {
            return Ok(false);
        }

        let key = (entry.entry_id(), entry.site_id());
        let structure = state
            .entries
            .get(&key)
            .and_then(|e| e.structure)
            .or_else(|| entry.structure().copied());

        state.entries.insert(
            key,
            Entry {
                id: entry.entry_id(),
                site_id: entry.site_id(),
                section_id: entry.section_id(),
                content: entry.content().clone(),
                structure,
            },
        );
        state.saved.push(SavedEntry {
            entry_id: entry.entry_id(),
            site_id: entry.site_id(),
            content: entry.content().clone(),
            structure: entry.structure().copied(),
        });
        Ok(true)
    }

    async fn get_section_by_id(&self, id: Uuid) -> Result<Option<Section>> {
        Ok(self.state.lock().sections.get(&id).cloned())
    }
}

// ============================================================================
// Taps
// ============================================================================

/// One tap invocation seen by a [`RecordingTap`].
#[derive(Debug, Clone, PartialEq)]
pub struct TapCall {
    pub event: TapEvent,
    pub entry_id: Uuid,
    /// Draft ID, or version ID for reverts.
    pub revision_id: Option<Uuid>,
    /// Draft name, or `v{num}` for reverts.
    pub label: String,
    pub notes: Option<String>,
    /// `is_new` for save events.
    pub is_new: Option<bool>,
}

/// Tap that records every revision event it receives.
#[derive(Clone)]
pub struct RecordingTap {
    name: String,
    weight: i32,
    calls: Arc<Mutex<Vec<TapCall>>>,
}

impl RecordingTap {
    pub fn new(name: &str) -> Self {
        Self::with_weight(name, 0)
    }

    pub fn with_weight(name: &str, weight: i32) -> Self {
        Self {
            name: name.to_string(),
            weight,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every recorded call, in order.
    pub fn calls(&self) -> Vec<TapCall> {
        self.calls.lock().clone()
    }

    /// Recorded events, in order.
    pub fn events(&self) -> Vec<TapEvent> {
        self.calls.lock().iter().map(|c| c.event).collect()
    }

    /// The last call for an event.
    pub fn last(&self, event: TapEvent) -> Option<TapCall> {
        self.calls
            .lock()
            .iter()
            .rev()
            .find(|c| c.event == event)
            .cloned()
    }

    fn record_draft(&self, event: TapEvent, draft: &EntryDraft, is_new: Option<bool>) {
        self.calls.lock().push(TapCall {
            event,
            entry_id: draft.entry_id,
            revision_id: draft.draft_id,
            label: draft.display_name().to_string(),
            notes: draft.content.revision_notes.clone(),
            is_new,
        });
    }
}

#[async_trait]
impl RevisionTap for RecordingTap {
    fn name(&self) -> &str {
        &self.name
    }

    fn weight(&self) -> i32 {
        self.weight
    }

    async fn before_save_draft(&self, draft: &mut EntryDraft, is_new: bool) -> PreCheck {
        self.record_draft(TapEvent::DraftPresave, draft, Some(is_new));
        PreCheck::Proceed
    }

    async fn after_save_draft(&self, draft: &EntryDraft, is_new: bool) {
        self.record_draft(TapEvent::DraftSave, draft, Some(is_new));
    }

    async fn before_publish_draft(&self, draft: &mut EntryDraft) -> PreCheck {
        self.record_draft(TapEvent::DraftPrepublish, draft, None);
        PreCheck::Proceed
    }

    async fn after_publish_draft(&self, draft: &EntryDraft) {
        self.record_draft(TapEvent::DraftPublish, draft, None);
    }

    async fn before_delete_draft(&self, draft: &EntryDraft) -> PreCheck {
        self.record_draft(TapEvent::DraftPredelete, draft, None);
        PreCheck::Proceed
    }

    async fn after_delete_draft(&self, draft: &EntryDraft) {
        self.record_draft(TapEvent::DraftDelete, draft, None);
    }

    async fn after_revert_entry_to_version(&self, version: &EntryVersion) {
        self.calls.lock().push(TapCall {
            event: TapEvent::EntryRevert,
            entry_id: version.entry_id,
            revision_id: Some(version.version_id),
            label: format!("v{}", version.num),
            notes: version.content.revision_notes.clone(),
            is_new: None,
        });
    }
}

/// Tap that aborts the pre events it was built with.
pub struct VetoTap {
    events: HashSet<TapEvent>,
}

impl VetoTap {
    pub fn new(events: &[TapEvent]) -> Self {
        Self {
            events: events.iter().copied().collect(),
        }
    }

    fn check(&self, event: TapEvent) -> PreCheck {
        if self.events.contains(&event) {
            PreCheck::abort(format!("{event} vetoed"))
        } else {
            PreCheck::Proceed
        }
    }
}

#[async_trait]
impl RevisionTap for VetoTap {
    fn name(&self) -> &str {
        "veto"
    }

    async fn before_save_draft(&self, _draft: &mut EntryDraft, _is_new: bool) -> PreCheck {
        self.check(TapEvent::DraftPresave)
    }

    async fn before_publish_draft(&self, _draft: &mut EntryDraft) -> PreCheck {
        self.check(TapEvent::DraftPrepublish)
    }

    async fn before_delete_draft(&self, _draft: &EntryDraft) -> PreCheck {
        self.check(TapEvent::DraftPredelete)
    }
}
