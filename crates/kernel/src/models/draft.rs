//! Entry draft model and its storage record.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entry::{EditableEntry, Entry, EntryContent, Field, StructurePosition};
use super::revision_data::RevisionData;

/// Maximum length of a draft name.
pub const DRAFT_NAME_MAX_LEN: usize = 255;

/// Default display name for the `num`-th draft of an entry.
pub fn default_draft_name(num: i64) -> String {
    format!("Draft {num}")
}

/// A named, editable snapshot of an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDraft {
    /// Draft ID (None until first saved).
    pub draft_id: Option<Uuid>,

    /// The live entry this draft belongs to.
    pub entry_id: Uuid,

    pub section_id: Uuid,

    pub site_id: Uuid,

    /// User who created the draft.
    pub creator_id: Uuid,

    /// Display name (assigned on save when missing).
    pub name: Option<String>,

    /// Snapshot content. `revision_notes` holds the draft notes.
    pub content: EntryContent,

    /// Copied from the live entry when loaded by ID; never stored.
    pub structure: Option<StructurePosition>,

    /// False for drafts loaded through a list query.
    pub fields_loaded: bool,
}

impl EntryDraft {
    /// Start a new, unsaved draft from the current state of an entry.
    pub fn from_entry(entry: &Entry, creator_id: Uuid) -> Self {
        Self {
            draft_id: None,
            entry_id: entry.id,
            section_id: entry.section_id,
            site_id: entry.site_id,
            creator_id,
            name: None,
            content: entry.content.clone(),
            structure: entry.structure,
            fields_loaded: true,
        }
    }

    /// Build a draft from its stored record and decoded payload.
    pub fn from_record(record: DraftRecord, data: RevisionData, catalog: &[Field]) -> Self {
        let fields_loaded = data.has_fields();
        Self {
            draft_id: Some(record.id),
            entry_id: record.entry_id,
            section_id: record.section_id,
            site_id: record.site_id,
            creator_id: record.creator_id,
            name: Some(record.name),
            content: data.into_content(catalog, record.notes),
            structure: None,
            fields_loaded,
        }
    }

    /// Display name, or an empty string for unnamed drafts.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Whether the draft still needs a default name.
    pub fn is_unnamed(&self) -> bool {
        self.name.as_deref().is_none_or(str::is_empty)
    }
}

impl EditableEntry for EntryDraft {
    fn entry_id(&self) -> Uuid {
        self.entry_id
    }

    fn site_id(&self) -> Uuid {
        self.site_id
    }

    fn section_id(&self) -> Uuid {
        self.section_id
    }

    fn content(&self) -> &EntryContent {
        &self.content
    }

    fn structure(&self) -> Option<&StructurePosition> {
        self.structure.as_ref()
    }
}

/// Row in the `entrydrafts` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DraftRecord {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,
    pub entry_id: Uuid,
    pub section_id: Uuid,
    pub site_id: Uuid,
    pub creator_id: Uuid,
    pub name: String,
    pub notes: Option<String>,
    /// Encoded [`RevisionData`].
    pub data: String,
    /// Unix timestamp when created.
    pub created: i64,
    /// Unix timestamp when last changed.
    pub changed: i64,
}

impl DraftRecord {
    /// Create an unsaved record for a draft's entry, section, creator, and site.
    pub fn for_draft(draft: &EntryDraft) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: Uuid::now_v7(),
            entry_id: draft.entry_id,
            section_id: draft.section_id,
            site_id: draft.site_id,
            creator_id: draft.creator_id,
            name: String::new(),
            notes: None,
            data: String::new(),
            created: now,
            changed: now,
        }
    }

    /// Check the record against the column rules of `entrydrafts`.
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty() && self.name.chars().count() <= DRAFT_NAME_MAX_LEN
    }
}
