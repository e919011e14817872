//! Entry version model and its storage record.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entry::{EditableEntry, EntryContent, Field};
use super::revision_data::RevisionData;

/// An immutable, numbered snapshot of an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryVersion {
    pub version_id: Uuid,

    pub entry_id: Uuid,

    pub section_id: Uuid,

    pub site_id: Uuid,

    /// User who saved the entry (or its author).
    pub creator_id: Option<Uuid>,

    /// Sequence number, starting at 1 per entry and site.
    pub num: i32,

    /// Snapshot content. `revision_notes` holds the version notes.
    pub content: EntryContent,

    /// Unix timestamp when this version was created.
    pub created: i64,

    /// False for versions loaded through a list query.
    pub fields_loaded: bool,
}

impl EntryVersion {
    /// Build a version from its stored record and decoded payload.
    pub fn from_record(record: VersionRecord, data: RevisionData, catalog: &[Field]) -> Self {
        let fields_loaded = data.has_fields();
        Self {
            version_id: record.id,
            entry_id: record.entry_id,
            section_id: record.section_id,
            site_id: record.site_id,
            creator_id: record.creator_id,
            num: record.num,
            content: data.into_content(catalog, record.notes),
            created: record.created,
            fields_loaded,
        }
    }
}

impl EditableEntry for EntryVersion {
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
}

/// Row in the `entryversions` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VersionRecord {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,
    pub entry_id: Uuid,
    pub section_id: Uuid,
    pub site_id: Uuid,
    pub creator_id: Option<Uuid>,
    pub num: i32,
    pub notes: Option<String>,
    /// Encoded [`RevisionData`].
    pub data: String,
    /// Unix timestamp when created.
    pub created: i64,
}

impl VersionRecord {
    /// Create a new version record for an entry.
    pub fn new(
        entry: &dyn EditableEntry,
        creator_id: Option<Uuid>,
        num: i32,
        data: String,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            entry_id: entry.entry_id(),
            section_id: entry.section_id(),
            site_id: entry.site_id(),
            creator_id,
            num,
            notes: entry.content().notes().map(str::to_string),
            data,
            created: chrono::Utc::now().timestamp(),
        }
    }

    /// Check the record against the column rules of `entryversions`.
    pub fn is_valid(&self) -> bool {
        self.num >= 1
    }
}
