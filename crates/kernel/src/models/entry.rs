//! Entry model shared by live entries, drafts, and versions.
//!
//! Entries belong to the hosting CMS. The revision service only needs their
//! editable surface, which drafts and versions carry too.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Position of an entry inside a structured (hierarchical) section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructurePosition {
    /// Root node of the tree the entry lives in.
    pub root: Uuid,
    /// Nested-set left bound.
    pub lft: i32,
    /// Nested-set right bound.
    pub rgt: i32,
    /// Depth, starting at 1 for top-level entries.
    pub level: i32,
}

/// How a section organizes its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    /// One fixed entry whose title is the section name.
    Single,
    /// Flat list of entries.
    Channel,
    /// Hierarchical entries.
    Structure,
}

/// Section record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: Uuid,
    pub name: String,
    pub kind: SectionKind,
}

impl Section {
    /// Check if this is a single section.
    pub fn is_single(&self) -> bool {
        self.kind == SectionKind::Single
    }
}

/// A field known to the field catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Stable identifier; snapshots key values by this.
    pub id: Uuid,
    /// Current handle; entry content keys values by this.
    pub handle: String,
}

impl Field {
    pub fn new(id: Uuid, handle: impl Into<String>) -> Self {
        Self {
            id,
            handle: handle.into(),
        }
    }
}

/// The editable state of an entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryContent {
    /// Entry type ID.
    pub type_id: Uuid,

    /// Author user ID.
    pub author_id: Option<Uuid>,

    pub title: String,

    pub slug: String,

    pub post_date: Option<DateTime<Utc>>,

    pub expiry_date: Option<DateTime<Utc>>,

    pub enabled: bool,

    /// Parent the entry should move under on its next save.
    pub new_parent_id: Option<Uuid>,

    /// Field values keyed by field handle.
    pub fields: BTreeMap<String, serde_json::Value>,

    /// Notes recorded with the next draft or version.
    pub revision_notes: Option<String>,
}

impl EntryContent {
    /// Revision notes, treating an empty string as absent.
    pub fn notes(&self) -> Option<&str> {
        self.revision_notes.as_deref().filter(|n| !n.is_empty())
    }
}

/// Live entry record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: Uuid,
    pub site_id: Uuid,
    pub section_id: Uuid,
    pub content: EntryContent,
    /// Present for entries in structured sections.
    pub structure: Option<StructurePosition>,
}

/// Anything exposing the entry-editable surface.
///
/// Implemented by [`Entry`], drafts, and versions so that any of them can be
/// snapshotted or handed to the entry store for saving.
pub trait EditableEntry: Send + Sync {
    /// The live entry this object belongs to.
    fn entry_id(&self) -> Uuid;

    fn site_id(&self) -> Uuid;

    fn section_id(&self) -> Uuid;

    fn content(&self) -> &EntryContent;

    fn structure(&self) -> Option<&StructurePosition> {
        None
    }
}

impl EditableEntry for Entry {
    fn entry_id(&self) -> Uuid {
        self.id
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

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_notes_are_absent() {
        let mut content = EntryContent {
            revision_notes: Some(String::new()),
            ..Default::default()
        };
        assert!(content.notes().is_none());

        content.revision_notes = Some("Fixed typo".to_string());
        assert_eq!(content.notes(), Some("Fixed typo"));
    }

    #[test]
    fn section_kind_serializes_lowercase() {
        let json = serde_json::to_string(&SectionKind::Single).unwrap();
        assert_eq!(json, "\"single\"");
    }
}
