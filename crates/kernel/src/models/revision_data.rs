//! Snapshot payload stored in the `data` column of drafts and versions.
//!
//! Field values are keyed by field ID rather than handle, so a field can be
//! renamed without invalidating the snapshots that already reference it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entry::{EditableEntry, EntryContent, Field};

/// Serialized editable state of an entry at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionData {
    pub type_id: Uuid,
    pub author_id: Option<Uuid>,
    pub title: String,
    pub slug: String,
    /// Unix timestamp.
    pub post_date: Option<i64>,
    /// Unix timestamp.
    pub expiry_date: Option<i64>,
    pub enabled: bool,
    pub new_parent_id: Option<Uuid>,
    /// Field ID -> value. `None` after a partial (list) decode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<Uuid, serde_json::Value>>,
}

impl RevisionData {
    /// Snapshot the editable surface of an entry, draft, or version.
    ///
    /// Only catalog fields whose handle holds a non-null value are recorded.
    pub fn extract(entry: &dyn EditableEntry, catalog: &[Field]) -> Self {
        let content = entry.content();

        let fields = catalog
            .iter()
            .filter_map(|field| match content.fields.get(&field.handle) {
                Some(value) if !value.is_null() => Some((field.id, value.clone())),
                _ => None,
            })
            .collect();

        Self {
            type_id: content.type_id,
            author_id: content.author_id,
            title: content.title.clone(),
            slug: content.slug.clone(),
            post_date: content.post_date.map(|d| d.timestamp()),
            expiry_date: content.expiry_date.map(|d| d.timestamp()),
            enabled: content.enabled,
            new_parent_id: content.new_parent_id,
            fields: Some(fields),
        }
    }

    /// Encode for storage.
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decode a stored payload, field values included.
    pub fn decode(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Decode a stored payload for list display, dropping field values.
    pub fn decode_partial(raw: &str) -> serde_json::Result<Self> {
        let mut data = Self::decode(raw)?;
        data.fields = None;
        Ok(data)
    }

    /// Whether field values are present.
    pub fn has_fields(&self) -> bool {
        self.fields.is_some()
    }

    /// Rebuild entry content, mapping field IDs back to current handles.
    ///
    /// Values for fields that no longer exist in the catalog are dropped.
    pub fn into_content(self, catalog: &[Field], revision_notes: Option<String>) -> EntryContent {
        let mut fields = BTreeMap::new();
        if let Some(values) = self.fields {
            for field in catalog {
                if let Some(value) = values.get(&field.id) {
                    fields.insert(field.handle.clone(), value.clone());
                }
            }
        }

        EntryContent {
            type_id: self.type_id,
            author_id: self.author_id,
            title: self.title,
            slug: self.slug,
            post_date: self.post_date.and_then(from_timestamp),
            expiry_date: self.expiry_date.and_then(from_timestamp),
            enabled: self.enabled,
            new_parent_id: self.new_parent_id,
            fields,
            revision_notes,
        }
    }
}

fn from_timestamp(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}
