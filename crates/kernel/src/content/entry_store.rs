//! Entry store contract.
//!
//! Entries and sections are owned by the hosting CMS; the revision service
//! reads and writes them only through this trait.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{EditableEntry, Entry, Section};

/// Loads and saves live entries.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Load an entry by ID for a site.
    async fn get_entry_by_id(&self, id: Uuid, site_id: Uuid) -> Result<Option<Entry>>;

    /// Save an entry, draft, or version as the live entry it belongs to.
    ///
    /// Returns Ok(false) if the entry failed validation.
    async fn save_entry(&self, entry: &dyn EditableEntry) -> Result<bool>;

    /// Load a section by ID.
    async fn get_section_by_id(&self, id: Uuid) -> Result<Option<Section>>;
}
