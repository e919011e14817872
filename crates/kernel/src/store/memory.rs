//! In-memory revision store.
//!
//! Follows the same ordering, validation, and uniqueness rules as the
//! PostgreSQL store. Draft names compare byte-wise, matching the `"C"`
//! collation the PostgreSQL store sorts with. Useful for tests and for
//! embedding without a database.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use super::{RevisionStore, RevisionTransaction};
use crate::error::{RevisionError, RevisionResult};
use crate::models::{DraftRecord, VersionRecord};

#[derive(Debug, Default)]
struct MemoryState {
    drafts: HashMap<Uuid, DraftRecord>,
    versions: HashMap<Uuid, VersionRecord>,
}

/// Revision store held in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRevisionStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRevisionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of draft records across all entries.
    pub fn draft_count(&self) -> usize {
        self.state.lock().drafts.len()
    }

    /// Total number of version records across all entries.
    pub fn version_count(&self) -> usize {
        self.state.lock().versions.len()
    }
}

#[async_trait]
impl RevisionStore for MemoryRevisionStore {
    async fn find_draft(&self, id: Uuid) -> RevisionResult<Option<DraftRecord>> {
        Ok(self.state.lock().drafts.get(&id).cloned())
    }

    async fn list_drafts(&self, entry_id: Uuid, site_id: Uuid) -> RevisionResult<Vec<DraftRecord>> {
        let mut records: Vec<DraftRecord> = self
            .state
            .lock()
            .drafts
            .values()
            .filter(|d| d.entry_id == entry_id && d.site_id == site_id)
            .cloned()
            .collect();

        records.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn count_drafts(&self, entry_id: Uuid, site_id: Uuid) -> RevisionResult<i64> {
        let count = self
            .state
            .lock()
            .drafts
            .values()
            .filter(|d| d.entry_id == entry_id && d.site_id == site_id)
            .count();

        Ok(count as i64)
    }

    async fn save_draft(&self, record: &DraftRecord) -> RevisionResult<bool> {
        if !record.is_valid() {
            return Ok(false);
        }

        let mut state = self.state.lock();
        match state.drafts.get_mut(&record.id) {
            Some(existing) => {
                existing.name.clone_from(&record.name);
                existing.notes.clone_from(&record.notes);
                existing.data.clone_from(&record.data);
                existing.changed = record.changed;
            }
            None => {
                state.drafts.insert(record.id, record.clone());
            }
        }

        Ok(true)
    }

    async fn begin(&self) -> RevisionResult<Box<dyn RevisionTransaction>> {
        Ok(Box::new(MemoryRevisionTransaction {
            state: Arc::clone(&self.state),
            deleted_drafts: Vec::new(),
        }))
    }

    async fn find_version(&self, id: Uuid) -> RevisionResult<Option<VersionRecord>> {
        Ok(self.state.lock().versions.get(&id).cloned())
    }

    async fn list_versions(
        &self,
        entry_id: Uuid,
        site_id: Uuid,
        offset: u32,
        limit: Option<u32>,
    ) -> RevisionResult<Vec<VersionRecord>> {
        let mut records: Vec<VersionRecord> = self
            .state
            .lock()
            .versions
            .values()
            .filter(|v| v.entry_id == entry_id && v.site_id == site_id)
            .cloned()
            .collect();

        records.sort_by(|a, b| b.num.cmp(&a.num));

        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = limit
            .and_then(|l| usize::try_from(l).ok())
            .unwrap_or(usize::MAX);

        Ok(records.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_versions(&self, entry_id: Uuid, site_id: Uuid) -> RevisionResult<i64> {
        let count = self
            .state
            .lock()
            .versions
            .values()
            .filter(|v| v.entry_id == entry_id && v.site_id == site_id)
            .count();

        Ok(count as i64)
    }

    async fn insert_version(&self, record: &VersionRecord) -> RevisionResult<bool> {
        if !record.is_valid() {
            return Ok(false);
        }

        let mut state = self.state.lock();
        let taken = state.versions.values().any(|v| {
            v.entry_id == record.entry_id && v.site_id == record.site_id && v.num == record.num
        });
        if taken {
            return Err(RevisionError::VersionConflict {
                entry_id: record.entry_id,
                site_id: record.site_id,
                num: record.num,
            });
        }

        state.versions.insert(record.id, record.clone());
        Ok(true)
    }
}

/// Transaction on the in-memory store. Deletions apply on commit.
struct MemoryRevisionTransaction {
    state: Arc<Mutex<MemoryState>>,
    deleted_drafts: Vec<Uuid>,
}

#[async_trait]
impl RevisionTransaction for MemoryRevisionTransaction {
    async fn delete_draft(&mut self, id: Uuid) -> RevisionResult<bool> {
        if self.deleted_drafts.contains(&id) || !self.state.lock().drafts.contains_key(&id) {
            return Ok(false);
        }

        self.deleted_drafts.push(id);
        Ok(true)
    }

    async fn commit(self: Box<Self>) -> RevisionResult<()> {
        let mut state = self.state.lock();
        for id in &self.deleted_drafts {
            state.drafts.remove(id);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> RevisionResult<()> {
        Ok(())
    }
}
