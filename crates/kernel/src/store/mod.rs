//! Revision persistence backends.
//!
//! Provides the storage trait for the `entrydrafts` and `entryversions`
//! tables and implementations backed by PostgreSQL or process memory.

mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::RevisionResult;
use crate::models::{DraftRecord, VersionRecord};

pub use memory::MemoryRevisionStore;
pub use postgres::PgRevisionStore;

/// Row-level storage for drafts and versions.
///
/// `save_draft` and `insert_version` return `Ok(false)` when the record is
/// rejected by the table's rules; infrastructure failures are errors.
#[async_trait]
pub trait RevisionStore: Send + Sync {
    /// Find a draft record by ID.
    async fn find_draft(&self, id: Uuid) -> RevisionResult<Option<DraftRecord>>;

    /// List draft records for an entry and site, ordered by name.
    async fn list_drafts(&self, entry_id: Uuid, site_id: Uuid) -> RevisionResult<Vec<DraftRecord>>;

    /// Count draft records for an entry and site.
    async fn count_drafts(&self, entry_id: Uuid, site_id: Uuid) -> RevisionResult<i64>;

    /// Insert or update a draft record by ID.
    async fn save_draft(&self, record: &DraftRecord) -> RevisionResult<bool>;

    /// Start a transaction.
    async fn begin(&self) -> RevisionResult<Box<dyn RevisionTransaction>>;

    /// Find a version record by ID.
    async fn find_version(&self, id: Uuid) -> RevisionResult<Option<VersionRecord>>;

    /// List version records for an entry and site, newest first.
    async fn list_versions(
        &self,
        entry_id: Uuid,
        site_id: Uuid,
        offset: u32,
        limit: Option<u32>,
    ) -> RevisionResult<Vec<VersionRecord>>;

    /// Count version records for an entry and site.
    async fn count_versions(&self, entry_id: Uuid, site_id: Uuid) -> RevisionResult<i64>;

    /// Insert a version record.
    ///
    /// Fails with `VersionConflict` if the entry and site already have a
    /// version with the same number.
    async fn insert_version(&self, record: &VersionRecord) -> RevisionResult<bool>;
}

/// Unit of work over a [`RevisionStore`].
///
/// Dropping a transaction without committing discards its changes.
#[async_trait]
pub trait RevisionTransaction: Send {
    /// Delete a draft record. Returns false if no record had the ID.
    async fn delete_draft(&mut self, id: Uuid) -> RevisionResult<bool>;

    async fn commit(self: Box<Self>) -> RevisionResult<()>;

    async fn rollback(self: Box<Self>) -> RevisionResult<()>;
}
