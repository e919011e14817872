#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! [`Harness`] wires the REAL revision service to in-memory stores, so the
//! tests exercise the same code paths as production without a database.
//! [`FlakyStore`] and [`RacingStore`] wrap a store to inject failures and
//! concurrent writers. [`pg_store`] connects to the PostgreSQL database named
//! by `DATABASE_URL`; tests that need it are skipped when it is unset.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use revisio_kernel::config::{Config, RevisionSettings};
use revisio_kernel::db;
use revisio_kernel::content::{FieldRegistry, RevisionService};
use revisio_kernel::error::{RevisionError, RevisionResult};
use revisio_kernel::models::{DraftRecord, Entry, Field, Section, SectionKind, VersionRecord};
use revisio_kernel::permissions::{SessionPermissions, UserContext};
use revisio_kernel::store::{
    MemoryRevisionStore, PgRevisionStore, RevisionStore, RevisionTransaction,
};
use revisio_kernel::tap::{RevisionTap, TapDispatcher, TapRegistry};
use revisio_test_utils::{MemoryEntryStore, RecordingTap, test_entry, test_section, test_user};

/// Fully wired revision service over in-memory collaborators.
pub struct Harness {
    pub service: RevisionService,
    pub store: MemoryRevisionStore,
    pub entries: MemoryEntryStore,
    pub fields: FieldRegistry,
    pub recorder: RecordingTap,
    pub section: Section,
    pub user: UserContext,
    pub body: Field,
    pub summary: Field,
}

impl Harness {
    /// Harness with a plain memory store and only the recording tap.
    pub fn new() -> Self {
        Self::build(plain, Vec::new())
    }

    /// Harness with extra taps registered after the recording tap.
    pub fn with_taps(taps: Vec<Arc<dyn RevisionTap>>) -> Self {
        Self::build(plain, taps)
    }

    /// Harness whose revision store is wrapped by `wrap`.
    pub fn with_store(wrap: impl FnOnce(MemoryRevisionStore) -> Arc<dyn RevisionStore>) -> Self {
        Self::build(wrap, Vec::new())
    }

    /// Harness with a wrapped revision store and extra taps.
    pub fn build(
        wrap: impl FnOnce(MemoryRevisionStore) -> Arc<dyn RevisionStore>,
        taps: Vec<Arc<dyn RevisionTap>>,
    ) -> Self {
        let store = MemoryRevisionStore::new();
        let entries = MemoryEntryStore::new();
        let body = Field::new(Uuid::now_v7(), "body");
        let summary = Field::new(Uuid::now_v7(), "summary");
        let fields = FieldRegistry::with_fields([body.clone(), summary.clone()]);

        let section = test_section("News", SectionKind::Channel);
        entries.insert_section(section.clone());

        let recorder = RecordingTap::new("recorder");
        let mut registry = TapRegistry::new();
        registry.register(Arc::new(recorder.clone()));
        for tap in taps {
            registry.register(tap);
        }

        let user = test_user(&[]);
        let service = RevisionService::new(
            wrap(store.clone()),
            Arc::new(entries.clone()),
            Arc::new(fields.clone()),
            Arc::new(SessionPermissions::for_user(user.clone())),
            TapDispatcher::new(Arc::new(registry)),
            RevisionSettings::default(),
        );

        Self {
            service,
            store,
            entries,
            fields,
            recorder,
            section,
            user,
            body,
            summary,
        }
    }

    /// Create and store a live entry in the harness section.
    pub fn entry(&self, title: &str) -> Entry {
        let entry = test_entry(title)
            .in_section(self.section.id)
            .with_author(self.user.id)
            .with_field("body", serde_json::json!(format!("{title} body")))
            .build();
        self.entries.insert_entry(entry.clone());
        entry
    }

    /// Add a section to the entry store.
    pub fn add_section(&self, name: &str, kind: SectionKind) -> Section {
        let section = test_section(name, kind);
        self.entries.insert_section(section.clone());
        section
    }

    /// The service acting as another user.
    pub fn as_user(&self, user: &UserContext) -> RevisionService {
        self.service
            .with_permissions(Arc::new(SessionPermissions::for_user(user.clone())))
    }

    /// The service with no current user.
    pub fn anonymous(&self) -> RevisionService {
        self.service
            .with_permissions(Arc::new(SessionPermissions::none()))
    }
}

/// PostgreSQL store with migrations applied, or None without `DATABASE_URL`.
///
/// Each test gets its own pool so connections never outlive the test's
/// runtime. Tests share the tables, so they must use fresh entry IDs.
pub async fn pg_store() -> Option<PgRevisionStore> {
    let config = Config::from_env().expect("invalid test configuration");
    if config.database_url.is_none() {
        eprintln!("DATABASE_URL not set, skipping PostgreSQL test");
        return None;
    }

    let pool = db::create_pool(&config)
        .await
        .expect("failed to connect to the test database");
    db::run_migrations(&pool)
        .await
        .expect("failed to run migrations");

    Some(PgRevisionStore::new(pool))
}

fn plain(store: MemoryRevisionStore) -> Arc<dyn RevisionStore> {
    Arc::new(store)
}

fn injected(what: &str) -> RevisionError {
    RevisionError::Collaborator(anyhow::anyhow!("injected {what} failure"))
}

// ============================================================================
// Failure injection
// ============================================================================

/// Switches and counters shared by a [`FlakyStore`] and its transactions.
#[derive(Default)]
pub struct FlakyState {
    pub fail_delete: AtomicBool,
    pub fail_commit: AtomicBool,
    pub fail_save_draft: AtomicBool,
    pub commits: AtomicU32,
    pub rollbacks: AtomicU32,
}

/// Memory store that fails on demand.
pub struct FlakyStore {
    inner: MemoryRevisionStore,
    state: Arc<FlakyState>,
}

impl FlakyStore {
    pub fn new(inner: MemoryRevisionStore, state: Arc<FlakyState>) -> Self {
        Self { inner, state }
    }
}

#[async_trait]
impl RevisionStore for FlakyStore {
    async fn find_draft(&self, id: Uuid) -> RevisionResult<Option<DraftRecord>> {
        self.inner.find_draft(id).await
    }

    async fn list_drafts(&self, entry_id: Uuid, site_id: Uuid) -> RevisionResult<Vec<DraftRecord>> {
        self.inner.list_drafts(entry_id, site_id).await
    }

    async fn count_drafts(&self, entry_id: Uuid, site_id: Uuid) -> RevisionResult<i64> {
        self.inner.count_drafts(entry_id, site_id).await
    }

    async fn save_draft(&self, record: &DraftRecord) -> RevisionResult<bool> {
        if self.state.fail_save_draft.load(Ordering::SeqCst) {
            return Err(injected("save"));
        }
        self.inner.save_draft(record).await
    }

    async fn begin(&self) -> RevisionResult<Box<dyn RevisionTransaction>> {
        Ok(Box::new(FlakyTransaction {
            inner: self.inner.begin().await?,
            state: self.state.clone(),
        }))
    }

    async fn find_version(&self, id: Uuid) -> RevisionResult<Option<VersionRecord>> {
        self.inner.find_version(id).await
    }

    async fn list_versions(
        &self,
        entry_id: Uuid,
        site_id: Uuid,
        offset: u32,
        limit: Option<u32>,
    ) -> RevisionResult<Vec<VersionRecord>> {
        self.inner
            .list_versions(entry_id, site_id, offset, limit)
            .await
    }

    async fn count_versions(&self, entry_id: Uuid, site_id: Uuid) -> RevisionResult<i64> {
        self.inner.count_versions(entry_id, site_id).await
    }

    async fn insert_version(&self, record: &VersionRecord) -> RevisionResult<bool> {
        self.inner.insert_version(record).await
    }
}

struct FlakyTransaction {
    inner: Box<dyn RevisionTransaction>,
    state: Arc<FlakyState>,
}

#[async_trait]
impl RevisionTransaction for FlakyTransaction {
    async fn delete_draft(&mut self, id: Uuid) -> RevisionResult<bool> {
        if self.state.fail_delete.load(Ordering::SeqCst) {
            return Err(injected("delete"));
        }
        self.inner.delete_draft(id).await
    }

    async fn commit(self: Box<Self>) -> RevisionResult<()> {
        if self.state.fail_commit.load(Ordering::SeqCst) {
            return Err(injected("commit"));
        }
        self.state.commits.fetch_add(1, Ordering::SeqCst);
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> RevisionResult<()> {
        self.state.rollbacks.fetch_add(1, Ordering::SeqCst);
        self.inner.rollback().await
    }
}

// ============================================================================
// Concurrent writers
// ============================================================================

/// Store whose version counts lag behind, as if another writer inserted a
/// version between the count and the insert.
pub struct RacingStore<S> {
    inner: S,
    stale_counts: AtomicU32,
}

impl<S: RevisionStore> RacingStore<S> {
    /// The next `stale_counts` version counts under-report by one.
    pub fn new(inner: S, stale_counts: u32) -> Self {
        Self {
            inner,
            stale_counts: AtomicU32::new(stale_counts),
        }
    }
}

#[async_trait]
impl<S: RevisionStore> RevisionStore for RacingStore<S> {
    async fn find_draft(&self, id: Uuid) -> RevisionResult<Option<DraftRecord>> {
        self.inner.find_draft(id).await
    }

    async fn list_drafts(&self, entry_id: Uuid, site_id: Uuid) -> RevisionResult<Vec<DraftRecord>> {
        self.inner.list_drafts(entry_id, site_id).await
    }

    async fn count_drafts(&self, entry_id: Uuid, site_id: Uuid) -> RevisionResult<i64> {
        self.inner.count_drafts(entry_id, site_id).await
    }

    async fn save_draft(&self, record: &DraftRecord) -> RevisionResult<bool> {
        self.inner.save_draft(record).await
    }

    async fn begin(&self) -> RevisionResult<Box<dyn RevisionTransaction>> {
        self.inner.begin().await
    }

    async fn find_version(&self, id: Uuid) -> RevisionResult<Option<VersionRecord>> {
        self.inner.find_version(id).await
    }

    async fn list_versions(
        &self,
        entry_id: Uuid,
        site_id: Uuid,
        offset: u32,
        limit: Option<u32>,
    ) -> RevisionResult<Vec<VersionRecord>> {
        self.inner
            .list_versions(entry_id, site_id, offset, limit)
            .await
    }

    async fn count_versions(&self, entry_id: Uuid, site_id: Uuid) -> RevisionResult<i64> {
        let count = self.inner.count_versions(entry_id, site_id).await?;
        let stale = self
            .stale_counts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if stale && count > 0 {
            return Ok(count - 1);
        }
        Ok(count)
    }

    async fn insert_version(&self, record: &VersionRecord) -> RevisionResult<bool> {
        self.inner.insert_version(record).await
    }
}
