//! PostgreSQL revision store.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use super::{RevisionStore, RevisionTransaction};
use crate::error::{RevisionError, RevisionResult};
use crate::models::{DraftRecord, VersionRecord};

const DRAFT_COLUMNS: &str =
    "id, entry_id, section_id, site_id, creator_id, name, notes, data, created, changed";

const VERSION_COLUMNS: &str =
    "id, entry_id, section_id, site_id, creator_id, num, notes, data, created";

/// Unique constraint on (entry_id, site_id, num).
const VERSION_NUM_CONSTRAINT: &str = "entryversions_entry_site_num";

/// Revision store backed by the `entrydrafts` and `entryversions` tables.
#[derive(Clone)]
pub struct PgRevisionStore {
    pool: PgPool,
}

impl PgRevisionStore {
    /// Create a new PostgreSQL revision store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RevisionStore for PgRevisionStore {
    async fn find_draft(&self, id: Uuid) -> RevisionResult<Option<DraftRecord>> {
        let record = sqlx::query_as::<_, DraftRecord>(&format!(
            "SELECT {DRAFT_COLUMNS} FROM entrydrafts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list_drafts(&self, entry_id: Uuid, site_id: Uuid) -> RevisionResult<Vec<DraftRecord>> {
        let records = sqlx::query_as::<_, DraftRecord>(&format!(
            r#"SELECT {DRAFT_COLUMNS} FROM entrydrafts WHERE entry_id = $1 AND site_id = $2 ORDER BY name COLLATE "C" ASC, id ASC"#
        ))
        .bind(entry_id)
        .bind(site_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn count_drafts(&self, entry_id: Uuid, site_id: Uuid) -> RevisionResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM entrydrafts WHERE entry_id = $1 AND site_id = $2",
        )
        .bind(entry_id)
        .bind(site_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn save_draft(&self, record: &DraftRecord) -> RevisionResult<bool> {
        if !record.is_valid() {
            debug!(draft_id = %record.id, "draft record rejected");
            return Ok(false);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO entrydrafts (id, entry_id, section_id, site_id, creator_id, name, notes, data, created, changed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                notes = EXCLUDED.notes,
                data = EXCLUDED.data,
                changed = EXCLUDED.changed
            "#,
        )
        .bind(record.id)
        .bind(record.entry_id)
        .bind(record.section_id)
        .bind(record.site_id)
        .bind(record.creator_id)
        .bind(&record.name)
        .bind(&record.notes)
        .bind(&record.data)
        .bind(record.created)
        .bind(record.changed)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn begin(&self) -> RevisionResult<Box<dyn RevisionTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgRevisionTransaction { tx }))
    }

    async fn find_version(&self, id: Uuid) -> RevisionResult<Option<VersionRecord>> {
        let record = sqlx::query_as::<_, VersionRecord>(&format!(
            "SELECT {VERSION_COLUMNS} FROM entryversions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list_versions(
        &self,
        entry_id: Uuid,
        site_id: Uuid,
        offset: u32,
        limit: Option<u32>,
    ) -> RevisionResult<Vec<VersionRecord>> {
        // LIMIT NULL is no limit in PostgreSQL
        let records = sqlx::query_as::<_, VersionRecord>(&format!(
            "SELECT {VERSION_COLUMNS} FROM entryversions WHERE entry_id = $1 AND site_id = $2 ORDER BY num DESC LIMIT $3 OFFSET $4"
        ))
        .bind(entry_id)
        .bind(site_id)
        .bind(limit.map(i64::from))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn count_versions(&self, entry_id: Uuid, site_id: Uuid) -> RevisionResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM entryversions WHERE entry_id = $1 AND site_id = $2",
        )
        .bind(entry_id)
        .bind(site_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn insert_version(&self, record: &VersionRecord) -> RevisionResult<bool> {
        if !record.is_valid() {
            debug!(version_id = %record.id, num = record.num, "version record rejected");
            return Ok(false);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO entryversions (id, entry_id, section_id, site_id, creator_id, num, notes, data, created)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.id)
        .bind(record.entry_id)
        .bind(record.section_id)
        .bind(record.site_id)
        .bind(record.creator_id)
        .bind(record.num)
        .bind(&record.notes)
        .bind(&record.data)
        .bind(record.created)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.rows_affected() > 0),
            Err(sqlx::Error::Database(db)) if db.constraint() == Some(VERSION_NUM_CONSTRAINT) => {
                Err(RevisionError::VersionConflict {
                    entry_id: record.entry_id,
                    site_id: record.site_id,
                    num: record.num,
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Transaction on the PostgreSQL revision store.
struct PgRevisionTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl RevisionTransaction for PgRevisionTransaction {
    async fn delete_draft(&mut self, id: Uuid) -> RevisionResult<bool> {
        let result = sqlx::query("DELETE FROM entrydrafts WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> RevisionResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> RevisionResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
