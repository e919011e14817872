//! CLI command implementations.
//!
//! These commands operate with a minimal context (database pool only) and
//! read stored rows directly, without an entry store or field catalog.

use anyhow::{Result, bail};
use chrono::DateTime;
use sqlx::PgPool;
use uuid::Uuid;

use revisio_kernel::db;
use revisio_kernel::models::RevisionData;
use revisio_kernel::store::{PgRevisionStore, RevisionStore};

/// Apply pending migrations.
pub async fn cmd_migrate(pool: &PgPool) -> Result<()> {
    db::run_migrations(pool).await?;
    println!("Migrations applied.");
    Ok(())
}

/// Report whether the database answers.
pub async fn cmd_health(pool: &PgPool) -> Result<()> {
    if !db::check_health(pool).await {
        bail!("database is not reachable");
    }
    println!("ok");
    Ok(())
}

/// List the drafts of an entry.
pub async fn cmd_drafts(pool: &PgPool, entry_id: Uuid, site_id: Uuid) -> Result<()> {
    let store = PgRevisionStore::new(pool.clone());
    let records = store.list_drafts(entry_id, site_id).await?;

    if records.is_empty() {
        println!("No drafts found.");
        return Ok(());
    }

    println!("{:<38} {:<30} {:<38} {:<20}", "DRAFT", "NAME", "CREATOR", "CHANGED");
    println!("{}", "-".repeat(126));

    for record in &records {
        // Only the title is needed; skip the field values
        let data = RevisionData::decode_partial(&record.data)?;
        println!(
            "{:<38} {:<30} {:<38} {:<20}",
            record.id,
            truncate(&record.name, 30),
            record.creator_id,
            format_timestamp(record.changed)
        );
        if !data.title.is_empty() {
            println!("  title: {}", data.title);
        }
    }

    Ok(())
}

/// List the versions of an entry, newest first.
pub async fn cmd_versions(
    pool: &PgPool,
    entry_id: Uuid,
    site_id: Uuid,
    limit: Option<u32>,
    include_current: bool,
) -> Result<()> {
    let store = PgRevisionStore::new(pool.clone());
    let offset = if include_current { 0 } else { 1 };
    let records = store
        .list_versions(entry_id, site_id, offset, limit)
        .await?;

    if records.is_empty() {
        println!("No versions found.");
        return Ok(());
    }

    println!("{:<6} {:<38} {:<20} {:<40}", "NUM", "CREATOR", "CREATED", "NOTES");
    println!("{}", "-".repeat(106));

    for record in &records {
        let creator = record
            .creator_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<6} {:<38} {:<20} {:<40}",
            record.num,
            creator,
            format_timestamp(record.created),
            truncate(record.notes.as_deref().unwrap_or(""), 40)
        );
    }

    Ok(())
}

fn format_timestamp(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
