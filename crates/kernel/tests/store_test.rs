//! Integration tests for the revision store backends.
//!
//! Every check runs against the in-memory store and, when `DATABASE_URL`
//! is set, against PostgreSQL, so both backends keep the same ordering,
//! paging, validation, uniqueness, and transaction behaviour.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use common::{Harness, RacingStore, pg_store};
use revisio_kernel::error::RevisionError;
use revisio_kernel::models::{DraftRecord, EntryDraft, VersionRecord};
use revisio_kernel::store::{MemoryRevisionStore, RevisionStore};
use uuid::Uuid;

fn draft_record(entry_id: Uuid, name: &str) -> DraftRecord {
    DraftRecord {
        id: Uuid::now_v7(),
        entry_id,
        section_id: Uuid::now_v7(),
        site_id: Uuid::nil(),
        creator_id: Uuid::now_v7(),
        name: name.to_string(),
        notes: None,
        data: "{}".to_string(),
        created: 1_700_000_000,
        changed: 1_700_000_000,
    }
}

fn version_record(entry_id: Uuid, num: i32) -> VersionRecord {
    VersionRecord {
        id: Uuid::now_v7(),
        entry_id,
        section_id: Uuid::now_v7(),
        site_id: Uuid::nil(),
        creator_id: None,
        num,
        notes: Some(format!("save {num}")),
        data: "{}".to_string(),
        created: 1_700_000_000 + i64::from(num),
    }
}

async fn nums(store: &dyn RevisionStore, entry_id: Uuid, offset: u32, limit: Option<u32>) -> Vec<i32> {
    store
        .list_versions(entry_id, Uuid::nil(), offset, limit)
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.num)
        .collect()
}

// ============================================================================
// Checks shared by both backends
// ============================================================================

async fn drafts_sort_by_name_bytewise(store: &dyn RevisionStore) {
    let entry_id = Uuid::now_v7();
    for name in ["beta", "Alpha", "alpha", "_draft", "Beta"] {
        assert!(store.save_draft(&draft_record(entry_id, name)).await.unwrap());
    }

    let names: Vec<String> = store
        .list_drafts(entry_id, Uuid::nil())
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.name)
        .collect();

    assert_eq!(names, vec!["Alpha", "Beta", "_draft", "alpha", "beta"]);
    assert_eq!(store.count_drafts(entry_id, Uuid::nil()).await.unwrap(), 5);
}

async fn draft_save_updates_existing_row(store: &dyn RevisionStore) {
    let entry_id = Uuid::now_v7();
    let mut record = draft_record(entry_id, "Draft 1");
    assert!(store.save_draft(&record).await.unwrap());

    record.name = "Spring copy".to_string();
    record.notes = Some("second pass".to_string());
    record.changed += 60;
    assert!(store.save_draft(&record).await.unwrap());

    let stored = store.find_draft(record.id).await.unwrap().unwrap();
    assert_eq!(stored, record);
    assert_eq!(store.count_drafts(entry_id, Uuid::nil()).await.unwrap(), 1);
}

async fn invalid_draft_is_not_saved(store: &dyn RevisionStore) {
    let entry_id = Uuid::now_v7();
    let empty = draft_record(entry_id, "");
    let overlong = draft_record(entry_id, &"x".repeat(256));

    assert!(!store.save_draft(&empty).await.unwrap());
    assert!(!store.save_draft(&overlong).await.unwrap());
    assert!(store.find_draft(empty.id).await.unwrap().is_none());
    assert_eq!(store.count_drafts(entry_id, Uuid::nil()).await.unwrap(), 0);
}

async fn versions_page_newest_first(store: &dyn RevisionStore) {
    let entry_id = Uuid::now_v7();
    for num in 1..=4 {
        assert!(store.insert_version(&version_record(entry_id, num)).await.unwrap());
    }

    assert_eq!(nums(store, entry_id, 0, None).await, vec![4, 3, 2, 1]);
    assert_eq!(nums(store, entry_id, 1, None).await, vec![3, 2, 1]);
    assert_eq!(nums(store, entry_id, 1, Some(2)).await, vec![3, 2]);
    assert!(nums(store, entry_id, 0, Some(0)).await.is_empty());
    assert!(nums(store, entry_id, 9, None).await.is_empty());
    assert_eq!(store.count_versions(entry_id, Uuid::nil()).await.unwrap(), 4);
}

async fn version_reads_back_unchanged(store: &dyn RevisionStore) {
    let record = version_record(Uuid::now_v7(), 1);
    store.insert_version(&record).await.unwrap();

    assert_eq!(store.find_version(record.id).await.unwrap(), Some(record));
    assert!(store.find_version(Uuid::now_v7()).await.unwrap().is_none());
}

async fn duplicate_version_number_conflicts(store: &dyn RevisionStore) {
    let entry_id = Uuid::now_v7();
    store.insert_version(&version_record(entry_id, 1)).await.unwrap();

    let err = store
        .insert_version(&version_record(entry_id, 1))
        .await
        .unwrap_err();
    assert!(
        matches!(err, RevisionError::VersionConflict { entry_id: id, num: 1, .. } if id == entry_id)
    );
    assert_eq!(store.count_versions(entry_id, Uuid::nil()).await.unwrap(), 1);

    // Numbers are only unique per entry and site
    let mut other_site = version_record(entry_id, 1);
    other_site.site_id = Uuid::now_v7();
    assert!(store.insert_version(&other_site).await.unwrap());
    assert!(store.insert_version(&version_record(Uuid::now_v7(), 1)).await.unwrap());
}

async fn draft_delete_is_transactional(store: &dyn RevisionStore) {
    let record = draft_record(Uuid::now_v7(), "Draft 1");
    store.save_draft(&record).await.unwrap();

    let mut tx = store.begin().await.unwrap();
    assert!(tx.delete_draft(record.id).await.unwrap());
    tx.rollback().await.unwrap();
    assert!(store.find_draft(record.id).await.unwrap().is_some());

    let mut tx = store.begin().await.unwrap();
    assert!(!tx.delete_draft(Uuid::now_v7()).await.unwrap());
    assert!(tx.delete_draft(record.id).await.unwrap());
    tx.commit().await.unwrap();
    assert!(store.find_draft(record.id).await.unwrap().is_none());
}

/// Generate one test per check for each backend.
macro_rules! store_tests {
    ($($check:ident),* $(,)?) => {
        mod memory {
            use super::*;

            $(
                #[tokio::test]
                async fn $check() {
                    super::$check(&MemoryRevisionStore::new()).await;
                }
            )*
        }

        mod postgres {
            use super::*;

            $(
                #[tokio::test]
                async fn $check() {
                    let Some(store) = pg_store().await else {
                        return;
                    };
                    super::$check(&store).await;
                }
            )*
        }
    };
}

store_tests!(
    drafts_sort_by_name_bytewise,
    draft_save_updates_existing_row,
    invalid_draft_is_not_saved,
    versions_page_newest_first,
    version_reads_back_unchanged,
    duplicate_version_number_conflicts,
    draft_delete_is_transactional,
);

// ============================================================================
// Revision service over PostgreSQL
// ============================================================================

#[tokio::test]
async fn postgres_service_numbers_versions() {
    let Some(store) = pg_store().await else {
        return;
    };
    let h = Harness::with_store(|_| Arc::new(store.clone()) as Arc<dyn RevisionStore>);
    let entry = h.entry("Launch");

    h.service.save_version(&entry).await.unwrap();
    h.service.save_version(&entry).await.unwrap();

    let versions = h
        .service
        .get_versions_by_entry_id(entry.id, None, None, true)
        .await
        .unwrap();
    let nums: Vec<i32> = versions.iter().map(|v| v.num).collect();
    assert_eq!(nums, vec![2, 1]);
    assert!(!versions[0].fields_loaded);

    let full = h
        .service
        .get_version_by_id(versions[0].version_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(full.content.fields["body"], "Launch body");
}

#[tokio::test]
async fn postgres_lost_number_race_is_retried() {
    let Some(store) = pg_store().await else {
        return;
    };
    let h = Harness::with_store(|_| {
        Arc::new(RacingStore::new(store.clone(), 1)) as Arc<dyn RevisionStore>
    });
    let entry = h.entry("Launch");
    store
        .insert_version(&VersionRecord::new(&entry, None, 1, "{}".to_string()))
        .await
        .unwrap();

    assert!(h.service.save_version(&entry).await.unwrap());
    assert_eq!(store.count_versions(entry.id, entry.site_id).await.unwrap(), 2);
}

#[tokio::test]
async fn postgres_publish_deletes_the_draft() {
    let Some(store) = pg_store().await else {
        return;
    };
    let h = Harness::with_store(|_| Arc::new(store.clone()) as Arc<dyn RevisionStore>);
    let entry = h.entry("Launch");

    let mut draft = EntryDraft::from_entry(&entry, h.user.id);
    assert!(h.service.save_draft(&mut draft).await.unwrap());
    assert_eq!(draft.name.as_deref(), Some("Draft 1"));

    assert!(h.service.publish_draft(&mut draft).await.unwrap());
    assert!(store.find_draft(draft.draft_id.unwrap()).await.unwrap().is_none());
    assert_eq!(h.entries.saved().len(), 1);
}
