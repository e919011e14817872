//! Revision service with tap integration.
//!
//! Manages entry drafts (named, editable, many per entry and site) and
//! entry versions (immutable, numbered, one per entry save). Drafts are
//! published into the live entry; versions are reverted into it.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{EntryStore, FieldCatalog};
use crate::config::RevisionSettings;
use crate::error::{RevisionError, RevisionResult};
use crate::models::{
    DraftRecord, Entry, EntryDraft, EntryVersion, RevisionData, Section, VersionRecord,
    default_draft_name,
};
use crate::permissions::{PermissionOracle, edit_peer_drafts_permission};
use crate::store::{RevisionStore, RevisionTransaction};
use crate::tap::{PreCheck, TapDispatcher};

/// Service for draft and version operations.
///
/// Collaborators are injected so the service can run against PostgreSQL in
/// production and in-memory stores in tests. The permission oracle is
/// request-scoped; use [`RevisionService::with_permissions`] to rebind it.
#[derive(Clone)]
pub struct RevisionService {
    store: Arc<dyn RevisionStore>,
    entries: Arc<dyn EntryStore>,
    fields: Arc<dyn FieldCatalog>,
    permissions: Arc<dyn PermissionOracle>,
    taps: TapDispatcher,
    settings: RevisionSettings,
}

impl RevisionService {
    /// Create a new revision service.
    pub fn new(
        store: Arc<dyn RevisionStore>,
        entries: Arc<dyn EntryStore>,
        fields: Arc<dyn FieldCatalog>,
        permissions: Arc<dyn PermissionOracle>,
        taps: TapDispatcher,
        settings: RevisionSettings,
    ) -> Self {
        Self {
            store,
            entries,
            fields,
            permissions,
            taps,
            settings,
        }
    }

    /// Same collaborators, different acting user.
    pub fn with_permissions(&self, permissions: Arc<dyn PermissionOracle>) -> Self {
        Self {
            permissions,
            ..self.clone()
        }
    }

    /// Get the service settings.
    pub fn settings(&self) -> &RevisionSettings {
        &self.settings
    }

    /// Start an unsaved draft of an entry owned by the current user.
    ///
    /// Returns None if there is no authenticated user.
    pub fn new_draft(&self, entry: &Entry) -> Option<EntryDraft> {
        let user = self.permissions.current_user()?;
        Some(EntryDraft::from_entry(entry, user.id))
    }

    // ------------------------------------------------------------------
    // Drafts
    // ------------------------------------------------------------------

    /// Load a draft by ID, field values included.
    ///
    /// The parent entry's structure position is copied onto the draft:
    /// drafts don't store it, but publishing into a structured section
    /// needs the entry's level to pick the right URL format.
    pub async fn get_draft_by_id(&self, draft_id: Uuid) -> RevisionResult<Option<EntryDraft>> {
        let Some(record) = self.store.find_draft(draft_id).await? else {
            return Ok(None);
        };

        let data = RevisionData::decode(&record.data)?;
        let catalog = self.fields.all_fields().await?;
        let (entry_id, site_id) = (record.entry_id, record.site_id);
        let mut draft = EntryDraft::from_record(record, data, &catalog);

        match self.entries.get_entry_by_id(entry_id, site_id).await? {
            Some(entry) => draft.structure = entry.structure,
            None => warn!(draft_id = %draft_id, entry_id = %entry_id, "draft belongs to a missing entry"),
        }

        Ok(Some(draft))
    }

    /// List drafts of an entry ordered by name, without field values.
    pub async fn get_drafts_by_entry_id(
        &self,
        entry_id: Uuid,
        site_id: Option<Uuid>,
    ) -> RevisionResult<Vec<EntryDraft>> {
        let site_id = site_id.unwrap_or(self.settings.primary_site_id);
        let records = self.store.list_drafts(entry_id, site_id).await?;

        records
            .into_iter()
            .map(|record| {
                let data = RevisionData::decode_partial(&record.data)?;
                Ok(EntryDraft::from_record(record, data, &[]))
            })
            .collect()
    }

    /// List the drafts of an entry the current user may edit.
    ///
    /// That is their own drafts, or every draft if they may edit peer
    /// drafts in the draft's section. Empty without an authenticated user.
    pub async fn get_editable_drafts_by_entry_id(
        &self,
        entry_id: Uuid,
        site_id: Option<Uuid>,
    ) -> RevisionResult<Vec<EntryDraft>> {
        let Some(user_id) = self.permissions.current_user().map(|u| u.id) else {
            return Ok(Vec::new());
        };

        let drafts = self.get_drafts_by_entry_id(entry_id, site_id).await?;

        Ok(drafts
            .into_iter()
            .filter(|d| {
                d.creator_id == user_id
                    || self
                        .permissions
                        .user_can(&edit_peer_drafts_permission(d.section_id))
            })
            .collect())
    }

    /// Save a draft, naming it "Draft N" if it has no name.
    ///
    /// Returns Ok(false) if a tap aborted the save or the record was
    /// rejected. Fails with `DraftNotFound` if the draft has an ID that
    /// no longer exists.
    pub async fn save_draft(&self, draft: &mut EntryDraft) -> RevisionResult<bool> {
        ensure_draft_fields(draft)?;

        let is_new = draft.draft_id.is_none();

        if draft.is_unnamed() {
            let total = self
                .store
                .count_drafts(draft.entry_id, draft.site_id)
                .await?;
            draft.name = Some(default_draft_name(total + 1));
        }

        if self.taps.before_save_draft(draft, is_new).await.is_abort() {
            return Ok(false);
        }

        let catalog = self.fields.all_fields().await?;
        let mut record = self.draft_record(draft).await?;
        record.name = draft.display_name().to_string();
        record.notes = draft.content.notes().map(str::to_string);
        record.data = RevisionData::extract(&*draft, &catalog).encode()?;
        record.changed = chrono::Utc::now().timestamp();

        if !self.store.save_draft(&record).await? {
            warn!(entry_id = %draft.entry_id, name = %record.name, "draft record rejected");
            return Ok(false);
        }

        draft.draft_id = Some(record.id);
        info!(draft_id = %record.id, entry_id = %draft.entry_id, is_new = is_new, "draft saved");

        self.taps.after_save_draft(draft, is_new).await;

        Ok(true)
    }

    /// Publish a draft into its entry, then delete the draft.
    ///
    /// Returns Ok(false) if a tap aborted the publish or the entry store
    /// refused the entry; the draft is left in place in both cases. Once the
    /// entry is saved, errors from deleting the draft are returned, while a
    /// tap vetoing the deletion is only logged.
    pub async fn publish_draft(&self, draft: &mut EntryDraft) -> RevisionResult<bool> {
        ensure_draft_fields(draft)?;

        let section = self.section(draft.section_id).await?;
        if section.is_single() {
            draft.content.title = section.name;
        }

        if draft.content.notes().is_none() {
            draft.content.revision_notes =
                Some(format!("Published draft “{}”.", draft.display_name()));
        }

        if self.taps.before_publish_draft(draft).await.is_abort() {
            return Ok(false);
        }

        if !self.entries.save_entry(&*draft).await? {
            info!(entry_id = %draft.entry_id, "entry rejected draft content; draft kept");
            return Ok(false);
        }

        if draft.draft_id.is_some() && !self.delete_draft(draft).await? {
            warn!(
                draft_id = ?draft.draft_id,
                entry_id = %draft.entry_id,
                "draft published but not deleted"
            );
        }

        info!(entry_id = %draft.entry_id, name = %draft.display_name(), "draft published");

        self.taps.after_publish_draft(draft).await;

        Ok(true)
    }

    /// Delete a draft inside a transaction.
    ///
    /// A tap veto returns Ok(false) and still commits the transaction.
    /// Any error rolls the transaction back and is returned.
    pub async fn delete_draft(&self, draft: &EntryDraft) -> RevisionResult<bool> {
        let Some(draft_id) = draft.draft_id else {
            warn!(entry_id = %draft.entry_id, "cannot delete a draft that was never saved");
            return Ok(false);
        };

        let mut tx = self.store.begin().await?;

        let result = self.delete_draft_in(tx.as_mut(), draft, draft_id).await;

        let success = match result {
            Ok(success) => {
                tx.commit().await?;
                success
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(draft_id = %draft_id, error = %rollback, "rollback failed");
                }
                return Err(e);
            }
        };

        if success {
            info!(draft_id = %draft_id, entry_id = %draft.entry_id, "draft deleted");
            self.taps.after_delete_draft(draft).await;
        }

        Ok(success)
    }

    async fn delete_draft_in(
        &self,
        tx: &mut dyn RevisionTransaction,
        draft: &EntryDraft,
        draft_id: Uuid,
    ) -> RevisionResult<bool> {
        if let PreCheck::Abort(reason) = self.taps.before_delete_draft(draft).await {
            debug!(draft_id = %draft_id, reason = %reason, "draft deletion vetoed");
            return Ok(false);
        }

        if !tx.delete_draft(draft_id).await? {
            return Err(RevisionError::DraftNotFound(draft_id));
        }

        Ok(true)
    }

    // ------------------------------------------------------------------
    // Versions
    // ------------------------------------------------------------------

    /// Load a version by ID, field values included.
    pub async fn get_version_by_id(&self, version_id: Uuid) -> RevisionResult<Option<EntryVersion>> {
        let Some(record) = self.store.find_version(version_id).await? else {
            return Ok(None);
        };

        let data = RevisionData::decode(&record.data)?;
        let catalog = self.fields.all_fields().await?;

        Ok(Some(EntryVersion::from_record(record, data, &catalog)))
    }

    /// List versions of an entry newest first, without field values.
    ///
    /// Unless `include_current` is set, the newest version is skipped: it
    /// mirrors the live entry.
    pub async fn get_versions_by_entry_id(
        &self,
        entry_id: Uuid,
        site_id: Option<Uuid>,
        limit: Option<u32>,
        include_current: bool,
    ) -> RevisionResult<Vec<EntryVersion>> {
        let site_id = site_id.unwrap_or(self.settings.primary_site_id);
        let offset = if include_current { 0 } else { 1 };
        let records = self
            .store
            .list_versions(entry_id, site_id, offset, limit)
            .await?;

        records
            .into_iter()
            .map(|record| {
                let data = RevisionData::decode_partial(&record.data)?;
                Ok(EntryVersion::from_record(record, data, &[]))
            })
            .collect()
    }

    /// Record a new version of an entry.
    ///
    /// Called when the entry is saved; no taps run. The version number is
    /// one more than the number of existing versions, recounted and retried
    /// if another writer claims it first.
    pub async fn save_version(&self, entry: &Entry) -> RevisionResult<bool> {
        let catalog = self.fields.all_fields().await?;
        let data = RevisionData::extract(entry, &catalog).encode()?;
        let creator_id = self
            .permissions
            .current_user()
            .map(|u| u.id)
            .or(entry.content.author_id);

        let attempts = self.settings.version_number_attempts.max(1);
        let mut attempt = 1;

        loop {
            let total = self.store.count_versions(entry.id, entry.site_id).await?;
            let num = i32::try_from(total + 1)
                .map_err(|_| anyhow::anyhow!("version number overflow for entry {}", entry.id))?;
            let record = VersionRecord::new(entry, creator_id, num, data.clone());

            match self.store.insert_version(&record).await {
                Ok(saved) => {
                    if saved {
                        info!(version_id = %record.id, entry_id = %entry.id, num = num, "version saved");
                    } else {
                        warn!(entry_id = %entry.id, num = num, "version record rejected");
                    }
                    return Ok(saved);
                }
                Err(RevisionError::VersionConflict { .. }) if attempt < attempts => {
                    warn!(entry_id = %entry.id, num = num, attempt = attempt, "version number taken, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Revert an entry to a version by saving the version's content.
    ///
    /// There is no pre tap: reverts cannot be vetoed.
    pub async fn revert_entry_to_version(&self, version: &mut EntryVersion) -> RevisionResult<bool> {
        if !version.fields_loaded {
            return Err(RevisionError::FieldsNotLoaded {
                kind: "version",
                id: version.version_id,
            });
        }

        let section = self.section(version.section_id).await?;
        if section.is_single() {
            version.content.title = section.name;
        }

        version.content.revision_notes = Some(format!("Reverted version {}.", version.num));

        if !self.entries.save_entry(&*version).await? {
            info!(entry_id = %version.entry_id, num = version.num, "entry rejected version content");
            return Ok(false);
        }

        info!(entry_id = %version.entry_id, num = version.num, "entry reverted");

        self.taps.after_revert_entry_to_version(version).await;

        Ok(true)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Load the stored record behind a draft, or start a new one.
    async fn draft_record(&self, draft: &EntryDraft) -> RevisionResult<DraftRecord> {
        match draft.draft_id {
            Some(id) => self
                .store
                .find_draft(id)
                .await?
                .ok_or(RevisionError::DraftNotFound(id)),
            None => Ok(DraftRecord::for_draft(draft)),
        }
    }

    async fn section(&self, section_id: Uuid) -> RevisionResult<Section> {
        self.entries
            .get_section_by_id(section_id)
            .await?
            .ok_or(RevisionError::SectionNotFound(section_id))
    }
}

fn ensure_draft_fields(draft: &EntryDraft) -> RevisionResult<()> {
    if draft.fields_loaded {
        return Ok(());
    }
    Err(RevisionError::FieldsNotLoaded {
        kind: "draft",
        id: draft.draft_id.unwrap_or(draft.entry_id),
    })
}
