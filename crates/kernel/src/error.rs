//! Revision error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the revision service and its stores.
///
/// Vetoes and rejected records are not errors; those operations return
/// `Ok(false)`. Everything here is either a programmer error (a bad
/// identifier, a partially loaded snapshot) or an infrastructure failure.
#[derive(Debug, Error)]
pub enum RevisionError {
    #[error("no draft exists with the ID '{0}'")]
    DraftNotFound(Uuid),

    #[error("no section exists with the ID '{0}'")]
    SectionNotFound(Uuid),

    /// A snapshot loaded through a list query has no field values; writing
    /// it back would erase them.
    #[error("{kind} '{id}' was loaded without field values")]
    FieldsNotLoaded { kind: &'static str, id: Uuid },

    /// Another writer took the version number first.
    #[error("version {num} already exists for entry '{entry_id}' on site '{site_id}'")]
    VersionConflict { entry_id: Uuid, site_id: Uuid, num: i32 },

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("revision payload error: {0}")]
    Payload(#[from] serde_json::Error),

    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

/// Result type alias using RevisionError.
pub type RevisionResult<T> = Result<T, RevisionError>;
