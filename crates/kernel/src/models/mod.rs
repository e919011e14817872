//! Revision models.

pub mod draft;
pub mod entry;
pub mod revision_data;
pub mod version;

pub use draft::{DraftRecord, EntryDraft, default_draft_name};
pub use entry::{EditableEntry, Entry, EntryContent, Field, Section, SectionKind, StructurePosition};
pub use revision_data::RevisionData;
pub use version::{EntryVersion, VersionRecord};
