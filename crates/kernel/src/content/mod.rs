//! Content module.
//!
//! This module provides:
//! - EntryStore: Contract for loading and saving live entries
//! - FieldRegistry: In-memory field catalog keyed by field ID
//! - RevisionService: Draft and version operations with tap invocations

mod entry_store;
mod field_registry;
mod revision_service;

pub use entry_store::EntryStore;
pub use field_registry::{FieldCatalog, FieldRegistry};
pub use revision_service::RevisionService;
