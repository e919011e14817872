//! Revisio Kernel Library
//!
//! Entry drafts and versions for a content management system. The
//! `revisio` binary wraps the PostgreSQL store for maintenance tasks.

pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod models;
pub mod permissions;
pub mod store;
pub mod tap;

pub use config::{Config, RevisionSettings};
pub use content::{EntryStore, FieldCatalog, FieldRegistry, RevisionService};
pub use error::{RevisionError, RevisionResult};
pub use permissions::{PermissionOracle, SessionPermissions, UserContext};
pub use store::{MemoryRevisionStore, PgRevisionStore, RevisionStore, RevisionTransaction};
pub use tap::{PreCheck, RevisionTap, TapDispatcher, TapRegistry};
