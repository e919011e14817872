//! Field catalog contract and an in-memory registry.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::Field;

/// Enumerates the fields known to the CMS.
#[async_trait]
pub trait FieldCatalog: Send + Sync {
    /// All fields, in a stable order.
    async fn all_fields(&self) -> Result<Vec<Field>>;
}

/// Registry of fields held in memory.
///
/// Fields are keyed by ID, so renaming a handle keeps every stored snapshot
/// that references the field readable.
#[derive(Clone, Default)]
pub struct FieldRegistry {
    inner: Arc<FieldRegistryInner>,
}

#[derive(Default)]
struct FieldRegistryInner {
    fields: DashMap<Uuid, Field>,
}

impl FieldRegistry {
    /// Create an empty field registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from a list of fields.
    pub fn with_fields(fields: impl IntoIterator<Item = Field>) -> Self {
        let registry = Self::new();
        for field in fields {
            registry.register(field);
        }
        registry
    }

    /// Register a field, replacing any field with the same ID.
    pub fn register(&self, field: Field) {
        debug!(field_id = %field.id, handle = %field.handle, "registered field");
        self.inner.fields.insert(field.id, field);
    }

    /// Rename a field's handle. Returns false if the field is unknown.
    pub fn rename(&self, id: Uuid, handle: impl Into<String>) -> bool {
        let Some(mut field) = self.inner.fields.get_mut(&id) else {
            warn!(field_id = %id, "rename of unknown field");
            return false;
        };
        field.handle = handle.into();
        true
    }

    /// Remove a field. Returns the removed field if it existed.
    pub fn remove(&self, id: Uuid) -> Option<Field> {
        self.inner.fields.remove(&id).map(|(_, f)| f)
    }

    /// Look up a field by handle.
    pub fn get_by_handle(&self, handle: &str) -> Option<Field> {
        self.inner
            .fields
            .iter()
            .find(|f| f.handle == handle)
            .map(|f| f.value().clone())
    }

    /// Get the number of registered fields.
    pub fn len(&self) -> usize {
        self.inner.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.fields.is_empty()
    }
}

#[async_trait]
impl FieldCatalog for FieldRegistry {
    async fn all_fields(&self) -> Result<Vec<Field>> {
        let mut fields: Vec<Field> = self
            .inner
            .fields
            .iter()
            .map(|f| f.value().clone())
            .collect();
        fields.sort_by(|a, b| a.handle.cmp(&b.handle));
        Ok(fields)
    }
}
