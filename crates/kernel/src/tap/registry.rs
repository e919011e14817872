//! Tap registry - holds revision tap handlers in weight order.
//!
//! Handlers are sorted by weight (lower = higher priority, called first).
//! Handlers with equal weight keep their registration order.

use std::sync::Arc;

use super::RevisionTap;

/// A registered tap handler with priority.
#[derive(Clone)]
pub struct TapHandler {
    /// The handler implementation.
    pub tap: Arc<dyn RevisionTap>,
    /// Weight for ordering (lower = higher priority).
    pub weight: i32,
}

impl std::fmt::Debug for TapHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TapHandler")
            .field("name", &self.tap.name())
            .field("weight", &self.weight)
            .finish()
    }
}

/// Registry of revision tap handlers.
#[derive(Debug, Default)]
pub struct TapRegistry {
    handlers: Vec<TapHandler>,
}

impl TapRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler at the weight it declares.
    pub fn register(&mut self, tap: Arc<dyn RevisionTap>) {
        let weight = tap.weight();
        self.register_with_weight(tap, weight);
    }

    /// Register a handler at an explicit weight.
    pub fn register_with_weight(&mut self, tap: Arc<dyn RevisionTap>, weight: i32) {
        self.handlers.push(TapHandler { tap, weight });
        // Stable sort keeps registration order for equal weights
        self.handlers.sort_by_key(|h| h.weight);
    }

    /// Get handlers in weight order.
    pub fn handlers(&self) -> &[TapHandler] {
        &self.handlers
    }

    /// Get all handler names in weight order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.iter().map(|h| h.tap.name())
    }

    /// Get the number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
