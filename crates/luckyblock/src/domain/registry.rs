//! Type name → handler mapping owned by a generator

use super::transaction::TransactionHandler;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Explicit registry of transaction handlers keyed by type name.
///
/// Each generator owns its registry, so several nodes with different handler
/// sets can live in one process.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn TransactionHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its own type name, replacing any previous one.
    pub fn register(&mut self, handler: Arc<dyn TransactionHandler>) {
        self.handlers
            .insert(handler.type_name().to_string(), handler);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, handler: Arc<dyn TransactionHandler>) -> Self {
        self.register(handler);
        self
    }

    pub fn get(&self, type_name: &str) -> Option<&Arc<dyn TransactionHandler>> {
        self.handlers.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.handlers.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.handlers.keys().collect();
        types.sort();
        f.debug_struct("HandlerRegistry")
            .field("types", &types)
            .finish()
    }
}
