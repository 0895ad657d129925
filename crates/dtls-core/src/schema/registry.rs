//! Version to handler lookup.
//!
//! [`Registry::new`] starts with the built-in Draft and 2025.10 handlers.
//! Registering a handler for a version that already has one replaces it.
//!
//! A process-wide instance is available through [`default_registry`]. Nothing
//! in detection, validation, parsing or resolution consults it; it exists for
//! callers that want pluggable formatting and validation hooks.
//!
//! ```rust
//! use dtls_core::schema::{default_registry, Feature};
//! use dtls_core::SchemaVersion;
//!
//! let handler = default_registry().get(SchemaVersion::V2025_10).unwrap();
//! assert!(handler.supports(Feature::Extends));
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;

use super::handler::{DraftHandler, SchemaHandler, V2025_10Handler};
use super::version::SchemaVersion;
use crate::error::{Error, Result};

static DEFAULT_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// The process-wide registry.
pub fn default_registry() -> &'static Registry {
    &DEFAULT_REGISTRY
}

/// Thread-safe map from schema version to handler.
pub struct Registry {
    handlers: RwLock<HashMap<SchemaVersion, Arc<dyn SchemaHandler>>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates a registry holding the built-in handlers.
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.register(DraftHandler);
        registry.register(V2025_10Handler);
        registry
    }

    /// Creates a registry with no handlers.
    pub fn empty() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Registers `handler` under its own version, replacing any previous one.
    pub fn register(&self, handler: impl SchemaHandler + 'static) {
        self.register_arc(Arc::new(handler));
    }

    pub fn register_arc(&self, handler: Arc<dyn SchemaHandler>) {
        let version = handler.version();
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(version, handler);
        tracing::debug!(%version, "schema handler registered");
    }

    /// Returns the handler for `version`.
    pub fn get(&self, version: SchemaVersion) -> Result<Arc<dyn SchemaHandler>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&version)
            .cloned()
            .ok_or(Error::NoHandler { version })
    }

    /// Registered versions in ascending order.
    pub fn versions(&self) -> Vec<SchemaVersion> {
        let mut versions: Vec<_> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        versions.sort();
        versions
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("versions", &self.versions())
            .finish()
    }
}
