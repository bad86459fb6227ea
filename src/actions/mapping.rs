//! Button index -> action token mapping
//!
//! The mapping is read on every rising edge and replaced only when the
//! configuration reloads. Readers take an `Arc` snapshot and release the
//! lock immediately; a reload installs a whole new snapshot, so a reader
//! never sees a half-updated mapping.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Immutable mapping from button index to its ordered action tokens
pub type ButtonMapping = HashMap<usize, Vec<String>>;

/// Shared, swappable handle to the current [`ButtonMapping`]
#[derive(Debug, Clone, Default)]
pub struct ButtonMap {
    current: Arc<RwLock<Arc<ButtonMapping>>>,
}

impl ButtonMap {
    /// Create a handle holding `mapping`
    pub fn new(mapping: ButtonMapping) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(mapping))),
        }
    }

    /// Take a reference to the mapping in effect right now
    pub fn snapshot(&self) -> Arc<ButtonMapping> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Tokens configured for one button, cloned out of the current snapshot
    pub fn get(&self, button_id: usize) -> Option<Vec<String>> {
        self.snapshot().get(&button_id).cloned()
    }

    /// Replace the mapping wholesale
    pub fn install(&self, mapping: ButtonMapping) {
        let mapping = Arc::new(mapping);
        tracing::debug!("Installing button mapping: {}", summary(&mapping));
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = mapping;
    }
}

impl std::fmt::Display for ButtonMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", summary(&self.snapshot()))
    }
}

fn summary(mapping: &ButtonMapping) -> String {
    let targets: usize = mapping.values().map(Vec::len).sum();
    format!("<{} buttons mapped to {} targets>", mapping.len(), targets)
}
