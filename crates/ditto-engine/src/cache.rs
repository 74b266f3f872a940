//! Per-invocation reference cache
//!
//! Maps source composite identity to its already-built clone. Populated
//! before a strategy recurses into its target, so a self-reference
//! encountered mid-construction resolves to the in-progress clone instead
//! of recursing forever. Owned by exactly one invocation and discarded
//! with it.

use ditto_core::{ObjId, ObjRef, Value};
use rustc_hash::FxHashMap;

/// Identity map from source composite to clone, scoped to one call
#[derive(Debug, Default)]
pub struct RefCache {
    map: FxHashMap<ObjId, Value>,
}

impl RefCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// The clone previously registered for `source`, if any
    pub fn get(&self, source: &ObjRef) -> Option<Value> {
        self.map.get(&source.id()).cloned()
    }

    /// Register the clone for `source`
    pub fn insert(&mut self, source: &ObjRef, target: Value) {
        self.map.insert(source.id(), target);
    }

    /// Number of registered composites
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether nothing has been registered yet
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
