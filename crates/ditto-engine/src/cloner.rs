//! Clone orchestrator
//!
//! The public entry point tying cache, hook, classifier and strategies into
//! one recursive walk. Never raises on well-formed input: composites the
//! engine cannot faithfully reconstruct pass through unchanged.

use ditto_core::{clone_hook, NativeFn, ObjRef, PropKey, Property, Value};

use crate::cache::RefCache;
use crate::kind::classify;
use crate::options::CloneOptions;
use crate::strategy;

/// One clone invocation: a private reference cache plus options
///
/// Exclusively owned by a single top-level call; no state survives it.
pub struct Cloner {
    cache: RefCache,
    options: CloneOptions,
}

impl Cloner {
    /// Create a fresh invocation context
    pub fn new(options: CloneOptions) -> Self {
        Self {
            cache: RefCache::new(),
            options,
        }
    }

    /// The invocation's options
    pub fn options(&self) -> &CloneOptions {
        &self.options
    }

    /// The recursive walk
    ///
    /// 1. Primitives are returned as-is.
    /// 2. A cached source resolves to its registered clone (cycle and
    ///    aliasing termination).
    /// 3. A custom-clone hook, if exposed, fully supersedes the registry;
    ///    its result is returned verbatim and cached, so aliases reuse it
    ///    instead of invoking the hook again.
    /// 4. Otherwise the composite is classified and dispatched to its
    ///    kind's strategy.
    pub fn walk(&mut self, value: &Value) -> Value {
        let source = match value {
            Value::Object(source) => source,
            _ => return value.clone(),
        };
        if let Some(hit) = self.cache.get(source) {
            return hit;
        }
        if let Some(hook) = find_clone_hook(source) {
            let result = hook.call(Value::Object(source.clone()), &[]);
            self.cache.insert(source, result.clone());
            return result;
        }
        let reconstruct = strategy::lookup(classify(source));
        reconstruct(source, self)
    }

    /// Register a freshly constructed clone for `source`
    ///
    /// Strategies call this before recursing into the target's contents.
    pub(crate) fn cache_insert(&mut self, source: &ObjRef, target: Value) {
        self.cache.insert(source, target);
    }
}

/// The composite's custom-clone operation, if it exposes one
///
/// A function-valued data property under the well-known [`clone_hook`]
/// symbol, on the composite itself or anywhere up its proto chain. Getters
/// are never consulted.
fn find_clone_hook(source: &ObjRef) -> Option<NativeFn> {
    let key = PropKey::Symbol(clone_hook());
    match source.lookup(&key) {
        Some(Property::Data {
            value: Value::Function(hook),
            ..
        }) => Some(hook),
        _ => None,
    }
}

/// Structurally duplicate a value graph
///
/// Returns a copy that is structurally equivalent to the source while
/// preserving its reference-identity topology: shared substructures stay
/// shared, cycles stay cyclic, and nothing mutable in the copy aliases the
/// source. Primitives come back as-is.
pub fn clone(value: &Value) -> Value {
    clone_with(value, CloneOptions::default())
}

/// [`clone`] with explicit options
pub fn clone_with(value: &Value, options: CloneOptions) -> Value {
    Cloner::new(options).walk(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_passthrough() {
        assert!(clone(&Value::Null).same_value(&Value::Null));
        assert!(clone(&Value::Undefined).same_value(&Value::Undefined));
        let s = Value::text("unchanged");
        assert!(clone(&s).same_value(&s));
        let f = Value::function(|_, _| Value::Null);
        assert!(clone(&f).same_value(&f));
    }

    #[test]
    fn test_composites_get_fresh_identity() {
        let source = ObjRef::plain();
        match clone(&Value::from(&source)) {
            Value::Object(copy) => assert!(!copy.ptr_eq(&source)),
            other => panic!("expected composite, got {:?}", other),
        }
    }

    #[test]
    fn test_hook_found_through_proto() {
        let proto = ObjRef::plain();
        proto.set(
            clone_hook(),
            Value::function(|_, _| Value::text("hooked")),
        );
        let instance = ObjRef::plain_with_proto(Some(proto));
        assert!(find_clone_hook(&instance).is_some());
        assert!(find_clone_hook(&ObjRef::plain()).is_none());
    }
}
