//! Strategy registry: kind-tag → reconstruction rule
//!
//! The registry is process-wide read-only configuration, built once at
//! first use. Each strategy reconstructs one composite kind, registering
//! its (possibly still-empty) target in the invocation's reference cache
//! *before* recursing into the target's contents — the sole cycle-breaking
//! mechanism. A composite that cannot be faithfully reconstructed is
//! returned unchanged, never an error.

use ditto_core::{ArrayStorage, ObjRef, Payload, PromiseState, Value, ViewObject};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::cloner::Cloner;
use crate::kind::Kind;
use crate::mirror::mirror;
use crate::options::KeyPolicy;

/// A kind-specific reconstruction rule
pub type StrategyFn = fn(&ObjRef, &mut Cloner) -> Value;

static REGISTRY: Lazy<FxHashMap<Kind, StrategyFn>> = Lazy::new(|| {
    let mut table: FxHashMap<Kind, StrategyFn> = FxHashMap::default();
    table.insert(Kind::Array, clone_array as StrategyFn);
    table.insert(Kind::Map, clone_map as StrategyFn);
    table.insert(Kind::Set, clone_set as StrategyFn);
    table.insert(Kind::Boxed, clone_boxed as StrategyFn);
    table.insert(Kind::Date, clone_date as StrategyFn);
    table.insert(Kind::RegExp, clone_regexp as StrategyFn);
    table.insert(Kind::Buffer, clone_buffer as StrategyFn);
    table.insert(Kind::View, clone_view as StrategyFn);
    table.insert(Kind::TypedArray, clone_typed_array as StrategyFn);
    table.insert(Kind::Error, clone_error as StrategyFn);
    table.insert(Kind::Promise, clone_promise as StrategyFn);
    table.insert(Kind::WeakMap, pass_through as StrategyFn);
    table.insert(Kind::WeakSet, pass_through as StrategyFn);
    table.insert(Kind::Plain, clone_plain as StrategyFn);
    table
});

/// The strategy for `kind`; unknown kinds fall back to the generic rule
pub fn lookup(kind: Kind) -> StrategyFn {
    REGISTRY.get(&kind).copied().unwrap_or(clone_plain)
}

/// Ordered collection: new collection of equal length
///
/// Dense with no extra properties: straight element loop. Otherwise the
/// holes are reproduced and the mirror carries the extra properties.
fn clone_array(source: &ObjRef, cloner: &mut Cloner) -> Value {
    let (len, dense, bare) = {
        let cell = source.borrow();
        match &cell.payload {
            Payload::Array(a) => (a.len(), a.is_dense(), cell.props.is_empty()),
            _ => return Value::Object(source.clone()),
        }
    };
    let target = ObjRef::array(ArrayStorage::with_len(len));
    cloner.cache_insert(source, Value::from(&target));
    for i in 0..len {
        let slot = match &source.borrow().payload {
            Payload::Array(a) => a.get(i).cloned(),
            _ => None,
        };
        if let Some(element) = slot {
            let cloned = cloner.walk(&element);
            if let Payload::Array(a) = &mut target.borrow_mut().payload {
                a.set(i, cloned);
            }
        }
    }
    if !(dense && bare) {
        mirror(source, &target, cloner);
    }
    Value::Object(target)
}

/// Associative map: new empty map cached immediately, values cloned, keys
/// per the invocation's key policy
fn clone_map(source: &ObjRef, cloner: &mut Cloner) -> Value {
    let entries: Vec<(Value, Value)> = match &source.borrow().payload {
        Payload::Map(m) => m.entries().cloned().collect(),
        _ => return Value::Object(source.clone()),
    };
    let target = ObjRef::new_map();
    cloner.cache_insert(source, Value::from(&target));
    for (key, value) in entries {
        let key = match cloner.options().key_policy {
            KeyPolicy::Share => key,
            KeyPolicy::Clone => cloner.walk(&key),
        };
        let value = cloner.walk(&value);
        if let Payload::Map(m) = &mut target.borrow_mut().payload {
            m.set(key, value);
        }
    }
    mirror(source, &target, cloner);
    Value::Object(target)
}

/// Set: new empty set cached immediately, members cloned
fn clone_set(source: &ObjRef, cloner: &mut Cloner) -> Value {
    let members: Vec<Value> = match &source.borrow().payload {
        Payload::Set(s) => s.values().cloned().collect(),
        _ => return Value::Object(source.clone()),
    };
    let target = ObjRef::new_set();
    cloner.cache_insert(source, Value::from(&target));
    for member in members {
        let cloned = cloner.walk(&member);
        if let Payload::Set(s) = &mut target.borrow_mut().payload {
            s.add(cloned);
        }
    }
    mirror(source, &target, cloner);
    Value::Object(target)
}

/// Boxed scalar wrapper: new wrapper holding the same primitive payload
fn clone_boxed(source: &ObjRef, cloner: &mut Cloner) -> Value {
    let payload = match &source.borrow().payload {
        Payload::Boxed(v) => v.clone(),
        _ => return Value::Object(source.clone()),
    };
    let target = ObjRef::new(Payload::Boxed(payload));
    cloner.cache_insert(source, Value::from(&target));
    mirror(source, &target, cloner);
    Value::Object(target)
}

/// Calendar value: new value at the same absolute instant
fn clone_date(source: &ObjRef, cloner: &mut Cloner) -> Value {
    let date = match &source.borrow().payload {
        Payload::Date(d) => *d,
        _ => return Value::Object(source.clone()),
    };
    let target = ObjRef::date(date);
    cloner.cache_insert(source, Value::from(&target));
    mirror(source, &target, cloner);
    Value::Object(target)
}

/// Pattern value: new value from the same source and flags
fn clone_regexp(source: &ObjRef, cloner: &mut Cloner) -> Value {
    let regexp = match &source.borrow().payload {
        Payload::RegExp(r) => r.clone(),
        _ => return Value::Object(source.clone()),
    };
    let target = ObjRef::new(Payload::RegExp(regexp));
    cloner.cache_insert(source, Value::from(&target));
    mirror(source, &target, cloner);
    Value::Object(target)
}

/// Raw byte buffer: byte-identical duplicate of the backing storage
fn clone_buffer(source: &ObjRef, cloner: &mut Cloner) -> Value {
    let buffer = match &source.borrow().payload {
        Payload::Buffer(b) => b.clone(),
        _ => return Value::Object(source.clone()),
    };
    let target = ObjRef::new(Payload::Buffer(buffer));
    cloner.cache_insert(source, Value::from(&target));
    mirror(source, &target, cloner);
    Value::Object(target)
}

/// Buffer view: clones the backing buffer through the walk and reproduces
/// offset/length
fn clone_view(source: &ObjRef, cloner: &mut Cloner) -> Value {
    let view = match &source.borrow().payload {
        Payload::View(v) => v.clone(),
        _ => return Value::Object(source.clone()),
    };
    // Backing buffers are leaves, so walking one first cannot recurse back
    // into this view; registration happens right after construction.
    let buffer = match cloner.walk(&Value::from(&view.buffer)) {
        Value::Object(b) => b,
        _ => return Value::Object(source.clone()),
    };
    let rebuilt = match ViewObject::new(buffer, view.byte_offset, view.byte_length) {
        Ok(v) => v,
        Err(_) => return Value::Object(source.clone()),
    };
    let target = ObjRef::new(Payload::View(rebuilt));
    cloner.cache_insert(source, Value::from(&target));
    mirror(source, &target, cloner);
    Value::Object(target)
}

/// Fixed-width numeric array: same lane and length, values copied directly
///
/// Pure payload — elements are primitive and the mirror does not apply.
fn clone_typed_array(source: &ObjRef, cloner: &mut Cloner) -> Value {
    let array = match &source.borrow().payload {
        Payload::TypedArray(t) => t.clone(),
        _ => return Value::Object(source.clone()),
    };
    let target = ObjRef::new(Payload::TypedArray(array));
    cloner.cache_insert(source, Value::from(&target));
    Value::Object(target)
}

/// Exception-like value: same subtype, message and origin fields
fn clone_error(source: &ObjRef, cloner: &mut Cloner) -> Value {
    let error = match &source.borrow().payload {
        Payload::Error(e) => e.clone(),
        _ => return Value::Object(source.clone()),
    };
    let target = ObjRef::error(error);
    cloner.cache_insert(source, Value::from(&target));
    mirror(source, &target, cloner);
    Value::Object(target)
}

/// Deferred value: best-effort new value chained to the original's
/// settlement; the resolution value is shared, not cloned
fn clone_promise(source: &ObjRef, cloner: &mut Cloner) -> Value {
    let state = match &source.borrow().payload {
        Payload::Promise(p) => p.state().clone(),
        _ => return Value::Object(source.clone()),
    };
    let target = match state {
        PromiseState::Resolved(value) => ObjRef::promise_resolved(value),
        PromiseState::Rejected(reason) => ObjRef::promise_rejected(reason),
        PromiseState::Pending => {
            let pending = ObjRef::promise();
            if let Payload::Promise(p) = &mut source.borrow_mut().payload {
                p.add_dependent(pending.clone());
            }
            pending
        }
    };
    cloner.cache_insert(source, Value::from(&target));
    mirror(source, &target, cloner);
    Value::Object(target)
}

/// Weak-reference collections cannot be duplicated: the source passes
/// through unchanged. A documented limitation, not a failure.
fn pass_through(source: &ObjRef, _cloner: &mut Cloner) -> Value {
    Value::Object(source.clone())
}

/// Generic composite: new composite from the same constructive template,
/// cached immediately, then every own property mirrored
fn clone_plain(source: &ObjRef, cloner: &mut Cloner) -> Value {
    let target = ObjRef::plain_with_proto(source.proto());
    cloner.cache_insert(source, Value::from(&target));
    mirror(source, &target, cloner);
    Value::Object(target)
}
