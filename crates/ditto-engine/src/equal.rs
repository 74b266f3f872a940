//! Cycle-aware deep structural equality
//!
//! Companion predicate to [`clone`](crate::clone): two graphs are equal if
//! they have the same shape and the same primitive content, whatever their
//! identities. Floats follow the `Object.is` discipline (NaN equals NaN,
//! +0 and −0 are distinct). Accessors and callables compare by identity.
//!
//! Termination on cyclic graphs uses an in-progress pair memo: a pair of
//! composites already under comparison is presumed equal, the same
//! coinductive discipline the clone cache uses.

use ditto_core::{MapStorage, ObjId, ObjRef, Payload, PromiseState, PropTable, Property, SetStorage, Value};
use rustc_hash::FxHashSet;

/// Pairs of composites currently being compared
type Seen = FxHashSet<(ObjId, ObjId)>;

/// Whether two value graphs are structurally equivalent
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    let mut seen = Seen::default();
    eq_value(a, b, &mut seen)
}

fn eq_value(a: &Value, b: &Value, seen: &mut Seen) -> bool {
    match (a, b) {
        (Value::Object(x), Value::Object(y)) => eq_object(x, y, seen),
        _ => a.same_value(b),
    }
}

fn eq_object(x: &ObjRef, y: &ObjRef, seen: &mut Seen) -> bool {
    if x.ptr_eq(y) {
        return true;
    }
    let pair = (x.id(), y.id());
    if !seen.insert(pair) {
        // already comparing this pair further up the walk
        return true;
    }
    let result = eq_object_inner(x, y, seen);
    seen.remove(&pair);
    result
}

fn eq_object_inner(x: &ObjRef, y: &ObjRef, seen: &mut Seen) -> bool {
    let cx = x.borrow();
    let cy = y.borrow();

    let proto_eq = match (&cx.proto, &cy.proto) {
        (None, None) => true,
        (Some(a), Some(b)) => a.ptr_eq(b),
        _ => false,
    };
    if !proto_eq {
        return false;
    }

    let payload_eq = match (&cx.payload, &cy.payload) {
        (Payload::Plain, Payload::Plain) => true,
        (Payload::Array(a), Payload::Array(b)) => {
            a.len() == b.len()
                && a.iter().zip(b.iter()).all(|(sa, sb)| match (sa, sb) {
                    (None, None) => true,
                    (Some(va), Some(vb)) => eq_value(va, vb, seen),
                    _ => false,
                })
        }
        (Payload::Map(a), Payload::Map(b)) => eq_map(a, b, seen),
        (Payload::Set(a), Payload::Set(b)) => eq_set(a, b, seen),
        (Payload::Boxed(a), Payload::Boxed(b)) => a.same_value(b),
        (Payload::Date(a), Payload::Date(b)) => a.get_time() == b.get_time(),
        (Payload::RegExp(a), Payload::RegExp(b)) => {
            a.source() == b.source() && a.flags() == b.flags()
        }
        (Payload::Buffer(a), Payload::Buffer(b)) => a.as_bytes() == b.as_bytes(),
        (Payload::View(a), Payload::View(b)) => {
            a.byte_offset == b.byte_offset
                && a.byte_length == b.byte_length
                && eq_object(&a.buffer, &b.buffer, seen)
        }
        (Payload::TypedArray(a), Payload::TypedArray(b)) => {
            a.kind() == b.kind() && a.as_bytes() == b.as_bytes()
        }
        (Payload::Error(a), Payload::Error(b)) => a == b,
        (Payload::Promise(a), Payload::Promise(b)) => match (a.state(), b.state()) {
            (PromiseState::Pending, PromiseState::Pending) => true,
            (PromiseState::Resolved(va), PromiseState::Resolved(vb)) => eq_value(va, vb, seen),
            (PromiseState::Rejected(va), PromiseState::Rejected(vb)) => eq_value(va, vb, seen),
            _ => false,
        },
        // weak collections compare by identity only, handled by ptr_eq above
        (Payload::WeakMap(_), Payload::WeakMap(_)) => false,
        (Payload::WeakSet(_), Payload::WeakSet(_)) => false,
        _ => false,
    };

    payload_eq && eq_props(&cx.props, &cy.props, seen)
}

/// Entry-by-entry map equality, order-insensitive, with composite keys
/// matched structurally
fn eq_map(a: &MapStorage, b: &MapStorage, seen: &mut Seen) -> bool {
    if a.size() != b.size() {
        return false;
    }
    let b_entries: Vec<&(Value, Value)> = b.entries().collect();
    let mut used = vec![false; b_entries.len()];
    'outer: for (ka, va) in a.entries() {
        for (j, (kb, vb)) in b_entries.iter().enumerate() {
            if !used[j] && eq_value(ka, kb, seen) && eq_value(va, vb, seen) {
                used[j] = true;
                continue 'outer;
            }
        }
        return false;
    }
    true
}

fn eq_set(a: &SetStorage, b: &SetStorage, seen: &mut Seen) -> bool {
    if a.size() != b.size() {
        return false;
    }
    let b_items: Vec<&Value> = b.values().collect();
    let mut used = vec![false; b_items.len()];
    'outer: for va in a.values() {
        for (j, vb) in b_items.iter().enumerate() {
            if !used[j] && eq_value(va, vb, seen) {
                used[j] = true;
                continue 'outer;
            }
        }
        return false;
    }
    true
}

fn eq_props(a: &PropTable, b: &PropTable, seen: &mut Seen) -> bool {
    if a.len() != b.len() {
        return false;
    }
    for (key, pa) in a.iter() {
        let pb = match b.get(key) {
            Some(p) => p,
            None => return false,
        };
        let matches = match (pa, pb) {
            (
                Property::Data {
                    value: va,
                    writable: wa,
                    enumerable: ea,
                    configurable: ca,
                },
                Property::Data {
                    value: vb,
                    writable: wb,
                    enumerable: eb,
                    configurable: cb,
                },
            ) => wa == wb && ea == eb && ca == cb && eq_value(va, vb, seen),
            (
                Property::Accessor {
                    get: ga,
                    set: sa,
                    enumerable: ea,
                    configurable: ca,
                },
                Property::Accessor {
                    get: gb,
                    set: sb,
                    enumerable: eb,
                    configurable: cb,
                },
            ) => {
                ea == eb
                    && ca == cb
                    && eq_fn(ga.as_ref(), gb.as_ref())
                    && eq_fn(sa.as_ref(), sb.as_ref())
            }
            _ => false,
        };
        if !matches {
            return false;
        }
    }
    true
}

fn eq_fn(a: Option<&ditto_core::NativeFn>, b: Option<&ditto_core::NativeFn>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(fa), Some(fb)) => fa.ptr_eq(fb),
        _ => false,
    }
}
