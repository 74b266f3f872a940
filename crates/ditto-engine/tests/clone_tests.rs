//! Integration tests for the clone engine
//!
//! Covers the full kind matrix: primitives, boxed scalars, dates, patterns,
//! ordered collections, maps, sets, binary storage, fixed-width numeric
//! arrays, errors, promises, weak collections and generic composites —
//! including cyclic, diamond, sparse and monkeypatched variants.

use ditto_core::{
    DateObject, ElementKind, ErrorKind, ErrorObject, ObjRef, Payload, PromiseState, PropKey,
    Property, Symbol, Value,
};
use ditto_engine::{clone, clone_with, deep_equal, CloneOptions, KeyPolicy};
use num_bigint::BigInt;

// ----------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------

fn obj(value: &Value) -> ObjRef {
    value.as_object().expect("expected a composite").clone()
}

fn clone_obj(source: &ObjRef) -> ObjRef {
    obj(&clone(&Value::from(source)))
}

/// Distinct identity, equivalent structure
fn alike(a: &Value, b: &Value) -> bool {
    !a.same_value(b) && deep_equal(a, b)
}

fn arr_get(array: &ObjRef, index: usize) -> Option<Value> {
    match &array.borrow().payload {
        Payload::Array(a) => a.get(index).cloned(),
        other => panic!("not an array: {}", other.type_name()),
    }
}

fn map_set(map: &ObjRef, key: Value, value: Value) {
    match &mut map.borrow_mut().payload {
        Payload::Map(m) => m.set(key, value),
        other => panic!("not a map: {}", other.type_name()),
    }
}

fn map_get(map: &ObjRef, key: &Value) -> Option<Value> {
    match &map.borrow().payload {
        Payload::Map(m) => m.get(key).cloned(),
        other => panic!("not a map: {}", other.type_name()),
    }
}

fn map_size(map: &ObjRef) -> usize {
    match &map.borrow().payload {
        Payload::Map(m) => m.size(),
        other => panic!("not a map: {}", other.type_name()),
    }
}

fn set_add(set: &ObjRef, value: Value) {
    match &mut set.borrow_mut().payload {
        Payload::Set(s) => s.add(value),
        other => panic!("not a set: {}", other.type_name()),
    }
}

fn set_has(set: &ObjRef, value: &Value) -> bool {
    match &set.borrow().payload {
        Payload::Set(s) => s.has(value),
        other => panic!("not a set: {}", other.type_name()),
    }
}

fn set_members(set: &ObjRef) -> Vec<Value> {
    match &set.borrow().payload {
        Payload::Set(s) => s.values().cloned().collect(),
        other => panic!("not a set: {}", other.type_name()),
    }
}

/// Attach an extra symbol-keyed property, clone, and check it survived
/// without tying the copy to the source
fn assert_monkeypatching_survives(source: &ObjRef) {
    let key = Symbol::with_description("monkeypatched");
    source.set(key.clone(), Value::text("prop val"));

    let cloned = clone_obj(source);
    assert_eq!(
        cloned.get(&key.clone().into()).as_text(),
        Some("prop val")
    );

    cloned.set(key.clone(), Value::text("different"));
    assert_eq!(source.get(&key.into()).as_text(), Some("prop val"));
    assert!(alike(&Value::from(source), &Value::from(&clone_obj(source))));
}

// ----------------------------------------------------------------------
// Primitives
// ----------------------------------------------------------------------

#[test]
fn test_null_and_undefined_pass_through() {
    assert!(clone(&Value::Null).same_value(&Value::Null));
    assert!(clone(&Value::Undefined).same_value(&Value::Undefined));
}

#[test]
fn test_numbers_pass_through_exactly() {
    for n in [1.0, -1.0, 3.75, f64::INFINITY, f64::NEG_INFINITY] {
        assert!(clone(&Value::number(n)).same_value(&Value::number(n)));
    }
    // non-reflexive and signed-zero cases keep their exact bit meaning
    assert!(clone(&Value::number(f64::NAN)).same_value(&Value::number(f64::NAN)));
    assert!(clone(&Value::number(0.0)).same_value(&Value::number(0.0)));
    assert!(clone(&Value::number(-0.0)).same_value(&Value::number(-0.0)));
    assert!(!clone(&Value::number(-0.0)).same_value(&Value::number(0.0)));
}

#[test]
fn test_text_and_booleans_pass_through() {
    assert!(clone(&Value::text("")).same_value(&Value::text("")));
    assert!(clone(&Value::text("string")).same_value(&Value::text("string")));
    assert!(clone(&Value::Bool(true)).same_value(&Value::Bool(true)));
    assert!(clone(&Value::Bool(false)).same_value(&Value::Bool(false)));
}

#[test]
fn test_symbols_keep_identity() {
    let symbol = Value::Symbol(Symbol::new());
    assert!(clone(&symbol).same_value(&symbol));
}

#[test]
fn test_bigints_pass_through() {
    for i in [0i64, 100, -100] {
        assert!(clone(&Value::int(i)).same_value(&Value::int(i)));
    }
    let huge = Value::big(BigInt::from(u64::MAX) * BigInt::from(u64::MAX));
    assert!(clone(&huge).same_value(&huge));
}

#[test]
fn test_callables_keep_identity() {
    let f = Value::function(|_, _| Value::number(1.0));
    assert!(clone(&f).same_value(&f));
}

// ----------------------------------------------------------------------
// Boxed scalar wrappers
// ----------------------------------------------------------------------

#[test]
fn test_boxed_number() {
    let number = ObjRef::boxed(Value::number(3.14)).unwrap();
    let cloned = clone_obj(&number);
    assert!(!cloned.ptr_eq(&number));
    assert!(alike(&Value::from(&number), &Value::from(&cloned)));
    match &cloned.borrow().payload {
        Payload::Boxed(v) => assert!(v.same_value(&Value::number(3.14))),
        other => panic!("not boxed: {}", other.type_name()),
    };
}

#[test]
fn test_boxed_text_and_boolean() {
    let text = ObjRef::boxed(Value::text("imastring")).unwrap();
    assert!(alike(&Value::from(&text), &Value::from(&clone_obj(&text))));
    let boolean = ObjRef::boxed(Value::Bool(true)).unwrap();
    assert!(alike(&Value::from(&boolean), &Value::from(&clone_obj(&boolean))));
}

#[test]
fn test_boxed_monkeypatching() {
    assert_monkeypatching_survives(&ObjRef::boxed(Value::number(3.14)).unwrap());
    assert_monkeypatching_survives(&ObjRef::boxed(Value::text("imastring")).unwrap());
    assert_monkeypatching_survives(&ObjRef::boxed(Value::Bool(true)).unwrap());
}

// ----------------------------------------------------------------------
// Dates and patterns
// ----------------------------------------------------------------------

#[test]
fn test_date_keeps_the_instant() {
    let now = ObjRef::date(DateObject::now());
    let cloned = clone_obj(&now);
    assert!(!cloned.ptr_eq(&now));
    match (&now.borrow().payload, &cloned.borrow().payload) {
        (Payload::Date(a), Payload::Date(b)) => assert_eq!(a.get_time(), b.get_time()),
        _ => panic!("expected dates"),
    }
    assert_monkeypatching_survives(&ObjRef::date(DateObject::from_timestamp(86_400_000)));
}

#[test]
fn test_regexp_keeps_source_and_flags() {
    let reg = ObjRef::regexp("x", "g").unwrap();
    let cloned = clone_obj(&reg);
    assert!(!cloned.ptr_eq(&reg));
    match &cloned.borrow().payload {
        Payload::RegExp(r) => {
            assert_eq!(r.source(), "x");
            assert_eq!(r.flags(), "g");
            assert!(r.global());
            assert!(r.test("box"));
        }
        other => panic!("not a regexp: {}", other.type_name()),
    }
    assert_monkeypatching_survives(&ObjRef::regexp("x", "g").unwrap());
}

// ----------------------------------------------------------------------
// Ordered collections
// ----------------------------------------------------------------------

#[test]
fn test_array_empty() {
    let empty = ObjRef::array_from(vec![]);
    let cloned = clone_obj(&empty);
    assert!(!cloned.ptr_eq(&empty));
    assert!(alike(&Value::from(&empty), &Value::from(&cloned)));
}

#[test]
fn test_array_nonempty_mixed() {
    let nonempty = ObjRef::array_from(vec![
        Value::number(f64::INFINITY),
        Value::number(0.0),
        Value::Undefined,
        Value::Symbol(Symbol::new()),
        Value::int(12),
    ]);
    assert!(alike(&Value::from(&nonempty), &Value::from(&clone_obj(&nonempty))));
}

#[test]
fn test_array_nested_elements_get_fresh_identity() {
    let rows: Vec<Value> = (0..3)
        .map(|r| {
            Value::from(&ObjRef::array_from(
                (1..=3).map(|c| Value::number((r * 3 + c) as f64)).collect(),
            ))
        })
        .collect();
    let nested = ObjRef::array_from(rows);
    let cloned = clone_obj(&nested);
    assert!(alike(&Value::from(&nested), &Value::from(&cloned)));
    for i in 0..3 {
        let original_row = obj(&arr_get(&nested, i).unwrap());
        let cloned_row = obj(&arr_get(&cloned, i).unwrap());
        assert!(!original_row.ptr_eq(&cloned_row));
    }
}

#[test]
fn test_array_cyclic() {
    let cyclic = ObjRef::array_from(vec![
        Value::text("before"),
        Value::Undefined,
        Value::text("after"),
    ]);
    if let Payload::Array(a) = &mut cyclic.borrow_mut().payload {
        a.set(1, Value::from(&cyclic));
    }
    let cloned = clone_obj(&cyclic);
    assert_eq!(arr_get(&cloned, 0).unwrap().as_text(), Some("before"));
    assert!(obj(&arr_get(&cloned, 1).unwrap()).ptr_eq(&cloned));
    assert_eq!(arr_get(&cloned, 2).unwrap().as_text(), Some("after"));
}

#[test]
fn test_array_diamond() {
    let child = ObjRef::array_from(vec![Value::text("im"), Value::text("child")]);
    let parent = ObjRef::array_from(vec![
        Value::text("before"),
        Value::from(&child),
        Value::text("between"),
        Value::from(&child),
        Value::text("after"),
    ]);
    let cloned = clone_obj(&parent);
    assert!(alike(&Value::from(&parent), &Value::from(&cloned)));
    let left = obj(&arr_get(&cloned, 1).unwrap());
    let right = obj(&arr_get(&cloned, 3).unwrap());
    assert!(!left.ptr_eq(&child));
    assert!(left.ptr_eq(&right));
}

#[test]
fn test_array_sparse() {
    // [1, , 3, , 5]
    let sparse = ObjRef::array(ditto_core::ArrayStorage::with_len(5));
    if let Payload::Array(a) = &mut sparse.borrow_mut().payload {
        a.set(0, Value::number(1.0));
        a.set(2, Value::number(3.0));
        a.set(4, Value::number(5.0));
    }
    let cloned = clone_obj(&sparse);
    assert!(alike(&Value::from(&sparse), &Value::from(&cloned)));
    assert!(arr_get(&cloned, 1).is_none());
    assert!(arr_get(&cloned, 3).is_none());
    assert_eq!(arr_get(&cloned, 4).unwrap().as_number(), Some(5.0));
}

#[test]
fn test_array_monkeypatching() {
    assert_monkeypatching_survives(&ObjRef::array_from(vec![
        Value::number(3.0),
        Value::number(1.0),
        Value::number(4.0),
    ]));
}

// ----------------------------------------------------------------------
// Maps
// ----------------------------------------------------------------------

#[test]
fn test_map_empty_and_nonempty() {
    let empty = ObjRef::new_map();
    assert!(alike(&Value::from(&empty), &Value::from(&clone_obj(&empty))));

    let nonempty = ObjRef::new_map();
    map_set(&nonempty, Value::text("ping"), Value::text("x"));
    map_set(&nonempty, Value::text("y"), Value::text("pong"));
    let cloned = clone_obj(&nonempty);
    assert!(alike(&Value::from(&nonempty), &Value::from(&cloned)));
    assert_eq!(map_size(&cloned), 2);
    assert_eq!(
        map_get(&cloned, &Value::text("ping")).unwrap().as_text(),
        Some("x")
    );
}

#[test]
fn test_map_nested_values_cloned() {
    let inner = ObjRef::new_map();
    map_set(&inner, Value::text("mx"), Value::number(0.0));
    let nested = ObjRef::new_map();
    map_set(&nested, Value::text("m"), Value::from(&inner));

    let cloned = clone_obj(&nested);
    assert!(alike(&Value::from(&nested), &Value::from(&cloned)));
    let cloned_inner = obj(&map_get(&cloned, &Value::text("m")).unwrap());
    assert!(!cloned_inner.ptr_eq(&inner));
}

#[test]
fn test_map_cyclic() {
    let cyclic = ObjRef::new_map();
    map_set(&cyclic, Value::text("self"), Value::from(&cyclic));
    let cloned = clone_obj(&cyclic);
    assert!(!cloned.ptr_eq(&cyclic));
    assert_eq!(map_size(&cloned), map_size(&cyclic));
    assert!(obj(&map_get(&cloned, &Value::text("self")).unwrap()).ptr_eq(&cloned));
}

#[test]
fn test_map_diamond() {
    let child = ObjRef::new_map();
    map_set(&child, Value::text("i am"), Value::text("child"));
    let diamond = ObjRef::new_map();
    map_set(&diamond, Value::text("a"), Value::from(&child));
    map_set(&diamond, Value::text("b"), Value::from(&child));

    let cloned = clone_obj(&diamond);
    assert!(alike(&Value::from(&diamond), &Value::from(&cloned)));
    let a = obj(&map_get(&cloned, &Value::text("a")).unwrap());
    let b = obj(&map_get(&cloned, &Value::text("b")).unwrap());
    assert!(a.ptr_eq(&b));
    assert!(!a.ptr_eq(&child));
}

#[test]
fn test_map_keys_shared_by_default() {
    let key = ObjRef::array_from(vec![]);
    let map = ObjRef::new_map();
    map_set(&map, Value::from(&key), Value::text("empty"));

    let cloned = clone_obj(&map);
    // the clone's entry is keyed by the very same composite
    assert_eq!(
        map_get(&cloned, &Value::from(&key)).unwrap().as_text(),
        Some("empty")
    );
}

#[test]
fn test_map_key_policy_clone_preserves_key_aliasing() {
    let key = ObjRef::plain();
    key.set("tag", Value::text("k"));
    let map = ObjRef::new_map();
    // the key composite is also a value elsewhere in the map
    map_set(&map, Value::from(&key), Value::text("by key"));
    map_set(&map, Value::text("alias"), Value::from(&key));

    let cloned = obj(&clone_with(
        &Value::from(&map),
        CloneOptions::new().with_key_policy(KeyPolicy::Clone),
    ));

    // the source key no longer appears in the clone...
    assert!(map_get(&cloned, &Value::from(&key)).is_none());
    // ...and the cloned key is the same composite as the cloned value
    let cloned_alias = obj(&map_get(&cloned, &Value::text("alias")).unwrap());
    assert!(!cloned_alias.ptr_eq(&key));
    assert!(map_get(&cloned, &Value::from(&cloned_alias)).is_some());
}

#[test]
fn test_map_monkeypatching() {
    let map = ObjRef::new_map();
    map_set(&map, Value::text("ping"), Value::text("x"));
    map_set(&map, Value::text("y"), Value::text("pong"));
    assert_monkeypatching_survives(&map);
}

// ----------------------------------------------------------------------
// Sets
// ----------------------------------------------------------------------

#[test]
fn test_set_empty_and_nonempty() {
    let empty = ObjRef::new_set();
    assert!(alike(&Value::from(&empty), &Value::from(&clone_obj(&empty))));

    let nonempty = ObjRef::new_set();
    for n in [1.0, 2.0, 3.0] {
        set_add(&nonempty, Value::number(n));
    }
    let cloned = clone_obj(&nonempty);
    assert!(alike(&Value::from(&nonempty), &Value::from(&cloned)));
    assert!(set_has(&cloned, &Value::number(2.0)));
}

#[test]
fn test_set_members_cloned() {
    let child = ObjRef::new_set();
    set_add(&child, Value::text("child"));
    let parent = ObjRef::new_set();
    set_add(&parent, Value::from(&child));

    let cloned = clone_obj(&parent);
    assert!(alike(&Value::from(&parent), &Value::from(&cloned)));
    let members = set_members(&cloned);
    assert_eq!(members.len(), 1);
    assert!(!obj(&members[0]).ptr_eq(&child));
}

#[test]
fn test_set_cyclic() {
    let cyclic = ObjRef::new_set();
    set_add(&cyclic, Value::from(&cyclic));
    let cloned = clone_obj(&cyclic);
    assert!(!cloned.ptr_eq(&cyclic));
    assert!(set_has(&cloned, &Value::from(&cloned)));
}

#[test]
fn test_set_monkeypatching() {
    let set = ObjRef::new_set();
    for n in [1.0, 2.0, 3.0] {
        set_add(&set, Value::number(n));
    }
    assert_monkeypatching_survives(&set);
}

// ----------------------------------------------------------------------
// Buffers, views and fixed-width numeric arrays
// ----------------------------------------------------------------------

#[test]
fn test_buffer_byte_identical_and_independent() {
    let buffer = ObjRef::buffer_from((0u8..32).collect());
    let cloned = clone_obj(&buffer);
    assert!(!cloned.ptr_eq(&buffer));
    assert!(alike(&Value::from(&buffer), &Value::from(&cloned)));

    if let Payload::Buffer(b) = &mut cloned.borrow_mut().payload {
        b.set_byte(0, 0xee).unwrap();
    }
    match &buffer.borrow().payload {
        Payload::Buffer(b) => assert_eq!(b.get_byte(0), Some(0)),
        _ => panic!("expected buffer"),
    }
    assert_monkeypatching_survives(&ObjRef::buffer(16));
}

#[test]
fn test_view_clones_backing_buffer() {
    let buffer = ObjRef::buffer(32);
    let view = ObjRef::view(&buffer, 1, 16).unwrap();
    let cloned = clone_obj(&view);

    let (cloned_buffer, offset, length) = match &cloned.borrow().payload {
        Payload::View(v) => (v.buffer.clone(), v.byte_offset, v.byte_length),
        other => panic!("not a view: {}", other.type_name()),
    };
    assert_eq!((offset, length), (1, 16));
    assert!(!cloned_buffer.ptr_eq(&buffer));

    // writing through the clone leaves the source untouched
    if let Payload::View(v) = &cloned.borrow().payload {
        v.set_int16(0, 12).unwrap();
    }
    if let Payload::View(v) = &view.borrow().payload {
        assert_ne!(v.get_int16(0).unwrap(), 12);
        assert_ne!(v.get_int16(1).unwrap(), 12);
    }
    assert_monkeypatching_survives(&ObjRef::view(&ObjRef::buffer(16), 0, 16).unwrap());
}

#[test]
fn test_sibling_views_share_one_cloned_buffer() {
    let buffer = ObjRef::buffer(8);
    let views = ObjRef::array_from(vec![
        Value::from(&ObjRef::view(&buffer, 0, 4).unwrap()),
        Value::from(&ObjRef::view(&buffer, 4, 4).unwrap()),
    ]);
    let cloned = clone_obj(&views);
    let first = obj(&arr_get(&cloned, 0).unwrap());
    let second = obj(&arr_get(&cloned, 1).unwrap());
    match (&first.borrow().payload, &second.borrow().payload) {
        (Payload::View(a), Payload::View(b)) => {
            assert!(a.buffer.ptr_eq(&b.buffer));
            assert!(!a.buffer.ptr_eq(&buffer));
        }
        _ => panic!("expected views"),
    };
}

#[test]
fn test_typed_arrays_all_lanes() {
    let lanes = [
        ElementKind::Int8,
        ElementKind::Uint8,
        ElementKind::Uint8Clamped,
        ElementKind::Int16,
        ElementKind::Uint16,
        ElementKind::Int32,
        ElementKind::Uint32,
        ElementKind::Float32,
        ElementKind::Float64,
        ElementKind::BigInt64,
        ElementKind::BigUint64,
    ];
    for kind in lanes {
        let source = ObjRef::typed_array(kind, 32);
        if let Payload::TypedArray(t) = &mut source.borrow_mut().payload {
            for at in [0, 15, 31] {
                t.set(at, 12.0).unwrap();
            }
        }
        let cloned = clone_obj(&source);
        assert!(!cloned.ptr_eq(&source));
        assert!(
            alike(&Value::from(&source), &Value::from(&cloned)),
            "lane {} did not round-trip",
            kind.name()
        );
    }
}

#[test]
fn test_typed_array_distinct_backing_store() {
    let source = ObjRef::typed_array(ElementKind::Int32, 10);
    if let Payload::TypedArray(t) = &mut source.borrow_mut().payload {
        for i in 0..10 {
            t.set(i, i as f64).unwrap();
        }
    }
    let cloned = clone_obj(&source);
    if let Payload::TypedArray(t) = &mut cloned.borrow_mut().payload {
        assert_eq!(t.get(7), Some(7.0));
        t.set(7, 700.0).unwrap();
    }
    match &source.borrow().payload {
        Payload::TypedArray(t) => assert_eq!(t.get(7), Some(7.0)),
        _ => panic!("expected typed array"),
    };
}

// ----------------------------------------------------------------------
// Errors
// ----------------------------------------------------------------------

#[test]
fn test_errors_all_subtypes() {
    let kinds = [
        ErrorKind::Generic,
        ErrorKind::Eval,
        ErrorKind::Range,
        ErrorKind::Reference,
        ErrorKind::Syntax,
        ErrorKind::Type,
        ErrorKind::Uri,
    ];
    for kind in kinds {
        let error = ObjRef::error(ErrorObject::with_origin(kind, "message", "filename", 50));
        let cloned = clone_obj(&error);
        assert!(!cloned.ptr_eq(&error));
        match &cloned.borrow().payload {
            Payload::Error(e) => {
                assert_eq!(e.kind, kind);
                assert_eq!(e.message, "message");
                assert_eq!(e.origin_file.as_deref(), Some("filename"));
                assert_eq!(e.origin_line, Some(50));
            }
            other => panic!("not an error: {}", other.type_name()),
        };
    }
    assert_monkeypatching_survives(&ObjRef::error(ErrorObject::new(
        ErrorKind::Range,
        "message",
    )));
}

// ----------------------------------------------------------------------
// Promises and weak collections
// ----------------------------------------------------------------------

#[test]
fn test_resolved_promise_clones_to_resolved() {
    let settled = ObjRef::promise_resolved(Value::text("done"));
    let cloned = clone_obj(&settled);
    assert!(!cloned.ptr_eq(&settled));
    match &cloned.borrow().payload {
        Payload::Promise(p) => match p.state() {
            PromiseState::Resolved(v) => assert_eq!(v.as_text(), Some("done")),
            other => panic!("unexpected state: {:?}", other),
        },
        other => panic!("not a promise: {}", other.type_name()),
    };
}

#[test]
fn test_pending_promise_chains_to_source_settlement() {
    let pending = ObjRef::promise();
    let cloned = clone_obj(&pending);
    assert!(!cloned.ptr_eq(&pending));
    match &cloned.borrow().payload {
        Payload::Promise(p) => assert!(!p.is_settled()),
        _ => panic!("expected promise"),
    }

    pending.resolve(Value::number(99.0)).unwrap();
    match &cloned.borrow().payload {
        Payload::Promise(p) => match p.state() {
            PromiseState::Resolved(v) => assert!(v.same_value(&Value::number(99.0))),
            other => panic!("unexpected state: {:?}", other),
        },
        _ => panic!("expected promise"),
    };
}

#[test]
fn test_weak_collections_pass_through_unchanged() {
    let weak_map = ObjRef::weak_map();
    assert!(clone_obj(&weak_map).ptr_eq(&weak_map));
    let weak_set = ObjRef::weak_set();
    assert!(clone_obj(&weak_set).ptr_eq(&weak_set));
}

// ----------------------------------------------------------------------
// Generic composites
// ----------------------------------------------------------------------

#[test]
fn test_plain_empty_and_nonempty() {
    let empty = ObjRef::plain();
    assert!(alike(&Value::from(&empty), &Value::from(&clone_obj(&empty))));

    let nonempty = ObjRef::plain();
    nonempty.set("left", Value::text("right"));
    nonempty.set("up", Value::text("down"));
    nonempty.set("red", Value::text("blue"));
    assert!(alike(&Value::from(&nonempty), &Value::from(&clone_obj(&nonempty))));
}

#[test]
fn test_scenario_nested_document() {
    // clone({a: 1, b: {c: 2}}) — fresh identity at every level, equal value
    let inner = ObjRef::plain();
    inner.set("c", Value::number(2.0));
    let outer = ObjRef::plain();
    outer.set("a", Value::number(1.0));
    outer.set("b", Value::from(&inner));

    let cloned = clone_obj(&outer);
    assert!(!cloned.ptr_eq(&outer));
    assert!(alike(&Value::from(&outer), &Value::from(&cloned)));
    let cloned_inner = obj(&cloned.get(&"b".into()));
    assert!(!cloned_inner.ptr_eq(&inner));
    assert!(cloned_inner.get(&"c".into()).same_value(&Value::number(2.0)));
}

#[test]
fn test_plain_cyclic() {
    let object = ObjRef::plain();
    object.set("prop", Value::text("val"));
    object.set("self", Value::from(&object));
    let cloned = clone_obj(&object);
    assert!(!cloned.ptr_eq(&object));
    assert!(obj(&cloned.get(&"self".into())).ptr_eq(&cloned));
}

#[test]
fn test_plain_diamond() {
    let child = ObjRef::plain();
    child.set("i_am", Value::text("child"));
    let parent = ObjRef::plain();
    parent.set("left", Value::from(&child));
    parent.set("right", Value::from(&child));

    let cloned = clone_obj(&parent);
    assert!(alike(&Value::from(&parent), &Value::from(&cloned)));
    let left = obj(&cloned.get(&"left".into()));
    let right = obj(&cloned.get(&"right".into()));
    assert!(left.ptr_eq(&right));
    assert!(!left.ptr_eq(&child));
}

#[test]
fn test_plain_symbol_keys() {
    let key = Symbol::new();
    let funky = ObjRef::plain();
    funky.set(key.clone(), Value::text("sym"));
    funky.set("str", Value::text("str"));
    let cloned = clone_obj(&funky);
    assert!(alike(&Value::from(&funky), &Value::from(&cloned)));
    assert_eq!(cloned.get(&key.into()).as_text(), Some("sym"));
}

#[test]
fn test_proto_is_shared_as_constructive_template() {
    // Object.create(proto) analogue: methods keep resolving through the
    // shared proto on the clone
    let proto = ObjRef::plain();
    proto.set("delimiter", Value::text(", "));
    let object = ObjRef::plain_with_proto(Some(proto.clone()));
    object.set("items", Value::from(&ObjRef::array_from(vec![
        Value::number(1.0),
        Value::number(2.0),
        Value::number(3.0),
    ])));

    let cloned = clone_obj(&object);
    assert!(cloned.proto().unwrap().ptr_eq(&proto));
    assert_eq!(cloned.get(&"delimiter".into()).as_text(), Some(", "));
    // own properties were cloned, not shared
    assert!(!obj(&cloned.get(&"items".into())).ptr_eq(&obj(&object.get(&"items".into()))));
}

#[test]
fn test_class_like_instances() {
    // constructor-function instances: plain composites with a shared proto
    let pair_proto = ObjRef::plain();
    let pair = ObjRef::plain_with_proto(Some(pair_proto.clone()));
    pair.set("left", Value::number(3.0));
    pair.set("right", Value::number(4.0));

    let cloned = clone_obj(&pair);
    assert!(alike(&Value::from(&pair), &Value::from(&cloned)));
    assert!(cloned.proto().unwrap().ptr_eq(&pair_proto));
}

#[test]
fn test_non_enumerable_flag_preserved() {
    let source = ObjRef::plain();
    source.define(
        "hidden".into(),
        Property::Data {
            value: Value::from(&ObjRef::plain()),
            writable: true,
            enumerable: false,
            configurable: false,
        },
    );
    let cloned = clone_obj(&source);
    match cloned.get_own(&"hidden".into()) {
        Some(Property::Data {
            value,
            writable,
            enumerable,
            configurable,
        }) => {
            assert!(writable);
            assert!(!enumerable);
            assert!(!configurable);
            // value was cloned, not shared
            assert!(!obj(&value).ptr_eq(&obj(&source.get(&"hidden".into()))));
        }
        other => panic!("unexpected property: {:?}", other),
    }
}

#[test]
fn test_getter_reads_the_clones_own_state() {
    let object = ObjRef::plain();
    object.set("val", Value::text("got"));
    object.define(
        "getter".into(),
        Property::getter(ditto_core::NativeFn::new(|this, _| match this {
            Value::Object(o) => o.get(&"val".into()),
            _ => Value::Undefined,
        })),
    );

    let cloned = clone_obj(&object);
    assert!(alike(&Value::from(&object), &Value::from(&cloned)));
    assert_eq!(cloned.get(&"getter".into()).as_text(), Some("got"));

    cloned.set("val", Value::text("not"));
    assert_eq!(cloned.get(&"getter".into()).as_text(), Some("not"));
    assert_eq!(object.get(&"getter".into()).as_text(), Some("got"));
}

#[test]
fn test_source_graph_not_mutated() {
    let child = ObjRef::plain();
    child.set("n", Value::number(1.0));
    let root = ObjRef::plain();
    root.set("child", Value::from(&child));
    root.set("self", Value::from(&root));

    let before_keys = root.keys();
    let _ = clone(&Value::from(&root));
    assert_eq!(root.keys(), before_keys);
    assert!(obj(&root.get(&"child".into())).ptr_eq(&child));
    assert!(obj(&root.get(&"self".into())).ptr_eq(&root));
}

#[test]
fn test_property_key_helper_roundtrip() {
    // PropKey::Text from &str and PropKey::Symbol coexist on one composite
    let source = ObjRef::plain();
    let sym = Symbol::with_description("tag");
    source.set("name", Value::text("text key"));
    source.set(sym.clone(), Value::text("symbol key"));
    let cloned = clone_obj(&source);
    assert_eq!(cloned.get(&PropKey::from("name")).as_text(), Some("text key"));
    assert_eq!(cloned.get(&PropKey::from(sym)).as_text(), Some("symbol key"));
}
