//! Composite kind classification
//!
//! Classification reads the composite's genuine payload, never its shape:
//! a plain composite that happens to carry `size`/`get` properties is still
//! `Kind::Plain`.

use ditto_core::{ObjRef, Payload};

/// Reconstruction kind of a composite
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Ordered collection
    Array,
    /// Associative map
    Map,
    /// Set
    Set,
    /// Boxed scalar wrapper
    Boxed,
    /// Calendar/timestamp value
    Date,
    /// Pattern value
    RegExp,
    /// Raw byte buffer
    Buffer,
    /// Buffer view
    View,
    /// Fixed-width numeric array
    TypedArray,
    /// Exception-like value
    Error,
    /// Deferred value
    Promise,
    /// Weak-keyed map (pass-through)
    WeakMap,
    /// Weak set (pass-through)
    WeakSet,
    /// Generic/user-defined composite
    Plain,
}

impl Kind {
    /// Kind name for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Array => "array",
            Kind::Map => "map",
            Kind::Set => "set",
            Kind::Boxed => "boxed",
            Kind::Date => "date",
            Kind::RegExp => "regexp",
            Kind::Buffer => "buffer",
            Kind::View => "view",
            Kind::TypedArray => "typedarray",
            Kind::Error => "error",
            Kind::Promise => "promise",
            Kind::WeakMap => "weakmap",
            Kind::WeakSet => "weakset",
            Kind::Plain => "object",
        }
    }
}

/// Classify a composite into its reconstruction kind
pub fn classify(obj: &ObjRef) -> Kind {
    match &obj.borrow().payload {
        Payload::Plain => Kind::Plain,
        Payload::Array(_) => Kind::Array,
        Payload::Map(_) => Kind::Map,
        Payload::Set(_) => Kind::Set,
        Payload::Boxed(_) => Kind::Boxed,
        Payload::Date(_) => Kind::Date,
        Payload::RegExp(_) => Kind::RegExp,
        Payload::Buffer(_) => Kind::Buffer,
        Payload::View(_) => Kind::View,
        Payload::TypedArray(_) => Kind::TypedArray,
        Payload::Error(_) => Kind::Error,
        Payload::Promise(_) => Kind::Promise,
        Payload::WeakMap(_) => Kind::WeakMap,
        Payload::WeakSet(_) => Kind::WeakSet,
    }
}
