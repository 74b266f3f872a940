//! Ditto core value model
//!
//! This crate provides the object-graph substrate the clone engine walks:
//! - Tagged values (primitives plus composite handles)
//! - Heap composites with identity, per-kind payloads and proto templates
//! - Own-property tables with full descriptor fidelity
//! - Unique symbols, including the well-known custom-clone key
//!
//! Composites are single-threaded `Rc` cells; identity is the allocation.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod object;
pub mod property;
pub mod symbol;
pub mod value;

pub use error::{CoreError, CoreResult};
pub use object::{
    ArrayStorage, Buffer, DateObject, ElementKind, ErrorKind, ErrorObject, MapStorage, Obj, ObjId,
    ObjRef, Payload, PromiseObject, PromiseState, RegExpObject, SetStorage, TypedArray, ValueKey,
    ViewObject, WeakMapStorage, WeakObj, WeakSetStorage,
};
pub use property::{PropKey, PropTable, Property};
pub use symbol::{clone_hook, Symbol};
pub use value::{NativeFn, Value};
