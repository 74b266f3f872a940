//! Ditto clone engine
//!
//! Structural duplication for dynamic value graphs:
//! - Per-invocation reference cache (cycle and aliasing termination)
//! - Payload-driven type classifier and kind → strategy registry
//! - Property-preservation mirror with full descriptor fidelity
//! - Custom-clone hook protocol under the well-known symbol
//! - Cycle-aware deep structural equality
//!
//! The single public operation is [`clone`]: it never mutates the source,
//! never raises on well-formed input, and returns a copy whose
//! reference-identity topology matches the source exactly — shared
//! substructures stay shared and cycles stay cyclic.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod cache;
pub mod cloner;
pub mod equal;
pub mod kind;
pub mod mirror;
pub mod options;
pub mod strategy;

pub use cache::RefCache;
pub use cloner::{clone, clone_with, Cloner};
pub use equal::deep_equal;
pub use kind::{classify, Kind};
pub use mirror::mirror;
pub use options::{CloneOptions, KeyPolicy};
pub use strategy::StrategyFn;
