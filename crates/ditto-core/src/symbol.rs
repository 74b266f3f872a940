//! Unique atomic tokens
//!
//! Symbols are identity-significant primitives: two symbols are equal only
//! if they came from the same `Symbol::new` call. The well-known
//! [`clone_hook`] symbol is the key under which a composite exposes its
//! custom-clone operation.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;

/// Global counter for generating unique symbol IDs
static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

/// Generate a new unique symbol ID
fn generate_symbol_id() -> u64 {
    NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed)
}

/// The well-known custom-clone symbol — created once at first use
static CLONE_HOOK: Lazy<Symbol> = Lazy::new(|| Symbol::with_description("ditto.cloneHook"));

/// A unique atomic token
///
/// Equality and hashing use the ID only; the description is diagnostic.
#[derive(Clone, Debug)]
pub struct Symbol {
    /// Unique ID (assigned on creation)
    id: u64,
    /// Optional human-readable description
    description: Option<Arc<str>>,
}

impl Symbol {
    /// Create a new symbol, distinct from every other symbol
    pub fn new() -> Self {
        Self {
            id: generate_symbol_id(),
            description: None,
        }
    }

    /// Create a new symbol carrying a description
    pub fn with_description(description: &str) -> Self {
        Self {
            id: generate_symbol_id(),
            description: Some(Arc::from(description)),
        }
    }

    /// The symbol's unique ID
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The symbol's description, if any
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl Default for Symbol {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(d) => write!(f, "Symbol({})", d),
            None => write!(f, "Symbol()"),
        }
    }
}

/// The well-known key under which a composite exposes its custom-clone
/// operation
///
/// Part of the public contract: any consumer may define a function-valued
/// property under this key (on a composite or its proto) to take full
/// ownership of that composite's cloning.
pub fn clone_hook() -> Symbol {
    CLONE_HOOK.clone()
}
