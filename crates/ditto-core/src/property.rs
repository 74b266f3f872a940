//! Own keyed properties with descriptor fidelity
//!
//! Every composite carries a [`PropTable`] of own properties. A property is
//! either a data slot or an accessor pair, each with its attribute flags.
//! Declaration order is preserved: redefining an existing key keeps its
//! position, new keys append.

use std::rc::Rc;

use crate::symbol::Symbol;
use crate::value::{NativeFn, Value};

/// A property key: text or symbol
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropKey {
    /// Text key, compared by content
    Text(Rc<str>),
    /// Symbol key, compared by identity
    Symbol(Symbol),
}

impl From<&str> for PropKey {
    fn from(s: &str) -> Self {
        PropKey::Text(Rc::from(s))
    }
}

impl From<Symbol> for PropKey {
    fn from(s: Symbol) -> Self {
        PropKey::Symbol(s)
    }
}

/// A property descriptor
#[derive(Clone, Debug)]
pub enum Property {
    /// A data property holding a value
    Data {
        /// The stored value
        value: Value,
        /// Whether the value may be replaced
        writable: bool,
        /// Whether the property shows up in enumeration
        enumerable: bool,
        /// Whether the descriptor may be redefined
        configurable: bool,
    },
    /// An accessor property backed by a getter and/or setter
    ///
    /// The pair is shared by reference when a composite is cloned and is
    /// never invoked by the cloning machinery.
    Accessor {
        /// Getter, invoked with the receiver
        get: Option<NativeFn>,
        /// Setter, invoked with the receiver and the new value
        set: Option<NativeFn>,
        /// Whether the property shows up in enumeration
        enumerable: bool,
        /// Whether the descriptor may be redefined
        configurable: bool,
    },
}

impl Property {
    /// A plain data property: writable, enumerable, configurable
    pub fn data(value: Value) -> Self {
        Property::Data {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// A getter-only accessor property, enumerable and configurable
    pub fn getter(get: NativeFn) -> Self {
        Property::Accessor {
            get: Some(get),
            set: None,
            enumerable: true,
            configurable: true,
        }
    }

    /// Whether this is an accessor descriptor
    pub fn is_accessor(&self) -> bool {
        matches!(self, Property::Accessor { .. })
    }

    /// The enumerable flag
    pub fn enumerable(&self) -> bool {
        match self {
            Property::Data { enumerable, .. } => *enumerable,
            Property::Accessor { enumerable, .. } => *enumerable,
        }
    }

    /// The configurable flag
    pub fn configurable(&self) -> bool {
        match self {
            Property::Data { configurable, .. } => *configurable,
            Property::Accessor { configurable, .. } => *configurable,
        }
    }
}

/// Insertion-ordered own-property table
#[derive(Clone, Debug, Default)]
pub struct PropTable {
    entries: Vec<(PropKey, Property)>,
}

impl PropTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of own properties
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Define a property, keeping declaration order
    ///
    /// An existing key is redefined in place; a new key appends.
    pub fn define(&mut self, key: PropKey, prop: Property) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = prop,
            None => self.entries.push((key, prop)),
        }
    }

    /// Look up an own property
    pub fn get(&self, key: &PropKey) -> Option<&Property> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, p)| p)
    }

    /// Remove an own property, returning its descriptor
    pub fn remove(&mut self, key: &PropKey) -> Option<Property> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Iterate own properties in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&PropKey, &Property)> {
        self.entries.iter().map(|(k, p)| (k, p))
    }

    /// Own keys in declaration order
    pub fn keys(&self) -> impl Iterator<Item = &PropKey> {
        self.entries.iter().map(|(k, _)| k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_order_preserved() {
        let mut table = PropTable::new();
        table.define("b".into(), Property::data(Value::number(1.0)));
        table.define("a".into(), Property::data(Value::number(2.0)));
        table.define("c".into(), Property::data(Value::number(3.0)));
        let keys: Vec<_> = table.keys().cloned().collect();
        assert_eq!(keys, vec!["b".into(), "a".into(), "c".into()]);
    }

    #[test]
    fn test_redefine_keeps_position() {
        let mut table = PropTable::new();
        table.define("x".into(), Property::data(Value::number(1.0)));
        table.define("y".into(), Property::data(Value::number(2.0)));
        table.define("x".into(), Property::data(Value::number(9.0)));
        let keys: Vec<_> = table.keys().cloned().collect();
        assert_eq!(keys, vec!["x".into(), "y".into()]);
        match table.get(&"x".into()) {
            Some(Property::Data { value, .. }) => assert!(value.same_value(&Value::number(9.0))),
            other => panic!("unexpected property: {:?}", other),
        }
    }

    #[test]
    fn test_symbol_keys_are_distinct() {
        let mut table = PropTable::new();
        let a = Symbol::new();
        let b = Symbol::new();
        table.define(a.clone().into(), Property::data(Value::text("a")));
        table.define(b.clone().into(), Property::data(Value::text("b")));
        assert_eq!(table.len(), 2);
        assert!(table.get(&a.into()).is_some());
        assert!(table.remove(&b.into()).is_some());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_flags() {
        let prop = Property::Data {
            value: Value::Null,
            writable: false,
            enumerable: false,
            configurable: true,
        };
        assert!(!prop.enumerable());
        assert!(prop.configurable());
        assert!(!prop.is_accessor());
        assert!(Property::getter(NativeFn::new(|_, _| Value::Null)).is_accessor());
    }
}
