//! Property-preservation mirror
//!
//! Copies every own keyed property of a composite onto its clone with full
//! descriptor fidelity. Accessor pairs are installed unmodified — shared by
//! reference between source and clone, and never invoked here (reading a
//! getter could trigger side effects unrelated to copying). Data values are
//! routed through the recursive walk, flags intact.

use ditto_core::{ObjRef, PropKey, Property};

use crate::cloner::Cloner;

/// Mirror `source`'s own properties onto `target`, in declaration order
pub fn mirror(source: &ObjRef, target: &ObjRef, cloner: &mut Cloner) {
    let entries: Vec<(PropKey, Property)> = {
        let cell = source.borrow();
        cell.props
            .iter()
            .map(|(k, p)| (k.clone(), p.clone()))
            .collect()
    };
    for (key, prop) in entries {
        match prop {
            Property::Accessor { .. } => target.define(key, prop),
            Property::Data {
                value,
                writable,
                enumerable,
                configurable,
            } => {
                let cloned = cloner.walk(&value);
                target.define(
                    key,
                    Property::Data {
                        value: cloned,
                        writable,
                        enumerable,
                        configurable,
                    },
                );
            }
        }
    }
}
