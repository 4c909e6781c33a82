//! String interning for identifier deduplication.
//!
//! Names flowing through resolution (callable names, lambda parameter names)
//! are interned once and compared as `Atom` indices afterwards. Interning is
//! append-only; an `Atom` stays valid for the lifetime of its `Interner`.

use rustc_hash::FxHashMap;
use std::cell::RefCell;

/// An interned string, represented as an index into the owning [`Interner`].
///
/// Equality and hashing are O(1) index comparisons. Atoms from different
/// interners must not be mixed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(pub u32);

/// Append-only string interner.
///
/// Methods take `&self`; the interner is single-threaded by design and uses
/// interior mutability so it can be shared freely within one resolution
/// pipeline.
#[derive(Debug, Default)]
pub struct Interner {
    map: RefCell<FxHashMap<String, Atom>>,
    strings: RefCell<Vec<String>>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning the existing atom if it was seen before.
    pub fn intern(&self, text: &str) -> Atom {
        if let Some(&atom) = self.map.borrow().get(text) {
            return atom;
        }
        let mut strings = self.strings.borrow_mut();
        let atom = Atom(strings.len() as u32);
        strings.push(text.to_string());
        self.map.borrow_mut().insert(text.to_string(), atom);
        atom
    }

    /// Resolve an atom back to its string.
    pub fn resolve(&self, atom: Atom) -> String {
        self.strings.borrow()[atom.0 as usize].clone()
    }

    pub fn len(&self) -> usize {
        self.strings.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.borrow().is_empty()
    }
}
