//! Type interning.

use crate::types::{FunctionShape, Intrinsic, TypeData, TypeId};
use mica_common::Atom;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::cell::RefCell;

/// Deduplicating store of [`TypeData`].
///
/// Interning the same structure twice yields the same `TypeId`, so type
/// equality is an index comparison. The interner is append-only and
/// single-threaded; methods take `&self` via interior mutability so it can be
/// shared across a resolution pipeline behind an `Rc`.
#[derive(Debug)]
pub struct TypeInterner {
    map: RefCell<FxHashMap<TypeData, TypeId>>,
    types: RefCell<Vec<TypeData>>,
}

const INTRINSICS: [Intrinsic; 7] = [
    Intrinsic::Error,
    Intrinsic::Nothing,
    Intrinsic::Unit,
    Intrinsic::Bool,
    Intrinsic::Int,
    Intrinsic::String,
    Intrinsic::Any,
];

impl TypeInterner {
    /// Create an interner with all intrinsics pre-registered at their
    /// constant `TypeId`s.
    pub fn new() -> Self {
        let interner = Self {
            map: RefCell::new(FxHashMap::default()),
            types: RefCell::new(Vec::new()),
        };
        for intrinsic in INTRINSICS {
            interner.intern(TypeData::Intrinsic(intrinsic));
        }
        debug_assert_eq!(interner.lookup(TypeId::UNIT), Some(TypeData::Intrinsic(Intrinsic::Unit)));
        debug_assert_eq!(interner.lookup(TypeId::ANY), Some(TypeData::Intrinsic(Intrinsic::Any)));
        interner
    }

    /// Intern a type, returning the existing `TypeId` if the same structure
    /// was interned before.
    pub fn intern(&self, data: TypeData) -> TypeId {
        if let Some(&id) = self.map.borrow().get(&data) {
            return id;
        }
        let mut types = self.types.borrow_mut();
        let id = TypeId(types.len() as u32);
        types.push(data.clone());
        self.map.borrow_mut().insert(data, id);
        id
    }

    /// Resolve a `TypeId` back to its structure. `None` only for ids that did
    /// not come from this interner.
    pub fn lookup(&self, id: TypeId) -> Option<TypeData> {
        self.types.borrow().get(id.0 as usize).cloned()
    }

    pub fn function(&self, params: impl IntoIterator<Item = TypeId>, return_type: TypeId) -> TypeId {
        self.intern(TypeData::Function(FunctionShape {
            params: params.into_iter().collect::<SmallVec<[TypeId; 4]>>(),
            return_type,
        }))
    }

    /// The type standing for an inference variable of some constraint system.
    pub fn variable(&self, index: u32) -> TypeId {
        self.intern(TypeData::Variable(index))
    }

    pub fn named(&self, name: Atom) -> TypeId {
        self.intern(TypeData::Named(name))
    }
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}
