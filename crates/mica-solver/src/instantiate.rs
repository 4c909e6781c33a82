//! Type substitution.
//!
//! A [`TypeSubstitution`] maps inference-variable indices to types.
//! [`instantiate_type`] applies one substitution pass; chained variables
//! (`T := U`, `U := Int`) converge through the iterative helpers on
//! [`ConstraintSystem`](crate::ConstraintSystem).

use crate::intern::TypeInterner;
use crate::types::{TypeData, TypeId};
use rustc_hash::FxHashMap;

/// A mapping from inference-variable indices to replacement types.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeSubstitution {
    map: FxHashMap<u32, TypeId>,
}

impl TypeSubstitution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, var: u32, ty: TypeId) {
        self.map.insert(var, ty);
    }

    pub fn get(&self, var: u32) -> Option<TypeId> {
        self.map.get(&var).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Apply one substitution pass to `ty`, rebuilding compound types whose
/// components changed. Variables absent from the substitution are kept as-is.
pub fn instantiate_type(interner: &TypeInterner, ty: TypeId, subst: &TypeSubstitution) -> TypeId {
    if subst.is_empty() {
        return ty;
    }
    match interner.lookup(ty) {
        Some(TypeData::Variable(index)) => subst.get(index).unwrap_or(ty),
        Some(TypeData::Function(shape)) => {
            let params: Vec<TypeId> = shape
                .params
                .iter()
                .map(|&p| instantiate_type(interner, p, subst))
                .collect();
            let return_type = instantiate_type(interner, shape.return_type, subst);
            if params.as_slice() == shape.params.as_slice() && return_type == shape.return_type {
                ty
            } else {
                interner.function(params, return_type)
            }
        }
        _ => ty,
    }
}
