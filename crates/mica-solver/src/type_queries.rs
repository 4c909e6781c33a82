//! Small structural queries over interned types.

use crate::intern::TypeInterner;
use crate::types::{TypeData, TypeId};
use rustc_hash::FxHashSet;

/// Collect the indices of every inference variable reachable from `ty`.
pub fn collect_inference_vars(interner: &TypeInterner, ty: TypeId, out: &mut FxHashSet<u32>) {
    match interner.lookup(ty) {
        Some(TypeData::Variable(index)) => {
            out.insert(index);
        }
        Some(TypeData::Function(shape)) => {
            for &param in &shape.params {
                collect_inference_vars(interner, param, out);
            }
            collect_inference_vars(interner, shape.return_type, out);
        }
        _ => {}
    }
}

pub fn contains_inference_vars(interner: &TypeInterner, ty: TypeId) -> bool {
    match interner.lookup(ty) {
        Some(TypeData::Variable(_)) => true,
        Some(TypeData::Function(shape)) => {
            shape.params.iter().any(|&p| contains_inference_vars(interner, p))
                || contains_inference_vars(interner, shape.return_type)
        }
        _ => false,
    }
}

pub fn is_function_type(interner: &TypeInterner, ty: TypeId) -> bool {
    matches!(interner.lookup(ty), Some(TypeData::Function(_)))
}

/// Structural subtype check over variable-free types.
///
/// Error is compatible in both directions, Nothing is a subtype of
/// everything, Any is a supertype of everything, and function types are
/// contravariant in parameters and covariant in return position. Inference
/// variables are not related here; constraints on them are decomposed before
/// this check runs.
pub fn is_subtype(interner: &TypeInterner, sub: TypeId, sup: TypeId) -> bool {
    if sub == sup || sub == TypeId::ERROR || sup == TypeId::ERROR {
        return true;
    }
    if sub == TypeId::NOTHING || sup == TypeId::ANY {
        return true;
    }
    match (interner.lookup(sub), interner.lookup(sup)) {
        (Some(TypeData::Function(f)), Some(TypeData::Function(g))) => {
            f.params.len() == g.params.len()
                && f.params
                    .iter()
                    .zip(g.params.iter())
                    .all(|(&fp, &gp)| is_subtype(interner, gp, fp))
                && is_subtype(interner, f.return_type, g.return_type)
        }
        _ => false,
    }
}
