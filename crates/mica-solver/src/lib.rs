//! Constraint-Based Type Solver
//!
//! This crate implements the inference machinery the call-resolution layer
//! drives to a fixed point. It uses:
//!
//! - **Ena**: For unification (Union-Find) of inference variables
//! - **Custom `TypeData`**: Structural type representation with interning
//! - **Monotone constraint storage**: Bounds are only ever added, fixation is
//!   one-way, contradictions are latched
//!
//! Key benefits:
//! - O(1) type equality via interning (`TypeId` comparison)
//! - Deterministic variable fixation (registration order)
//! - Read-only storage snapshots that survive later mutation of the live
//!   system

pub mod completion;
pub mod infer;
mod instantiate;
mod intern;
pub mod type_queries;
pub mod types;

pub use completion::{
    CompletionMode, ConstraintSystemCompleter, PostponableAtom, TrivialConstraintOracle,
};
pub use infer::{
    ConstraintError, ConstraintPosition, ConstraintStorage, ConstraintSystem, InferenceInfo,
    InferenceVar,
};
pub use instantiate::{TypeSubstitution, instantiate_type};
pub use intern::TypeInterner;
pub use type_queries::{
    collect_inference_vars, contains_inference_vars, is_function_type, is_subtype,
};
pub use types::{FunctionShape, Intrinsic, TypeData, TypeId};

#[cfg(test)]
#[path = "tests/infer_tests.rs"]
mod infer_tests;
#[cfg(test)]
#[path = "tests/completion_tests.rs"]
mod completion_tests;
