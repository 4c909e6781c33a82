//! Centralized limits and thresholds for the mica compiler.
//!
//! This module provides shared constants for recursion depths and operation
//! counts used throughout the codebase. Centralizing these values:
//! - Prevents duplicate definitions with inconsistent values
//! - Documents the rationale for each limit

// =============================================================================
// Operation Count Limits (Solver)
// =============================================================================

/// Maximum number of fix/analyze rounds one constraint-system completion may
/// run.
///
/// The completion loop is monotone when driven correctly: each round either
/// fixes at least one type variable or analyzes one postponed atom, both of
/// which are one-way transitions. A misbehaving analysis callback (one that
/// neither marks its atom analyzed nor adds constraints) would otherwise loop
/// forever; at this bound the completer bails out and leaves the remaining
/// variables to the normal not-enough-information reporting.
pub const MAX_COMPLETION_ITERATIONS: usize = 256;

/// Maximum structural depth when decomposing a single constraint.
///
/// Subtype constraints between function types recurse into parameter and
/// return positions. Source-level types are shallow in practice; at this
/// depth the solver treats the constraint as satisfied rather than
/// overflowing the stack on pathological input.
pub const MAX_CONSTRAINT_DECOMPOSITION_DEPTH: usize = 64;

/// Maximum number of substitution passes when resolving a type through the
/// current substitutor.
///
/// Substitution is applied iteratively so chains of type variables
/// (`T := U`, `U := Int`) converge. Chains longer than this indicate a cycle
/// that the occurs check should have rejected; iteration stops and the
/// current type is returned as-is.
pub const MAX_SUBSTITUTION_PASSES: usize = 8;
