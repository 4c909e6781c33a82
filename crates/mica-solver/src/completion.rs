//! Constraint-system completion.
//!
//! The [`ConstraintSystemCompleter`] drives a [`ConstraintSystem`] to a fixed
//! point: it alternates between fixing every "ready" variable and handing a
//! stalled, not-yet-analyzed postponed atom (a lambda or callable reference
//! whose body is deferred) to an analysis callback. Analysis adds constraints
//! back into the system, which unblocks further fixation.
//!
//! Three modes:
//! - [`CompletionMode::Full`]: every variable ends fixed; survivors with no
//!   usable constraints are reported and pinned to the error type.
//! - [`CompletionMode::Partial`]: fix what is locally determinable, leave the
//!   rest (in particular the variables of the top-level result type) for an
//!   enclosing inference session.
//! - [`CompletionMode::UntilFirstLambda`]: fix just enough to determine the
//!   input types of the first unanalyzed postponed atom, then stop. Used only
//!   by the cross-candidate lambda disambiguation protocol.

use crate::infer::{ConstraintError, ConstraintSystem, InferenceInfo, InferenceVar};
use crate::type_queries::{collect_inference_vars, contains_inference_vars, is_subtype};
use crate::types::TypeId;
use mica_common::limits::MAX_COMPLETION_ITERATIONS;
use rustc_hash::FxHashSet;
use std::rc::Rc;
use tracing::{debug, trace};

/// How far one completion attempt drives the constraint system.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CompletionMode {
    /// Solve every unfixed variable to a concrete type; terminal.
    Full,
    /// Solve as much as is locally determinable and stop.
    Partial,
    /// Solve only enough to fix the first unanalyzed lambda's input types.
    UntilFirstLambda,
}

/// A postponed sub-expression (lambda / callable reference) whose analysis is
/// deferred until its input types can be fixed.
pub trait PostponableAtom {
    /// The atom's input (parameter) types: variables or concrete types of the
    /// owning candidate's system.
    fn input_types(&self) -> Vec<TypeId>;

    /// The types the atom's analysis will constrain: its return slot.
    /// Variables reachable from here stay unfixed until the atom is analyzed.
    fn output_types(&self) -> Vec<TypeId>;

    /// Whether the atom's body has been analyzed. One-way: false to true.
    fn analyzed(&self) -> bool;
}

/// Decides whether a variable's constraints carry any information an
/// enclosing call could improve on.
///
/// A bound is trivial when it could not change the fixation result no matter
/// what an outer call adds: the bottom type or the error type as a lower
/// bound, the top type as an upper bound.
pub struct TrivialConstraintOracle;

impl TrivialConstraintOracle {
    pub fn new() -> Self {
        TrivialConstraintOracle
    }

    pub fn is_trivial_bound(&self, bound: TypeId) -> bool {
        bound == TypeId::NOTHING || bound == TypeId::ERROR
    }

    /// Whether every constraint on a variable is trivial.
    pub fn is_trivially_constrained(&self, info: &InferenceInfo) -> bool {
        info.equal_bounds.is_empty()
            && info.lower_bounds.iter().all(|&(ty, _)| self.is_trivial_bound(ty))
            && info.upper_bounds.iter().all(|&(ty, _)| ty == TypeId::ANY)
    }
}

impl Default for TrivialConstraintOracle {
    fn default() -> Self {
        Self::new()
    }
}

/// The fixed-point solver driver.
pub struct ConstraintSystemCompleter;

impl ConstraintSystemCompleter {
    pub fn new() -> Self {
        ConstraintSystemCompleter
    }

    /// Drive `system` to a fixed point in the given mode.
    ///
    /// `postponed_atoms` are the candidate's deferred lambda atoms;
    /// `top_level_type` is the call's return type (the variables it mentions
    /// are left unfixed in [`CompletionMode::Partial`]). `analyze` is invoked
    /// when progress stalls on a still-unanalyzed atom, after that atom's
    /// input-type variables have been fixed; it is expected to mark the atom
    /// analyzed and may add constraints to the system.
    pub fn run_completion<A, F>(
        &self,
        system: &mut ConstraintSystem,
        mode: CompletionMode,
        postponed_atoms: &[Rc<A>],
        top_level_type: TypeId,
        mut analyze: F,
    ) where
        A: PostponableAtom,
        F: FnMut(&mut ConstraintSystem, &Rc<A>),
    {
        debug!(?mode, atoms = postponed_atoms.len(), "running constraint system completion");
        let mut rounds = 0;
        loop {
            rounds += 1;
            if rounds > MAX_COMPLETION_ITERATIONS {
                debug!(rounds, "completion iteration limit reached, bailing out");
                break;
            }
            let fixed_any = self.fix_ready_variables(system, mode, top_level_type, postponed_atoms);

            if let Some(atom) = postponed_atoms.iter().find(|atom| !atom.analyzed()) {
                self.fix_input_variables(system, &atom.input_types());
                if mode == CompletionMode::UntilFirstLambda {
                    trace!("stopping at first unanalyzed lambda");
                    return;
                }
                analyze(system, atom);
                if atom.analyzed() || fixed_any {
                    continue;
                }
                // The callback neither analyzed the atom nor did fixation
                // progress; nothing further can change.
                break;
            }

            if system.not_fixed_type_variables().is_empty() || !fixed_any {
                break;
            }
        }

        if mode == CompletionMode::Full {
            self.report_not_enough_information(system, top_level_type);
        }
    }

    /// Fix the input-type variables of a postponed atom from their current
    /// constraints so the atom's body can be analyzed against concrete types.
    /// Inputs with no usable constraints are pinned to the error type.
    pub fn fix_input_variables(&self, system: &mut ConstraintSystem, input_types: &[TypeId]) {
        let interner = Rc::clone(system.interner());
        let mut vars = FxHashSet::default();
        for &input in input_types {
            // Substitute first so aliases of unified variables resolve to
            // their class representative before the membership check.
            let input = system.substitute(input);
            collect_inference_vars(&interner, input, &mut vars);
        }
        for var in system.not_fixed_type_variables() {
            if !vars.contains(&var.0) {
                continue;
            }
            match self.compute_fixation_result(system, var) {
                Some(result) => system.fix_variable(var, result),
                None => {
                    system.record_error(ConstraintError::NotEnoughInformation { var });
                    system.fix_variable(var, TypeId::ERROR);
                }
            }
        }
    }

    /// Substituted, fixed input types for a postponed atom. This is the
    /// preparation step of the cross-candidate lambda protocol: after it, two
    /// candidates agree on the atom's inputs iff the returned lists are equal.
    pub fn prepare_lambda_input_types<A>(
        &self,
        system: &mut ConstraintSystem,
        atom: &A,
    ) -> Vec<TypeId>
    where
        A: PostponableAtom,
    {
        let input_types = atom.input_types();
        self.fix_input_variables(system, &input_types);
        input_types.iter().map(|&ty| system.substitute(ty)).collect()
    }

    /// Fix every ready variable in registration order. A variable is ready
    /// when at least one of its bounds is proper (variable-free) after
    /// substitution, and it is not blocked: in Partial mode the variables of
    /// the top-level result type stay open for the enclosing session, and in
    /// every mode the variables an unanalyzed atom's output will constrain
    /// wait for that analysis. Returns whether anything was fixed.
    fn fix_ready_variables<A>(
        &self,
        system: &mut ConstraintSystem,
        mode: CompletionMode,
        top_level_type: TypeId,
        postponed_atoms: &[Rc<A>],
    ) -> bool
    where
        A: PostponableAtom,
    {
        let mut skip = FxHashSet::default();
        if mode == CompletionMode::Partial {
            collect_inference_vars(system.interner(), top_level_type, &mut skip);
        }
        for atom in postponed_atoms.iter().filter(|atom| !atom.analyzed()) {
            let interner = Rc::clone(system.interner());
            for output in atom.output_types() {
                let output = system.substitute(output);
                collect_inference_vars(&interner, output, &mut skip);
            }
        }

        let mut fixed_any = false;
        for var in system.not_fixed_type_variables() {
            if skip.contains(&var.0) {
                continue;
            }
            if let Some(result) = self.compute_fixation_result(system, var) {
                system.fix_variable(var, result);
                fixed_any = true;
            }
        }
        fixed_any
    }

    /// Compute the fixation result for `var` from its current bounds, or
    /// `None` when no bound is proper yet.
    ///
    /// An equality bound wins outright; otherwise the most general proper
    /// lower bound; otherwise the most specific proper upper bound. The
    /// result is validated against every proper upper bound, and violations
    /// are recorded on the system.
    fn compute_fixation_result(
        &self,
        system: &mut ConstraintSystem,
        var: InferenceVar,
    ) -> Option<TypeId> {
        let interner = Rc::clone(system.interner());
        let info = system.variable_constraints(var);
        let self_type = system.variable_type(var);

        let proper = |system: &mut ConstraintSystem, bounds: &[(TypeId, _)]| -> Vec<TypeId> {
            bounds
                .iter()
                .map(|&(ty, _)| system.substitute(ty))
                .filter(|&ty| ty != self_type && !contains_inference_vars(&interner, ty))
                .collect()
        };

        let equal = proper(system, &info.equal_bounds);
        if let Some(&first) = equal.first() {
            for &other in &equal[1..] {
                if other != first {
                    system.record_error(ConstraintError::ContradictoryBounds {
                        var,
                        first,
                        second: other,
                    });
                    return Some(TypeId::ERROR);
                }
            }
            self.validate_upper_bounds(system, &interner, var, first, &info);
            return Some(first);
        }

        let lowers = proper(system, &info.lower_bounds);
        if let Some(&first) = lowers.first() {
            let mut result = first;
            for &bound in &lowers[1..] {
                if is_subtype(&interner, result, bound) {
                    result = bound;
                } else if !is_subtype(&interner, bound, result) {
                    system.record_error(ConstraintError::ContradictoryBounds {
                        var,
                        first: result,
                        second: bound,
                    });
                    return Some(TypeId::ERROR);
                }
            }
            self.validate_upper_bounds(system, &interner, var, result, &info);
            return Some(result);
        }

        let uppers = proper(system, &info.upper_bounds);
        if let Some(&first) = uppers.first() {
            let mut result = first;
            for &bound in &uppers[1..] {
                if is_subtype(&interner, bound, result) {
                    result = bound;
                } else if !is_subtype(&interner, result, bound) {
                    system.record_error(ConstraintError::ContradictoryBounds {
                        var,
                        first: result,
                        second: bound,
                    });
                    return Some(TypeId::ERROR);
                }
            }
            return Some(result);
        }

        None
    }

    fn validate_upper_bounds(
        &self,
        system: &mut ConstraintSystem,
        interner: &crate::TypeInterner,
        var: InferenceVar,
        result: TypeId,
        info: &InferenceInfo,
    ) {
        let self_type = system.variable_type(var);
        for &(bound, position) in info.upper_bounds.iter() {
            let bound = system.substitute(bound);
            if bound == self_type || contains_inference_vars(interner, bound) {
                continue;
            }
            if !is_subtype(interner, result, bound) {
                system.record_error(ConstraintError::SubtypeViolation {
                    lower: result,
                    upper: bound,
                    position,
                });
            }
        }
    }

    /// Report every variable that survived full completion with no usable
    /// constraints, and pin it to the error type so completion is terminal.
    ///
    /// Pinning one variable can make another's bounds proper, so fixation is
    /// retried after each pin until no variable remains unfixed.
    fn report_not_enough_information(&self, system: &mut ConstraintSystem, top_level_type: TypeId) {
        loop {
            let unfixed = system.not_fixed_type_variables();
            if unfixed.is_empty() {
                return;
            }
            let mut progressed = false;
            for var in unfixed {
                if let Some(result) = self.compute_fixation_result(system, var) {
                    system.fix_variable(var, result);
                    progressed = true;
                }
            }
            if progressed {
                continue;
            }
            if let Some(&var) = system.not_fixed_type_variables().first() {
                trace!(?var, ?top_level_type, "not enough information to infer variable");
                system.record_error(ConstraintError::NotEnoughInformation { var });
                system.fix_variable(var, TypeId::ERROR);
            }
        }
    }
}

impl Default for ConstraintSystemCompleter {
    fn default() -> Self {
        Self::new()
    }
}
