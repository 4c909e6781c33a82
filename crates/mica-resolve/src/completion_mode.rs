//! Completion-mode policy.
//!
//! Chosen once per completion attempt. FULL is terminal for the candidate;
//! PARTIAL leaves inference open for an enclosing call; UNTIL_FIRST_LAMBDA is
//! never produced here — it exists only inside the cross-candidate lambda
//! disambiguation protocol.

use crate::call_completer::ExpectedType;
use crate::candidate::CallCandidate;
use mica_solver::{CompletionMode, TrivialConstraintOracle, TypeId, collect_inference_vars};
use rustc_hash::FxHashSet;
use tracing::trace;

pub struct CompletionModeCalculator;

impl CompletionModeCalculator {
    /// Decide how far this candidate's completion runs.
    ///
    /// PARTIAL applies exactly when the call could still learn something
    /// from its context: no expected type is available and the result type
    /// reaches an unfixed variable whose constraints are not all trivial.
    /// Everything else completes fully.
    pub fn compute(
        candidate: &mut CallCandidate,
        expected_type: ExpectedType,
        result_type: Option<TypeId>,
        oracle: &TrivialConstraintOracle,
    ) -> CompletionMode {
        if !matches!(expected_type, ExpectedType::None) {
            return CompletionMode::Full;
        }
        let Some(result_type) = result_type else {
            return CompletionMode::Full;
        };

        let system = candidate.system_mut();
        let mut result_vars = FxHashSet::default();
        collect_inference_vars(system.interner(), result_type, &mut result_vars);
        if result_vars.is_empty() {
            return CompletionMode::Full;
        }

        for var in system.not_fixed_type_variables() {
            if !result_vars.contains(&var.0) {
                continue;
            }
            let info = system.variable_constraints(var);
            if !oracle.is_trivially_constrained(&info) {
                trace!(?var, "deferring completion: result variable still informative");
                return CompletionMode::Partial;
            }
        }
        CompletionMode::Full
    }
}
