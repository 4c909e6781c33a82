//! Trait seams to the surrounding front end.

use crate::atoms::{LambdaExpression, ResolvedCallAtom, ResolvedLambdaAtom};
use crate::candidate::CallCandidate;
use mica_solver::TypeId;
use std::rc::Rc;

/// Policy of the inference session a call is being completed under.
///
/// The session handle is threaded explicitly through the completion entry
/// points; there is no ambient/global session state.
pub trait InferenceSession {
    /// Whether full completion may run for this candidate now. Declining
    /// defers final fixation to the enclosing session: the candidate is
    /// completed partially and the result is flagged as forwarded.
    fn should_run_completion(&self, candidate: &CallCandidate) -> bool;
}

/// The session for top-level calls: completion always runs.
pub struct TopLevelInferenceSession;

impl InferenceSession for TopLevelInferenceSession {
    fn should_run_completion(&self, _candidate: &CallCandidate) -> bool {
        true
    }
}

/// Bridge to front-end machinery the completion engine must not own:
/// trace/record side effects, contract checking, cast-expression lookup, and
/// lambda body analysis.
pub trait ResolutionCallbacks {
    fn inference_session(&self) -> &dyn InferenceSession;

    /// Bind a stub resolved-call record for the candidate before its lambda
    /// arguments are analyzed. Non-local-return analysis of a lambda body
    /// needs the outer call bound first.
    fn bind_stub_resolved_call_for_candidate(&self, _resolved_call: &ResolvedCallAtom) {}

    /// Disable contract-checking machinery when the candidate signals it.
    fn disable_contracts_if_necessary(&self, _resolved_call: &ResolvedCallAtom) {}

    /// The target type of an enclosing cast expression, recorded in the
    /// trace as a side effect. `None` when there is no enclosing cast or the
    /// caller declines to supply one.
    fn expected_type_from_cast_expression(&self, _resolved_call: &ResolvedCallAtom) -> Option<TypeId> {
        None
    }

    /// Record inlinability of the lambdas participating in cross-candidate
    /// disambiguation, before the shared body analysis runs.
    fn record_inlinability_of_lambda(&self, _lambdas: &[Rc<ResolvedLambdaAtom>]) {}

    /// Type-check a lambda body against fixed input types, returning the
    /// types of its returned expressions. This is the single entry through
    /// which expression-body analysis (out of scope here) is reached.
    fn analyze_lambda_body(
        &self,
        expression: &Rc<LambdaExpression>,
        input_types: &[TypeId],
        expected_return_type: Option<TypeId>,
    ) -> Vec<TypeId>;
}
