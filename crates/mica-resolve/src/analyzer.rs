//! Postponed-argument analysis.
//!
//! A postponed lambda atom is analyzed at most once per call site. The
//! analyzer's first method runs the body against fixed input types and
//! records the results on the atom; the second replays recorded results onto
//! a sibling candidate's constraint system without re-running the body.

use crate::atoms::ResolvedLambdaAtom;
use crate::callbacks::ResolutionCallbacks;
use crate::diagnostics::DiagnosticsHolder;
use mica_solver::{
    CompletionMode, ConstraintPosition, ConstraintSystem, TypeId, contains_inference_vars,
};
use std::rc::Rc;
use tracing::debug;

/// The outcome of analyzing one lambda body: the types of its returned
/// expressions, one entry per return point.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LambdaAnalysisResult {
    pub returned_types: Vec<TypeId>,
}

impl LambdaAnalysisResult {
    pub fn new(returned_types: Vec<TypeId>) -> Self {
        Self { returned_types }
    }

    /// The empty result used when bodies are deliberately left unanalyzed.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Analyzes one postponed atom against fixed input types, and propagates
/// already-computed results onto sibling candidates sharing the same lambda.
pub trait PostponedArgumentsAnalyzer {
    fn analyze_lambda(
        &mut self,
        system: &mut ConstraintSystem,
        callbacks: &dyn ResolutionCallbacks,
        atom: &Rc<ResolvedLambdaAtom>,
        mode: CompletionMode,
        diagnostics: &mut DiagnosticsHolder,
    ) -> LambdaAnalysisResult;

    fn apply_results_of_analyzed_lambda(
        &mut self,
        system: &mut ConstraintSystem,
        atom: &Rc<ResolvedLambdaAtom>,
        results: &LambdaAnalysisResult,
        mode: CompletionMode,
        diagnostics: &mut DiagnosticsHolder,
    );
}

/// Default analyzer: substitutes the atom's input types through the owning
/// system, delegates body checking to the callbacks layer, and constrains
/// each returned type under the lambda's return slot.
pub struct LambdaAnalyzer;

impl LambdaAnalyzer {
    pub fn new() -> Self {
        LambdaAnalyzer
    }

    fn constrain_returned_types(
        system: &mut ConstraintSystem,
        atom: &ResolvedLambdaAtom,
        results: &LambdaAnalysisResult,
    ) {
        for &returned in &results.returned_types {
            system.add_subtype_constraint(returned, atom.return_type, ConstraintPosition::LambdaReturn);
        }
    }
}

impl PostponedArgumentsAnalyzer for LambdaAnalyzer {
    fn analyze_lambda(
        &mut self,
        system: &mut ConstraintSystem,
        callbacks: &dyn ResolutionCallbacks,
        atom: &Rc<ResolvedLambdaAtom>,
        mode: CompletionMode,
        _diagnostics: &mut DiagnosticsHolder,
    ) -> LambdaAnalysisResult {
        let input_types: Vec<_> = atom
            .input_types
            .iter()
            .map(|&ty| system.substitute(ty))
            .collect();
        let expected_return = {
            let substituted = system.substitute(atom.return_type);
            (!contains_inference_vars(system.interner(), substituted)).then_some(substituted)
        };
        debug!(?mode, ?input_types, ?expected_return, "analyzing lambda body");

        let returned = callbacks.analyze_lambda_body(&atom.expression, &input_types, expected_return);
        let results = LambdaAnalysisResult::new(returned);
        Self::constrain_returned_types(system, atom, &results);
        atom.mark_analyzed(results.clone());
        results
    }

    fn apply_results_of_analyzed_lambda(
        &mut self,
        system: &mut ConstraintSystem,
        atom: &Rc<ResolvedLambdaAtom>,
        results: &LambdaAnalysisResult,
        mode: CompletionMode,
        _diagnostics: &mut DiagnosticsHolder,
    ) {
        debug!(?mode, "applying shared lambda analysis results");
        Self::constrain_returned_types(system, atom, results);
        atom.mark_analyzed(results.clone());
    }
}

impl Default for LambdaAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
