//! The call completer.
//!
//! Top level of the engine: selects one candidate out of the collected set
//! (synthesizing an error candidate when selection fails), seeds
//! expected-type constraints, picks a completion mode, drives the constraint
//! system to a fixed point, and packages the outcome. Also hosts the
//! cross-candidate lambda disambiguation protocol and the all-candidates
//! tooling entry.

use crate::analyzer::PostponedArgumentsAnalyzer;
use crate::atoms::{LambdaExpression, ResolvedLambdaAtom};
use crate::candidate::{CallCandidate, CandidateFactory};
use crate::completion_mode::CompletionModeCalculator;
use crate::diagnostics::{DiagnosticsHolder, ResolutionDiagnostic};
use crate::features::LanguageFeatures;
use crate::result::{CallResolutionResult, CandidateWithDiagnostics};
use indexmap::IndexMap;
use mica_solver::{
    CompletionMode, ConstraintPosition, ConstraintSystemCompleter, TrivialConstraintOracle, TypeId,
    instantiate_type, is_function_type,
};
use std::rc::Rc;
use tracing::{debug, trace};

/// The expected type a call is completed against.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExpectedType {
    /// No constraint from context.
    None,
    /// The call is in statement position: its result must be exactly
    /// unit-compatible.
    Unit,
    /// A concrete expected type; the call's result must be a subtype.
    Type(TypeId),
}

/// Turns `(candidates, expected type)` into a [`CallResolutionResult`].
pub struct CallCompleter<A> {
    postponed_arguments_analyzer: A,
    constraint_system_completer: ConstraintSystemCompleter,
    trivial_constraint_oracle: TrivialConstraintOracle,
}

impl<A: PostponedArgumentsAnalyzer> CallCompleter<A> {
    pub fn new(postponed_arguments_analyzer: A) -> Self {
        Self {
            postponed_arguments_analyzer,
            constraint_system_completer: ConstraintSystemCompleter::new(),
            trivial_constraint_oracle: TrivialConstraintOracle::new(),
        }
    }

    /// Complete the call: select a candidate, propagate expected-type
    /// constraints, run completion in the computed mode, and package the
    /// result. Selection failure (zero or many candidates) is reported as a
    /// diagnostic on a synthesized error candidate, never as a failure of
    /// the engine itself.
    pub fn run_completion(
        &mut self,
        factory: &dyn CandidateFactory,
        candidates: Vec<CallCandidate>,
        expected_type: ExpectedType,
        callbacks: &dyn crate::callbacks::ResolutionCallbacks,
    ) -> CallResolutionResult {
        let mut diagnostics_holder = DiagnosticsHolder::new();
        match candidates.len() {
            0 => diagnostics_holder.add_diagnostic(ResolutionDiagnostic::NoneCandidates),
            count if count > 1 => {
                diagnostics_holder.add_diagnostic(ResolutionDiagnostic::ManyCandidates { count });
            }
            _ => {}
        }

        let mut candidate = prepare_candidate_for_completion(factory, candidates, callbacks);
        let result_type = if matches!(candidate, CallCandidate::Regular(_)) {
            check_sam_with_vararg(&candidate, &mut diagnostics_holder);
            let return_type = substituted_return_type(&candidate);
            add_expected_type_constraint(&mut candidate, return_type, expected_type);
            add_expected_type_from_cast_constraint(&mut candidate, return_type, callbacks);
            return_type
        } else {
            substituted_reflection_type(&candidate)
        };

        let completion_mode = CompletionModeCalculator::compute(
            &mut candidate,
            expected_type,
            result_type,
            &self.trivial_constraint_oracle,
        );
        debug!(?completion_mode, ?expected_type, "completing selected candidate");

        match completion_mode {
            CompletionMode::Full => {
                if callbacks.inference_session().should_run_completion(&candidate) {
                    self.complete_candidate(
                        &mut candidate,
                        CompletionMode::Full,
                        &mut diagnostics_holder,
                        callbacks,
                        false,
                    );
                    as_call_resolution_result(candidate, CompletionMode::Full, &diagnostics_holder, false)
                } else {
                    as_call_resolution_result(candidate, CompletionMode::Partial, &diagnostics_holder, true)
                }
            }
            CompletionMode::Partial => {
                self.complete_candidate(
                    &mut candidate,
                    CompletionMode::Partial,
                    &mut diagnostics_holder,
                    callbacks,
                    false,
                );
                as_call_resolution_result(candidate, CompletionMode::Partial, &diagnostics_holder, false)
            }
            CompletionMode::UntilFirstLambda => panic!(
                "invariant violation: until-first-lambda completion requested outside \
                 lambda overload disambiguation"
            ),
        }
    }

    /// Cross-candidate lambda disambiguation.
    ///
    /// When the surviving overloads of one call site share a single
    /// unanalyzed lambda whose parameter types differ only by overload, the
    /// lambda's body is analyzed exactly once — against the first candidate's
    /// fixed input types — and the results are propagated onto every sibling.
    /// Candidates are then partitioned by success; the successful subset is
    /// returned when non-empty, the errored subset otherwise. Any bail-out
    /// returns the (regular) candidate set unchanged.
    pub fn choose_candidate_regarding_overload_resolution_by_lambda_return_type(
        &mut self,
        candidates: Vec<CallCandidate>,
        callbacks: &dyn crate::callbacks::ResolutionCallbacks,
    ) -> Vec<CallCandidate> {
        let mut candidates: Vec<CallCandidate> = candidates
            .into_iter()
            .filter(|candidate| matches!(candidate, CallCandidate::Regular(_)))
            .collect();

        // Group the postponed lambda atoms by the identity of their source
        // expression; disambiguation only applies to the single-common-lambda
        // case.
        let mut groups: IndexMap<*const LambdaExpression, Vec<(usize, Rc<ResolvedLambdaAtom>)>> =
            IndexMap::new();
        for (index, candidate) in candidates.iter().enumerate() {
            for atom in candidate.resolved_call().lambda_atoms() {
                if atom.analyzed() {
                    continue;
                }
                groups
                    .entry(Rc::as_ptr(&atom.expression))
                    .or_default()
                    .push((index, atom));
            }
        }
        if groups.len() != 1 {
            return candidates;
        }
        let Some((_, group)) = groups.pop() else {
            return candidates;
        };
        let lambdas: IndexMap<usize, Rc<ResolvedLambdaAtom>> = group.into_iter().collect();
        let Some(first_atom_in_group) = lambdas.values().next() else {
            return candidates;
        };

        let parameter_count = first_atom_in_group.parameter_count();
        if !lambdas.values().all(|atom| atom.parameter_count() == parameter_count) {
            return candidates;
        }
        {
            let Some(first_candidate) = candidates.first() else {
                return candidates;
            };
            let interner = Rc::clone(first_candidate.system().interner());
            let function_typed = lambdas.values().all(|atom| {
                atom.expected_type
                    .is_some_and(|ty| is_function_type(&interner, ty))
            });
            if !function_typed {
                return candidates;
            }
        }

        // Fix enough of each candidate's system to determine the lambda's
        // input types.
        for (&index, _) in &lambdas {
            let mut holder = DiagnosticsHolder::new();
            self.complete_candidate(
                &mut candidates[index],
                CompletionMode::UntilFirstLambda,
                &mut holder,
                callbacks,
                false,
            );
            let collected = holder.collect_all();
            candidates[index].diagnostics_mut().extend(collected);
        }

        let mut input_types = Vec::with_capacity(lambdas.len());
        for (&index, atom) in &lambdas {
            input_types.push(
                self.constraint_system_completer
                    .prepare_lambda_input_types(candidates[index].system_mut(), atom.as_ref()),
            );
        }
        if !input_types.windows(2).all(|pair| pair[0] == pair[1]) {
            trace!("lambda input types disagree across candidates, keeping ambiguity");
            return candidates;
        }

        let shared_atoms: Vec<Rc<ResolvedLambdaAtom>> = lambdas.values().cloned().collect();
        callbacks.record_inlinability_of_lambda(&shared_atoms);

        // Analyze the body once, against the first candidate's inputs, then
        // propagate onto every sibling. Strictly sequential: all propagations
        // finish before any candidate's success flag is read.
        let mut lambda_diagnostics = DiagnosticsHolder::new();
        let mut entries = lambdas.iter();
        let Some((&first_index, first_atom)) = entries.next() else {
            return candidates;
        };
        debug!(candidates = lambdas.len(), "analyzing shared lambda once");
        let results = self.postponed_arguments_analyzer.analyze_lambda(
            candidates[first_index].system_mut(),
            callbacks,
            first_atom,
            CompletionMode::Full,
            &mut lambda_diagnostics,
        );
        for (&index, atom) in entries {
            self.postponed_arguments_analyzer.apply_results_of_analyzed_lambda(
                candidates[index].system_mut(),
                atom,
                &results,
                CompletionMode::Full,
                &mut lambda_diagnostics,
            );
        }

        let (successful, errored): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|candidate| candidate.is_successful());
        if !successful.is_empty() { successful } else { errored }
    }

    /// Tooling entry: complete every candidate independently in FULL mode
    /// with postponed atoms left unanalyzed, pairing each with its own
    /// diagnostics. No candidate is dropped or chosen.
    pub fn create_all_candidates_result(
        &mut self,
        candidates: Vec<CallCandidate>,
        expected_type: ExpectedType,
        callbacks: &dyn crate::callbacks::ResolutionCallbacks,
    ) -> CallResolutionResult {
        let mut completed = Vec::with_capacity(candidates.len());
        for mut candidate in candidates {
            let mut holder = DiagnosticsHolder::new();
            let return_type = substituted_return_type(&candidate);
            add_expected_type_constraint(&mut candidate, return_type, expected_type);
            self.complete_candidate(
                &mut candidate,
                CompletionMode::Full,
                &mut holder,
                callbacks,
                true,
            );
            let mut diagnostics = holder.collect_all();
            diagnostics.extend(candidate.diagnostics().iter().cloned());
            completed.push(CandidateWithDiagnostics {
                candidate,
                diagnostics,
            });
        }
        CallResolutionResult::AllCandidates(completed)
    }

    /// Drive the candidate's constraint system in the given mode. The stall
    /// callback marks atoms empty-analyzed in collect-all-candidates mode and
    /// delegates to the postponed-arguments analyzer otherwise. Errors the
    /// system accumulated are merged into the holder afterwards.
    fn complete_candidate(
        &mut self,
        candidate: &mut CallCandidate,
        mode: CompletionMode,
        diagnostics_holder: &mut DiagnosticsHolder,
        callbacks: &dyn crate::callbacks::ResolutionCallbacks,
        collect_all_candidates_mode: bool,
    ) {
        let interner = Rc::clone(candidate.system().interner());
        let return_type = candidate
            .resolved_call()
            .fresh_return_type(&interner)
            .unwrap_or(TypeId::UNIT);
        let atoms = candidate.resolved_call().lambda_atoms();

        let completer = &self.constraint_system_completer;
        let analyzer = &mut self.postponed_arguments_analyzer;
        let system = candidate.system_mut();
        completer.run_completion(system, mode, &atoms, return_type, |system, atom| {
            if collect_all_candidates_mode {
                atom.set_empty_analyzed_results();
            } else {
                analyzer.analyze_lambda(system, callbacks, atom, mode, diagnostics_holder);
            }
        });

        for error in candidate.system().errors().to_vec() {
            diagnostics_holder.add_error(error);
        }
    }
}

/// Select the single candidate, or synthesize a forced error candidate. The
/// "none"/"many" diagnostic was already recorded by the caller.
fn prepare_candidate_for_completion(
    factory: &dyn CandidateFactory,
    mut candidates: Vec<CallCandidate>,
    callbacks: &dyn crate::callbacks::ResolutionCallbacks,
) -> CallCandidate {
    let candidate = if candidates.len() == 1 { candidates.pop() } else { None };

    if let Some(candidate) = &candidate {
        let resolved_call = candidate.resolved_call();
        // Non-local-return analysis of a lambda body needs the outer call
        // bound before the lambda is analyzed.
        if resolved_call.has_lambda_arguments() {
            callbacks.bind_stub_resolved_call_for_candidate(resolved_call);
        }
        callbacks.disable_contracts_if_necessary(resolved_call);
    }

    candidate.unwrap_or_else(|| factory.create_error_candidate())
}

/// The candidate's declared return type remapped into its own system.
fn substituted_return_type(candidate: &CallCandidate) -> Option<TypeId> {
    let resolved_call = candidate.resolved_call();
    let interner = candidate.system().interner();
    resolved_call
        .descriptor
        .return_type
        .map(|ty| instantiate_type(interner, ty, &resolved_call.fresh_variables_substitutor))
}

/// A callable-reference candidate's reflection type, remapped the same way.
fn substituted_reflection_type(candidate: &CallCandidate) -> Option<TypeId> {
    match candidate {
        CallCandidate::CallableReference(reference) => Some(instantiate_type(
            reference.system.interner(),
            reference.reflection_type,
            &reference.resolved_call.fresh_variables_substitutor,
        )),
        CallCandidate::Regular(_) => None,
    }
}

/// Expected-type propagation. No constraint when the return type is absent,
/// there is no expected type, or every variable is already fixed — in the
/// latter case the later expression-type check owns the mismatch, and
/// constraining here would widen literal-typed operators like `1 + 1`.
fn add_expected_type_constraint(
    candidate: &mut CallCandidate,
    return_type: Option<TypeId>,
    expected_type: ExpectedType,
) {
    let Some(return_type) = return_type else { return };
    if matches!(expected_type, ExpectedType::None) {
        return;
    }
    let system = candidate.system_mut();
    if system.not_fixed_type_variables().is_empty() {
        return;
    }
    match expected_type {
        ExpectedType::Unit => {
            // Statement position: the result must infer exactly
            // unit-compatible, so this is an equality, not a subtype edge.
            system.add_equality_constraint_if_compatible(
                return_type,
                TypeId::UNIT,
                ConstraintPosition::ExpectedType,
            );
        }
        ExpectedType::Type(expected) => {
            system.add_subtype_constraint(return_type, expected, ConstraintPosition::ExpectedType);
        }
        ExpectedType::None => {}
    }
}

/// Independent propagation of an enclosing cast expression's target type,
/// active only under the corresponding language feature and only when the
/// callbacks layer supplies a target.
fn add_expected_type_from_cast_constraint(
    candidate: &mut CallCandidate,
    return_type: Option<TypeId>,
    callbacks: &dyn crate::callbacks::ResolutionCallbacks,
) {
    if !candidate
        .components()
        .language_features
        .contains(LanguageFeatures::EXPECTED_TYPE_FROM_CAST)
    {
        return;
    }
    let Some(return_type) = return_type else { return };
    let Some(expected) = callbacks.expected_type_from_cast_expression(candidate.resolved_call())
    else {
        return;
    };
    candidate.system_mut().add_subtype_constraint(
        return_type,
        expected,
        ConstraintPosition::ExpectedTypeFromCast,
    );
}

/// SAM-conversion edge case: a synthetic SAM adapter over a base callable
/// with a trailing vararg gets a warning-level diagnostic on the last
/// argument, under the per-argument conversion feature without the
/// prohibition feature.
fn check_sam_with_vararg(candidate: &CallCandidate, diagnostics_holder: &mut DiagnosticsHolder) {
    let features = candidate.components().language_features;
    let warn_for_vararg_after_sam = features.contains(LanguageFeatures::SAM_CONVERSION_PER_ARGUMENT)
        && !features.contains(LanguageFeatures::PROHIBIT_VARARG_AS_ARRAY_AFTER_SAM);
    if !warn_for_vararg_after_sam {
        return;
    }
    let resolved_call = candidate.resolved_call();
    let Some(base) = resolved_call.descriptor.synthetic_sam_base.as_ref() else {
        return;
    };
    if !base.has_trailing_vararg {
        return;
    }
    let Some(argument_index) = resolved_call.arguments.len().checked_sub(1) else {
        return;
    };
    diagnostics_holder
        .add_diagnostic(ResolutionDiagnostic::ResolvedToSamWithVararg { argument_index });
}

/// Package the candidate as a terminal result. Error classification
/// dominates mode; the storage snapshot is taken here, at packaging time.
fn as_call_resolution_result(
    mut candidate: CallCandidate,
    mode: CompletionMode,
    diagnostics_holder: &DiagnosticsHolder,
    forwarded_to_session: bool,
) -> CallResolutionResult {
    let storage = candidate.system_mut().as_read_only_storage();
    let mut diagnostics = diagnostics_holder.collect_all();
    diagnostics.extend(candidate.diagnostics().iter().cloned());
    let resolved_call = Rc::clone(candidate.resolved_call());

    if candidate.is_error_candidate() {
        return CallResolutionResult::Error {
            resolved_call,
            diagnostics,
            storage,
        };
    }
    if mode == CompletionMode::Full {
        CallResolutionResult::Completed {
            resolved_call,
            diagnostics,
            storage,
        }
    } else {
        CallResolutionResult::Partial {
            resolved_call,
            diagnostics,
            storage,
            forwarded_to_session,
        }
    }
}
