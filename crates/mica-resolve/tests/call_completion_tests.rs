//! Candidate selection, completion modes, and result packaging.

mod common;

use common::{Fixture, TestCallbacks};
use mica_resolve::{
    CallResolutionResult, CallCompleter, ExpectedType, LambdaAnalyzer, ResolutionDiagnostic,
};
use mica_solver::TypeId;

fn completer() -> CallCompleter<LambdaAnalyzer> {
    CallCompleter::new(LambdaAnalyzer::new())
}

#[test]
fn test_single_candidate_completes_fully() {
    let fixture = Fixture::new();
    let callbacks = TestCallbacks::new();
    let candidate = fixture.simple_candidate("greet", TypeId::STRING);

    let result = completer().run_completion(
        &fixture.error_factory(),
        vec![candidate],
        ExpectedType::None,
        &callbacks,
    );

    match result {
        CallResolutionResult::Completed { diagnostics, storage, resolved_call } => {
            assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
            assert!(!storage.has_contradiction);
            assert!(!resolved_call.descriptor.is_error_marker());
        }
        _ => panic!("expected a completed result"),
    }
}

#[test]
fn test_generic_candidate_fixes_variables_under_expected_type() {
    let fixture = Fixture::new();
    let callbacks = TestCallbacks::new();
    let (candidate, var) = fixture.generic_candidate("make", TypeId::INT);

    let result = completer().run_completion(
        &fixture.error_factory(),
        vec![candidate],
        ExpectedType::Type(TypeId::ANY),
        &callbacks,
    );

    match result {
        CallResolutionResult::Completed { diagnostics, storage, .. } => {
            assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
            assert_eq!(storage.fixed.get(&var), Some(&TypeId::INT));
            assert!(storage.not_fixed.is_empty());
        }
        _ => panic!("expected a completed result"),
    }
}

#[test]
fn test_empty_candidate_set_yields_error_with_diagnostic() {
    let fixture = Fixture::new();
    let callbacks = TestCallbacks::new();

    let result = completer().run_completion(
        &fixture.error_factory(),
        Vec::new(),
        ExpectedType::None,
        &callbacks,
    );

    match result {
        CallResolutionResult::Error { diagnostics, resolved_call, .. } => {
            assert_eq!(diagnostics, vec![ResolutionDiagnostic::NoneCandidates]);
            assert!(resolved_call.descriptor.is_error_marker());
        }
        _ => panic!("expected an error result"),
    }
}

#[test]
fn test_many_candidates_yield_error_with_diagnostic() {
    let fixture = Fixture::new();
    let callbacks = TestCallbacks::new();
    let candidates = vec![
        fixture.simple_candidate("first", TypeId::INT),
        fixture.simple_candidate("second", TypeId::STRING),
    ];

    let result = completer().run_completion(
        &fixture.error_factory(),
        candidates,
        ExpectedType::None,
        &callbacks,
    );

    match result {
        CallResolutionResult::Error { diagnostics, resolved_call, .. } => {
            assert_eq!(
                diagnostics,
                vec![ResolutionDiagnostic::ManyCandidates { count: 2 }]
            );
            assert!(resolved_call.descriptor.is_error_marker());
        }
        _ => panic!("expected an error result"),
    }
}

#[test]
fn test_selection_failure_is_idempotent() {
    let fixture = Fixture::new();
    let callbacks = TestCallbacks::new();

    let diagnostics_of = |candidates| {
        let result = completer().run_completion(
            &fixture.error_factory(),
            candidates,
            ExpectedType::None,
            &callbacks,
        );
        result.diagnostics().to_vec()
    };

    let first = diagnostics_of(vec![
        fixture.simple_candidate("first", TypeId::INT),
        fixture.simple_candidate("second", TypeId::STRING),
    ]);
    let second = diagnostics_of(vec![
        fixture.simple_candidate("first", TypeId::INT),
        fixture.simple_candidate("second", TypeId::STRING),
    ]);
    assert_eq!(first, second);
}

#[test]
fn test_declining_session_forwards_partial_result() {
    let fixture = Fixture::new();
    let callbacks = TestCallbacks::deferring_session();
    let (candidate, var) = fixture.generic_candidate("make", TypeId::INT);

    let result = completer().run_completion(
        &fixture.error_factory(),
        vec![candidate],
        ExpectedType::Type(TypeId::ANY),
        &callbacks,
    );

    match result {
        CallResolutionResult::Partial { forwarded_to_session, storage, .. } => {
            assert!(forwarded_to_session);
            // Completion never ran: the variable is still open for the
            // enclosing session.
            assert_eq!(storage.not_fixed, vec![var]);
        }
        _ => panic!("expected a forwarded partial result"),
    }
}

#[test]
fn test_partial_completion_without_expected_type() {
    let fixture = Fixture::new();
    let callbacks = TestCallbacks::new();
    let (candidate, var) = fixture.generic_candidate("make", TypeId::INT);

    let result = completer().run_completion(
        &fixture.error_factory(),
        vec![candidate],
        ExpectedType::None,
        &callbacks,
    );

    match result {
        CallResolutionResult::Partial { forwarded_to_session, storage, diagnostics, .. } => {
            assert!(!forwarded_to_session);
            assert_eq!(storage.not_fixed, vec![var]);
            assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
        }
        _ => panic!("expected a partial result"),
    }
}

#[test]
fn test_unconstrained_variable_reports_inference_failure() {
    let fixture = Fixture::new();
    let callbacks = TestCallbacks::new();
    let (candidate, var) = fixture.unconstrained_candidate("mystery");

    let result = completer().run_completion(
        &fixture.error_factory(),
        vec![candidate],
        ExpectedType::None,
        &callbacks,
    );

    // Only trivial information is missing, so the call completes fully but
    // records the inference failure.
    match result {
        CallResolutionResult::Completed { diagnostics, storage, .. } => {
            assert_eq!(storage.fixed.get(&var), Some(&TypeId::ERROR));
            assert!(diagnostics.iter().any(|diagnostic| matches!(
                diagnostic,
                ResolutionDiagnostic::ConstraintError(_)
            )));
        }
        _ => panic!("expected a completed result"),
    }
}

#[test]
fn test_lambda_argument_drives_stub_binding_and_body_analysis() {
    let fixture = Fixture::new();
    let callbacks = TestCallbacks::new();
    let lambda = fixture.lambda_expression(&["it"]);
    let candidate = fixture.lambda_candidate("run", &lambda, TypeId::INT, None);

    let result = completer().run_completion(
        &fixture.error_factory(),
        vec![candidate],
        ExpectedType::Type(TypeId::ANY),
        &callbacks,
    );

    assert_eq!(callbacks.stub_bindings.get(), 1);
    assert_eq!(callbacks.analyze_count.get(), 1);
    match result {
        CallResolutionResult::Completed { storage, .. } => {
            // The body's returned type flowed into the lambda's return slot.
            assert!(storage.fixed.values().any(|&ty| ty == TypeId::BOOL));
        }
        _ => panic!("expected a completed result"),
    }
}

#[test]
fn test_cast_target_constrains_return_under_feature() {
    use mica_resolve::LanguageFeatures;

    let fixture = Fixture::with_features(LanguageFeatures::EXPECTED_TYPE_FROM_CAST);
    let mut callbacks = TestCallbacks::new();
    callbacks.cast_target = Some(TypeId::STRING);
    let (candidate, var) = fixture.unconstrained_candidate("parse");

    let result = completer().run_completion(
        &fixture.error_factory(),
        vec![candidate],
        ExpectedType::Type(TypeId::ANY),
        &callbacks,
    );

    // The cast target is the tighter of the two upper bounds.
    match result {
        CallResolutionResult::Completed { storage, diagnostics, .. } => {
            assert_eq!(storage.fixed.get(&var), Some(&TypeId::STRING));
            assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
        }
        _ => panic!("expected a completed result"),
    }
}

#[test]
fn test_cast_target_ignored_without_feature() {
    let fixture = Fixture::new();
    let mut callbacks = TestCallbacks::new();
    callbacks.cast_target = Some(TypeId::STRING);
    let (candidate, var) = fixture.unconstrained_candidate("parse");

    let result = completer().run_completion(
        &fixture.error_factory(),
        vec![candidate],
        ExpectedType::Type(TypeId::ANY),
        &callbacks,
    );

    match result {
        CallResolutionResult::Completed { storage, .. } => {
            assert_eq!(storage.fixed.get(&var), Some(&TypeId::ANY));
        }
        _ => panic!("expected a completed result"),
    }
}

#[test]
fn test_sam_adapter_with_trailing_vararg_warns_without_blocking() {
    use mica_resolve::LanguageFeatures;

    let fixture = Fixture::with_features(LanguageFeatures::SAM_CONVERSION_PER_ARGUMENT);
    let callbacks = TestCallbacks::new();
    let candidate = fixture.sam_adapter_candidate("listener");

    let result = completer().run_completion(
        &fixture.error_factory(),
        vec![candidate],
        ExpectedType::None,
        &callbacks,
    );

    match result {
        CallResolutionResult::Completed { diagnostics, .. } => {
            assert_eq!(
                diagnostics,
                vec![ResolutionDiagnostic::ResolvedToSamWithVararg { argument_index: 0 }]
            );
        }
        _ => panic!("warning-level diagnostics must not block completion"),
    }
}

#[test]
fn test_sam_vararg_warning_suppressed_by_prohibition_feature() {
    use mica_resolve::LanguageFeatures;

    let fixture = Fixture::with_features(
        LanguageFeatures::SAM_CONVERSION_PER_ARGUMENT
            | LanguageFeatures::PROHIBIT_VARARG_AS_ARRAY_AFTER_SAM,
    );
    let callbacks = TestCallbacks::new();
    let candidate = fixture.sam_adapter_candidate("listener");

    let result = completer().run_completion(
        &fixture.error_factory(),
        vec![candidate],
        ExpectedType::None,
        &callbacks,
    );

    // Under the prohibition the argument is rejected elsewhere; the
    // transitional warning is gone.
    assert!(result.diagnostics().is_empty());
}

#[test]
fn test_callable_reference_completes_against_reflection_type() {
    let fixture = Fixture::new();
    let callbacks = TestCallbacks::new();
    let reflection = fixture.interner.function([TypeId::INT], TypeId::STRING);
    let candidate = fixture.reference_candidate("::parse", reflection);

    let result = completer().run_completion(
        &fixture.error_factory(),
        vec![candidate],
        ExpectedType::None,
        &callbacks,
    );

    match result {
        CallResolutionResult::Completed { diagnostics, storage, .. } => {
            assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
            assert!(!storage.has_contradiction);
        }
        _ => panic!("expected a completed result"),
    }
    // Reference candidates never bind stub calls for lambda arguments.
    assert_eq!(callbacks.stub_bindings.get(), 0);
}

#[test]
fn test_packaged_diagnostics_round_trip_candidate_diagnostics() {
    let fixture = Fixture::new();
    let callbacks = TestCallbacks::new();
    let mut candidate = fixture.simple_candidate("greet", TypeId::STRING);
    candidate
        .diagnostics_mut()
        .push(ResolutionDiagnostic::ResolvedToSamWithVararg { argument_index: 0 });

    let result = completer().run_completion(
        &fixture.error_factory(),
        vec![candidate],
        ExpectedType::None,
        &callbacks,
    );

    // Holder contents (empty here) plus the candidate's own pre-existing
    // diagnostics, with no loss or duplication.
    assert_eq!(
        result.diagnostics(),
        &[ResolutionDiagnostic::ResolvedToSamWithVararg { argument_index: 0 }]
    );
}
