//! Shared fixtures for the resolution integration tests.
#![allow(dead_code)]

use mica_common::Interner;
use mica_resolve::{
    ArgumentAtom, CallCandidate, CallComponents, CallableDescriptor, CandidateFactory,
    InferenceSession, LambdaExpression, LanguageFeatures, RegularCandidate, ResolutionCallbacks,
    ResolvedCallAtom, ResolvedLambdaAtom,
};
use mica_solver::{
    ConstraintPosition, ConstraintSystem, InferenceVar, TypeId, TypeInterner, TypeSubstitution,
};
use std::cell::Cell;
use std::rc::Rc;

pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Interners plus default call components, shared by every candidate of a
/// simulated call site.
pub struct Fixture {
    pub names: Interner,
    pub interner: Rc<TypeInterner>,
    pub components: Rc<CallComponents>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_features(LanguageFeatures::empty())
    }

    pub fn with_features(language_features: LanguageFeatures) -> Self {
        init_tracing();
        Self {
            names: Interner::new(),
            interner: Rc::new(TypeInterner::new()),
            components: Rc::new(CallComponents { language_features }),
        }
    }

    fn system(&self) -> ConstraintSystem {
        ConstraintSystem::new(Rc::clone(&self.interner))
    }

    fn regular(
        &self,
        descriptor: CallableDescriptor,
        substitutor: TypeSubstitution,
        arguments: Vec<ArgumentAtom>,
        system: ConstraintSystem,
    ) -> CallCandidate {
        CallCandidate::Regular(RegularCandidate {
            resolved_call: Rc::new(ResolvedCallAtom {
                descriptor: Rc::new(descriptor),
                fresh_variables_substitutor: substitutor,
                arguments,
            }),
            system,
            components: Rc::clone(&self.components),
            diagnostics: Vec::new(),
        })
    }

    /// A monomorphic candidate: no type variables, a concrete return type.
    pub fn simple_candidate(&self, name: &str, return_type: TypeId) -> CallCandidate {
        let descriptor =
            CallableDescriptor::new(self.names.intern(name), Vec::new(), Some(return_type));
        self.regular(descriptor, TypeSubstitution::new(), Vec::new(), self.system())
    }

    /// A generic candidate `fun <T> make(x: T): T` whose single argument has
    /// already constrained `T` from below with `argument_type`. The
    /// declaration writes its return type with a declaration-local variable
    /// index, remapped into the candidate's system by the fresh-variables
    /// substitutor.
    pub fn generic_candidate(
        &self,
        name: &str,
        argument_type: TypeId,
    ) -> (CallCandidate, InferenceVar) {
        const DECL_LOCAL_T: u32 = 7;
        let mut system = self.system();
        let var = system.fresh_type_variable();
        let var_type = system.variable_type(var);
        system.add_subtype_constraint(argument_type, var_type, ConstraintPosition::Argument(0));

        let mut substitutor = TypeSubstitution::new();
        substitutor.insert(DECL_LOCAL_T, var_type);
        let descriptor = CallableDescriptor::new(
            self.names.intern(name),
            vec![self.interner.variable(DECL_LOCAL_T)],
            Some(self.interner.variable(DECL_LOCAL_T)),
        );
        let candidate = self.regular(
            descriptor,
            substitutor,
            vec![ArgumentAtom::Expression { type_id: argument_type }],
            system,
        );
        (candidate, var)
    }

    /// A generic candidate whose return variable has no constraints at all.
    pub fn unconstrained_candidate(&self, name: &str) -> (CallCandidate, InferenceVar) {
        let mut system = self.system();
        let var = system.fresh_type_variable();
        let var_type = system.variable_type(var);
        let descriptor = CallableDescriptor::new(self.names.intern(name), Vec::new(), Some(var_type));
        let candidate = self.regular(descriptor, TypeSubstitution::new(), Vec::new(), system);
        (candidate, var)
    }

    /// An overload candidate `fun <R> apply(f: (I) -> R): R` over a shared
    /// lambda expression. `lambda_return_slot` overrides the fresh return
    /// variable with a concrete slot when given.
    pub fn lambda_candidate(
        &self,
        name: &str,
        lambda: &Rc<LambdaExpression>,
        input_type: TypeId,
        lambda_return_slot: Option<TypeId>,
    ) -> CallCandidate {
        let mut system = self.system();
        let lambda_return = lambda_return_slot.unwrap_or_else(|| {
            let var = system.fresh_type_variable();
            system.variable_type(var)
        });
        let expected = self.interner.function([input_type], lambda_return);
        let atom = ResolvedLambdaAtom::new(
            Rc::clone(lambda),
            vec![input_type],
            lambda_return,
            Some(expected),
        );
        let descriptor = CallableDescriptor::new(
            self.names.intern(name),
            vec![expected],
            Some(lambda_return),
        );
        self.regular(
            descriptor,
            TypeSubstitution::new(),
            vec![ArgumentAtom::Lambda(atom)],
            system,
        )
    }

    /// `lambda_candidate` with explicit inputs and expected type, for the
    /// disambiguation bail-out cases.
    pub fn lambda_candidate_custom(
        &self,
        name: &str,
        lambda: &Rc<LambdaExpression>,
        input_types: Vec<TypeId>,
        expected_type: Option<TypeId>,
    ) -> CallCandidate {
        let mut system = self.system();
        let ret_var = system.fresh_type_variable();
        let lambda_return = system.variable_type(ret_var);
        let atom = ResolvedLambdaAtom::new(
            Rc::clone(lambda),
            input_types,
            lambda_return,
            expected_type,
        );
        let descriptor =
            CallableDescriptor::new(self.names.intern(name), Vec::new(), Some(lambda_return));
        self.regular(
            descriptor,
            TypeSubstitution::new(),
            vec![ArgumentAtom::Lambda(atom)],
            system,
        )
    }

    /// A synthetic SAM-adapter candidate whose base callable ends in a
    /// vararg, with one argument.
    pub fn sam_adapter_candidate(&self, name: &str) -> CallCandidate {
        let mut base = CallableDescriptor::new(
            self.names.intern("base"),
            Vec::new(),
            Some(TypeId::UNIT),
        );
        base.has_trailing_vararg = true;
        let mut descriptor =
            CallableDescriptor::new(self.names.intern(name), vec![TypeId::INT], Some(TypeId::UNIT));
        descriptor.synthetic_sam_base = Some(Rc::new(base));
        self.regular(
            descriptor,
            TypeSubstitution::new(),
            vec![ArgumentAtom::Expression { type_id: TypeId::INT }],
            self.system(),
        )
    }

    /// A callable-reference candidate with a concrete reflection type.
    pub fn reference_candidate(&self, name: &str, reflection_type: TypeId) -> CallCandidate {
        use mica_resolve::CallableReferenceCandidate;
        CallCandidate::CallableReference(CallableReferenceCandidate {
            resolved_call: Rc::new(ResolvedCallAtom {
                descriptor: Rc::new(CallableDescriptor::new(
                    self.names.intern(name),
                    Vec::new(),
                    None,
                )),
                fresh_variables_substitutor: TypeSubstitution::new(),
                arguments: Vec::new(),
            }),
            reflection_type,
            system: self.system(),
            components: Rc::clone(&self.components),
            diagnostics: Vec::new(),
        })
    }

    pub fn lambda_expression(&self, parameter_names: &[&str]) -> Rc<LambdaExpression> {
        Rc::new(LambdaExpression {
            parameter_names: parameter_names.iter().map(|name| self.names.intern(name)).collect(),
        })
    }

    pub fn error_factory(&self) -> TestFactory {
        TestFactory {
            interner: Rc::clone(&self.interner),
            components: Rc::clone(&self.components),
            error_name: self.names.intern("<error>"),
        }
    }
}

pub struct TestFactory {
    interner: Rc<TypeInterner>,
    components: Rc<CallComponents>,
    error_name: mica_common::Atom,
}

impl CandidateFactory for TestFactory {
    fn create_error_candidate(&self) -> CallCandidate {
        CallCandidate::Regular(RegularCandidate {
            resolved_call: Rc::new(ResolvedCallAtom {
                descriptor: Rc::new(CallableDescriptor::error_marker(self.error_name)),
                fresh_variables_substitutor: TypeSubstitution::new(),
                arguments: Vec::new(),
            }),
            system: ConstraintSystem::new(Rc::clone(&self.interner)),
            components: Rc::clone(&self.components),
            diagnostics: Vec::new(),
        })
    }
}

pub struct TestSession {
    pub run_completion: bool,
}

impl InferenceSession for TestSession {
    fn should_run_completion(&self, _candidate: &CallCandidate) -> bool {
        self.run_completion
    }
}

/// Callback stub with observable side effects.
pub struct TestCallbacks {
    pub session: TestSession,
    /// Types handed back as the lambda body's returned expressions.
    pub lambda_body_types: Vec<TypeId>,
    pub analyze_count: Cell<usize>,
    pub stub_bindings: Cell<usize>,
    pub inlinability_recordings: Cell<usize>,
    pub cast_target: Option<TypeId>,
}

impl TestCallbacks {
    pub fn new() -> Self {
        Self {
            session: TestSession { run_completion: true },
            lambda_body_types: vec![TypeId::BOOL],
            analyze_count: Cell::new(0),
            stub_bindings: Cell::new(0),
            inlinability_recordings: Cell::new(0),
            cast_target: None,
        }
    }

    pub fn deferring_session() -> Self {
        Self {
            session: TestSession { run_completion: false },
            ..Self::new()
        }
    }
}

impl ResolutionCallbacks for TestCallbacks {
    fn inference_session(&self) -> &dyn InferenceSession {
        &self.session
    }

    fn bind_stub_resolved_call_for_candidate(&self, _resolved_call: &ResolvedCallAtom) {
        self.stub_bindings.set(self.stub_bindings.get() + 1);
    }

    fn expected_type_from_cast_expression(&self, _resolved_call: &ResolvedCallAtom) -> Option<TypeId> {
        self.cast_target
    }

    fn record_inlinability_of_lambda(&self, _lambdas: &[Rc<ResolvedLambdaAtom>]) {
        self.inlinability_recordings
            .set(self.inlinability_recordings.get() + 1);
    }

    fn analyze_lambda_body(
        &self,
        _expression: &Rc<LambdaExpression>,
        _input_types: &[TypeId],
        _expected_return_type: Option<TypeId>,
    ) -> Vec<TypeId> {
        self.analyze_count.set(self.analyze_count.get() + 1);
        self.lambda_body_types.clone()
    }
}
