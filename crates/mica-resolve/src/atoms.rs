//! The resolved-call atom tree.
//!
//! A call's arguments are "atoms": already-typed sub-expressions, plus
//! postponed lambda atoms whose bodies are deferred until the surrounding
//! call fixes their input types. A postponed atom is mutated exactly once —
//! the `analyzed` flag flips false to true when its analysis results are
//! recorded — and never again.

use crate::analyzer::LambdaAnalysisResult;
use crate::descriptor::CallableDescriptor;
use mica_common::Atom;
use mica_solver::completion::PostponableAtom;
use mica_solver::{TypeId, TypeInterner, TypeSubstitution, instantiate_type};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// A source-level lambda expression.
///
/// One lambda may appear as an atom under several sibling candidates of the
/// same call site; those atoms share the expression by `Rc`, and structural
/// identity of the lambda is `Rc` pointer identity.
#[derive(Debug)]
pub struct LambdaExpression {
    pub parameter_names: Vec<Atom>,
}

/// A not-yet-analyzed lambda argument bound to one candidate's constraint
/// system.
#[derive(Debug)]
pub struct ResolvedLambdaAtom {
    pub expression: Rc<LambdaExpression>,
    /// Parameter types, as variables or concrete types of the owning
    /// candidate's system.
    pub input_types: Vec<TypeId>,
    /// The slot the body's returned expressions are constrained under;
    /// usually a variable of the owning system.
    pub return_type: TypeId,
    /// The expected type for the whole lambda, when the context supplies one.
    pub expected_type: Option<TypeId>,
    analyzed: Cell<bool>,
    results: RefCell<Option<LambdaAnalysisResult>>,
}

impl ResolvedLambdaAtom {
    pub fn new(
        expression: Rc<LambdaExpression>,
        input_types: Vec<TypeId>,
        return_type: TypeId,
        expected_type: Option<TypeId>,
    ) -> Rc<Self> {
        Rc::new(Self {
            expression,
            input_types,
            return_type,
            expected_type,
            analyzed: Cell::new(false),
            results: RefCell::new(None),
        })
    }

    /// The parameter count this candidate's view of the lambda has. Two
    /// candidates over the same expression may disagree (their expected
    /// function types differ), which is what the disambiguation protocol's
    /// agreement check looks at.
    pub fn parameter_count(&self) -> usize {
        self.input_types.len()
    }

    pub fn analyzed(&self) -> bool {
        self.analyzed.get()
    }

    /// Record the atom's analysis results and flip the `analyzed` flag.
    ///
    /// This is the only write path to the atom, and it is one-way: marking an
    /// already-analyzed atom is a caller bug.
    pub fn mark_analyzed(&self, results: LambdaAnalysisResult) {
        assert!(
            !self.analyzed.get(),
            "invariant violation: lambda atom analyzed twice"
        );
        *self.results.borrow_mut() = Some(results);
        self.analyzed.set(true);
    }

    /// Mark the atom analyzed with empty results. Used by the
    /// collect-all-candidates mode, where bodies are deliberately left
    /// unanalyzed.
    pub fn set_empty_analyzed_results(&self) {
        self.mark_analyzed(LambdaAnalysisResult::empty());
    }

    pub fn analysis_results(&self) -> Option<LambdaAnalysisResult> {
        self.results.borrow().clone()
    }
}

impl PostponableAtom for ResolvedLambdaAtom {
    fn input_types(&self) -> Vec<TypeId> {
        self.input_types.clone()
    }

    fn output_types(&self) -> Vec<TypeId> {
        vec![self.return_type]
    }

    fn analyzed(&self) -> bool {
        self.analyzed.get()
    }
}

/// One argument of a resolved call.
#[derive(Debug)]
pub enum ArgumentAtom {
    /// An already-typed sub-expression.
    Expression { type_id: TypeId },
    /// A postponed lambda argument.
    Lambda(Rc<ResolvedLambdaAtom>),
}

/// The resolved call a candidate proposes: the callable, the substitutor from
/// declaration-local variables to the candidate's fresh system variables, and
/// the argument atoms.
#[derive(Debug)]
pub struct ResolvedCallAtom {
    pub descriptor: Rc<CallableDescriptor>,
    pub fresh_variables_substitutor: TypeSubstitution,
    pub arguments: Vec<ArgumentAtom>,
}

impl ResolvedCallAtom {
    /// The callable's return type, remapped into the candidate's system.
    pub fn fresh_return_type(&self, interner: &TypeInterner) -> Option<TypeId> {
        self.descriptor
            .return_type
            .map(|ty| instantiate_type(interner, ty, &self.fresh_variables_substitutor))
    }

    pub fn has_lambda_arguments(&self) -> bool {
        self.arguments
            .iter()
            .any(|argument| matches!(argument, ArgumentAtom::Lambda(_)))
    }

    /// The call's postponed lambda atoms, in argument order.
    pub fn lambda_atoms(&self) -> Vec<Rc<ResolvedLambdaAtom>> {
        self.arguments
            .iter()
            .filter_map(|argument| match argument {
                ArgumentAtom::Lambda(atom) => Some(Rc::clone(atom)),
                ArgumentAtom::Expression { .. } => None,
            })
            .collect()
    }
}
