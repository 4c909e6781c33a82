//! Resolution candidates.
//!
//! A candidate is one proposed resolution of a call to one callable. It owns
//! its constraint system exclusively (1:1, never shared across candidates)
//! and is mutated in place by the completer: constraints are added to the
//! system, lambda atoms get marked analyzed, diagnostics accumulate. After
//! result packaging a candidate is not touched again.
//!
//! The two variants form a closed tagged union. Shared state is reached
//! through the accessor methods below; the two call sites that need
//! variant-specific typing (return type vs. reflection type) pattern-match in
//! `call_completer` instead of going through virtual dispatch.

use crate::atoms::ResolvedCallAtom;
use crate::diagnostics::ResolutionDiagnostic;
use crate::features::LanguageFeatures;
use mica_solver::ConstraintSystem;
use mica_solver::TypeId;
use std::rc::Rc;

/// Ambient pieces every candidate carries: for this engine, the language
/// feature settings.
#[derive(Clone, Debug)]
pub struct CallComponents {
    pub language_features: LanguageFeatures,
}

/// An ordinary function or property call.
pub struct RegularCandidate {
    pub resolved_call: Rc<ResolvedCallAtom>,
    pub system: ConstraintSystem,
    pub components: Rc<CallComponents>,
    pub diagnostics: Vec<ResolutionDiagnostic>,
}

/// A reference to a callable used as a value; completes against a reflection
/// type instead of a return type.
pub struct CallableReferenceCandidate {
    pub resolved_call: Rc<ResolvedCallAtom>,
    pub reflection_type: TypeId,
    pub system: ConstraintSystem,
    pub components: Rc<CallComponents>,
    pub diagnostics: Vec<ResolutionDiagnostic>,
}

/// One proposed resolution of a call.
pub enum CallCandidate {
    Regular(RegularCandidate),
    CallableReference(CallableReferenceCandidate),
}

impl CallCandidate {
    pub fn system(&self) -> &ConstraintSystem {
        match self {
            CallCandidate::Regular(candidate) => &candidate.system,
            CallCandidate::CallableReference(candidate) => &candidate.system,
        }
    }

    pub fn system_mut(&mut self) -> &mut ConstraintSystem {
        match self {
            CallCandidate::Regular(candidate) => &mut candidate.system,
            CallCandidate::CallableReference(candidate) => &mut candidate.system,
        }
    }

    pub fn resolved_call(&self) -> &Rc<ResolvedCallAtom> {
        match self {
            CallCandidate::Regular(candidate) => &candidate.resolved_call,
            CallCandidate::CallableReference(candidate) => &candidate.resolved_call,
        }
    }

    pub fn components(&self) -> &CallComponents {
        match self {
            CallCandidate::Regular(candidate) => &candidate.components,
            CallCandidate::CallableReference(candidate) => &candidate.components,
        }
    }

    pub fn diagnostics(&self) -> &[ResolutionDiagnostic] {
        match self {
            CallCandidate::Regular(candidate) => &candidate.diagnostics,
            CallCandidate::CallableReference(candidate) => &candidate.diagnostics,
        }
    }

    pub fn diagnostics_mut(&mut self) -> &mut Vec<ResolutionDiagnostic> {
        match self {
            CallCandidate::Regular(candidate) => &mut candidate.diagnostics,
            CallCandidate::CallableReference(candidate) => &mut candidate.diagnostics,
        }
    }

    /// An error candidate proposes an error-marker callable or owns a
    /// contradictory constraint system. Error classification dominates
    /// completion mode when the result is packaged.
    pub fn is_error_candidate(&self) -> bool {
        self.resolved_call().descriptor.is_error_marker() || self.system().has_contradiction()
    }

    pub fn is_successful(&self) -> bool {
        !self.is_error_candidate()
            && self.diagnostics().iter().all(|diagnostic| !diagnostic.is_error())
    }
}

/// Synthesizes candidates outside the normal overload collection path.
/// Consumed only when candidate selection fails (zero or many candidates).
pub trait CandidateFactory {
    fn create_error_candidate(&self) -> CallCandidate;
}
