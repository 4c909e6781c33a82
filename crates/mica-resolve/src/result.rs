//! Call resolution results.
//!
//! Terminal and immutable: every variant carries a read-only snapshot of the
//! candidate's constraint storage taken at packaging time, so later mutation
//! of a live system (by an enclosing session, for instance) cannot
//! retroactively change an already-produced result.

use crate::atoms::ResolvedCallAtom;
use crate::candidate::CallCandidate;
use crate::diagnostics::ResolutionDiagnostic;
use mica_solver::ConstraintStorage;
use std::rc::Rc;

/// One completed candidate paired with its diagnostics, for the
/// all-candidates tooling mode.
pub struct CandidateWithDiagnostics {
    pub candidate: CallCandidate,
    pub diagnostics: Vec<ResolutionDiagnostic>,
}

/// The outcome of one call resolution.
pub enum CallResolutionResult {
    /// Full completion succeeded.
    Completed {
        resolved_call: Rc<ResolvedCallAtom>,
        diagnostics: Vec<ResolutionDiagnostic>,
        storage: ConstraintStorage,
    },
    /// Completion was deferred to an enclosing inference session.
    Partial {
        resolved_call: Rc<ResolvedCallAtom>,
        diagnostics: Vec<ResolutionDiagnostic>,
        storage: ConstraintStorage,
        /// Whether the candidate was handed to the session without running
        /// completion at all.
        forwarded_to_session: bool,
    },
    /// The candidate itself was erroneous.
    Error {
        resolved_call: Rc<ResolvedCallAtom>,
        diagnostics: Vec<ResolutionDiagnostic>,
        storage: ConstraintStorage,
    },
    /// Diagnostic/tooling mode: every candidate completed independently,
    /// none selected.
    AllCandidates(Vec<CandidateWithDiagnostics>),
}

impl CallResolutionResult {
    /// The diagnostics of a single-candidate result; empty for
    /// [`CallResolutionResult::AllCandidates`], whose diagnostics are
    /// per-candidate.
    pub fn diagnostics(&self) -> &[ResolutionDiagnostic] {
        match self {
            CallResolutionResult::Completed { diagnostics, .. }
            | CallResolutionResult::Partial { diagnostics, .. }
            | CallResolutionResult::Error { diagnostics, .. } => diagnostics,
            CallResolutionResult::AllCandidates(_) => &[],
        }
    }

    pub fn storage(&self) -> Option<&ConstraintStorage> {
        match self {
            CallResolutionResult::Completed { storage, .. }
            | CallResolutionResult::Partial { storage, .. }
            | CallResolutionResult::Error { storage, .. } => Some(storage),
            CallResolutionResult::AllCandidates(_) => None,
        }
    }
}
