//! Call Resolution Completion
//!
//! Given the candidate overloads collected for one call expression and the
//! partially solved constraint system each candidate owns, this crate selects
//! a single candidate, drives its type-variable inference to a fixed point
//! (interleaving with deferred lambda-argument analysis), and packages the
//! outcome as an immutable [`CallResolutionResult`].
//!
//! Collaborators are injected at trait seams: the [`CandidateFactory`] that
//! synthesizes error candidates, the [`ResolutionCallbacks`] bridge to the
//! surrounding front end, the [`InferenceSession`] policy of an enclosing
//! inference scope, and the [`PostponedArgumentsAnalyzer`] that analyzes
//! lambda bodies. Candidate enumeration, scope resolution, and diagnostics
//! rendering live elsewhere.

pub mod analyzer;
pub mod atoms;
pub mod call_completer;
pub mod callbacks;
pub mod candidate;
pub mod completion_mode;
pub mod descriptor;
pub mod diagnostics;
pub mod features;
pub mod result;

pub use analyzer::{LambdaAnalysisResult, LambdaAnalyzer, PostponedArgumentsAnalyzer};
pub use atoms::{ArgumentAtom, LambdaExpression, ResolvedCallAtom, ResolvedLambdaAtom};
pub use call_completer::{CallCompleter, ExpectedType};
pub use callbacks::{InferenceSession, ResolutionCallbacks, TopLevelInferenceSession};
pub use candidate::{
    CallCandidate, CallComponents, CallableReferenceCandidate, CandidateFactory, RegularCandidate,
};
pub use completion_mode::CompletionModeCalculator;
pub use descriptor::CallableDescriptor;
pub use diagnostics::{DiagnosticsHolder, ResolutionDiagnostic};
pub use features::LanguageFeatures;
pub use result::{CallResolutionResult, CandidateWithDiagnostics};
