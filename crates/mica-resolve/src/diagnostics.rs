//! Resolution diagnostics.
//!
//! Diagnostics are structured values, not strings; rendering belongs to the
//! surrounding reporter. A [`DiagnosticsHolder`] accumulates the ordered
//! findings of one completion attempt, with hard constraint errors tracked
//! separately and merged in at collection time.

use mica_solver::ConstraintError;

/// One resolution-time finding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolutionDiagnostic {
    /// The candidate set for the call was empty.
    NoneCandidates,
    /// More than one candidate survived overload resolution.
    ManyCandidates { count: usize },
    /// The call resolved to a synthetic SAM adapter whose base callable has a
    /// trailing vararg; warning-level.
    ResolvedToSamWithVararg { argument_index: usize },
    /// A hard error merged from the candidate's constraint system.
    ConstraintError(ConstraintError),
}

impl ResolutionDiagnostic {
    /// Whether this finding blocks a successful resolution.
    pub fn is_error(&self) -> bool {
        match self {
            ResolutionDiagnostic::NoneCandidates
            | ResolutionDiagnostic::ManyCandidates { .. }
            | ResolutionDiagnostic::ConstraintError(_) => true,
            ResolutionDiagnostic::ResolvedToSamWithVararg { .. } => false,
        }
    }
}

/// Ordered accumulator for one completion attempt.
#[derive(Debug, Default)]
pub struct DiagnosticsHolder {
    diagnostics: Vec<ResolutionDiagnostic>,
    errors: Vec<ConstraintError>,
}

impl DiagnosticsHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_diagnostic(&mut self, diagnostic: ResolutionDiagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn add_error(&mut self, error: ConstraintError) {
        self.errors.push(error);
    }

    pub fn diagnostics(&self) -> &[ResolutionDiagnostic] {
        &self.diagnostics
    }

    pub fn errors(&self) -> &[ConstraintError] {
        &self.errors
    }

    /// All findings in order: diagnostics first, then the hard errors wrapped
    /// as [`ResolutionDiagnostic::ConstraintError`].
    pub fn collect_all(&self) -> Vec<ResolutionDiagnostic> {
        let mut all = self.diagnostics.clone();
        all.extend(
            self.errors
                .iter()
                .cloned()
                .map(ResolutionDiagnostic::ConstraintError),
        );
        all
    }
}
