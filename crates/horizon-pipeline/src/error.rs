//! Pipeline error type

use horizon_engine::{AnalysisError, DraftError};
use horizon_gateway::ResolveError;

/// Whole-request pipeline failures
///
/// A fully-failed outcome always carries the originating error kind; a
/// deadline is not a failure (it surfaces as a flagged partial report).
#[derive(Debug, Clone, thiserror::Error)]
pub enum PipelineError {
    /// Gap analysis aborted
    #[error("analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    /// Amendment drafting aborted
    #[error("drafting failed: {0}")]
    Draft(#[from] DraftError),

    /// Document listing or lookup failed
    #[error("resolution failed: {0}")]
    Resolve(#[from] ResolveError),
}

impl PipelineError {
    /// Whether the caller cancelled the request
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Analysis(AnalysisError::Cancelled) | Self::Draft(DraftError::Cancelled)
        )
    }
}
