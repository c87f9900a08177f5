//! Error types for the engines
//!
//! Only whole-request failures live here. Per-passage and per-gap failures
//! are absorbed into the outcome envelopes (skipped counts, error lists)
//! and never surface as engine errors.

use horizon_gateway::{ResolveError, RetrievalError};

/// Gap analysis failures that abort the whole request
#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalysisError {
    /// A document id failed to resolve; structural, never retried
    #[error("resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    /// Context retrieval failed after retry
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    /// The caller cancelled the request
    #[error("analysis cancelled")]
    Cancelled,
}

/// Amendment drafting failures that abort the whole request
///
/// Invalid gap references are deliberately absent: they are per-entry
/// failures reported in the drafting outcome.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DraftError {
    /// The policy id failed to resolve; structural, never retried
    #[error("resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    /// The caller cancelled the request
    #[error("drafting cancelled")]
    Cancelled,
}
