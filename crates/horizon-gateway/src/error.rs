//! Error types for the gateway layer
//!
//! The taxonomy mirrors how failures propagate:
//! - Structural errors ([`ResolveError`]) abort a whole request.
//! - Transport errors ([`RetrievalError`], retryable once) abort after retry.
//! - Generation errors ([`GenerationError`]) are scoped to one invocation
//!   and may be absorbed as per-unit failures by the engines.

use crate::store::StoreError;
use horizon_types::DocumentKind;

/// Document resolution failures
///
/// Structural: there is no partial result without valid document identity.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolveError {
    /// No document with this id exists in the store
    #[error("document not found: {id}")]
    NotFound { id: String },

    /// The stored document is of a different kind than expected
    #[error("document {id} is a {actual}, expected a {expected}")]
    KindMismatch {
        id: String,
        expected: DocumentKind,
        actual: DocumentKind,
    },

    /// The store itself failed
    #[error("document store error: {0}")]
    Store(String),
}

impl From<StoreError> for ResolveError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id } => Self::NotFound { id },
            StoreError::Backend(detail) => Self::Store(detail),
        }
    }
}

/// Semantic retrieval failures
///
/// An empty passage list is not represented here: "no evidence found" is a
/// successful, empty result.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RetrievalError {
    /// The underlying index is unreachable (transient; retried once)
    #[error("retrieval unavailable: {0}")]
    Unavailable(String),

    /// The index rejected the query
    #[error("index error: {0}")]
    Index(String),
}

impl RetrievalError {
    /// Whether a single retry is warranted
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Generation invocation failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    /// The backend did not respond within the configured deadline
    #[error("generation timed out after {deadline_secs}s")]
    Timeout { deadline_secs: u64 },

    /// The backend signalled throttling
    #[error("generation rate limited")]
    RateLimited,

    /// The response could not be parsed into the expected schema,
    /// even after one repair attempt
    #[error("generation output did not match schema: {detail}")]
    ParseFailure { detail: String },

    /// The backend failed outright
    #[error("generation backend error: {0}")]
    Backend(String),
}

impl GenerationError {
    /// Whether backoff-and-retry is warranted
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::RateLimited)
    }

    /// Whether this failure should be absorbed as a per-unit skip rather
    /// than aborting the whole run
    #[inline]
    #[must_use]
    pub fn is_per_unit(&self) -> bool {
        matches!(
            self,
            Self::ParseFailure { .. } | Self::Timeout { .. } | Self::RateLimited
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_generation_errors_are_retryable() {
        assert!(GenerationError::RateLimited.is_retryable());
        assert!(GenerationError::Timeout { deadline_secs: 30 }.is_retryable());
        assert!(!GenerationError::ParseFailure {
            detail: "bad json".to_string()
        }
        .is_retryable());
        assert!(!GenerationError::Backend("down".to_string()).is_retryable());
    }

    #[test]
    fn only_outages_retry_retrieval() {
        assert!(RetrievalError::Unavailable("conn refused".to_string()).is_retryable());
        assert!(!RetrievalError::Index("bad query".to_string()).is_retryable());
    }

    #[test]
    fn store_not_found_maps_to_resolve_not_found() {
        let err: ResolveError = StoreError::NotFound {
            id: "reg-1".to_string(),
        }
        .into();
        assert!(matches!(err, ResolveError::NotFound { .. }));
    }
}
