//! Semantic index contract

use crate::error::RetrievalError;
use horizon_types::{DocumentKind, RetrievedPassage};

/// Top-k passage search over an indexed corpus
///
/// The index is built and maintained outside the pipeline; chunking and
/// embedding strategy are its concern. Results come back ordered by
/// descending similarity score with at most `k` entries.
#[async_trait::async_trait]
pub trait SemanticIndex: Send + Sync {
    /// Search one document's passages within a corpus
    ///
    /// # Arguments
    /// * `corpus` - which index to search
    /// * `document_id` - document whose passages are candidates
    /// * `query` - free-text query
    /// * `k` - maximum passages to return
    ///
    /// # Errors
    /// Returns `RetrievalError::Unavailable` when the index is unreachable.
    /// An empty result is success, not an error.
    async fn search(
        &self,
        corpus: DocumentKind,
        document_id: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedPassage>, RetrievalError>;
}
