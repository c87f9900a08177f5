//! Semantic retriever
//!
//! Thin policy layer over the index: caps result length at k, enforces the
//! relevance floor, keeps descending-score order, and retries exactly once
//! when the index is unreachable. An empty result means "no evidence
//! found", never failure.

use crate::error::RetrievalError;
use crate::index::SemanticIndex;
use horizon_types::{DocumentHandle, RetrievedPassage};
use std::sync::Arc;

/// Retrieves relevant passages for one document
#[derive(Clone)]
pub struct SemanticRetriever {
    index: Arc<dyn SemanticIndex>,
    k: usize,
    relevance_floor: f64,
}

impl std::fmt::Debug for SemanticRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticRetriever")
            .field("k", &self.k)
            .field("relevance_floor", &self.relevance_floor)
            .finish_non_exhaustive()
    }
}

impl SemanticRetriever {
    /// Create a retriever over a semantic index
    #[inline]
    #[must_use]
    pub fn new(index: Arc<dyn SemanticIndex>, k: usize, relevance_floor: f64) -> Self {
        Self {
            index,
            k,
            relevance_floor,
        }
    }

    /// Configured retrieval depth
    #[inline]
    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Retrieve up to k passages for a query against one document
    ///
    /// Passages below the relevance floor are dropped; the remainder keeps
    /// descending-score order.
    ///
    /// # Errors
    /// Returns `RetrievalError::Unavailable` after the single retry fails.
    pub async fn retrieve(
        &self,
        handle: &DocumentHandle,
        query: &str,
    ) -> Result<Vec<RetrievedPassage>, RetrievalError> {
        let raw = match self
            .index
            .search(handle.kind, &handle.id, query, self.k)
            .await
        {
            Ok(passages) => passages,
            Err(err) if err.is_retryable() => {
                tracing::warn!(document = %handle.id, error = %err, "retrieval failed, retrying once");
                self.index
                    .search(handle.kind, &handle.id, query, self.k)
                    .await?
            }
            Err(err) => return Err(err),
        };

        let mut passages: Vec<RetrievedPassage> = raw
            .into_iter()
            .filter(|p| p.score >= self.relevance_floor)
            .collect();
        // Defensive re-sort: the contract says descending score, the floor
        // filter must not be the only thing standing between us and a
        // misbehaving index.
        passages.sort_by(|a, b| b.score.total_cmp(&a.score));
        passages.truncate(self.k);

        tracing::debug!(
            document = %handle.id,
            count = passages.len(),
            "retrieved passages"
        );
        Ok(passages)
    }
}
