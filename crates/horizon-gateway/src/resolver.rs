//! Document reference resolver
//!
//! Maps a document id plus expected kind to a retrievable handle. Pure
//! lookup and validation; no side effects.

use crate::error::ResolveError;
use crate::store::DocumentStore;
use horizon_types::{DocumentHandle, DocumentKind};
use std::sync::Arc;

/// A resolved document: validated handle plus its text content
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDocument {
    /// Validated reference
    pub handle: DocumentHandle,
    /// Full document text, used as the self-retrieval query
    pub content: String,
}

/// Resolves document references against the store
#[derive(Clone)]
pub struct DocumentResolver {
    store: Arc<dyn DocumentStore>,
}

impl std::fmt::Debug for DocumentResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentResolver").finish_non_exhaustive()
    }
}

impl DocumentResolver {
    /// Create a resolver over a document store
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Resolve a document id, validating its kind
    ///
    /// # Errors
    /// - `ResolveError::NotFound` if no document with that id exists
    /// - `ResolveError::KindMismatch` if the stored kind differs from
    ///   `expected` (e.g. a policy id passed where a regulation is expected)
    /// - `ResolveError::Store` on storage failure
    pub async fn resolve(
        &self,
        id: &str,
        expected: DocumentKind,
    ) -> Result<ResolvedDocument, ResolveError> {
        let doc = self.store.get_by_id(id).await?;
        if doc.kind != expected {
            tracing::warn!(id, expected = %expected, actual = %doc.kind, "document kind mismatch");
            return Err(ResolveError::KindMismatch {
                id: id.to_string(),
                expected,
                actual: doc.kind,
            });
        }
        let mut handle = DocumentHandle::new(doc.id, doc.kind, doc.location);
        handle.metadata = doc.metadata;
        Ok(ResolvedDocument {
            handle,
            content: doc.content,
        })
    }

    /// List document handles, optionally filtered by kind
    ///
    /// # Errors
    /// Returns `ResolveError::Store` on storage failure.
    pub async fn list(
        &self,
        kind: Option<DocumentKind>,
    ) -> Result<Vec<DocumentHandle>, ResolveError> {
        let docs = self.store.list(kind).await.map_err(ResolveError::from)?;
        Ok(docs
            .into_iter()
            .map(|doc| {
                let mut handle = DocumentHandle::new(doc.id, doc.kind, doc.location);
                handle.metadata = doc.metadata;
                handle
            })
            .collect())
    }
}
