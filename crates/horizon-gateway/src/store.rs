//! Document store contract

use horizon_types::DocumentKind;
use std::collections::HashMap;

/// A document as the store holds it
///
/// Created on ingestion, outside the pipeline; read-only to the core.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// Identifier, unique within its kind
    pub id: String,
    /// Corpus membership
    pub kind: DocumentKind,
    /// Storage location (bucket key, path, ...)
    pub location: String,
    /// Full document text
    pub content: String,
    /// Ingestion metadata
    pub metadata: HashMap<String, String>,
}

/// Store-level failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// No document with this id
    #[error("document not found: {id}")]
    NotFound { id: String },

    /// The storage backend failed
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Document lookup and listing, as provided by the ingestion system
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document by id
    ///
    /// # Errors
    /// - `StoreError::NotFound` if no document with that id exists
    /// - `StoreError::Backend` on storage failure
    async fn get_by_id(&self, id: &str) -> Result<StoredDocument, StoreError>;

    /// List document metadata, optionally filtered by kind
    ///
    /// # Errors
    /// Returns `StoreError::Backend` on storage failure.
    async fn list(&self, kind: Option<DocumentKind>) -> Result<Vec<StoredDocument>, StoreError>;
}
