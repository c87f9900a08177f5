//! Document references and retrieved passages

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Which corpus a document belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// A regulatory document (the source of requirements)
    Regulation,
    /// An internal policy document (the subject of analysis)
    Policy,
}

impl DocumentKind {
    /// Human-readable corpus name
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Regulation => "regulation",
            Self::Policy => "policy",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regulation" => Ok(Self::Regulation),
            "policy" => Ok(Self::Policy),
            other => Err(format!("unknown document kind: {other}")),
        }
    }
}

/// A resolved, retrievable document reference
///
/// Produced by the resolver after id and kind validation. Read-only to the
/// pipeline: the core never mutates stored documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentHandle {
    /// Identifier, unique within its kind
    pub id: String,
    /// Corpus membership
    pub kind: DocumentKind,
    /// Storage location (store-specific, opaque to the pipeline)
    pub location: String,
    /// Display title, derived from the id by the store
    pub title: String,
    /// Store-side metadata (version, jurisdiction, ...)
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl DocumentHandle {
    /// Create a handle with a title derived from the id
    #[must_use]
    pub fn new(id: impl Into<String>, kind: DocumentKind, location: impl Into<String>) -> Self {
        let id = id.into();
        let title = title_from_id(&id);
        Self {
            id,
            kind,
            location: location.into(),
            title,
            metadata: HashMap::new(),
        }
    }

    /// With an explicit title
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// With a metadata entry
    #[inline]
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Derive a display title from a document id ("data_protection" -> "Data Protection")
fn title_from_id(id: &str) -> String {
    id.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A passage returned by semantic retrieval
///
/// Ephemeral: produced per retrieval call, never persisted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// Source document id
    pub document_id: String,
    /// Verbatim excerpt text
    pub text: String,
    /// Similarity score in [0, 1]
    pub score: f64,
    /// Position of the passage within the document (0-based)
    pub ordinal: usize,
    /// Character offset where the excerpt begins
    pub span_start: usize,
    /// Character offset just past the excerpt end
    pub span_end: usize,
}

impl RetrievedPassage {
    /// Fractional overlap between this passage's span and another's
    ///
    /// Returns overlap length divided by the shorter span's length, so a
    /// passage fully contained in a larger one scores 1.0. Zero-length
    /// spans never overlap.
    #[must_use]
    pub fn span_overlap(&self, other: &Self) -> f64 {
        span_overlap(
            (self.span_start, self.span_end),
            (other.span_start, other.span_end),
        )
    }
}

/// Fractional overlap of two half-open character ranges
#[must_use]
pub fn span_overlap(a: (usize, usize), b: (usize, usize)) -> f64 {
    let start = a.0.max(b.0);
    let end = a.1.min(b.1);
    if end <= start {
        return 0.0;
    }
    let shorter = (a.1 - a.0).min(b.1 - b.0);
    if shorter == 0 {
        return 0.0;
    }
    (end - start) as f64 / shorter as f64
}
