//! Identifier types
//!
//! Two identity regimes coexist:
//! - [`GapId`] is content-derived (Blake3 over the identifying tuple), so
//!   reruns over unchanged documents reproduce the same ids.
//! - [`AmendmentId`] and [`AnalysisId`] are fresh UUIDs per run, because
//!   repeated drafting attempts over the same gap must not collide.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable gap identifier
///
/// Derived from (regulation_id, policy_id, span start offset) so that the
/// same gap detected twice carries the same id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GapId(String);

impl GapId {
    /// Derive the stable id for a gap
    ///
    /// The hash covers the regulation id, the policy id, and the character
    /// offset where the regulation excerpt begins. Text content is excluded
    /// deliberately: the offset already pins the excerpt within an unchanged
    /// document, and excluding it keeps ids stable across whitespace-only
    /// retrieval differences.
    #[must_use]
    pub fn derive(regulation_id: &str, policy_id: &str, span_start: usize) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(regulation_id.as_bytes());
        hasher.update(b"\x1f");
        hasher.update(policy_id.as_bytes());
        hasher.update(b"\x1f");
        hasher.update(&(span_start as u64).to_le_bytes());
        let hash = hasher.finalize();
        Self(format!("gap-{}", &hash.to_hex()[..16]))
    }

    /// Wrap an existing id string (e.g. deserialized from a caller request)
    #[inline]
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The id as a string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GapId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique amendment identifier (fresh per drafting attempt)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AmendmentId(pub Uuid);

impl AmendmentId {
    /// Generate new amendment ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AmendmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AmendmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique analysis-run identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnalysisId(pub Uuid);

impl AnalysisId {
    /// Generate new analysis ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnalysisId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
