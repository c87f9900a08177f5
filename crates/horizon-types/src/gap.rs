//! Gap records and severity levels

use crate::id::GapId;
use serde::{Deserialize, Serialize};

/// Compliance gap severity
///
/// Closed set: no other level is representable. Variants are declared in
/// ascending order so the derived `Ord` ranks `Critical` highest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All levels, most severe first
    pub const ALL: [Self; 4] = [Self::Critical, Self::High, Self::Medium, Self::Low];

    /// Human-readable level name
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected compliance gap
///
/// Produced by the gap-analysis engine; immutable once returned. The quoted
/// `regulation_text` and `policy_text` are drawn verbatim from retrieved
/// passages; only `description` is generative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    /// Stable id, reproducible across reruns over unchanged documents
    pub gap_id: GapId,
    /// Regulation the requirement came from
    pub regulation_id: String,
    /// Policy that was analyzed
    pub policy_id: String,
    /// Short gap title
    pub title: String,
    /// Verbatim regulation excerpt containing the requirement
    pub regulation_text: String,
    /// Verbatim policy excerpt demonstrating the shortfall; empty when the
    /// policy omits the control entirely
    pub policy_text: String,
    /// What is missing and why it matters
    pub description: String,
    /// Assigned severity
    pub severity: Severity,
    /// Classifier confidence in [0, 1], when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Ordinal position of the regulation excerpt within its document,
    /// used for deterministic ordering
    pub ordinal: usize,
}

impl Gap {
    /// Whether the policy has no coverage at all for this requirement
    #[inline]
    #[must_use]
    pub fn coverage_absent(&self) -> bool {
        self.policy_text.trim().is_empty()
    }
}
