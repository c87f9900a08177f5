//! Amendment records

use crate::id::{AmendmentId, GapId};
use serde::{Deserialize, Serialize};

/// How an amendment alters the policy text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// New text inserted where no control existed
    Addition,
    /// Existing text rewritten to close the gap
    Modification,
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Addition => "addition",
            Self::Modification => "modification",
        })
    }
}

/// A proposed policy text change closing one gap
///
/// Immutable; persistence, if any, is the caller's concern. `amendment_id`
/// is fresh per drafting attempt so repeated drafting never collides;
/// traceability back to the gap rides on `gap_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amendment {
    /// Fresh unique id for this drafting attempt
    pub amendment_id: AmendmentId,
    /// Gap this amendment closes; must belong to the request's policy
    pub gap_id: GapId,
    /// Policy section or heading the change lands in
    pub policy_section: String,
    /// Current policy wording; empty for pure additions
    pub original_text: String,
    /// Proposed replacement or inserted wording
    pub proposed_text: String,
    /// Addition vs. modification
    pub change_type: ChangeType,
    /// Why the change closes the gap
    pub rationale: String,
    /// Impact assessment, when the drafter provides one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
}
