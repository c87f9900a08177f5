//! Structured-output schemas
//!
//! The shapes the generation backend is instructed to produce. Parsing into
//! these types happens in the invoker; a response that does not fit is a
//! parse failure, never a panic.

use horizon_types::{ChangeType, Severity};
use serde::Deserialize;

/// Compare-and-classify verdict for one regulation passage
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifyVerdict {
    /// Whether the policy passages adequately cover the requirement
    pub covered: bool,
    /// Short gap title
    #[serde(default)]
    pub title: Option<String>,
    /// Gap description
    #[serde(default)]
    pub description: Option<String>,
    /// Exact policy text demonstrating the shortfall; empty or missing
    /// means the control is absent
    #[serde(default)]
    pub policy_text: Option<String>,
    /// Assigned severity
    #[serde(default)]
    pub severity: Option<Severity>,
    /// Classifier confidence in [0, 1]
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Drafted amendment for one gap
#[derive(Debug, Clone, Deserialize)]
pub struct DraftOutput {
    /// Section or heading the change lands in
    #[serde(default)]
    pub policy_section: Option<String>,
    /// Exact current wording being changed; empty for pure additions
    #[serde(default)]
    pub original_text: Option<String>,
    /// The amended or inserted wording
    pub proposed_text: String,
    /// Addition vs. modification
    #[serde(default)]
    pub change_type: Option<ChangeType>,
    /// Why the change closes the gap
    pub rationale: String,
    /// Impact assessment
    #[serde(default)]
    pub impact: Option<String>,
}
