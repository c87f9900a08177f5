//! Report envelopes returned to callers
//!
//! A response always distinguishes fully-successful, partial, and
//! deadline-clipped outcomes; per-item failures are listed, never silently
//! dropped.

use crate::amendment::Amendment;
use crate::gap::Gap;
use crate::id::{AnalysisId, GapId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result envelope for a gap analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Fresh id for this analysis run
    pub analysis_id: AnalysisId,
    /// Regulation analyzed against
    pub regulation_id: String,
    /// Policy analyzed
    pub policy_id: String,
    /// Detected gaps, ordered by descending severity then document position
    pub gaps: Vec<Gap>,
    /// True when some passage classifications were skipped
    pub partial: bool,
    /// Number of passages whose classification was inconclusive
    pub skipped_count: usize,
    /// True when the whole-request deadline clipped the run
    pub deadline_exceeded: bool,
    /// One-line human summary
    pub summary: String,
    /// When the run finished
    pub completed_at: DateTime<Utc>,
}

impl AnalysisReport {
    /// Build the deterministic one-line summary for a gap set
    #[must_use]
    pub fn summarize(gaps: &[Gap], skipped: usize) -> String {
        match (gaps.len(), skipped) {
            (0, 0) => "No compliance gaps found.".to_string(),
            (0, s) => format!("No compliance gaps found; {s} passage(s) inconclusive."),
            (n, 0) => format!("Found {n} compliance gap(s) that need to be addressed."),
            (n, s) => format!(
                "Found {n} compliance gap(s) that need to be addressed; {s} passage(s) inconclusive."
            ),
        }
    }
}

/// A per-gap drafting failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftFailure {
    /// The gap whose drafting failed
    pub gap_id: GapId,
    /// Failure kind and detail, e.g. "invalid reference: gap belongs to policy X"
    pub reason: String,
}

/// Result envelope for an amendment drafting run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftingReport {
    /// Policy the amendments target
    pub policy_id: String,
    /// Successfully drafted amendments
    pub amendments: Vec<Amendment>,
    /// Per-gap failures (invalid references, parse failures)
    pub errors: Vec<DraftFailure>,
    /// True when the whole-request deadline clipped the run
    pub deadline_exceeded: bool,
    /// One-line human summary
    pub summary: String,
    /// When the run finished
    pub completed_at: DateTime<Utc>,
}

impl DraftingReport {
    /// Build the deterministic one-line summary for a drafting result
    #[must_use]
    pub fn summarize(amendments: &[Amendment], errors: &[DraftFailure]) -> String {
        match (amendments.len(), errors.len()) {
            (n, 0) => format!("Generated {n} amendment(s) to address the compliance gaps."),
            (n, e) => format!("Generated {n} amendment(s); {e} gap(s) could not be drafted."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_mentions_skipped_passages() {
        let text = AnalysisReport::summarize(&[], 2);
        assert!(text.contains("2 passage(s) inconclusive"));
    }

    #[test]
    fn summary_is_clean_on_full_success() {
        let text = AnalysisReport::summarize(&[], 0);
        assert_eq!(text, "No compliance gaps found.");
    }

    #[test]
    fn drafting_summary_counts_errors() {
        let errors = vec![DraftFailure {
            gap_id: GapId::from_raw("gap-x"),
            reason: "parse failure".to_string(),
        }];
        let text = DraftingReport::summarize(&[], &errors);
        assert!(text.contains("1 gap(s) could not be drafted"));
    }
}
