//! Gap analysis engine
//!
//! Orchestrates resolver, both retrievers, and the invoker to produce an
//! ordered gap set for a (regulation, policy) pair:
//!
//! 1. Resolve both document ids (either failure aborts).
//! 2. Retrieve top-k passages from both corpora concurrently, using the
//!    regulation's own content as the query (self-retrieval covers every
//!    requirement clause).
//! 3. Classify each regulation passage against the full policy evidence
//!    through the bounded pool.
//! 4. Drop covered passages; dedup overlapping candidates; derive stable
//!    ids; order by severity then document position.
//!
//! Per-passage classification failures are absorbed as skips; resolver or
//! retriever failure aborts the request.

use crate::error::AnalysisError;
use crate::pool::{run_bounded, PoolRun};
use crate::prompt::classify_prompt;
use crate::schema::ClassifyVerdict;
use horizon_gateway::{DocumentResolver, GenerationInvoker, SemanticRetriever};
use horizon_types::{
    document::span_overlap, CancelToken, DocumentKind, Gap, GapId, PipelineConfig,
    RetrievedPassage, Severity,
};
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;

/// Gap analysis run phases
///
/// `Failed` is reachable from any non-terminal phase; `Assembled` is the
/// successful terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisPhase {
    Pending,
    RetrievingContext,
    Comparing,
    Classifying,
    Assembled,
    Failed,
}

impl AnalysisPhase {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::RetrievingContext => "retrieving_context",
            Self::Comparing => "comparing",
            Self::Classifying => "classifying",
            Self::Assembled => "assembled",
            Self::Failed => "failed",
        }
    }
}

/// Phase tracker for one run; transitions are logged
#[derive(Debug)]
struct PhaseTracker {
    phase: AnalysisPhase,
}

impl PhaseTracker {
    fn new() -> Self {
        Self {
            phase: AnalysisPhase::Pending,
        }
    }

    fn advance(&mut self, next: AnalysisPhase) {
        tracing::debug!(from = self.phase.as_str(), to = next.as_str(), "analysis phase");
        self.phase = next;
    }
}

/// Engine-level analysis result, wrapped into a report by the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    /// Regulation analyzed against
    pub regulation_id: String,
    /// Policy analyzed
    pub policy_id: String,
    /// Ordered, deduplicated gaps
    pub gaps: Vec<Gap>,
    /// True when some passages were skipped as inconclusive
    pub partial: bool,
    /// Number of skipped passages
    pub skipped_count: usize,
    /// True when the whole-request deadline clipped the run
    pub deadline_exceeded: bool,
}

/// Candidate gap prior to dedup and id assignment
#[derive(Debug, Clone)]
struct CandidateGap {
    title: String,
    description: String,
    policy_text: String,
    severity: Severity,
    confidence: Option<f64>,
    regulation_text: String,
    ordinal: usize,
    span_start: usize,
    span_end: usize,
}

/// Per-passage classification outcome
#[derive(Debug, Clone)]
enum PassageOutcome {
    /// Policy adequately covers the requirement; dropped silently
    Covered,
    /// A compliance shortfall was identified
    Candidate(Box<CandidateGap>),
    /// Classification failed after retries; counted as skipped
    Inconclusive,
}

/// The gap analysis engine
#[derive(Debug, Clone)]
pub struct GapAnalysisEngine {
    resolver: DocumentResolver,
    regulation_retriever: SemanticRetriever,
    policy_retriever: SemanticRetriever,
    invoker: GenerationInvoker,
    config: PipelineConfig,
}

impl GapAnalysisEngine {
    /// Create an engine over the gateway components
    #[must_use]
    pub fn new(
        resolver: DocumentResolver,
        regulation_retriever: SemanticRetriever,
        policy_retriever: SemanticRetriever,
        invoker: GenerationInvoker,
        config: PipelineConfig,
    ) -> Self {
        Self {
            resolver,
            regulation_retriever,
            policy_retriever,
            invoker,
            config,
        }
    }

    /// Analyze compliance gaps between a regulation and a policy
    ///
    /// Reruns over unchanged documents reproduce the same gap ids and
    /// severities. A deadline yields the partial result collected so far;
    /// cancellation aborts with [`AnalysisError::Cancelled`].
    ///
    /// # Errors
    /// - [`AnalysisError::Resolve`] when either document id is invalid
    /// - [`AnalysisError::Retrieval`] when context retrieval fails after retry
    /// - [`AnalysisError::Cancelled`] when the caller cancelled
    pub async fn analyze(
        &self,
        regulation_id: &str,
        policy_id: &str,
        deadline: Option<Instant>,
        cancel: &CancelToken,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        let mut tracker = PhaseTracker::new();
        tracing::info!(regulation_id, policy_id, "starting gap analysis");

        let result = self
            .run(regulation_id, policy_id, deadline, cancel, &mut tracker)
            .await;
        match &result {
            Ok(outcome) => {
                tracker.advance(AnalysisPhase::Assembled);
                tracing::info!(
                    gaps = outcome.gaps.len(),
                    skipped = outcome.skipped_count,
                    deadline_exceeded = outcome.deadline_exceeded,
                    "gap analysis assembled"
                );
            }
            Err(err) => {
                tracker.advance(AnalysisPhase::Failed);
                tracing::error!(error = %err, "gap analysis failed");
            }
        }
        result
    }

    async fn run(
        &self,
        regulation_id: &str,
        policy_id: &str,
        deadline: Option<Instant>,
        cancel: &CancelToken,
        tracker: &mut PhaseTracker,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        if cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }

        // 1. Resolve both ids; either failure aborts with the resolver's error.
        let regulation = match with_deadline(
            deadline,
            self.resolver.resolve(regulation_id, DocumentKind::Regulation),
        )
        .await
        {
            Some(resolved) => resolved?,
            None => return Ok(self.clipped_outcome(regulation_id, policy_id)),
        };
        let policy = match with_deadline(
            deadline,
            self.resolver.resolve(policy_id, DocumentKind::Policy),
        )
        .await
        {
            Some(resolved) => resolved?,
            None => return Ok(self.clipped_outcome(regulation_id, policy_id)),
        };

        if cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }
        tracker.advance(AnalysisPhase::RetrievingContext);

        // 2. Concurrent self-query retrieval from both corpora. The
        //    regulation's own content is the query for both, so the policy
        //    evidence is gathered in the regulation's terms.
        let query = regulation.content.as_str();
        let retrievals = async {
            tokio::join!(
                self.regulation_retriever.retrieve(&regulation.handle, query),
                self.policy_retriever.retrieve(&policy.handle, query),
            )
        };
        let (regulation_passages, policy_passages) = tokio::select! {
            () = cancel.cancelled() => return Err(AnalysisError::Cancelled),
            retrieved = with_deadline(deadline, retrievals) => match retrieved {
                Some((reg, pol)) => (reg?, pol?),
                None => return Ok(self.clipped_outcome(regulation_id, policy_id)),
            },
        };
        tracker.advance(AnalysisPhase::Comparing);
        tracing::debug!(
            regulation_passages = regulation_passages.len(),
            policy_passages = policy_passages.len(),
            "context retrieved"
        );

        // 3. Classify each regulation passage against the full policy
        //    evidence, bounded-concurrently. Each job gets independent
        //    clones; merge order is input order.
        tracker.advance(AnalysisPhase::Classifying);
        let run = self
            .classify_all(
                regulation_id,
                policy_id,
                regulation_passages,
                policy_passages,
                deadline,
                cancel,
            )
            .await;
        if run.cancelled {
            return Err(AnalysisError::Cancelled);
        }

        // 4.-7. Collect, dedup, assign ids, order.
        let mut skipped = run.unresolved();
        let mut candidates = Vec::new();
        for outcome in run.slots.into_iter().flatten() {
            match outcome {
                PassageOutcome::Covered => {}
                PassageOutcome::Candidate(candidate) => candidates.push(*candidate),
                PassageOutcome::Inconclusive => skipped += 1,
            }
        }

        let deduped = dedup_candidates(candidates, self.config.dedup_overlap_threshold);
        let gaps = assemble_gaps(regulation_id, policy_id, deduped);

        Ok(AnalysisOutcome {
            regulation_id: regulation_id.to_string(),
            policy_id: policy_id.to_string(),
            gaps,
            partial: skipped > 0,
            skipped_count: skipped,
            deadline_exceeded: run.deadline_exceeded,
        })
    }

    async fn classify_all(
        &self,
        regulation_id: &str,
        policy_id: &str,
        regulation_passages: Vec<RetrievedPassage>,
        policy_passages: Vec<RetrievedPassage>,
        deadline: Option<Instant>,
        cancel: &CancelToken,
    ) -> PoolRun<PassageOutcome> {
        let invoker = self.invoker.clone();
        let policy_passages = Arc::new(policy_passages);
        let regulation_id = regulation_id.to_string();
        let policy_id = policy_id.to_string();

        run_bounded(
            regulation_passages,
            self.config.classify_width,
            deadline,
            cancel,
            move |_, passage: RetrievedPassage| {
                let invoker = invoker.clone();
                let policy_passages = Arc::clone(&policy_passages);
                let regulation_id = regulation_id.clone();
                let policy_id = policy_id.clone();
                async move {
                    classify_one(&invoker, &regulation_id, &policy_id, passage, &policy_passages)
                        .await
                }
            },
        )
        .await
    }

    /// Outcome shape for a run clipped before any passage work happened
    fn clipped_outcome(&self, regulation_id: &str, policy_id: &str) -> AnalysisOutcome {
        tracing::warn!(regulation_id, policy_id, "analysis deadline expired before classification");
        AnalysisOutcome {
            regulation_id: regulation_id.to_string(),
            policy_id: policy_id.to_string(),
            gaps: Vec::new(),
            partial: false,
            skipped_count: 0,
            deadline_exceeded: true,
        }
    }
}

/// Classify one regulation passage against the policy evidence
async fn classify_one(
    invoker: &GenerationInvoker,
    regulation_id: &str,
    policy_id: &str,
    passage: RetrievedPassage,
    policy_passages: &[RetrievedPassage],
) -> PassageOutcome {
    let prompt = classify_prompt(regulation_id, policy_id, &passage, policy_passages);
    let verdict = match invoker.invoke::<ClassifyVerdict>(&prompt).await {
        Ok(verdict) => verdict,
        Err(err) => {
            tracing::warn!(
                ordinal = passage.ordinal,
                error = %err,
                "passage classification inconclusive"
            );
            return PassageOutcome::Inconclusive;
        }
    };

    if verdict.covered {
        return PassageOutcome::Covered;
    }

    // A gap verdict without severity or description violates the schema
    // contract even though it parsed as JSON.
    let (Some(severity), Some(description)) = (verdict.severity, verdict.description) else {
        tracing::warn!(ordinal = passage.ordinal, "gap verdict missing severity or description");
        return PassageOutcome::Inconclusive;
    };

    let policy_text = anchor_policy_quote(verdict.policy_text.as_deref(), policy_passages);
    // Deterministic floor: a requirement with no policy coverage at all is
    // never below High.
    let severity = if policy_text.trim().is_empty() {
        severity.max(Severity::High)
    } else {
        severity
    };
    let title = verdict
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| "Compliance gap".to_string());

    PassageOutcome::Candidate(Box::new(CandidateGap {
        title,
        description,
        policy_text,
        severity,
        confidence: verdict.confidence,
        regulation_text: passage.text,
        ordinal: passage.ordinal,
        span_start: passage.span_start,
        span_end: passage.span_end,
    }))
}

/// Anchor the model's policy quote to retrieved evidence
///
/// Quoted policy text must be drawn verbatim from retrieved passages; the
/// pipeline never emits fabricated quotes. A quote that appears in no
/// passage is replaced by the best-scoring passage's text (still verbatim
/// retrieval output), and an empty or missing quote means the control is
/// absent.
fn anchor_policy_quote(quote: Option<&str>, policy_passages: &[RetrievedPassage]) -> String {
    let quote = quote.map(str::trim).unwrap_or_default();
    if quote.is_empty() {
        return String::new();
    }
    if policy_passages.iter().any(|p| p.text.contains(quote)) {
        return quote.to_string();
    }
    tracing::warn!("policy quote not found verbatim in retrieved passages, anchoring to evidence");
    policy_passages
        .first()
        .map(|p| p.text.clone())
        .unwrap_or_default()
}

/// Dedup candidates whose regulation spans overlap substantially
///
/// Keeps the higher-severity duplicate; ties keep the candidate earlier in
/// regulation-document order.
fn dedup_candidates(mut candidates: Vec<CandidateGap>, threshold: f64) -> Vec<CandidateGap> {
    candidates.sort_by_key(|c| c.ordinal);
    let mut kept: Vec<CandidateGap> = Vec::new();
    'outer: for candidate in candidates {
        for existing in &mut kept {
            let overlap = span_overlap(
                (existing.span_start, existing.span_end),
                (candidate.span_start, candidate.span_end),
            );
            if overlap > threshold {
                if candidate.severity > existing.severity {
                    *existing = candidate;
                }
                continue 'outer;
            }
        }
        kept.push(candidate);
    }
    kept
}

/// Assign stable ids and apply the final ordering
fn assemble_gaps(regulation_id: &str, policy_id: &str, candidates: Vec<CandidateGap>) -> Vec<Gap> {
    let mut gaps: Vec<Gap> = candidates
        .into_iter()
        .map(|c| Gap {
            gap_id: GapId::derive(regulation_id, policy_id, c.span_start),
            regulation_id: regulation_id.to_string(),
            policy_id: policy_id.to_string(),
            title: c.title,
            regulation_text: c.regulation_text,
            policy_text: c.policy_text,
            description: c.description,
            severity: c.severity,
            confidence: c.confidence,
            ordinal: c.ordinal,
        })
        .collect();
    gaps.sort_by(|a, b| b.severity.cmp(&a.severity).then(a.ordinal.cmp(&b.ordinal)));
    gaps
}

async fn with_deadline<F: Future>(deadline: Option<Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(at) => tokio::time::timeout_at(at, fut).await.ok(),
        None => Some(fut.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(ordinal: usize, span: (usize, usize), severity: Severity) -> CandidateGap {
        CandidateGap {
            title: format!("gap {ordinal}"),
            description: String::new(),
            policy_text: "covered text".to_string(),
            severity,
            confidence: None,
            regulation_text: String::new(),
            ordinal,
            span_start: span.0,
            span_end: span.1,
        }
    }

    fn passage(text: &str, score: f64) -> RetrievedPassage {
        RetrievedPassage {
            document_id: "pol".to_string(),
            text: text.to_string(),
            score,
            ordinal: 0,
            span_start: 0,
            span_end: text.len(),
        }
    }

    #[test]
    fn overlapping_duplicates_keep_higher_severity() {
        let kept = dedup_candidates(
            vec![
                candidate(0, (0, 100), Severity::Medium),
                candidate(1, (10, 90), Severity::Critical),
            ],
            0.5,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].severity, Severity::Critical);
    }

    #[test]
    fn severity_ties_keep_earlier_ordinal() {
        let kept = dedup_candidates(
            vec![
                candidate(3, (10, 90), Severity::High),
                candidate(1, (0, 100), Severity::High),
            ],
            0.5,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].ordinal, 1);
    }

    #[test]
    fn disjoint_candidates_all_survive() {
        let kept = dedup_candidates(
            vec![
                candidate(0, (0, 100), Severity::Low),
                candidate(1, (200, 300), Severity::Low),
                candidate(2, (400, 500), Severity::Low),
            ],
            0.5,
        );
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn final_order_is_severity_then_position() {
        let gaps = assemble_gaps(
            "reg",
            "pol",
            vec![
                candidate(5, (500, 600), Severity::High),
                candidate(1, (100, 200), Severity::Low),
                candidate(3, (300, 400), Severity::High),
                candidate(0, (0, 50), Severity::Critical),
            ],
        );
        let order: Vec<(Severity, usize)> = gaps.iter().map(|g| (g.severity, g.ordinal)).collect();
        assert_eq!(
            order,
            vec![
                (Severity::Critical, 0),
                (Severity::High, 3),
                (Severity::High, 5),
                (Severity::Low, 1),
            ]
        );
    }

    #[test]
    fn gap_ids_are_reproducible_per_span() {
        let first = assemble_gaps("reg", "pol", vec![candidate(0, (40, 90), Severity::High)]);
        let second = assemble_gaps("reg", "pol", vec![candidate(0, (40, 90), Severity::High)]);
        assert_eq!(first[0].gap_id, second[0].gap_id);
    }

    #[test]
    fn verbatim_quote_is_kept() {
        let passages = vec![passage("Data is encrypted at rest.", 0.9)];
        let anchored = anchor_policy_quote(Some("encrypted at rest"), &passages);
        assert_eq!(anchored, "encrypted at rest");
    }

    #[test]
    fn fabricated_quote_is_anchored_to_evidence() {
        let passages = vec![passage("Data is encrypted at rest.", 0.9)];
        let anchored = anchor_policy_quote(Some("we never said this"), &passages);
        assert_eq!(anchored, "Data is encrypted at rest.");
    }

    #[test]
    fn missing_quote_means_absent_control() {
        assert_eq!(anchor_policy_quote(None, &[]), "");
        assert_eq!(anchor_policy_quote(Some("  "), &[]), "");
    }
}
