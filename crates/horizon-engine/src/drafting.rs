//! Amendment drafting engine
//!
//! Turns gaps into proposed policy edits. Every gap must belong to the
//! stated policy; a violating entry fails with an invalid-reference record
//! for that entry only. Drafting failures are likewise per-gap: one
//! unparsable draft never blocks the others.

use crate::error::DraftError;
use crate::pool::run_bounded;
use crate::prompt::draft_prompt;
use crate::schema::DraftOutput;
use horizon_gateway::{DocumentResolver, GenerationInvoker, SemanticRetriever};
use horizon_types::{
    Amendment, AmendmentId, CancelToken, ChangeType, DocumentHandle, DocumentKind, DraftFailure,
    Gap, PipelineConfig,
};
use tokio::time::Instant;

/// Engine-level drafting result, wrapped into a report by the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct DraftingOutcome {
    /// Policy the amendments target
    pub policy_id: String,
    /// Successfully drafted amendments, in input gap order
    pub amendments: Vec<Amendment>,
    /// Per-gap failures: invalid references and drafting errors
    pub errors: Vec<DraftFailure>,
    /// True when the whole-request deadline clipped the run
    pub deadline_exceeded: bool,
}

/// Per-gap drafting result inside the pool
type DraftSlot = Result<Amendment, DraftFailure>;

/// The amendment drafting engine
#[derive(Debug, Clone)]
pub struct AmendmentDraftingEngine {
    resolver: DocumentResolver,
    policy_retriever: SemanticRetriever,
    invoker: GenerationInvoker,
    config: PipelineConfig,
}

impl AmendmentDraftingEngine {
    /// Create an engine over the gateway components
    #[must_use]
    pub fn new(
        resolver: DocumentResolver,
        policy_retriever: SemanticRetriever,
        invoker: GenerationInvoker,
        config: PipelineConfig,
    ) -> Self {
        Self {
            resolver,
            policy_retriever,
            invoker,
            config,
        }
    }

    /// Draft amendments for a set of gaps against one policy
    ///
    /// Precondition per entry: `gap.policy_id == policy_id`; violations are
    /// reported per entry as invalid references, never rejected wholesale.
    ///
    /// # Errors
    /// - [`DraftError::Resolve`] when the policy id is invalid
    /// - [`DraftError::Cancelled`] when the caller cancelled
    pub async fn draft(
        &self,
        gaps: Vec<Gap>,
        policy_id: &str,
        deadline: Option<Instant>,
        cancel: &CancelToken,
    ) -> Result<DraftingOutcome, DraftError> {
        if cancel.is_cancelled() {
            return Err(DraftError::Cancelled);
        }
        tracing::info!(policy_id, gaps = gaps.len(), "starting amendment drafting");

        let policy = match deadline {
            Some(at) => {
                match tokio::time::timeout_at(
                    at,
                    self.resolver.resolve(policy_id, DocumentKind::Policy),
                )
                .await
                {
                    Ok(resolved) => resolved?,
                    Err(_) => {
                        return Ok(DraftingOutcome {
                            policy_id: policy_id.to_string(),
                            amendments: Vec::new(),
                            errors: Vec::new(),
                            deadline_exceeded: true,
                        })
                    }
                }
            }
            None => self.resolver.resolve(policy_id, DocumentKind::Policy).await?,
        };

        // Per-entry reference validation up front; invalid entries never
        // reach the drafting pool.
        let mut errors = Vec::new();
        let mut valid = Vec::new();
        for gap in gaps {
            if gap.policy_id == policy_id {
                valid.push(gap);
            } else {
                tracing::warn!(
                    gap_id = %gap.gap_id,
                    gap_policy = %gap.policy_id,
                    requested_policy = policy_id,
                    "invalid gap reference"
                );
                errors.push(DraftFailure {
                    gap_id: gap.gap_id.clone(),
                    reason: format!(
                        "invalid reference: gap belongs to policy {}, request targets {}",
                        gap.policy_id, policy_id
                    ),
                });
            }
        }

        if cancel.is_cancelled() {
            return Err(DraftError::Cancelled);
        }

        let retriever = self.policy_retriever.clone();
        let invoker = self.invoker.clone();
        let handle = policy.handle.clone();
        let run = run_bounded(
            valid,
            self.config.classify_width,
            deadline,
            cancel,
            move |_, gap: Gap| {
                let retriever = retriever.clone();
                let invoker = invoker.clone();
                let handle = handle.clone();
                async move { draft_one(&retriever, &invoker, &handle, gap).await }
            },
        )
        .await;
        if run.cancelled {
            return Err(DraftError::Cancelled);
        }

        let mut amendments = Vec::new();
        for slot in run.slots.into_iter().flatten() {
            match slot {
                Ok(amendment) => amendments.push(amendment),
                Err(failure) => errors.push(failure),
            }
        }

        tracing::info!(
            amendments = amendments.len(),
            errors = errors.len(),
            deadline_exceeded = run.deadline_exceeded,
            "amendment drafting finished"
        );
        Ok(DraftingOutcome {
            policy_id: policy_id.to_string(),
            amendments,
            errors,
            deadline_exceeded: run.deadline_exceeded,
        })
    }
}

/// Draft one amendment: retrieve surrounding context, invoke, assemble
///
/// The context query is the gap's policy excerpt when one exists, or the
/// gap description when the control is absent (to land near where the
/// missing control should live).
async fn draft_one(
    retriever: &SemanticRetriever,
    invoker: &GenerationInvoker,
    policy: &DocumentHandle,
    gap: Gap,
) -> DraftSlot {
    let query = if gap.coverage_absent() {
        gap.description.clone()
    } else {
        gap.policy_text.clone()
    };
    let context = match retriever.retrieve(policy, &query).await {
        Ok(passages) => passages,
        Err(err) => {
            tracing::warn!(gap_id = %gap.gap_id, error = %err, "context retrieval failed for gap");
            return Err(DraftFailure {
                gap_id: gap.gap_id,
                reason: format!("context retrieval failed: {err}"),
            });
        }
    };

    let prompt = draft_prompt(&gap, &context);
    let output = match invoker.invoke::<DraftOutput>(&prompt).await {
        Ok(output) => output,
        Err(err) => {
            tracing::warn!(gap_id = %gap.gap_id, error = %err, "drafting invocation failed");
            return Err(DraftFailure {
                gap_id: gap.gap_id,
                reason: err.to_string(),
            });
        }
    };

    Ok(assemble_amendment(gap, output))
}

/// Build the amendment record from the gap and the draft output
fn assemble_amendment(gap: Gap, output: DraftOutput) -> Amendment {
    // Fall back to the gap's own verbatim excerpt when the drafter omits
    // the original wording.
    let original_text = output
        .original_text
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| gap.policy_text.clone());
    let change_type = output.change_type.unwrap_or(if original_text.trim().is_empty() {
        ChangeType::Addition
    } else {
        ChangeType::Modification
    });

    Amendment {
        amendment_id: AmendmentId::new(),
        gap_id: gap.gap_id,
        policy_section: output.policy_section.unwrap_or_default(),
        original_text,
        proposed_text: output.proposed_text,
        change_type,
        rationale: output.rationale,
        impact: output.impact,
    }
}
