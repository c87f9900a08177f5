//! The pipeline orchestrator
//!
//! Composition root for the stack: builds the resolver, one retriever per
//! corpus, and the invoker from the three collaborator trait objects, and
//! sequences analysis and drafting with per-request deadlines and
//! cooperative cancellation.

use crate::error::PipelineError;
use chrono::Utc;
use horizon_engine::{AmendmentDraftingEngine, GapAnalysisEngine};
use horizon_gateway::{
    DocumentResolver, DocumentStore, GenerationInvoker, Generator, SemanticIndex,
    SemanticRetriever,
};
use horizon_types::{
    AnalysisId, AnalysisReport, CancelToken, DocumentHandle, DocumentKind, DraftingReport, Gap,
    PipelineConfig,
};
use std::sync::Arc;
use tokio::time::Instant;

/// The top-level pipeline controller
#[derive(Debug, Clone)]
pub struct Pipeline {
    resolver: DocumentResolver,
    analysis: GapAnalysisEngine,
    drafting: AmendmentDraftingEngine,
    config: PipelineConfig,
}

impl Pipeline {
    /// Wire a pipeline from the three collaborator capabilities
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        index: Arc<dyn SemanticIndex>,
        generator: Arc<dyn Generator>,
        config: PipelineConfig,
    ) -> Self {
        let resolver = DocumentResolver::new(store);
        let regulation_retriever = SemanticRetriever::new(
            Arc::clone(&index),
            config.retrieval_k,
            config.relevance_floor,
        );
        let policy_retriever =
            SemanticRetriever::new(index, config.retrieval_k, config.relevance_floor);
        let invoker =
            GenerationInvoker::new(generator, config.invoke_timeout(), config.backoff);

        let analysis = GapAnalysisEngine::new(
            resolver.clone(),
            regulation_retriever,
            policy_retriever.clone(),
            invoker.clone(),
            config.clone(),
        );
        let drafting =
            AmendmentDraftingEngine::new(resolver.clone(), policy_retriever, invoker, config.clone());

        Self {
            resolver,
            analysis,
            drafting,
            config,
        }
    }

    /// Analyze compliance gaps between a regulation and a policy
    ///
    /// # Errors
    /// Returns [`PipelineError::Analysis`] when resolution or retrieval
    /// aborts the request.
    pub async fn analyze_gaps(
        &self,
        regulation_id: &str,
        policy_id: &str,
    ) -> Result<AnalysisReport, PipelineError> {
        self.analyze_gaps_with(regulation_id, policy_id, &CancelToken::new())
            .await
    }

    /// Analyze with a caller-held cancellation token
    ///
    /// # Errors
    /// As [`Pipeline::analyze_gaps`], plus cancellation.
    pub async fn analyze_gaps_with(
        &self,
        regulation_id: &str,
        policy_id: &str,
        cancel: &CancelToken,
    ) -> Result<AnalysisReport, PipelineError> {
        tracing::info!(regulation_id, policy_id, "gap analysis requested");
        let deadline = Instant::now() + self.config.analysis_deadline();
        let outcome = self
            .analysis
            .analyze(regulation_id, policy_id, Some(deadline), cancel)
            .await?;

        let summary = AnalysisReport::summarize(&outcome.gaps, outcome.skipped_count);
        let report = AnalysisReport {
            analysis_id: AnalysisId::new(),
            regulation_id: outcome.regulation_id,
            policy_id: outcome.policy_id,
            gaps: outcome.gaps,
            partial: outcome.partial,
            skipped_count: outcome.skipped_count,
            deadline_exceeded: outcome.deadline_exceeded,
            summary,
            completed_at: Utc::now(),
        };
        tracing::info!(
            analysis_id = %report.analysis_id,
            gaps = report.gaps.len(),
            partial = report.partial,
            "analysis report ready"
        );
        Ok(report)
    }

    /// Draft amendments closing the given gaps against one policy
    ///
    /// # Errors
    /// Returns [`PipelineError::Draft`] when policy resolution aborts the
    /// request. Invalid gap references and per-gap drafting failures are
    /// reported inside the envelope, not as errors.
    pub async fn draft_amendments(
        &self,
        gaps: Vec<Gap>,
        policy_id: &str,
    ) -> Result<DraftingReport, PipelineError> {
        self.draft_amendments_with(gaps, policy_id, &CancelToken::new())
            .await
    }

    /// Draft with a caller-held cancellation token
    ///
    /// # Errors
    /// As [`Pipeline::draft_amendments`], plus cancellation.
    pub async fn draft_amendments_with(
        &self,
        gaps: Vec<Gap>,
        policy_id: &str,
        cancel: &CancelToken,
    ) -> Result<DraftingReport, PipelineError> {
        tracing::info!(policy_id, gaps = gaps.len(), "amendment drafting requested");
        let deadline = Instant::now() + self.config.drafting_deadline();
        let outcome = self
            .drafting
            .draft(gaps, policy_id, Some(deadline), cancel)
            .await?;

        let summary = DraftingReport::summarize(&outcome.amendments, &outcome.errors);
        let report = DraftingReport {
            policy_id: outcome.policy_id,
            amendments: outcome.amendments,
            errors: outcome.errors,
            deadline_exceeded: outcome.deadline_exceeded,
            summary,
            completed_at: Utc::now(),
        };
        tracing::info!(
            amendments = report.amendments.len(),
            errors = report.errors.len(),
            "drafting report ready"
        );
        Ok(report)
    }

    /// List known documents, optionally filtered by kind
    ///
    /// # Errors
    /// Returns [`PipelineError::Resolve`] on storage failure.
    pub async fn list_documents(
        &self,
        kind: Option<DocumentKind>,
    ) -> Result<Vec<DocumentHandle>, PipelineError> {
        Ok(self.resolver.list(kind).await?)
    }
}
