//! Pipeline configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Exponential backoff policy for retryable generation failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    /// First delay in milliseconds
    pub base_delay_ms: u64,
    /// Delay cap in milliseconds
    pub max_delay_ms: u64,
    /// Maximum attempts (initial call included)
    pub max_attempts: u32,
}

impl BackoffPolicy {
    /// Delay before the given retry (1-based), doubling up to the cap
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(16);
        let delay = self
            .base_delay_ms
            .saturating_mul(1u64 << exp)
            .min(self.max_delay_ms);
        Duration::from_millis(delay)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: 1_000,
            max_delay_ms: 8_000,
            max_attempts: 3,
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Passages fetched per retrieval call
    pub retrieval_k: usize,
    /// Minimum similarity score a passage must reach to be returned
    pub relevance_floor: f64,
    /// Maximum concurrent passage classifications
    pub classify_width: usize,
    /// Per-invocation deadline for the generation backend, in seconds
    pub invoke_timeout_secs: u64,
    /// Whole-request deadline for gap analysis, in seconds
    pub analysis_deadline_secs: u64,
    /// Whole-request deadline for amendment drafting, in seconds
    pub drafting_deadline_secs: u64,
    /// Backoff for rate-limited / timed-out generation calls
    pub backoff: BackoffPolicy,
    /// Fractional regulation-span overlap above which two candidate gaps
    /// count as duplicates
    pub dedup_overlap_threshold: f64,
}

impl PipelineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With retrieval depth
    #[inline]
    #[must_use]
    pub fn with_retrieval_k(mut self, k: usize) -> Self {
        self.retrieval_k = k;
        self
    }

    /// With classification pool width
    #[inline]
    #[must_use]
    pub fn with_classify_width(mut self, width: usize) -> Self {
        self.classify_width = width.max(1);
        self
    }

    /// With per-invocation timeout
    #[inline]
    #[must_use]
    pub fn with_invoke_timeout_secs(mut self, secs: u64) -> Self {
        self.invoke_timeout_secs = secs;
        self
    }

    /// With whole-request deadlines
    #[inline]
    #[must_use]
    pub fn with_deadlines_secs(mut self, analysis: u64, drafting: u64) -> Self {
        self.analysis_deadline_secs = analysis;
        self.drafting_deadline_secs = drafting;
        self
    }

    /// With backoff policy
    #[inline]
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Per-invocation deadline as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn invoke_timeout(&self) -> Duration {
        Duration::from_secs(self.invoke_timeout_secs)
    }

    /// Analysis deadline as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn analysis_deadline(&self) -> Duration {
        Duration::from_secs(self.analysis_deadline_secs)
    }

    /// Drafting deadline as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn drafting_deadline(&self) -> Duration {
        Duration::from_secs(self.drafting_deadline_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retrieval_k: 5,
            relevance_floor: 0.25,
            classify_width: 4,
            invoke_timeout_secs: 30,
            analysis_deadline_secs: 60,
            drafting_deadline_secs: 45,
            backoff: BackoffPolicy::default(),
            dedup_overlap_threshold: 0.5,
        }
    }
}
