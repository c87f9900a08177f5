//! Horizon Engine - gap analysis and amendment drafting
//!
//! Two orchestration engines built on the gateway contracts:
//! - [`GapAnalysisEngine`] resolves a (regulation, policy) pair, retrieves
//!   context from both corpora concurrently, classifies each regulation
//!   passage against the policy evidence through a bounded worker pool, and
//!   assembles an ordered, deduplicated gap set with stable ids.
//! - [`AmendmentDraftingEngine`] turns gaps into proposed text edits with
//!   rationale, validating that every gap belongs to the stated policy and
//!   isolating per-gap failures.
//!
//! Both engines honor a whole-request deadline (partial results, never an
//! error) and a cooperative cancellation token (an error: the caller asked
//! for abandonment).

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod analysis;
pub mod drafting;
pub mod error;
pub mod pool;
pub mod prompt;
pub mod schema;

// Re-exports for convenience
pub use analysis::{AnalysisOutcome, AnalysisPhase, GapAnalysisEngine};
pub use drafting::{AmendmentDraftingEngine, DraftingOutcome};
pub use error::{AnalysisError, DraftError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
