//! Horizon Pipeline - the top-level controller
//!
//! Exposes the two caller-facing operations and wires the whole stack
//! together:
//! - [`Pipeline::analyze_gaps`] - gap analysis for a (regulation, policy)
//!   pair
//! - [`Pipeline::draft_amendments`] - amendment drafting for a set of gaps
//!
//! Both are synchronous from the caller's perspective (they return only
//! after completion, deadline, or cancellation) and internally concurrent.
//! Whole-request deadlines surface partial results with a flag; caller
//! cancellation propagates to in-flight work and aborts.
//!
//! # Example
//!
//! ```rust,ignore
//! use horizon_pipeline::Pipeline;
//! use horizon_types::PipelineConfig;
//! use std::sync::Arc;
//!
//! # async fn example(store: Arc<dyn horizon_gateway::DocumentStore>,
//! #                  index: Arc<dyn horizon_gateway::SemanticIndex>,
//! #                  generator: Arc<dyn horizon_gateway::Generator>) {
//! let pipeline = Pipeline::new(store, index, generator, PipelineConfig::new());
//! let report = pipeline.analyze_gaps("gdpr", "data_protection").await.unwrap();
//! let drafts = pipeline
//!     .draft_amendments(report.gaps.clone(), "data_protection")
//!     .await
//!     .unwrap();
//! # let _ = drafts;
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod pipeline;

// Re-exports for convenience
pub use error::PipelineError;
pub use pipeline::Pipeline;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
