//! Horizon Types - shared data model
//!
//! Defines the vocabulary the pipeline speaks:
//! - Document references and retrieved passages
//! - Gaps (detected compliance shortfalls) and their severities
//! - Amendments (proposed policy edits)
//! - Report envelopes returned to callers
//! - Pipeline configuration
//!
//! Everything here is plain data: no I/O, no collaborator calls.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod amendment;
pub mod cancel;
pub mod config;
pub mod document;
pub mod gap;
pub mod id;
pub mod report;

// Re-exports for convenience
pub use amendment::{Amendment, ChangeType};
pub use cancel::CancelToken;
pub use config::{BackoffPolicy, PipelineConfig};
pub use document::{DocumentHandle, DocumentKind, RetrievedPassage};
pub use gap::{Gap, Severity};
pub use id::{AmendmentId, AnalysisId, GapId};
pub use report::{AnalysisReport, DraftFailure, DraftingReport};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Horizon types
    pub use crate::{
        Amendment, AmendmentId, AnalysisReport, CancelToken, ChangeType, DocumentHandle,
        DocumentKind, DraftFailure, DraftingReport, Gap, GapId, PipelineConfig,
        RetrievedPassage, Severity,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
