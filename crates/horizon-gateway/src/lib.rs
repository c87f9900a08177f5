//! Horizon Gateway - collaborator contracts and leaf components
//!
//! The pipeline consumes three external capabilities, each behind a trait:
//! - [`DocumentStore`] - document lookup and listing
//! - [`SemanticIndex`] - top-k passage search over a corpus
//! - [`Generator`] - black-box text generation
//!
//! On top of the traits sit the three leaf components the engines use:
//! - [`DocumentResolver`] - id + kind validation, content fetch
//! - [`SemanticRetriever`] - k cap, relevance floor, one retry on outage
//! - [`GenerationInvoker`] - per-call timeout, backoff, repair-prompt retry,
//!   typed JSON parsing
//!
//! Swapping a backend never touches the engines: they only see the traits.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod generator;
pub mod index;
pub mod resolver;
pub mod retriever;
pub mod store;

// Re-exports for convenience
pub use error::{GenerationError, ResolveError, RetrievalError};
pub use generator::{GenerationInvoker, Generator, GeneratorFailure};
pub use index::SemanticIndex;
pub use resolver::{DocumentResolver, ResolvedDocument};
pub use retriever::SemanticRetriever;
pub use store::{DocumentStore, StoreError, StoredDocument};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
