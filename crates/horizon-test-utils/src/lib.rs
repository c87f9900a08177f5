//! Testing utilities for the Horizon workspace
//!
//! Shared fakes and fixtures: an in-memory document store, a scripted
//! semantic index with failure injection, and a rule-based scripted
//! generator. Fixtures mirror a data-protection regulation/policy pair.

#![allow(missing_docs)]

use dashmap::DashMap;
use horizon_gateway::{
    DocumentStore, Generator, GeneratorFailure, RetrievalError, SemanticIndex, StoreError,
    StoredDocument,
};
use horizon_types::{DocumentKind, RetrievedPassage};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Once;

/// Initialize test tracing once per binary
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

/// In-memory document store
#[derive(Debug, Default)]
pub struct InMemoryStore {
    documents: DashMap<String, StoredDocument>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, document: StoredDocument) {
        self.documents.insert(document.id.clone(), document);
    }

    #[must_use]
    pub fn with_document(self, document: StoredDocument) -> Self {
        self.insert(document);
        self
    }
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryStore {
    async fn get_by_id(&self, id: &str) -> Result<StoredDocument, StoreError> {
        self.documents
            .get(id)
            .map(|entry| entry.clone())
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    async fn list(&self, kind: Option<DocumentKind>) -> Result<Vec<StoredDocument>, StoreError> {
        let mut docs: Vec<StoredDocument> = self
            .documents
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|doc| kind.map_or(true, |k| doc.kind == k))
            .collect();
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(docs)
    }
}

/// Scripted semantic index
///
/// Serves canned passages per (corpus, document) and can inject a queue of
/// failures that fire before any successful response.
#[derive(Debug, Default)]
pub struct ScriptedIndex {
    passages: DashMap<(DocumentKind, String), Vec<RetrievedPassage>>,
    failures: Mutex<Vec<RetrievalError>>,
}

impl ScriptedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_passages(
        &self,
        corpus: DocumentKind,
        document_id: &str,
        passages: Vec<RetrievedPassage>,
    ) {
        self.passages
            .insert((corpus, document_id.to_string()), passages);
    }

    #[must_use]
    pub fn with_passages(
        self,
        corpus: DocumentKind,
        document_id: &str,
        passages: Vec<RetrievedPassage>,
    ) -> Self {
        self.insert_passages(corpus, document_id, passages);
        self
    }

    /// Queue a failure to be returned ahead of the scripted passages
    pub fn push_failure(&self, error: RetrievalError) {
        self.failures.lock().push(error);
    }
}

#[async_trait::async_trait]
impl SemanticIndex for ScriptedIndex {
    async fn search(
        &self,
        corpus: DocumentKind,
        document_id: &str,
        _query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedPassage>, RetrievalError> {
        if let Some(err) = self.failures.lock().pop() {
            return Err(err);
        }
        let mut passages = self
            .passages
            .get(&(corpus, document_id.to_string()))
            .map(|entry| entry.clone())
            .unwrap_or_default();
        passages.truncate(k);
        Ok(passages)
    }
}

/// Scripted generation backend
///
/// Routes prompts to responses by substring match, so concurrent
/// invocations stay deterministic regardless of completion order. Rules are
/// tried in insertion order; unmatched prompts get the default response.
pub struct ScriptedGenerator {
    rules: Mutex<Vec<(String, Result<String, GeneratorFailure>)>>,
    default_response: Mutex<Result<String, GeneratorFailure>>,
    prompts: Mutex<Vec<String>>,
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            default_response: Mutex::new(Ok(covered_verdict_json())),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond with `response` to any prompt containing `needle`
    #[must_use]
    pub fn with_rule(
        self,
        needle: impl Into<String>,
        response: Result<String, GeneratorFailure>,
    ) -> Self {
        self.rules.lock().push((needle.into(), response));
        self
    }

    /// Response for prompts no rule matches
    #[must_use]
    pub fn with_default(self, response: Result<String, GeneratorFailure>) -> Self {
        *self.default_response.lock() = response;
        self
    }

    /// Prompts seen so far, in call order
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait::async_trait]
impl Generator for ScriptedGenerator {
    async fn complete(&self, prompt: &str) -> Result<String, GeneratorFailure> {
        self.prompts.lock().push(prompt.to_string());
        let rules = self.rules.lock();
        for (needle, response) in rules.iter() {
            if prompt.contains(needle.as_str()) {
                return response.clone();
            }
        }
        self.default_response.lock().clone()
    }
}

/// Build a stored document
#[must_use]
pub fn document(id: &str, kind: DocumentKind, content: &str) -> StoredDocument {
    StoredDocument {
        id: id.to_string(),
        kind,
        location: format!("mem://{}/{id}", kind.as_str()),
        content: content.to_string(),
        metadata: HashMap::new(),
    }
}

/// Build a retrieved passage with explicit span offsets
#[must_use]
pub fn passage(
    document_id: &str,
    ordinal: usize,
    span_start: usize,
    text: &str,
    score: f64,
) -> RetrievedPassage {
    RetrievedPassage {
        document_id: document_id.to_string(),
        text: text.to_string(),
        score,
        ordinal,
        span_start,
        span_end: span_start + text.len(),
    }
}

/// JSON for a "requirement is covered" classify verdict
#[must_use]
pub fn covered_verdict_json() -> String {
    r#"{"covered": true, "confidence": 0.95}"#.to_string()
}

/// JSON for a gap classify verdict
#[must_use]
pub fn gap_verdict_json(
    title: &str,
    description: &str,
    policy_text: &str,
    severity: &str,
) -> String {
    serde_json::json!({
        "covered": false,
        "title": title,
        "description": description,
        "policy_text": policy_text,
        "severity": severity,
        "confidence": 0.9,
    })
    .to_string()
}

/// JSON for a drafted amendment
#[must_use]
pub fn draft_output_json(
    policy_section: &str,
    original_text: &str,
    proposed_text: &str,
    rationale: &str,
) -> String {
    serde_json::json!({
        "policy_section": policy_section,
        "original_text": original_text,
        "proposed_text": proposed_text,
        "change_type": if original_text.is_empty() { "addition" } else { "modification" },
        "rationale": rationale,
        "impact": "High - ensures compliance with data protection regulations.",
    })
    .to_string()
}

/// Fixture corpus: a data-protection regulation and a policy that covers
/// storage encryption but not transit encryption or retention limits.
pub mod fixtures {
    use super::{document, passage, InMemoryStore, ScriptedIndex};
    use horizon_types::DocumentKind;

    pub const REGULATION_ID: &str = "gdpr";
    pub const POLICY_ID: &str = "data_protection";

    pub const TRANSIT_CLAUSE: &str = "Data must be encrypted at rest and in transit.";
    pub const RETENTION_CLAUSE: &str = "Data retention period must not exceed 5 years.";
    pub const LAWFUL_CLAUSE: &str =
        "Personal data shall be processed lawfully, fairly and in a transparent manner.";

    pub const POLICY_STORAGE: &str = "Data is encrypted at rest.";
    pub const POLICY_RETENTION: &str = "We retain data as needed for business purposes.";
    pub const POLICY_LAWFUL: &str =
        "We process personal data lawfully and transparently, with documented purposes.";

    /// Store holding the fixture pair
    #[must_use]
    pub fn store() -> InMemoryStore {
        InMemoryStore::new()
            .with_document(document(
                REGULATION_ID,
                DocumentKind::Regulation,
                &format!("{LAWFUL_CLAUSE}\n{TRANSIT_CLAUSE}\n{RETENTION_CLAUSE}"),
            ))
            .with_document(document(
                POLICY_ID,
                DocumentKind::Policy,
                &format!("{POLICY_LAWFUL}\n{POLICY_STORAGE}\n{POLICY_RETENTION}"),
            ))
    }

    /// Index serving the fixture passages for both corpora
    #[must_use]
    pub fn index() -> ScriptedIndex {
        ScriptedIndex::new()
            .with_passages(
                DocumentKind::Regulation,
                REGULATION_ID,
                vec![
                    passage(REGULATION_ID, 0, 0, LAWFUL_CLAUSE, 0.95),
                    passage(REGULATION_ID, 1, 100, TRANSIT_CLAUSE, 0.9),
                    passage(REGULATION_ID, 2, 200, RETENTION_CLAUSE, 0.85),
                ],
            )
            .with_passages(
                DocumentKind::Policy,
                POLICY_ID,
                vec![
                    passage(POLICY_ID, 0, 0, POLICY_LAWFUL, 0.9),
                    passage(POLICY_ID, 1, 120, POLICY_STORAGE, 0.85),
                    passage(POLICY_ID, 2, 220, POLICY_RETENTION, 0.8),
                ],
            )
    }
}
