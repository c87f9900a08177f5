//! Amendment drafting pipeline tests
//!
//! Referential integrity, per-gap failure isolation, and the scenario
//! where a transit-encryption gap is closed while preserving the policy's
//! original sentence.

use horizon_pipeline::Pipeline;
use horizon_test_utils::{draft_output_json, fixtures, init_tracing, ScriptedGenerator};
use horizon_types::{ChangeType, Gap, GapId, PipelineConfig, Severity};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const PROPOSED: &str =
    "Data is encrypted at rest and in transit using industry-standard protocols (TLS 1.3+).";

fn transit_gap() -> Gap {
    Gap {
        gap_id: GapId::derive(fixtures::REGULATION_ID, fixtures::POLICY_ID, 100),
        regulation_id: fixtures::REGULATION_ID.to_string(),
        policy_id: fixtures::POLICY_ID.to_string(),
        title: "Missing transit encryption".to_string(),
        regulation_text: fixtures::TRANSIT_CLAUSE.to_string(),
        policy_text: fixtures::POLICY_STORAGE.to_string(),
        description: "The policy does not require encryption in transit.".to_string(),
        severity: Severity::High,
        confidence: Some(0.9),
        ordinal: 1,
    }
}

fn retention_gap() -> Gap {
    Gap {
        gap_id: GapId::derive(fixtures::REGULATION_ID, fixtures::POLICY_ID, 200),
        regulation_id: fixtures::REGULATION_ID.to_string(),
        policy_id: fixtures::POLICY_ID.to_string(),
        title: "Vague retention period".to_string(),
        regulation_text: fixtures::RETENTION_CLAUSE.to_string(),
        policy_text: fixtures::POLICY_RETENTION.to_string(),
        description: "The policy sets no bounded retention period.".to_string(),
        severity: Severity::Medium,
        confidence: None,
        ordinal: 2,
    }
}

fn pipeline_with(generator: ScriptedGenerator) -> Pipeline {
    init_tracing();
    Pipeline::new(
        Arc::new(fixtures::store()),
        Arc::new(fixtures::index()),
        Arc::new(generator),
        PipelineConfig::new(),
    )
}

/// Generator answering every drafting prompt with the transit amendment
fn transit_draft_generator() -> ScriptedGenerator {
    ScriptedGenerator::new().with_default(Ok(draft_output_json(
        "Data Storage",
        fixtures::POLICY_STORAGE,
        PROPOSED,
        "Explicitly requires in-transit encryption to meet the regulation.",
    )))
}

#[tokio::test]
async fn drafts_amendment_preserving_original_sentence() {
    let pipeline = pipeline_with(transit_draft_generator());
    let gap = transit_gap();

    let report = pipeline
        .draft_amendments(vec![gap.clone()], fixtures::POLICY_ID)
        .await
        .unwrap();

    assert_eq!(report.amendments.len(), 1);
    assert!(report.errors.is_empty());

    let amendment = &report.amendments[0];
    assert_eq!(amendment.gap_id, gap.gap_id);
    assert_eq!(amendment.original_text, fixtures::POLICY_STORAGE);
    assert!(amendment.proposed_text.contains("in transit"));
    assert_eq!(amendment.change_type, ChangeType::Modification);
    assert!(!amendment.rationale.is_empty());
}

#[tokio::test]
async fn cross_policy_gap_fails_per_entry_only() {
    let pipeline = pipeline_with(transit_draft_generator());
    let valid = transit_gap();
    let mut foreign = retention_gap();
    foreign.policy_id = "some_other_policy".to_string();

    let report = pipeline
        .draft_amendments(vec![foreign.clone(), valid.clone()], fixtures::POLICY_ID)
        .await
        .unwrap();

    // The valid gap still drafts; the foreign one is rejected per entry.
    assert_eq!(report.amendments.len(), 1);
    assert_eq!(report.amendments[0].gap_id, valid.gap_id);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].gap_id, foreign.gap_id);
    assert!(report.errors[0].reason.contains("invalid reference"));
}

#[tokio::test]
async fn every_amendment_references_a_supplied_gap() {
    let pipeline = pipeline_with(transit_draft_generator());
    let gaps = vec![transit_gap(), retention_gap()];
    let supplied_ids: Vec<GapId> = gaps.iter().map(|g| g.gap_id.clone()).collect();

    let report = pipeline
        .draft_amendments(gaps, fixtures::POLICY_ID)
        .await
        .unwrap();

    assert_eq!(report.amendments.len(), 2);
    for amendment in &report.amendments {
        assert!(supplied_ids.contains(&amendment.gap_id));
    }
}

#[tokio::test]
async fn one_unparsable_draft_does_not_block_the_rest() {
    // Retention drafting answers garbage on both attempts; the transit
    // amendment still lands.
    let generator = ScriptedGenerator::new()
        .with_rule("Vague retention period", Ok("not json".to_string()))
        .with_default(Ok(draft_output_json(
            "Data Storage",
            fixtures::POLICY_STORAGE,
            PROPOSED,
            "Adds in-transit encryption.",
        )));
    let pipeline = pipeline_with(generator);
    let transit = transit_gap();
    let retention = retention_gap();

    let report = pipeline
        .draft_amendments(vec![transit.clone(), retention.clone()], fixtures::POLICY_ID)
        .await
        .unwrap();

    assert_eq!(report.amendments.len(), 1);
    assert_eq!(report.amendments[0].gap_id, transit.gap_id);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].gap_id, retention.gap_id);
    assert!(report.summary.contains("could not be drafted"));
}

#[tokio::test]
async fn repeated_drafting_yields_fresh_amendment_ids() {
    let pipeline = pipeline_with(transit_draft_generator());
    let gap = transit_gap();

    let first = pipeline
        .draft_amendments(vec![gap.clone()], fixtures::POLICY_ID)
        .await
        .unwrap();
    let second = pipeline
        .draft_amendments(vec![gap], fixtures::POLICY_ID)
        .await
        .unwrap();

    assert_ne!(
        first.amendments[0].amendment_id,
        second.amendments[0].amendment_id
    );
    assert_eq!(first.amendments[0].gap_id, second.amendments[0].gap_id);
}

#[tokio::test]
async fn unknown_policy_aborts_the_whole_request() {
    let pipeline = pipeline_with(transit_draft_generator());

    let err = pipeline
        .draft_amendments(vec![transit_gap()], "no_such_policy")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not found"));
}
