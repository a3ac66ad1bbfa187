//! End-to-end orchestrator runs against a scripted backend.
//!
//! Covers the fatal/recoverable split, zero-segment recovery, fallback shape
//! parity, and the all-calls-fail scenario.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use valuecheck::{
    AssessmentError, AssessmentEvent, AssessmentOptions, ChannelObserver, NoopObserver,
    ProductInput, Provenance, SeededRandom, SegmentOrchestrator, StageId, full_assessment,
};
use valuecheck_engine::test_support::ScriptedBackend;

fn ecobike() -> ProductInput {
    ProductInput::new("EcoBike 3000", "electric bike with recycled frame")
}

fn orchestrator(backend: &ScriptedBackend, use_fallback: bool) -> SegmentOrchestrator {
    SegmentOrchestrator::new(
        Arc::new(backend.clone()),
        AssessmentOptions {
            use_fallback,
            timeout: Duration::from_secs(2),
            seed: Some(42),
            ..AssessmentOptions::default()
        },
    )
}

/// JSON pointers every segment report must carry, with the expected kind.
const SEGMENT_CONTRACT: &[(&str, Kind)] = &[
    ("/step1_nbaAnalysis/identifiedAlternatives", Kind::List),
    ("/step1_nbaValue/nbaValue", Kind::Number),
    ("/step2_valueDifferentiators/differentiators", Kind::List),
    ("/step3_willingnessToPay", Kind::Object),
    ("/step4_totalValue/totalValueToCustomer", Kind::Number),
    ("/step5_customerCommunication/communicationStrategy", Kind::Text),
    ("/step6_companyGuidance", Kind::Object),
    ("/executiveSummary/recommendedPrice", Kind::Number),
    ("/executiveSummary/confidenceLevel", Kind::Number),
    ("/executiveSummary/keyFindings", Kind::List),
    ("/executiveSummary/nextSteps", Kind::List),
    ("/executiveSummary/metrics/nbaValue", Kind::Number),
    ("/executiveSummary/metrics/differentiatorValue", Kind::Number),
    ("/executiveSummary/metrics/totalWillingnessToPay", Kind::Number),
];

#[derive(Debug, Clone, Copy)]
enum Kind {
    Number,
    Text,
    List,
    Object,
}

fn assert_contract(result: &Value, label: &str) {
    let segments = result["segments"].as_array().expect("segments array");
    assert!(!segments.is_empty(), "{label}: no segments");

    for segment in segments {
        for (pointer, kind) in SEGMENT_CONTRACT {
            let value = segment
                .pointer(pointer)
                .unwrap_or_else(|| panic!("{label}: {pointer} missing"));
            let ok = match kind {
                Kind::Number => value.is_number(),
                Kind::Text => value.is_string(),
                Kind::List => value.is_array(),
                Kind::Object => value.is_object(),
            };
            assert!(ok, "{label}: {pointer} should be {kind:?}, got {value}");
        }
    }

    let stats = &result["crossSegmentSummary"]["summaryStats"];
    assert!(stats["spread"].is_number(), "{label}: spread missing");
    assert!(stats["averageRecommendedPrice"].is_number());
}

#[tokio::test]
async fn fallback_and_minimal_outputs_share_the_same_contract() {
    let offline = full_assessment(&ecobike(), &SeededRandom::from_seed(5));
    assert_contract(&serde_json::to_value(&offline).unwrap(), "fallback");

    let backend = ScriptedBackend::new()
        .reply(StageId::Segmentation, r#"{"segments": [{"name": "Fleet"}]}"#)
        .reply(StageId::NbaAnalysis, r#"{"identifiedAlternatives": []}"#)
        .reply(StageId::NbaValue, r#"{"nbaValue": 900}"#)
        .reply(StageId::ValueDifferentiators, r#"{"differentiators": []}"#)
        .reply(StageId::WillingnessToPay, r#"{"totalWillingnessToPay": 900}"#)
        .reply(
            StageId::CustomerCommunication,
            r#"{"communicationStrategy": "Lead with cost"}"#,
        )
        .reply(StageId::CompanyGuidance, r#"{"valueDriverStrengths": []}"#);

    let result = orchestrator(&backend, false)
        .assess_product(&ecobike(), &NoopObserver)
        .await
        .unwrap();

    assert_eq!(result.source, Provenance::OpenaiMultiCall);
    assert_eq!(result.segments.len(), 1);
    assert_eq!(result.segments[0].executive_summary.recommended_price, 900);
    assert_contract(&serde_json::to_value(&result).unwrap(), "minimal");
}

#[tokio::test]
async fn zero_segments_yield_one_default_segment() {
    let backend = ScriptedBackend::new().reply(StageId::Segmentation, r#"{"segments": []}"#);

    let result = orchestrator(&backend, false)
        .assess_product(&ecobike(), &NoopObserver)
        .await
        .unwrap();

    assert_eq!(result.segments.len(), 1);
    assert!(!result.is_degraded());
    assert!(result.stage_history.iter().all(|r| r.success));
    assert_eq!(backend.call_sequence().len(), 1 + StageId::SEGMENT_STAGES.len());
}

#[tokio::test]
async fn stage_failure_is_fatal_without_fallback() {
    let backend = ScriptedBackend::new().fail(StageId::ValueDifferentiators, "connection reset");

    let err = orchestrator(&backend, false)
        .assess_product(&ecobike(), &NoopObserver)
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(StageId::ValueDifferentiators));
    assert!(matches!(err.root(), AssessmentError::Transport(_)));
    assert!(matches!(
        err,
        AssessmentError::StageFailed { ref segment, .. } if segment.as_deref() == Some("fleet-1")
    ));

    // Nothing after the failing call runs
    let sequence = backend.call_sequence();
    assert_eq!(
        sequence.last(),
        Some(&(
            StageId::ValueDifferentiators.as_str().to_string(),
            Some("fleet-1".to_string())
        ))
    );
}

#[tokio::test]
async fn same_failure_degrades_with_fallback() {
    let backend = ScriptedBackend::new().fail(StageId::ValueDifferentiators, "connection reset");

    let result = orchestrator(&backend, true)
        .assess_product(&ecobike(), &NoopObserver)
        .await
        .unwrap();

    assert_eq!(result.source, Provenance::Fallback);
    assert!(result.is_degraded());

    let failed: Vec<_> = result.failed_stages().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].stage, StageId::ValueDifferentiators);
    assert_eq!(failed[0].segment_id.as_deref(), Some("fleet-1"));

    // The synthetic stage output still feeds the segment's report
    let fleet = result.segment("fleet-1").unwrap();
    assert!(fleet.results.value_differentiators.is_some());
    assert!(fleet.results.willingness_to_pay.is_some());
}

#[tokio::test]
async fn every_call_failing_still_produces_a_report() {
    let backend = ScriptedBackend::failing();

    let result = orchestrator(&backend, true)
        .assess_product(&ecobike(), &NoopObserver)
        .await
        .unwrap();

    assert_eq!(result.source, Provenance::Fallback);
    assert!(!result.segments.is_empty());
    assert!(result.stage_history.iter().all(|r| !r.success));

    let stats = result
        .cross_segment_summary
        .summary_stats
        .as_ref()
        .expect("summary stats for non-empty segments");
    assert!(stats.highest.recommended_price >= stats.lowest.recommended_price);
    assert_eq!(
        stats.spread,
        stats.highest.recommended_price - stats.lowest.recommended_price
    );

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["_source"], "fallback");
    for segment in json["segments"].as_array().unwrap() {
        assert!(segment["executiveSummary"]["recommendedPrice"].as_u64().is_some());
    }
}

#[tokio::test]
async fn preconditions_fail_before_any_stage_call() {
    let backend = ScriptedBackend::failing();
    let blank = ProductInput::new("  ", "electric bike");
    let err = orchestrator(&backend, true)
        .assess_product(&blank, &NoopObserver)
        .await
        .unwrap_err();
    assert!(matches!(err, AssessmentError::Validation(_)));
    assert!(backend.calls().is_empty());

    let unconfigured = ScriptedBackend::without_credentials();
    let err = orchestrator(&unconfigured, true)
        .assess_product(&ecobike(), &NoopObserver)
        .await
        .unwrap_err();
    assert!(matches!(err, AssessmentError::Configuration(_)));
    assert!(unconfigured.calls().is_empty());
}

#[tokio::test]
async fn failed_connectivity_probe_aborts_even_with_fallback() {
    let backend = ScriptedBackend::failing();
    let orchestrator = SegmentOrchestrator::new(
        Arc::new(backend.clone()),
        AssessmentOptions {
            use_fallback: true,
            verify_connectivity: true,
            timeout: Duration::from_secs(2),
            ..AssessmentOptions::default()
        },
    );

    let err = orchestrator
        .assess_product(&ecobike(), &NoopObserver)
        .await
        .unwrap_err();

    assert!(matches!(err, AssessmentError::Connectivity(_)));
    assert_eq!(backend.calls().len(), 1);
}

#[tokio::test]
async fn progress_events_arrive_in_stage_order() {
    let backend = ScriptedBackend::new().fail(StageId::NbaValue, "upstream 503");
    let (tx, mut rx) = mpsc::unbounded_channel();
    let observer = ChannelObserver::new(tx);

    orchestrator(&backend, true)
        .assess_product(&ecobike(), &observer)
        .await
        .unwrap();
    drop(observer);

    let mut started = Vec::new();
    let mut completed = Vec::new();
    let mut partials = 0;
    while let Some(event) = rx.recv().await {
        match event {
            AssessmentEvent::StepStarted(stage) => started.push(stage),
            AssessmentEvent::StepCompleted { stage, success, .. } => {
                completed.push((stage, success));
            }
            AssessmentEvent::PartialResult(_) => partials += 1,
        }
    }

    assert_eq!(started, StageId::ALL.to_vec());
    assert_eq!(completed.len(), StageId::ALL.len());
    assert!(completed.contains(&(StageId::NbaValue, false)));
    assert!(completed.contains(&(StageId::CompanyGuidance, true)));
    // One after segmentation, then one per segment-stage for two segments
    assert_eq!(partials, 1 + StageId::SEGMENT_STAGES.len() * 2);
}
