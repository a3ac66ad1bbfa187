//! Segment orchestrator.
//!
//! Runs segmentation once, then the six segment stages in order, each stage
//! for every segment before the next stage starts. A segment's stage N prompt
//! always sees its stage N-1 output (real or synthetic). Execution is
//! sequential; each segment owns its state and never reads another's.

mod stage_exec;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use valuecheck_config::{Config, DEFAULT_DOC_EXCERPT_CHARS, DEFAULT_REQUEST_TIMEOUT_SECS};
use valuecheck_llm::LlmBackend;
use valuecheck_utils::error::AssessmentError;
use valuecheck_utils::types::StageId;

use crate::aggregate::compose_result;
use crate::events::AssessmentObserver;
use crate::fallback::{self, FallbackContext, RandomSource, SeededRandom};
use crate::outputs::{SegmentationOutput, StageOutput};
use crate::product::{BaseInfo, ProductInput};
use crate::prompts::{PromptContext, build_prompt};
use crate::result::{AssessmentResult, StageRecord};
use crate::segment::{SegmentState, normalize_segments};

/// Stage id reported for the connectivity probe
pub const PROBE_STAGE_ID: &str = "connectivity-probe";

/// Run-time switches for one orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentOptions {
    /// Substitute synthetic output for failed stages instead of aborting
    pub use_fallback: bool,
    /// Send one probe request before the first stage
    pub verify_connectivity: bool,
    /// Deadline for each model call
    pub timeout: Duration,
    /// `None` uses the backend's default model
    pub model: Option<String>,
    /// Seed for fallback figures
    pub seed: Option<u64>,
    pub doc_excerpt_chars: usize,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl Default for AssessmentOptions {
    fn default() -> Self {
        Self {
            use_fallback: true,
            verify_connectivity: false,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            model: None,
            seed: None,
            doc_excerpt_chars: DEFAULT_DOC_EXCERPT_CHARS,
            max_tokens: None,
            temperature: None,
        }
    }
}

impl AssessmentOptions {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            use_fallback: config.use_fallback(),
            verify_connectivity: config.verify_connectivity(),
            timeout: config.request_timeout(),
            model: Some(config.model().to_string()),
            seed: config.seed(),
            doc_excerpt_chars: config.doc_excerpt_chars(),
            max_tokens: Some(config.max_tokens()),
            temperature: Some(config.temperature()),
        }
    }
}

/// Drives one or more assessment runs against an [`LlmBackend`].
///
/// Holds no per-run state, so concurrent runs on one orchestrator are
/// independent apart from sharing the random source.
pub struct SegmentOrchestrator {
    backend: Arc<dyn LlmBackend>,
    options: AssessmentOptions,
    random: Arc<dyn RandomSource>,
}

impl SegmentOrchestrator {
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>, options: AssessmentOptions) -> Self {
        let random = Arc::new(SeededRandom::from_optional_seed(options.seed));
        Self {
            backend,
            options,
            random,
        }
    }

    /// Build the configured backend and options from `config`.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::Configuration` when the backend cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, AssessmentError> {
        let backend = valuecheck_llm::from_config(config)
            .map_err(|e| AssessmentError::Configuration(e.to_string()))?;
        Ok(Self::new(
            Arc::from(backend),
            AssessmentOptions::from_config(config),
        ))
    }

    #[must_use]
    pub fn with_random_source(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    #[must_use]
    pub fn options(&self) -> &AssessmentOptions {
        &self.options
    }

    /// Assess `product` end to end.
    ///
    /// Input is validated, then the backend configuration, then connectivity
    /// (when enabled); none of these fall back. Stage failures fall back when
    /// `use_fallback` is set, otherwise the first one aborts the run.
    ///
    /// # Errors
    ///
    /// `Validation`, `Configuration` and `Connectivity` for failed
    /// preconditions; `StageFailed` for a stage failure with fallback off.
    pub async fn assess_product(
        &self,
        product: &ProductInput,
        observer: &dyn AssessmentObserver,
    ) -> Result<AssessmentResult, AssessmentError> {
        product.validate()?;
        self.backend
            .check_configuration()
            .map_err(|e| AssessmentError::Configuration(e.to_string()))?;
        if self.options.verify_connectivity {
            self.verify_connectivity().await?;
        }

        info!(product = %product.name, fallback = self.options.use_fallback, "Starting assessment");

        let base = BaseInfo::from_product(product, self.options.doc_excerpt_chars);
        let mut history: Vec<StageRecord> = Vec::new();

        let segmentation = self.run_segmentation(&base, observer, &mut history).await?;
        let mut states = SegmentState::from_segments(&normalize_segments(&segmentation.segments));
        debug!(segments = states.len(), "Segments normalized");

        observer.on_partial_result(&snapshot(product, &segmentation, &states, &history));

        for stage in StageId::SEGMENT_STAGES {
            observer.on_step_started(stage);
            let mut last_error: Option<AssessmentError> = None;

            for index in 0..states.len() {
                let state = &states[index];
                let prompt = build_prompt(
                    stage,
                    &PromptContext::segment(&base, &state.profile, &state.results),
                );
                let fallback_ctx = FallbackContext {
                    segment: &state.profile,
                    results: &state.results,
                };
                let random = self.random.as_ref();

                let outcome = self
                    .execute(
                        stage,
                        Some(state.id()),
                        prompt,
                        || fallback::generate(stage, product, &fallback_ctx, random),
                        &mut history,
                    )
                    .await;

                let (output, failure) = match outcome {
                    Ok(resolved) => resolved,
                    Err(err) => {
                        observer.on_step_completed(stage, false, Some(&err));
                        return Err(err);
                    }
                };

                states[index].results.record(output);
                if failure.is_some() {
                    last_error = failure;
                }
                observer.on_partial_result(&snapshot(product, &segmentation, &states, &history));
            }

            observer.on_step_completed(stage, last_error.is_none(), last_error.as_ref());
        }

        let result = compose_result(product, &segmentation, &states).with_history(history);
        info!(
            segments = result.segments.len(),
            source = result.source.as_str(),
            "Assessment complete"
        );
        Ok(result)
    }

    async fn run_segmentation(
        &self,
        base: &BaseInfo,
        observer: &dyn AssessmentObserver,
        history: &mut Vec<StageRecord>,
    ) -> Result<SegmentationOutput, AssessmentError> {
        let stage = StageId::Segmentation;
        observer.on_step_started(stage);

        let prompt = build_prompt(stage, &PromptContext::product(base));
        let outcome = self
            .execute(
                stage,
                None,
                prompt,
                || StageOutput::Segmentation(fallback::segmentation()),
                history,
            )
            .await;

        match outcome {
            Ok((StageOutput::Segmentation(segmentation), failure)) => {
                observer.on_step_completed(stage, failure.is_none(), failure.as_ref());
                Ok(segmentation)
            }
            Ok((other, _)) => {
                let err = AssessmentError::Shape {
                    stage,
                    reason: format!("expected segmentation output, got {}", other.stage()),
                }
                .in_stage(stage, None);
                observer.on_step_completed(stage, false, Some(&err));
                Err(err)
            }
            Err(err) => {
                observer.on_step_completed(stage, false, Some(&err));
                Err(err)
            }
        }
    }
}

fn snapshot(
    product: &ProductInput,
    segmentation: &SegmentationOutput,
    states: &[SegmentState],
    history: &[StageRecord],
) -> AssessmentResult {
    compose_result(product, segmentation, states).with_history(history.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{AssessmentEvent, ChannelObserver, NoopObserver};
    use crate::test_support::ScriptedBackend;
    use tokio::sync::mpsc;

    fn product() -> ProductInput {
        ProductInput::new("EcoBike 3000", "electric bike with recycled frame")
    }

    fn orchestrator(backend: &ScriptedBackend, use_fallback: bool) -> SegmentOrchestrator {
        SegmentOrchestrator::new(
            Arc::new(backend.clone()),
            AssessmentOptions {
                use_fallback,
                seed: Some(7),
                timeout: Duration::from_secs(2),
                ..AssessmentOptions::default()
            },
        )
    }

    #[tokio::test]
    async fn stages_run_in_order_for_every_segment() {
        let backend = ScriptedBackend::new();
        let result = orchestrator(&backend, false)
            .assess_product(&product(), &NoopObserver)
            .await
            .unwrap();

        assert_eq!(result.segments.len(), 2);
        assert!(!result.is_degraded());

        let sequence = backend.call_sequence();
        assert_eq!(sequence.len(), 1 + 6 * 2);
        assert_eq!(sequence[0], ("segmentation".to_string(), None));

        let mut expected = Vec::new();
        for stage in StageId::SEGMENT_STAGES {
            for id in ["fleet-1", "leaders-2"] {
                expected.push((stage.as_str().to_string(), Some(id.to_string())));
            }
        }
        assert_eq!(sequence[1..], expected[..]);
    }

    #[tokio::test]
    async fn prompts_carry_prior_stage_output() {
        let backend = ScriptedBackend::new();
        orchestrator(&backend, false)
            .assess_product(&product(), &NoopObserver)
            .await
            .unwrap();

        let calls = backend.calls();
        let nba_value_call = calls
            .iter()
            .find(|c| c.stage_id == "nba-value")
            .unwrap();
        assert!(nba_value_call.prompt().contains("Legacy Cruiser"));
        assert!(nba_value_call.prompt().contains("Fleet Operators"));
    }

    #[tokio::test]
    async fn observer_sees_partials_and_aggregated_completion() {
        let backend = ScriptedBackend::new().fail(StageId::WillingnessToPay, "boom");
        let (tx, mut rx) = mpsc::unbounded_channel();

        let result = orchestrator(&backend, true)
            .assess_product(&product(), &ChannelObserver::new(tx))
            .await
            .unwrap();
        assert!(result.is_degraded());

        let mut partials = 0;
        let mut completions = Vec::new();
        while let Ok(event) = rx.try_recv() {
            match event {
                AssessmentEvent::PartialResult(_) => partials += 1,
                AssessmentEvent::StepCompleted { stage, success, .. } => {
                    completions.push((stage, success));
                }
                AssessmentEvent::StepStarted(_) => {}
            }
        }

        // One after segmentation plus one per segment-stage.
        assert_eq!(partials, 1 + 6 * 2);
        assert_eq!(completions.len(), 7);
        for (stage, success) in completions {
            assert_eq!(success, stage != StageId::WillingnessToPay, "{stage}");
        }

        let failed: Vec<_> = result.failed_stages().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].segment_id.as_deref(), Some("fleet-1"));
    }

    #[tokio::test]
    async fn validation_precedes_configuration() {
        let backend = ScriptedBackend::without_credentials();
        let err = orchestrator(&backend, true)
            .assess_product(&ProductInput::new(" ", "desc"), &NoopObserver)
            .await
            .unwrap_err();
        assert!(matches!(err, AssessmentError::Validation(_)));

        let err = orchestrator(&backend, true)
            .assess_product(&product(), &NoopObserver)
            .await
            .unwrap_err();
        assert!(matches!(err, AssessmentError::Configuration(_)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn connectivity_probe_runs_first_and_is_fatal() {
        let backend = ScriptedBackend::failing();
        let mut orchestrator = orchestrator(&backend, true);
        orchestrator.options.verify_connectivity = true;

        let err = orchestrator
            .assess_product(&product(), &NoopObserver)
            .await
            .unwrap_err();
        assert!(matches!(err, AssessmentError::Connectivity(_)));
        assert_eq!(backend.call_sequence(), vec![(PROBE_STAGE_ID.to_string(), None)]);
    }
}
