//! Single stage execution: call, parse, validate, fall back.

use std::time::Instant;

use serde_json::json;
use tracing::Instrument;

use valuecheck_llm::{LlmInvocation, LlmResult, Message};
use valuecheck_utils::error::AssessmentError;
use valuecheck_utils::logging::{
    log_stage_complete, log_stage_fallback, log_stage_start, stage_span,
};
use valuecheck_utils::types::StageId;

use super::{PROBE_STAGE_ID, SegmentOrchestrator};
use crate::outputs::StageOutput;
use crate::parse::parse_json;
use crate::prompts::{PROBE_PROMPT, SYSTEM_PROMPT};
use crate::result::StageRecord;

impl SegmentOrchestrator {
    /// Run one stage call and resolve failures.
    ///
    /// On a recoverable failure with fallback enabled, returns the synthetic
    /// output together with the error it replaced. Otherwise the error is
    /// tagged with stage and segment and returned.
    pub(super) async fn execute<F>(
        &self,
        stage: StageId,
        segment_id: Option<&str>,
        prompt: String,
        fallback: F,
        history: &mut Vec<StageRecord>,
    ) -> Result<(StageOutput, Option<AssessmentError>), AssessmentError>
    where
        F: FnOnce() -> StageOutput,
    {
        log_stage_start(stage, segment_id);
        let started = Instant::now();

        let outcome = self
            .call_stage(stage, segment_id, prompt)
            .instrument(stage_span(stage, segment_id))
            .await;
        let elapsed_ms = started.elapsed().as_millis();

        match outcome {
            Ok(output) => {
                log_stage_complete(stage, segment_id, elapsed_ms);
                history.push(StageRecord::succeeded(stage, segment_id));
                Ok((output, None))
            }
            Err(err) if self.options.use_fallback && err.is_recoverable() => {
                log_stage_fallback(stage, segment_id, &err.to_string(), elapsed_ms);
                history.push(StageRecord::failed(stage, segment_id, &err));
                Ok((fallback(), Some(err)))
            }
            Err(err) => {
                history.push(StageRecord::failed(stage, segment_id, &err));
                Err(err.in_stage(stage, segment_id))
            }
        }
    }

    async fn call_stage(
        &self,
        stage: StageId,
        segment_id: Option<&str>,
        prompt: String,
    ) -> Result<StageOutput, AssessmentError> {
        let mut invocation = self.invocation(
            stage.as_str(),
            vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)],
        );
        if let Some(segment_id) = segment_id {
            invocation = invocation.for_segment(segment_id);
        }

        let response = self.invoke_with_deadline(invocation).await?;
        let value = parse_json(&response.raw_response)?;
        StageOutput::from_value(stage, value)
    }

    fn invocation(&self, stage_id: &str, messages: Vec<Message>) -> LlmInvocation {
        let model = self.options.model.clone().unwrap_or_default();
        let mut invocation = LlmInvocation::new(stage_id, model, self.options.timeout, messages);
        if let Some(max_tokens) = self.options.max_tokens {
            invocation = invocation.with_metadata("max_tokens", json!(max_tokens));
        }
        if let Some(temperature) = self.options.temperature {
            invocation = invocation.with_metadata("temperature", json!(temperature));
        }
        invocation
    }

    /// The backend enforces its own timeout too; this one also bounds
    /// backends that ignore `LlmInvocation::timeout`.
    async fn invoke_with_deadline(
        &self,
        invocation: LlmInvocation,
    ) -> Result<LlmResult, AssessmentError> {
        let duration = self.options.timeout;
        let response = tokio::time::timeout(duration, self.backend.invoke(invocation))
            .await
            .map_err(|_| AssessmentError::Timeout { duration })??;
        Ok(response)
    }

    /// One lightweight call before the run. Any failure is fatal.
    pub(super) async fn verify_connectivity(&self) -> Result<(), AssessmentError> {
        let invocation = self.invocation(PROBE_STAGE_ID, vec![Message::user(PROBE_PROMPT)]);

        self.invoke_with_deadline(invocation)
            .instrument(tracing::info_span!("connectivity_probe"))
            .await
            .map(|_| ())
            .map_err(|e| AssessmentError::Connectivity(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::orchestrator::AssessmentOptions;
    use crate::test_support::{ScriptedBackend, canned_response};

    fn orchestrator(backend: ScriptedBackend, use_fallback: bool) -> SegmentOrchestrator {
        SegmentOrchestrator::new(
            Arc::new(backend),
            AssessmentOptions {
                use_fallback,
                timeout: Duration::from_millis(200),
                seed: Some(1),
                max_tokens: Some(1200),
                ..AssessmentOptions::default()
            },
        )
    }

    #[tokio::test]
    async fn successful_call_is_recorded() {
        let backend = ScriptedBackend::new().reply(StageId::NbaValue, canned_response(StageId::NbaValue));
        let orchestrator = orchestrator(backend.clone(), true);
        let mut history = Vec::new();

        let (output, failure) = orchestrator
            .execute(
                StageId::NbaValue,
                Some("general-market-1"),
                "prompt".to_string(),
                || panic!("fallback must not run"),
                &mut history,
            )
            .await
            .unwrap();

        assert!(failure.is_none());
        assert_eq!(output.stage(), StageId::NbaValue);
        assert_eq!(history, vec![StageRecord::succeeded(StageId::NbaValue, Some("general-market-1"))]);

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].segment_id.as_deref(), Some("general-market-1"));
        assert_eq!(calls[0].messages[0].content, SYSTEM_PROMPT);
        assert_eq!(calls[0].metadata.get("max_tokens"), Some(&json!(1200)));
    }

    #[tokio::test]
    async fn unparseable_reply_falls_back() {
        let backend = ScriptedBackend::new().reply(StageId::NbaValue, "I cannot answer that");
        let orchestrator = orchestrator(backend, true);
        let mut history = Vec::new();

        let (output, failure) = orchestrator
            .execute(
                StageId::NbaValue,
                None,
                "prompt".to_string(),
                || StageOutput::Segmentation(crate::fallback::segmentation()),
                &mut history,
            )
            .await
            .unwrap();

        assert!(matches!(failure, Some(AssessmentError::Parse(_))));
        assert_eq!(output.stage(), StageId::Segmentation);
        assert!(!history[0].success);
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let backend = ScriptedBackend::new()
            .reply(StageId::NbaValue, canned_response(StageId::NbaValue))
            .with_delay(Duration::from_secs(5));
        let orchestrator = orchestrator(backend, false);
        let mut history = Vec::new();

        let err = orchestrator
            .execute(
                StageId::NbaValue,
                Some("seg-1"),
                "prompt".to_string(),
                || panic!("fallback is disabled"),
                &mut history,
            )
            .await
            .unwrap_err();

        assert!(matches!(err.root(), AssessmentError::Timeout { .. }));
        assert_eq!(err.stage(), Some(StageId::NbaValue));
        assert!(matches!(err, AssessmentError::StageFailed { ref segment, .. } if segment.as_deref() == Some("seg-1")));
    }

    #[tokio::test]
    async fn probe_failure_is_connectivity_error() {
        let backend = ScriptedBackend::failing();
        let orchestrator = orchestrator(backend, true);
        let err = orchestrator.verify_connectivity().await.unwrap_err();
        assert!(matches!(err, AssessmentError::Connectivity(_)));
    }
}
