//! Progress notifications emitted during a run.

use tokio::sync::mpsc::UnboundedSender;

use valuecheck_utils::error::AssessmentError;
use valuecheck_utils::types::StageId;

use crate::result::AssessmentResult;

/// Receives progress from the orchestrator.
///
/// Calls are made synchronously from the run, in order. Every method has a
/// no-op default so observers only implement what they render.
pub trait AssessmentObserver: Send + Sync {
    fn on_step_started(&self, _stage: StageId) {}

    /// Once per stage. `success` is false when any segment needed fallback;
    /// `error` is then the last failure seen for the stage.
    fn on_step_completed(&self, _stage: StageId, _success: bool, _error: Option<&AssessmentError>) {}

    /// Snapshot after segmentation and after every segment-stage.
    fn on_partial_result(&self, _partial: &AssessmentResult) {}
}

/// Ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl AssessmentObserver for NoopObserver {}

/// Owned form of an observer notification.
#[derive(Debug, Clone)]
pub enum AssessmentEvent {
    StepStarted(StageId),
    StepCompleted {
        stage: StageId,
        success: bool,
        /// Display text of the failure
        error: Option<String>,
    },
    PartialResult(Box<AssessmentResult>),
}

/// Forwards notifications into an unbounded tokio channel.
///
/// A dropped receiver is ignored; the run does not depend on anyone listening.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: UnboundedSender<AssessmentEvent>,
}

impl ChannelObserver {
    #[must_use]
    pub fn new(tx: UnboundedSender<AssessmentEvent>) -> Self {
        Self { tx }
    }
}

impl AssessmentObserver for ChannelObserver {
    fn on_step_started(&self, stage: StageId) {
        let _ = self.tx.send(AssessmentEvent::StepStarted(stage));
    }

    fn on_step_completed(&self, stage: StageId, success: bool, error: Option<&AssessmentError>) {
        let _ = self.tx.send(AssessmentEvent::StepCompleted {
            stage,
            success,
            error: error.map(ToString::to_string),
        });
    }

    fn on_partial_result(&self, partial: &AssessmentResult) {
        let _ = self
            .tx
            .send(AssessmentEvent::PartialResult(Box::new(partial.clone())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn channel_observer_forwards_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let observer = ChannelObserver::new(tx);

        observer.on_step_started(StageId::Segmentation);
        observer.on_step_completed(
            StageId::Segmentation,
            false,
            Some(&AssessmentError::Parse("bad".to_string())),
        );

        assert!(matches!(
            rx.try_recv(),
            Ok(AssessmentEvent::StepStarted(StageId::Segmentation))
        ));
        match rx.try_recv() {
            Ok(AssessmentEvent::StepCompleted {
                stage,
                success,
                error,
            }) => {
                assert_eq!(stage, StageId::Segmentation);
                assert!(!success);
                assert!(error.unwrap().contains("bad"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn dropped_receiver_is_ignored() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        ChannelObserver::new(tx).on_step_started(StageId::NbaValue);
        NoopObserver.on_step_started(StageId::NbaValue);
    }
}
