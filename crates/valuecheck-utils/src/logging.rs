//! Logging and observability for valuecheck
//!
//! Structured logging via `tracing`. The CLI installs a subscriber once with
//! [`init_tracing`]; library code only emits events. Stage helpers attach the
//! `stage`, `segment` and `duration_ms` fields consistently so log lines from
//! the orchestrator can be filtered per stage or per segment.

use tracing::{Level, info, span, warn};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::redaction::redact_secrets;
use crate::types::StageId;

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set. Otherwise verbose mode logs the valuecheck crates
/// at debug level. Output goes to stderr so stdout stays clean for JSON.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("valuecheck=debug,valuecheck_engine=debug,valuecheck_llm=debug,info")
            } else {
                EnvFilter::try_new("warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Span covering one stage for one segment (or the segmentation stage).
pub fn stage_span(stage: StageId, segment: Option<&str>) -> tracing::Span {
    span!(
        Level::INFO,
        "stage",
        stage = %stage,
        segment = segment.unwrap_or("-"),
    )
}

pub fn log_stage_start(stage: StageId, segment: Option<&str>) {
    info!(
        stage = %stage,
        segment = segment.unwrap_or("-"),
        "Starting stage"
    );
}

pub fn log_stage_complete(stage: StageId, segment: Option<&str>, duration_ms: u128) {
    info!(
        stage = %stage,
        segment = segment.unwrap_or("-"),
        duration_ms = %duration_ms,
        "Stage completed"
    );
}

/// Log a recoverable stage failure that is about to be replaced with fallback data.
///
/// Error text is redacted before it is recorded.
pub fn log_stage_fallback(stage: StageId, segment: Option<&str>, error: &str, duration_ms: u128) {
    let sanitized_error = redact_secrets(error);
    warn!(
        stage = %stage,
        segment = segment.unwrap_or("-"),
        duration_ms = %duration_ms,
        error = %sanitized_error,
        "Stage failed, substituting fallback output"
    );
}
