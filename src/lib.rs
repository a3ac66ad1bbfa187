//! valuecheck - economic value assessment for sustainable products
//!
//! Estimates what each customer segment would pay for a product by running a
//! fixed sequence of LLM analysis stages per segment and aggregating the
//! answers into one structured report. When a stage cannot be answered, a
//! plausible synthetic output stands in so the report keeps its shape.
//!
//! valuecheck can be used in two ways:
//! - **CLI**: run `valuecheck assess` or `valuecheck offline` from the command line
//! - **Library**: build a [`SegmentOrchestrator`] and call
//!   [`SegmentOrchestrator::assess_product`]
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! export OPENAI_API_KEY=...
//! valuecheck assess --name "EcoBike" --description "Recycled aluminium e-bike" --pretty
//!
//! # No provider needed
//! valuecheck offline --name "EcoBike" --description "Recycled aluminium e-bike" --seed 7
//! ```
//!
//! # Quick Start (Library)
//!
//! ```no_run
//! use valuecheck::{CliArgs, Config, NoopObserver, ProductInput, SegmentOrchestrator};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let config = Config::discover(&CliArgs::default())?;
//! let orchestrator = SegmentOrchestrator::from_config(&config)?;
//! let product = ProductInput::new("EcoBike", "Recycled aluminium e-bike");
//! let result = orchestrator.assess_product(&product, &NoopObserver).await?;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! # Ok(())
//! # }
//! ```
//!
//! # Stable Public API
//!
//! - [`ProductInput`] and [`DocumentText`] - what is assessed
//! - [`SegmentOrchestrator`] and [`AssessmentOptions`] - running an assessment
//! - [`AssessmentResult`] - the report
//! - [`AssessmentObserver`] - progress notifications
//! - [`Config`] and [`ConfigBuilder`] - configuration
//! - [`AssessmentError`] and [`ExitCode`] - failures
//!
//! The [`cli`] and [`extraction`] modules back the binary and are not
//! covered by semver guarantees.

pub use valuecheck_config::{CliArgs, Config, ConfigBuilder};
pub use valuecheck_engine::{
    AssessmentEvent, AssessmentObserver, AssessmentOptions, AssessmentResult, ChannelObserver,
    DocumentText, NoopObserver, ProductInput, Provenance, RandomSource, SeededRandom,
    SegmentOrchestrator, StageRecord, full_assessment,
};
pub use valuecheck_llm::{LlmBackend, LlmInvocation, LlmResult, Message};
pub use valuecheck_utils::error::{AssessmentError, ConfigError, LlmError, UserFriendlyError};
pub use valuecheck_utils::exit_codes::ExitCode;
pub use valuecheck_utils::types::{PricingSensitivity, StageId};

#[doc(hidden)]
pub mod cli;
#[doc(hidden)]
pub mod extraction;
