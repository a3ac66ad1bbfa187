//! Assessment engine for valuecheck
//!
//! Turns a [`ProductInput`] into an [`AssessmentResult`] by running a fixed
//! pipeline of model calls per customer segment:
//!
//! 1. segmentation (once)
//! 2. NBA analysis, NBA value, value differentiators, willingness to pay,
//!    customer communication, company guidance (per segment, in order)
//!
//! Each stage's reply is parsed into a typed output. When a call fails and
//! fallback is enabled, [`fallback`] supplies output of the same type, and the
//! result's provenance records the degradation.

pub mod aggregate;
pub mod events;
pub mod fallback;
pub mod orchestrator;
pub mod outputs;
pub mod parse;
pub mod product;
pub mod prompts;
pub mod result;
pub mod segment;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use aggregate::{SegmentFigures, compose_result, cross_segment_summary};
pub use events::{AssessmentEvent, AssessmentObserver, ChannelObserver, NoopObserver};
pub use fallback::{RandomSource, SeededRandom, full_assessment};
pub use orchestrator::{AssessmentOptions, PROBE_STAGE_ID, SegmentOrchestrator};
pub use outputs::StageOutput;
pub use parse::parse_json;
pub use product::{BaseInfo, DocumentText, ProductInput};
pub use result::{AssessmentResult, Provenance, StageRecord};
pub use segment::{Segment, SegmentState};
