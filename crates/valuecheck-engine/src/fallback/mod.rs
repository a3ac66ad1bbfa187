//! Synthetic stage output used when the model cannot supply it.
//!
//! Every generator returns the same typed output the parser produces for a
//! real response. Randomness comes only from the injected [`RandomSource`].

pub mod random;
mod segments;
mod stages;

pub use random::{RandomSource, SeededRandom};
pub use segments::segmentation;
pub use stages::{FallbackContext, generate, sensitivity_factor};

use valuecheck_utils::types::StageId;

use crate::aggregate::compose_result;
use crate::product::ProductInput;
use crate::result::{AssessmentResult, ProductSummary, Provenance};
use crate::segment::{SegmentState, normalize_segments};

/// Complete assessment built without any model calls.
///
/// Runs the canonical segmentation and every segment stage through the
/// generators, then composes the result like a real run. Tagged `fallback`.
#[must_use]
pub fn full_assessment(product: &ProductInput, rng: &dyn RandomSource) -> AssessmentResult {
    let segmentation = segmentation();
    let mut states = SegmentState::from_segments(&normalize_segments(&segmentation.segments));

    for state in &mut states {
        for stage in StageId::SEGMENT_STAGES {
            let output = generate(
                stage,
                product,
                &FallbackContext {
                    segment: &state.profile,
                    results: &state.results,
                },
                rng,
            );
            state.results.record(output);
        }
    }

    let mut result = compose_result(product, &segmentation, &states);
    result.product_summary = ProductSummary::offline(product);
    result.source = Provenance::Fallback;
    result
}
