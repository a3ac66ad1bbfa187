//! Customer segments and the per-segment run state.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use valuecheck_utils::types::PricingSensitivity;

use crate::outputs::{RawSegment, SegmentResults};

static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Name given to the segment synthesised when segmentation yields none
pub const DEFAULT_SEGMENT_NAME: &str = "General Market";

/// Read-only profile of one customer segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    /// Unique within one run
    pub id: String,
    pub name: String,
    pub description: String,
    pub primary_needs: Vec<String>,
    pub buying_criteria: Vec<String>,
    pub pricing_sensitivity: PricingSensitivity,
    pub representative_share: String,
    pub value_drivers_focus: Vec<String>,
    pub risk_factors: Vec<String>,
}

/// Lowercase slug of `value` with the 1-based `index` appended.
///
/// The ordinal suffix makes ids unique even when names repeat.
#[must_use]
pub fn slugify(value: &str, index: usize) -> String {
    let lowered = value.to_lowercase();
    let slug = NON_SLUG_CHARS.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    let base = if slug.is_empty() { "segment" } else { slug };
    format!("{base}-{}", index + 1)
}

/// Turn model-proposed segments into profiles with unique ids.
///
/// Zero proposed segments yields exactly one default segment.
#[must_use]
pub fn normalize_segments(raw: &[RawSegment]) -> Vec<Segment> {
    if raw.is_empty() {
        return vec![default_segment()];
    }

    raw.iter()
        .enumerate()
        .map(|(index, segment)| {
            let name = segment.name.trim();
            let name = if name.is_empty() {
                format!("Segment {}", index + 1)
            } else {
                name.to_string()
            };
            let id_source = if segment.id.trim().is_empty() {
                name.as_str()
            } else {
                segment.id.as_str()
            };

            Segment {
                id: slugify(id_source, index),
                description: segment.description.trim().to_string(),
                primary_needs: segment.primary_needs.clone(),
                buying_criteria: segment.buying_criteria.clone(),
                pricing_sensitivity: PricingSensitivity::from_free_text(
                    &segment.pricing_sensitivity,
                ),
                representative_share: non_empty_or(&segment.representative_share, "Not specified"),
                value_drivers_focus: segment.value_drivers_focus.clone(),
                risk_factors: segment.risk_factors.clone(),
                name,
            }
        })
        .collect()
}

/// The single segment used when segmentation produced nothing usable.
#[must_use]
pub fn default_segment() -> Segment {
    Segment {
        id: slugify(DEFAULT_SEGMENT_NAME, 0),
        name: DEFAULT_SEGMENT_NAME.to_string(),
        description: "All prospective buyers evaluated as one market.".to_string(),
        primary_needs: vec![
            "Reliable performance".to_string(),
            "Competitive total cost of ownership".to_string(),
        ],
        buying_criteria: vec![
            "Upfront price".to_string(),
            "Documented lifetime savings".to_string(),
        ],
        pricing_sensitivity: PricingSensitivity::Medium,
        representative_share: "100%".to_string(),
        value_drivers_focus: vec!["Operating cost savings".to_string()],
        risk_factors: vec!["Unclear differentiation versus incumbent options".to_string()],
    }
}

fn non_empty_or(value: &str, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Mutable accumulator for one segment during a run.
#[derive(Debug, Clone)]
pub struct SegmentState {
    pub index: usize,
    pub profile: Segment,
    pub results: SegmentResults,
}

impl SegmentState {
    #[must_use]
    pub fn new(index: usize, profile: Segment) -> Self {
        Self {
            index,
            profile,
            results: SegmentResults::default(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.profile.id
    }

    /// One state per segment, in segment order.
    #[must_use]
    pub fn from_segments(segments: &[Segment]) -> Vec<Self> {
        segments
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, profile)| Self::new(index, profile))
            .collect()
    }
}
