//! The assessment snapshot handed back to callers.
//!
//! Serialized field names follow the JSON consumers already read
//! (`step1_nbaAnalysis`, `_source`, `crossSegmentSummary`, ...).

use chrono::{DateTime, Utc};
use serde::Serialize;

use valuecheck_utils::error::AssessmentError;
use valuecheck_utils::redaction::redact_secrets;
use valuecheck_utils::types::StageId;

use crate::outputs::{SegmentResults, SegmentationOutput};
use crate::product::ProductInput;
use crate::segment::Segment;

/// Whether every stage came from the model or some were synthesised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    OpenaiMultiCall,
    Fallback,
}

impl Provenance {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Provenance::OpenaiMultiCall => "openai_multi_call",
            Provenance::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub title: String,
    pub description: String,
    pub sustainability_highlights: Vec<String>,
}

impl ProductSummary {
    /// Summary for a model-driven run.
    #[must_use]
    pub fn from_product(product: &ProductInput) -> Self {
        Self {
            title: product.name.clone(),
            description: product.description.clone(),
            sustainability_highlights: vec![
                "Reduced environmental impact".to_string(),
                "Lower total cost of ownership".to_string(),
                "Extended product lifetime".to_string(),
            ],
        }
    }

    /// Summary for a run with no model involvement at all.
    #[must_use]
    pub fn offline(product: &ProductInput) -> Self {
        Self {
            title: product.name.clone(),
            description: format!(
                "A sustainable {} positioned to deliver measurable ROI and emissions impact.",
                product.name
            ),
            sustainability_highlights: vec![
                "Reduced environmental footprint vs. incumbent alternatives".to_string(),
                "Lower operating cost profile through energy and maintenance savings".to_string(),
                "Extended lifetime backed by durable design and support".to_string(),
            ],
        }
    }
}

/// Segmentation as returned by the stage plus the normalized profiles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentationSummary {
    pub raw: SegmentationOutput,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueMetrics {
    pub nba_value: u64,
    pub differentiator_value: u64,
    pub total_willingness_to_pay: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutiveSummary {
    pub key_findings: Vec<String>,
    pub recommended_price: u64,
    /// 0..=100
    pub confidence_level: u8,
    pub next_steps: Vec<String>,
    pub metrics: ValueMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalValue {
    pub total_value_to_customer: u64,
    #[serde(rename = "valueWithoutNBA")]
    pub value_without_nba: String,
    pub calculation_method: String,
}

/// Fully resolved output for one segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentReport {
    pub id: String,
    pub name: String,
    pub index: usize,
    pub profile: Segment,
    #[serde(flatten)]
    pub results: SegmentResults,
    #[serde(rename = "step4_totalValue")]
    pub total_value: TotalValue,
    pub executive_summary: ExecutiveSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentPricePoint {
    pub id: String,
    pub name: String,
    pub recommended_price: u64,
    pub total_willingness_to_pay: u64,
    pub confidence: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub highest: SegmentPricePoint,
    pub lowest: SegmentPricePoint,
    pub spread: u64,
    pub average_recommended_price: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossSegmentSummary {
    /// Segment order, not price order
    pub segments: Vec<SegmentPricePoint>,
    /// `None` when there are no segments
    pub summary_stats: Option<SummaryStats>,
}

/// Outcome of one stage call, for one segment or for segmentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRecord {
    pub stage: StageId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageRecord {
    #[must_use]
    pub fn succeeded(stage: StageId, segment_id: Option<&str>) -> Self {
        Self {
            stage,
            segment_id: segment_id.map(str::to_string),
            success: true,
            error: None,
        }
    }

    /// Error text is redacted before it is stored.
    #[must_use]
    pub fn failed(stage: StageId, segment_id: Option<&str>, error: &AssessmentError) -> Self {
        Self {
            stage,
            segment_id: segment_id.map(str::to_string),
            success: false,
            error: Some(redact_secrets(&error.to_string())),
        }
    }
}

/// Final (or partial) result of an assessment run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    pub product_summary: ProductSummary,
    pub segmentation: SegmentationSummary,
    pub segments: Vec<SegmentReport>,
    pub cross_segment_summary: CrossSegmentSummary,
    #[serde(rename = "_source")]
    pub source: Provenance,
    #[serde(rename = "_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub stage_history: Vec<StageRecord>,
}

impl AssessmentResult {
    /// Attach the stage history and derive provenance from it.
    #[must_use]
    pub fn with_history(mut self, history: Vec<StageRecord>) -> Self {
        self.source = if history.iter().all(|record| record.success) {
            Provenance::OpenaiMultiCall
        } else {
            Provenance::Fallback
        };
        self.stage_history = history;
        self
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.source == Provenance::Fallback
    }

    #[must_use]
    pub fn segment(&self, id: &str) -> Option<&SegmentReport> {
        self.segments.iter().find(|segment| segment.id == id)
    }

    /// Stage calls that had to be replaced with synthetic output.
    pub fn failed_stages(&self) -> impl Iterator<Item = &StageRecord> {
        self.stage_history.iter().filter(|record| !record.success)
    }
}
