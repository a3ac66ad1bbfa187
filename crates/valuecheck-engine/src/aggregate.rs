//! Per-segment metrics and the cross-segment roll-up.
//!
//! Money figures are rounded and floored at zero before they leave this
//! module. The differentiator figure is always the itemized sum; declared
//! totals from the model are never read here.

use chrono::Utc;

use crate::outputs::{Confidence, SegmentResults, SegmentationOutput};
use crate::product::ProductInput;
use crate::result::{
    AssessmentResult, CrossSegmentSummary, ExecutiveSummary, ProductSummary, Provenance,
    SegmentPricePoint, SegmentReport, SegmentationSummary, SummaryStats, TotalValue, ValueMetrics,
};
use crate::segment::SegmentState;

/// Score used when confidence is missing or unrecognised
pub const DEFAULT_CONFIDENCE: u8 = 85;

/// `$` followed by the rounded amount with thousands separators.
#[must_use]
pub fn format_currency(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Round to whole dollars, flooring negatives and non-finite values at zero.
#[must_use]
pub fn clamp_money(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        // Saturating float-to-int cast.
        value.round() as u64
    } else {
        0
    }
}

/// Map stated confidence onto a 0..=100 score.
///
/// Labels match by substring, checked in the order high, medium, low, so
/// `"Medium-High"` scores as high.
#[must_use]
pub fn confidence_score(confidence: Option<&Confidence>) -> u8 {
    match confidence {
        Some(Confidence::Score(score)) if score.is_finite() => score.clamp(0.0, 100.0).round() as u8,
        Some(Confidence::Label(label)) => {
            let label = label.to_lowercase();
            if label.contains("high") {
                90
            } else if label.contains("medium") {
                80
            } else if label.contains("low") {
                65
            } else {
                DEFAULT_CONFIDENCE
            }
        }
        _ => DEFAULT_CONFIDENCE,
    }
}

/// Numeric view of one segment's stage outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentFigures {
    pub nba_value: u64,
    pub differentiator_value: u64,
    pub total_willingness_to_pay: u64,
    pub recommended_price: u64,
    pub confidence_level: u8,
}

impl SegmentFigures {
    #[must_use]
    pub fn from_results(results: &SegmentResults) -> Self {
        let nba = results
            .nba_value
            .as_ref()
            .map(|v| v.nba_value)
            .filter(|v| v.is_finite())
            .unwrap_or(0.0);
        let differentiators = results
            .value_differentiators
            .as_ref()
            .map_or(0.0, |vd| vd.itemized_total());

        let wtp = results.willingness_to_pay.as_ref();
        let total = wtp
            .and_then(|w| w.total_willingness_to_pay)
            .filter(|v| v.is_finite())
            .unwrap_or(nba + differentiators);
        let recommendation = wtp.and_then(|w| w.price_recommendation.as_ref());
        let recommended = recommendation
            .and_then(|p| p.recommended_price)
            .filter(|v| v.is_finite())
            .unwrap_or(total);

        Self {
            nba_value: clamp_money(nba),
            differentiator_value: clamp_money(differentiators),
            total_willingness_to_pay: clamp_money(total),
            recommended_price: clamp_money(recommended),
            confidence_level: confidence_score(recommendation.and_then(|p| p.confidence.as_ref())),
        }
    }

    #[must_use]
    pub fn metrics(&self) -> ValueMetrics {
        ValueMetrics {
            nba_value: self.nba_value,
            differentiator_value: self.differentiator_value,
            total_willingness_to_pay: self.total_willingness_to_pay,
        }
    }
}

fn executive_summary(segment_name: &str, figures: &SegmentFigures) -> ExecutiveSummary {
    ExecutiveSummary {
        key_findings: vec![
            format!(
                "{segment_name} face an NBA benchmark near {}, but quantified differentiators unlock {} in additional value.",
                format_currency(figures.nba_value as f64),
                format_currency(figures.differentiator_value as f64)
            ),
            format!(
                "{segment_name} can support premium pricing when incentive enablement and ROI calculators are front-loaded in the sales cycle."
            ),
            "Operational readiness and incentive execution remain the biggest levers to accelerate adoption.".to_string(),
        ],
        recommended_price: figures.recommended_price,
        confidence_level: figures.confidence_level,
        next_steps: vec![
            "Align commercial assets to segment-specific ROI narratives.".to_string(),
            "Stand up an incentive enablement pod to streamline customer onboarding.".to_string(),
            "Instrument post-sale value tracking to reinforce renewal pricing.".to_string(),
        ],
        metrics: figures.metrics(),
    }
}

fn total_value(figures: &SegmentFigures) -> TotalValue {
    TotalValue {
        total_value_to_customer: figures.total_willingness_to_pay,
        value_without_nba:
            "Total value calculated from NBA analysis and segment-specific differentiators."
                .to_string(),
        calculation_method:
            "NBA benchmark plus quantified economic differentiators adjusted for segment sensitivity."
                .to_string(),
    }
}

/// Resolve one segment state into its report.
#[must_use]
pub fn segment_report(state: &SegmentState) -> SegmentReport {
    let figures = SegmentFigures::from_results(&state.results);
    SegmentReport {
        id: state.profile.id.clone(),
        name: state.profile.name.clone(),
        index: state.index,
        profile: state.profile.clone(),
        results: state.results.clone(),
        total_value: total_value(&figures),
        executive_summary: executive_summary(&state.profile.name, &figures),
    }
}

/// Price spread and average across segments.
///
/// The series is ordered by recommended price, highest first. Ties keep
/// segment order.
#[must_use]
pub fn cross_segment_summary(reports: &[SegmentReport]) -> CrossSegmentSummary {
    let mut series: Vec<SegmentPricePoint> = reports
        .iter()
        .map(|report| SegmentPricePoint {
            id: report.id.clone(),
            name: report.name.clone(),
            recommended_price: report.executive_summary.recommended_price,
            total_willingness_to_pay: report.executive_summary.metrics.total_willingness_to_pay,
            confidence: report.executive_summary.confidence_level,
        })
        .collect();

    series.sort_by(|a, b| b.recommended_price.cmp(&a.recommended_price));

    let summary_stats = match (series.first(), series.last()) {
        (Some(highest), Some(lowest)) => {
            let sum: u64 = series.iter().map(|point| point.recommended_price).sum();
            let average = (sum as f64 / series.len() as f64).round() as u64;
            Some(SummaryStats {
                spread: highest.recommended_price.saturating_sub(lowest.recommended_price),
                average_recommended_price: average,
                highest: highest.clone(),
                lowest: lowest.clone(),
            })
        }
        _ => None,
    };

    CrossSegmentSummary {
        segments: series,
        summary_stats,
    }
}

/// Build the result snapshot from the current segment states.
///
/// Provenance starts as model-generated; [`AssessmentResult::with_history`]
/// downgrades it when any stage needed fallback.
#[must_use]
pub fn compose_result(
    product: &ProductInput,
    segmentation: &SegmentationOutput,
    states: &[SegmentState],
) -> AssessmentResult {
    let segments: Vec<SegmentReport> = states.iter().map(segment_report).collect();
    let cross_segment_summary = cross_segment_summary(&segments);

    AssessmentResult {
        product_summary: ProductSummary::from_product(product),
        segmentation: SegmentationSummary {
            raw: segmentation.clone(),
            segments: states.iter().map(|state| state.profile.clone()).collect(),
        },
        segments,
        cross_segment_summary,
        source: Provenance::OpenaiMultiCall,
        timestamp: Utc::now(),
        stage_history: Vec::new(),
    }
}
