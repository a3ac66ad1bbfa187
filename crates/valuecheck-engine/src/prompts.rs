//! Stage prompt templates.
//!
//! Prompts are pure functions of the product projection, the segment profile
//! and the segment's earlier stage outputs. Each upstream block is serialized
//! as pretty JSON and cut at a per-block character budget.

use serde::Serialize;

use valuecheck_utils::types::StageId;

use crate::outputs::SegmentResults;
use crate::product::BaseInfo;
use crate::segment::Segment;

/// System message sent with every stage call
pub const SYSTEM_PROMPT: &str =
    "You are a sustainability and pricing expert. Always respond with strictly valid JSON.";

/// Prompt for the optional connectivity check
pub const PROBE_PROMPT: &str = r#"Return {"status":"ready"} to confirm API health."#;

/// Marker appended to context blocks cut at their budget
pub const TRUNCATION_MARKER: &str = "... (truncated)";

const DEFAULT_BUDGET: usize = 2000;
const SEGMENT_PROFILE_BUDGET: usize = 1200;

/// Inputs available to a stage prompt.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub base: &'a BaseInfo,
    /// `None` for the segmentation stage
    pub segment: Option<&'a Segment>,
    pub results: Option<&'a SegmentResults>,
}

impl<'a> PromptContext<'a> {
    #[must_use]
    pub fn product(base: &'a BaseInfo) -> Self {
        Self {
            base,
            segment: None,
            results: None,
        }
    }

    #[must_use]
    pub fn segment(base: &'a BaseInfo, segment: &'a Segment, results: &'a SegmentResults) -> Self {
        Self {
            base,
            segment: Some(segment),
            results: Some(results),
        }
    }
}

/// Render `data` as a labelled context block of at most `max_chars` characters.
#[must_use]
pub fn format_context<T: Serialize + ?Sized>(label: &str, data: Option<&T>, max_chars: usize) -> String {
    let Some(serialized) = data.and_then(|d| serde_json::to_string_pretty(d).ok()) else {
        return format!("{label}: None available.");
    };

    if serialized.chars().count() > max_chars {
        let head: String = serialized.chars().take(max_chars).collect();
        format!("{label}:\n{head}{TRUNCATION_MARKER}")
    } else {
        format!("{label}:\n{serialized}")
    }
}

/// Build the user prompt for `stage`.
#[must_use]
pub fn build_prompt(stage: StageId, ctx: &PromptContext<'_>) -> String {
    match stage {
        StageId::Segmentation => segmentation(ctx),
        StageId::NbaAnalysis => nba_analysis(ctx),
        StageId::NbaValue => nba_value(ctx),
        StageId::ValueDifferentiators => value_differentiators(ctx),
        StageId::WillingnessToPay => willingness_to_pay(ctx),
        StageId::CustomerCommunication => customer_communication(ctx),
        StageId::CompanyGuidance => company_guidance(ctx),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductSnapshot<'a> {
    name: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    known_alternatives: Option<&'a str>,
    additional_info: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    extracted_documents: Option<&'a str>,
}

impl<'a> ProductSnapshot<'a> {
    fn full(base: &'a BaseInfo) -> Self {
        Self {
            name: &base.name,
            description: &base.description,
            known_alternatives: Some(&base.alternatives),
            additional_info: &base.additional_info,
            extracted_documents: Some(&base.docs),
        }
    }

    fn brief(base: &'a BaseInfo) -> Self {
        Self {
            name: &base.name,
            description: &base.description,
            known_alternatives: None,
            additional_info: &base.additional_info,
            extracted_documents: None,
        }
    }
}

fn segment_name<'a>(ctx: &PromptContext<'a>) -> &'a str {
    ctx.segment.map_or("the target market", |s| s.name.as_str())
}

fn segment_block(ctx: &PromptContext<'_>) -> String {
    format_context("SEGMENT_PROFILE", ctx.segment, SEGMENT_PROFILE_BUDGET)
}

fn results(ctx: &PromptContext<'_>) -> SegmentResults {
    ctx.results.cloned().unwrap_or_default()
}

fn segmentation(ctx: &PromptContext<'_>) -> String {
    format!(
        "STEP 0 - CUSTOMER SEGMENTATION

Identify the distinct customer segments that would evaluate this sustainable product. Group buyers by sustainability maturity, budget posture and decision criteria. Propose between two and four segments that differ meaningfully in how they value and pay for the product.

{product}

Return strictly valid JSON with this structure:
{SEGMENTATION_SCHEMA}",
        product = format_context(
            "PRODUCT_INPUT",
            Some(&ProductSnapshot::full(ctx.base)),
            DEFAULT_BUDGET
        ),
    )
}

fn nba_analysis(ctx: &PromptContext<'_>) -> String {
    format!(
        "STEP 1 - NEXT BEST ALTERNATIVES (NBA) ANALYSIS

Use the product information below to identify the most relevant next best alternatives for the {segment} segment, including sourcing evidence and realistic pricing. Focus on real-world competitors, traditional substitutes, and price/performance adjacencies this segment actually shortlists. Do not calculate an aggregate NBA value in this step.

{product}

{profile}

Return strictly valid JSON with this structure:
{NBA_ANALYSIS_SCHEMA}",
        segment = segment_name(ctx),
        product = format_context(
            "PRODUCT_INPUT",
            Some(&ProductSnapshot::full(ctx.base)),
            DEFAULT_BUDGET
        ),
        profile = segment_block(ctx),
    )
}

fn nba_value(ctx: &PromptContext<'_>) -> String {
    let results = results(ctx);
    format!(
        "STEP 1B - NBA VALUE ESTIMATION

Derive a representative NBA value for the {segment} segment using the alternatives identified in the previous step. Reference specific alternative prices, weighting logic, and any relevant assumptions. This step should produce a single monetary value and clearly explain how it was calculated.

{profile}

NBA ANALYSIS CONTEXT:
{nba}

Return strictly valid JSON with this structure:
{NBA_VALUE_SCHEMA}",
        segment = segment_name(ctx),
        profile = segment_block(ctx),
        nba = format_context("NBA_ANALYSIS_RESULT", results.nba_analysis.as_ref(), 2200),
    )
}

fn value_differentiators(ctx: &PromptContext<'_>) -> String {
    let results = results(ctx);
    format!(
        "STEP 2 - VALUE DIFFERENTIATORS

Using the NBA analysis and NBA value estimation you just created, calculate the incremental economic value of the sustainable product versus those alternatives for the {segment} segment. Ground every calculation in the NBA pricing, positioning data, and consolidated NBA value figure. Each differentiator value must be a single number; the total must equal the sum of the items.

{product}

{profile}

NBA ANALYSIS CONTEXT:
{nba}

NBA VALUE CONTEXT:
{value}

Return strictly valid JSON with this structure:
{VALUE_DIFFERENTIATORS_SCHEMA}",
        segment = segment_name(ctx),
        product = format_context(
            "PRODUCT_INPUT",
            Some(&ProductSnapshot::brief(ctx.base)),
            1200
        ),
        profile = segment_block(ctx),
        nba = format_context("NBA_ANALYSIS_RESULT", results.nba_analysis.as_ref(), 2200),
        value = format_context("NBA_VALUE_RESULT", results.nba_value.as_ref(), 1600),
    )
}

fn willingness_to_pay(ctx: &PromptContext<'_>) -> String {
    let results = results(ctx);
    format!(
        "STEP 3 - CUSTOMER WILLINGNESS TO PAY

Estimate what the {segment} segment is willing to pay using the NBA baseline, the consolidated NBA value, and the quantified differentiator value calculated in the prior step. Adjust for the segment's pricing sensitivity and recommend a price with floor and stretch bounds.

{profile}

NBA ANALYSIS CONTEXT:
{nba}

NBA VALUE CONTEXT:
{value}

VALUE DIFFERENTIATOR CONTEXT:
{diff}

Return strictly valid JSON:
{WILLINGNESS_TO_PAY_SCHEMA}",
        segment = segment_name(ctx),
        profile = segment_block(ctx),
        nba = format_context("NBA_ANALYSIS_RESULT", results.nba_analysis.as_ref(), 1800),
        value = format_context("NBA_VALUE_RESULT", results.nba_value.as_ref(), 1600),
        diff = format_context(
            "VALUE_DIFFERENTIATORS",
            results.value_differentiators.as_ref(),
            2200
        ),
    )
}

fn customer_communication(ctx: &PromptContext<'_>) -> String {
    let results = results(ctx);
    format!(
        "STEP 4 - CUSTOMER COMMUNICATION PLAN

Design the communication strategy for the {segment} segment using the quantified NBA, NBA value estimate, differentiator, and willingness-to-pay outputs. Emphasize how to translate the numbers into customer-facing messaging and tools.

{profile}

NBA ANALYSIS CONTEXT:
{nba}

NBA VALUE CONTEXT:
{value}

VALUE DIFFERENTIATOR CONTEXT:
{diff}

WILLINGNESS TO PAY CONTEXT:
{wtp}

Return strictly valid JSON in this format:
{COMMUNICATION_SCHEMA}",
        segment = segment_name(ctx),
        profile = segment_block(ctx),
        nba = format_context("NBA_ANALYSIS_RESULT", results.nba_analysis.as_ref(), 1600),
        value = format_context("NBA_VALUE_RESULT", results.nba_value.as_ref(), 1400),
        diff = format_context(
            "VALUE_DIFFERENTIATORS",
            results.value_differentiators.as_ref(),
            1800
        ),
        wtp = format_context(
            "WILLINGNESS_TO_PAY",
            results.willingness_to_pay.as_ref(),
            1600
        ),
    )
}

fn company_guidance(ctx: &PromptContext<'_>) -> String {
    let results = results(ctx);
    format!(
        "STEP 5 - COMPANY ENABLEMENT GUIDANCE

Assess organisational strengths, weaknesses, and next steps required to deliver the quantified value to the {segment} segment. Anchor recommendations in the NBA findings, differentiator insights, willingness-to-pay outcomes, and communication plan.

{profile}

NBA ANALYSIS CONTEXT:
{nba}

NBA VALUE CONTEXT:
{value}

VALUE DIFFERENTIATOR CONTEXT:
{diff}

WILLINGNESS TO PAY CONTEXT:
{wtp}

COMMUNICATION PLAN CONTEXT:
{comms}

Return strictly valid JSON:
{COMPANY_GUIDANCE_SCHEMA}",
        segment = segment_name(ctx),
        profile = segment_block(ctx),
        nba = format_context("NBA_ANALYSIS_RESULT", results.nba_analysis.as_ref(), 1400),
        value = format_context("NBA_VALUE_RESULT", results.nba_value.as_ref(), 1200),
        diff = format_context(
            "VALUE_DIFFERENTIATORS",
            results.value_differentiators.as_ref(),
            1600
        ),
        wtp = format_context(
            "WILLINGNESS_TO_PAY",
            results.willingness_to_pay.as_ref(),
            1400
        ),
        comms = format_context(
            "COMMUNICATION_PLAN",
            results.customer_communication.as_ref(),
            1400
        ),
    )
}

const SEGMENTATION_SCHEMA: &str = r#"{
  "segmentationApproach": "How you grouped customers",
  "keyObservations": ["Observation list"],
  "segments": [
    {
      "id": "short-identifier",
      "name": "Segment name",
      "description": "Who these buyers are",
      "primaryNeeds": ["Need list"],
      "buyingCriteria": ["Criteria list"],
      "pricingSensitivity": "low/medium/high",
      "representativeShare": "Share of the addressable market, e.g. 30%",
      "valueDriversFocus": ["Value drivers this segment rewards"],
      "riskFactors": ["Adoption risks"]
    }
  ]
}"#;

const NBA_ANALYSIS_SCHEMA: &str = r#"{
  "searchMethodology": "How you researched alternatives",
  "identifiedAlternatives": [
    {
      "name": "Alternative name",
      "reasoning": "Why customers consider this alternative",
      "estimatedPrice": 0,
      "priceRange": "low/medium/high",
      "keyDifferences": ["difference list"],
      "marketShare": "Market position overview",
      "proofPoints": {
        "priceSources": [
          {
            "source": "Source name",
            "url": "https://example.com",
            "price": "$1,140",
            "reliability": "Reason source is credible"
          }
        ],
        "marketData": [
          {
            "source": "Report name",
            "url": "https://example.com/report",
            "data": "Market data referenced",
            "reliability": "Why this data is trustworthy"
          }
        ],
        "segmentSpecificNotes": ["Notes on how this segment views the alternative"]
      }
    }
  ],
  "marketPositioning": "Summary of positioning vs alternatives",
  "confidenceLevel": "High / Medium / Low"
}"#;

const NBA_VALUE_SCHEMA: &str = r#"{
  "nbaValue": 0,
  "valuationMethodology": "How you calculated the representative NBA value",
  "justification": "Narrative summary referencing alternative data and assumptions",
  "assumptions": ["Key assumption list"],
  "confidenceLevel": "High / Medium / Low"
}"#;

const VALUE_DIFFERENTIATORS_SCHEMA: &str = r#"{
  "differentiators": [
    {
      "name": "Value driver name",
      "value": 0,
      "calculation": {
        "methodology": "How the value was calculated",
        "substeps": [
          {
            "step": "Sub-step label",
            "calculation": "Equation used",
            "assumptions": "Key assumptions"
          }
        ],
        "totalCalculation": "Summary of the calculation"
      },
      "economicRationale": "Why customers value this differentiator",
      "evidence": "Supporting data or references"
    }
  ],
  "totalDifferentiatorValue": 0
}"#;

const WILLINGNESS_TO_PAY_SCHEMA: &str = r#"{
  "calculation": "How willingness to pay was derived",
  "nbaValue": 0,
  "differentiatorValue": 0,
  "totalWillingnessToPay": 0,
  "priceRecommendation": {
    "recommendedPrice": 0,
    "floorPrice": 0,
    "stretchPrice": 0,
    "confidence": "High / Medium / Low",
    "rationale": "Why this price is defensible"
  },
  "customerSegments": [
    {
      "segment": "Sub-segment name",
      "willingnessToPay": 0,
      "reasoning": "Why this group pays this amount"
    }
  ],
  "sensitivityAnalysis": [
    {
      "factor": "Driver of willingness to pay",
      "impact": "Effect on willingness to pay"
    }
  ]
}"#;

const COMMUNICATION_SCHEMA: &str = r#"{
  "communicationStrategy": "High-level approach",
  "tcoGuidance": {
    "message": "Message to convey",
    "tools": ["tool list"],
    "objectives": "Objectives summary",
    "actionableSteps": [
      {
        "step": "Action name",
        "description": "Action description",
        "implementation": "How to implement"
      }
    ]
  },
  "incentiveGuidance": { "message": "...", "tools": [], "objectives": "...", "actionableSteps": [] },
  "lifetimeGuidance": { "message": "...", "tools": [], "objectives": "...", "actionableSteps": [] },
  "storytellingThemes": ["Theme list"]
}"#;

const COMPANY_GUIDANCE_SCHEMA: &str = r#"{
  "valueDriverStrengths": [
    {
      "driver": "Capability name",
      "currentStrength": "Current performance summary",
      "strengthLevel": "low/medium/high",
      "evidence": "Supporting evidence",
      "enhancementOpportunities": [
        {
          "opportunity": "Opportunity name",
          "action": "Recommended action",
          "expectedImpact": "Expected impact"
        }
      ]
    }
  ],
  "valueDriverWeaknesses": [
    {
      "driver": "Capability name",
      "currentWeakness": "Weakness summary",
      "weaknessLevel": "low/medium/high",
      "rootCause": "Underlying cause",
      "improvementPlan": [
        {
          "improvement": "Improvement name",
          "action": "Action to take",
          "expectedImpact": "Impact description"
        }
      ]
    }
  ],
  "competitivePositioning": {
    "currentPosition": "Current market position",
    "positioningGaps": "Where positioning falls short",
    "positioningOpportunities": [
      {
        "opportunity": "Opportunity name",
        "action": "Recommended action",
        "expectedImpact": "Impact description"
      }
    ]
  }
}"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::{NbaAnalysis, StageOutput};
    use crate::product::ProductInput;
    use crate::segment::default_segment;
    use serde_json::json;

    fn base() -> BaseInfo {
        BaseInfo::from_product(
            &ProductInput::new("EcoBike 3000", "electric bike with recycled frame"),
            500,
        )
    }

    #[test]
    fn absent_context_is_marked() {
        assert_eq!(
            format_context::<NbaAnalysis>("NBA_ANALYSIS_RESULT", None, 100),
            "NBA_ANALYSIS_RESULT: None available."
        );
    }

    #[test]
    fn long_context_is_truncated_with_marker() {
        let data = json!({"text": "x".repeat(500)});
        let block = format_context("BLOCK", Some(&data), 50);
        assert!(block.starts_with("BLOCK:\n"));
        assert!(block.ends_with(TRUNCATION_MARKER));
        assert_eq!(
            block.chars().count(),
            "BLOCK:\n".len() + 50 + TRUNCATION_MARKER.len()
        );
    }

    #[test]
    fn every_prompt_asks_for_json_only() {
        let base = base();
        let segment = default_segment();
        let results = SegmentResults::default();

        for stage in StageId::ALL {
            let ctx = if stage == StageId::Segmentation {
                PromptContext::product(&base)
            } else {
                PromptContext::segment(&base, &segment, &results)
            };
            let prompt = build_prompt(stage, &ctx);
            assert!(prompt.contains("strictly valid JSON"), "{stage}");
            if stage == StageId::Segmentation {
                assert!(prompt.contains("EcoBike 3000"));
                assert!(!prompt.contains("SEGMENT_PROFILE"));
            } else {
                assert!(prompt.contains("SEGMENT_PROFILE:\n"), "{stage}");
                assert!(prompt.contains("General Market"), "{stage}");
            }
        }
    }

    #[test]
    fn prior_stage_output_is_quoted() {
        let base = base();
        let segment = default_segment();
        let mut results = SegmentResults::default();
        let nba = StageOutput::from_value(
            StageId::NbaAnalysis,
            json!({"identifiedAlternatives": [{"name": "Legacy Cruiser", "estimatedPrice": 1450}]}),
        )
        .unwrap();
        results.record(nba);

        let prompt = build_prompt(
            StageId::NbaValue,
            &PromptContext::segment(&base, &segment, &results),
        );
        assert!(prompt.contains("Legacy Cruiser"));
        assert!(prompt.contains("1450"));

        let prompt = build_prompt(
            StageId::WillingnessToPay,
            &PromptContext::segment(&base, &segment, &results),
        );
        assert!(prompt.contains("VALUE_DIFFERENTIATORS: None available."));
    }

    #[test]
    fn segment_stages_name_their_audience() {
        let base = base();
        let segment = default_segment();
        let results = SegmentResults::default();

        let targeted = build_prompt(
            StageId::NbaAnalysis,
            &PromptContext::segment(&base, &segment, &results),
        );
        assert!(targeted.contains("for the General Market segment"));

        let untargeted = build_prompt(StageId::NbaAnalysis, &PromptContext::product(&base));
        assert!(untargeted.contains("the target market"));
        assert!(!untargeted.contains("General Market"));
    }

    #[test]
    fn prompts_are_deterministic() {
        let base = base();
        let ctx = PromptContext::product(&base);
        assert_eq!(
            build_prompt(StageId::Segmentation, &ctx),
            build_prompt(StageId::Segmentation, &ctx)
        );
    }
}
