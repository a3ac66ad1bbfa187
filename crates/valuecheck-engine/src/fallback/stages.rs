//! Per-stage synthetic output.
//!
//! Figures are derived from whatever real or synthetic results the segment
//! already holds, so a fallback stage stays coherent with its predecessors.

use valuecheck_utils::types::{PricingSensitivity, StageId};

use super::random::RandomSource;
use crate::aggregate::format_currency;
use super::segments;
use crate::outputs::{
    ActionStep, Alternative, Calculation, CommunicationPlan, CompanyGuidance, Confidence,
    Differentiator, Guidance, Improvement, NbaAnalysis, NbaValuation, Opportunity, Positioning,
    PriceRecommendation, PriceSource, ProofPoints, SegmentResults, SensitivityFactor, StageOutput,
    Strength, Substep, ValueDifferentiators, Weakness, WillingnessToPay,
};
use crate::product::ProductInput;
use crate::segment::Segment;

/// Upstream state visible to a fallback generator.
#[derive(Debug, Clone, Copy)]
pub struct FallbackContext<'a> {
    pub segment: &'a Segment,
    pub results: &'a SegmentResults,
}

/// Price multiplier for a segment's sensitivity.
#[must_use]
pub fn sensitivity_factor(sensitivity: PricingSensitivity) -> f64 {
    match sensitivity {
        PricingSensitivity::Low => 1.15,
        PricingSensitivity::Medium => 1.0,
        PricingSensitivity::High => 0.85,
    }
}

fn qualitative_confidence(sensitivity: PricingSensitivity) -> &'static str {
    match sensitivity {
        PricingSensitivity::Low => "High",
        PricingSensitivity::Medium => "Medium-High",
        PricingSensitivity::High => "Medium",
    }
}

/// Synthetic output for `stage`.
///
/// Never touches the network. With a seeded `rng` the result is reproducible.
#[must_use]
pub fn generate(
    stage: StageId,
    product: &ProductInput,
    ctx: &FallbackContext<'_>,
    rng: &dyn RandomSource,
) -> StageOutput {
    let product = product.name.trim();
    match stage {
        StageId::Segmentation => StageOutput::Segmentation(segments::segmentation()),
        StageId::NbaAnalysis => StageOutput::NbaAnalysis(nba_analysis(product, ctx, rng)),
        StageId::NbaValue => StageOutput::NbaValue(nba_value(product, ctx, rng)),
        StageId::ValueDifferentiators => {
            StageOutput::ValueDifferentiators(value_differentiators(ctx, rng))
        }
        StageId::WillingnessToPay => StageOutput::WillingnessToPay(willingness_to_pay(ctx, rng)),
        StageId::CustomerCommunication => {
            StageOutput::CustomerCommunication(customer_communication(product, ctx))
        }
        StageId::CompanyGuidance => StageOutput::CompanyGuidance(company_guidance(product, ctx)),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn nba_analysis(product: &str, ctx: &FallbackContext<'_>, rng: &dyn RandomSource) -> NbaAnalysis {
    let name = &ctx.segment.name;
    let multiplier = sensitivity_factor(ctx.segment.pricing_sensitivity);
    let primary_price = (rng.between(1400.0, 2300.0) * multiplier).round();
    let challenger_price = (rng.between(1000.0, 1800.0) * multiplier * 0.95).round();

    let alternative = |name: &str,
                       reasoning: String,
                       price: f64,
                       price_range: &str,
                       differences: &[&str],
                       market_share: &str,
                       source: PriceSource,
                       note: String| Alternative {
        name: name.to_string(),
        reasoning,
        estimated_price: Some(price),
        price_range: price_range.to_string(),
        key_differences: strings(differences),
        market_share: market_share.to_string(),
        proof_points: Some(ProofPoints {
            price_sources: vec![source],
            market_data: Vec::new(),
            segment_specific_notes: vec![note],
        }),
    };

    NbaAnalysis {
        search_methodology: format!(
            "Secondary research focused on offerings shortlisted by {name}, combining analyst reports, marketplace pricing, and peer case studies."
        ),
        identified_alternatives: vec![
            alternative(
                "Established OEM Alternative",
                format!("{name} often shortlist long-standing OEMs with nationwide service coverage."),
                primary_price,
                if multiplier > 1.0 { "high" } else { "medium" },
                &[
                    "Lower sustainability performance",
                    "Higher energy consumption",
                    "Shorter warranty coverage",
                ],
                "Market leader with approximately 55% share across mainstream buyers",
                PriceSource {
                    source: "Industry pricing index".to_string(),
                    url: "https://example.com/pricing-index".to_string(),
                    price: format_currency(primary_price),
                    reliability: "Aggregated benchmark data for comparable configurations"
                        .to_string(),
                },
                format!(
                    "{name} values the predictable maintenance network despite weaker sustainability credentials than {product}."
                ),
            ),
            alternative(
                "Budget Import Option",
                format!("{name} consider lower-priced imports to test premium positioning."),
                challenger_price,
                if multiplier < 1.0 { "low" } else { "medium" },
                &[
                    "Limited sustainability certifications",
                    "Minimal after-sales support",
                    "Shorter expected lifetime",
                ],
                "Challenger brand growing share with budget-focused customers",
                PriceSource {
                    source: "Public marketplace listings".to_string(),
                    url: "https://example.com/marketplace".to_string(),
                    price: format_currency(challenger_price),
                    reliability: "Validated across multiple sellers within the past quarter"
                        .to_string(),
                },
                format!(
                    "{name} recognises the upfront savings but raises concerns about downtime risk."
                ),
            ),
        ],
        market_positioning: format!(
            "{name} view {product} as the premium option that offsets a higher upfront price with verifiable lifetime value."
        ),
        confidence_level: "medium".to_string(),
        extra: Default::default(),
    }
}

fn nba_value(product: &str, ctx: &FallbackContext<'_>, rng: &dyn RandomSource) -> NbaValuation {
    let name = &ctx.segment.name;
    let price_points = match &ctx.results.nba_analysis {
        Some(analysis) => analysis.price_points(),
        None => nba_analysis(product, ctx, rng).price_points(),
    };
    let base_average = if price_points.is_empty() {
        rng.between(1800.0, 2600.0)
    } else {
        price_points.iter().sum::<f64>() / price_points.len() as f64
    };

    let multiplier = sensitivity_factor(ctx.segment.pricing_sensitivity);
    let confidence = if multiplier > 1.0 {
        "high"
    } else if multiplier < 1.0 {
        "medium"
    } else {
        "medium-high"
    };

    NbaValuation {
        nba_value: (base_average * multiplier).round(),
        valuation_methodology: format!(
            "Weighted average of verified NBA price points adjusted for {name} purchasing patterns."
        ),
        justification: "Benchmark accounts for typical option mix, service packages, and volume discounts observed in similar deals.".to_string(),
        assumptions: vec![
            "Reference prices remain valid for the current budgeting cycle.".to_string(),
            format!("{name} generally negotiates 5-8% off list prices based on volume."),
        ],
        confidence_level: confidence.to_string(),
        extra: Default::default(),
    }
}

fn upstream_nba_value(ctx: &FallbackContext<'_>, rng: &dyn RandomSource) -> f64 {
    ctx.results
        .nba_value
        .as_ref()
        .map_or_else(|| rng.between(1800.0, 2600.0), |v| v.nba_value)
}

/// Declared (reconciled) differentiator total, or the itemized sum.
fn upstream_differentiator_total(results: &SegmentResults) -> Option<f64> {
    results
        .value_differentiators
        .as_ref()
        .map(|vd| vd.total_differentiator_value.unwrap_or_else(|| vd.itemized_total()))
}

fn substeps(steps: [(&str, &str, &str); 3]) -> Vec<Substep> {
    steps
        .into_iter()
        .map(|(step, calculation, assumptions)| Substep {
            step: step.to_string(),
            calculation: calculation.to_string(),
            assumptions: assumptions.to_string(),
        })
        .collect()
}

fn value_differentiators(ctx: &FallbackContext<'_>, rng: &dyn RandomSource) -> ValueDifferentiators {
    let name = &ctx.segment.name;
    let sensitivity = ctx.segment.pricing_sensitivity;
    let multiplier = sensitivity_factor(sensitivity);
    let nba = upstream_nba_value(ctx, rng);

    // Each item is a jittered share of the NBA value.
    let tco_ratio = rng.between(0.75, 1.05);
    let incentive_share = if name == "Eco Leaders" { 0.9 } else { 0.65 };
    let incentive_ratio = incentive_share * rng.between(0.9, 1.15);
    let lifetime_share = if sensitivity == PricingSensitivity::High {
        0.7
    } else {
        0.95
    };
    let lifetime_ratio = lifetime_share * rng.between(0.9, 1.15);

    let tco = (nba * tco_ratio * multiplier).round();
    let incentives = (nba * incentive_ratio * multiplier).round();
    let lifetime = (nba * lifetime_ratio * multiplier).round();

    let differentiators = vec![
        Differentiator {
            name: "Total Cost of Ownership (TCO) Advantage".to_string(),
            value: tco,
            calculation: Some(Calculation {
                methodology: "Compare 10-year operating, maintenance, and downtime costs versus NBA set.".to_string(),
                substeps: substeps([
                    (
                        "Energy savings",
                        "Annual kWh reduction × utility rate × 10 years",
                        "Higher efficiency vs. legacy alternatives",
                    ),
                    (
                        "Maintenance avoidance",
                        "Reduced technician visits × labour rate × contract duration",
                        "Predictive maintenance and modular components",
                    ),
                    (
                        "Downtime avoided",
                        "Hours avoided × productivity cost",
                        "Higher reliability from sustainable design",
                    ),
                ]),
                total_calculation: "Sum of energy, maintenance, and downtime savings".to_string(),
            }),
            economic_rationale: format!(
                "{name} unlocks compounding OPEX benefits while protecting uptime."
            ),
            evidence: "Benchmark case studies and internal service logs for sustainable fleets."
                .to_string(),
        },
        Differentiator {
            name: "Incentives & Credits Capture".to_string(),
            value: incentives,
            calculation: Some(Calculation {
                methodology: "Aggregate tax credits, grants, and carbon monetisation unique to the product.".to_string(),
                substeps: substeps([
                    (
                        "Federal/State incentives",
                        "Eligible tax credit value × adoption likelihood",
                        "Current policy outlook and product eligibility",
                    ),
                    (
                        "Utility rebates",
                        "Local incentive amount × coverage rate",
                        "Average rebate utilisation for similar customers",
                    ),
                    (
                        "Carbon monetisation",
                        "Annual emissions reduction × carbon price × product lifetime",
                        "Regional carbon pricing scenarios",
                    ),
                ]),
                total_calculation: "Sum of all accessible incentive pools".to_string(),
            }),
            economic_rationale: format!(
                "{name} can offset upfront premiums by maximising incentive capture."
            ),
            evidence: "Government programme databases and sustainability finance benchmarks."
                .to_string(),
        },
        Differentiator {
            name: "Extended Lifetime Value".to_string(),
            value: lifetime,
            calculation: Some(Calculation {
                methodology: "Quantify the economic benefit of longer product lifespan and warranty coverage.".to_string(),
                substeps: substeps([
                    (
                        "Warranty extension impact",
                        "Additional warranty years × equivalent replacement cost",
                        "OEM-backed warranty and reliability data",
                    ),
                    (
                        "Residual value protection",
                        "Higher resale value × fleet replacement cadence",
                        "Improved asset care from sustainable design",
                    ),
                    (
                        "Productivity gains",
                        "Reduced downtime × revenue per hour",
                        "Stabilised operations vs. NBA alternatives",
                    ),
                ]),
                total_calculation: "Warranty value + residual protection + productivity gains"
                    .to_string(),
            }),
            economic_rationale: format!(
                "{name} benefit from predictable asset performance and lifecycle savings."
            ),
            evidence: "Internal reliability testing and customer case studies.".to_string(),
        },
    ];

    let mut output = ValueDifferentiators {
        differentiators,
        total_differentiator_value: None,
        extra: Default::default(),
    };
    output.reconcile();
    output
}

fn willingness_to_pay(ctx: &FallbackContext<'_>, rng: &dyn RandomSource) -> WillingnessToPay {
    let name = &ctx.segment.name;
    let sensitivity = ctx.segment.pricing_sensitivity;

    let nba = upstream_nba_value(ctx, rng).round();
    let differentiators = upstream_differentiator_total(ctx.results)
        .unwrap_or_else(|| rng.between(4200.0, 6800.0))
        .round();

    let (adjustment, price_ratio, stretch_ratio) = match sensitivity {
        PricingSensitivity::Low => (1.08, 0.95, 1.22),
        PricingSensitivity::Medium => (1.0, 0.92, 1.15),
        PricingSensitivity::High => (0.9, 0.88, 1.15),
    };
    let total = ((nba + differentiators) * adjustment).round();
    let recommended = (total * price_ratio).round();

    WillingnessToPay {
        calculation: "NBA baseline plus quantified differentiators, adjusted by segment pricing sensitivity and adoption risk.".to_string(),
        nba_value: Some(nba),
        differentiator_value: Some(differentiators),
        total_willingness_to_pay: Some(total),
        price_recommendation: Some(PriceRecommendation {
            recommended_price: Some(recommended),
            floor_price: Some((recommended * 0.9).round()),
            stretch_price: Some((recommended * stretch_ratio).round()),
            confidence: Some(Confidence::Label(
                qualitative_confidence(sensitivity).to_string(),
            )),
            rationale: format!(
                "{name} can justify a premium when value realisation and incentive access are clearly documented."
            ),
        }),
        customer_segments: Vec::new(),
        sensitivity_analysis: vec![
            SensitivityFactor {
                factor: "Availability of incentives and subsidies".to_string(),
                impact: "Reduced incentive availability decreases willingness to pay by 8-12%."
                    .to_string(),
            },
            SensitivityFactor {
                factor: "Implementation complexity".to_string(),
                impact: "Higher perceived deployment effort requires additional ROI proof points to maintain premium pricing.".to_string(),
            },
        ],
        extra: Default::default(),
    }
}

fn guidance(
    message: String,
    tools: &[&str],
    objectives: &str,
    step: (&str, String, &str),
) -> Option<Guidance> {
    Some(Guidance {
        message,
        tools: strings(tools),
        objectives: objectives.to_string(),
        actionable_steps: vec![ActionStep {
            step: step.0.to_string(),
            description: step.1,
            implementation: step.2.to_string(),
        }],
    })
}

fn customer_communication(product: &str, ctx: &FallbackContext<'_>) -> CommunicationPlan {
    let name = &ctx.segment.name;
    let results = ctx.results;

    let nba_baseline = results
        .nba_value
        .as_ref()
        .map(|v| v.nba_value)
        .filter(|v| *v != 0.0)
        .map_or_else(|| "the NBA benchmark price".to_string(), format_currency);
    let differentiator_total = upstream_differentiator_total(results)
        .filter(|v| *v != 0.0)
        .map_or_else(
            || "the quantified differentiator value".to_string(),
            format_currency,
        );
    let price_anchor = results
        .willingness_to_pay
        .as_ref()
        .and_then(|w| w.price_recommendation.as_ref())
        .and_then(|p| p.recommended_price)
        .filter(|v| *v != 0.0)
        .map(|price| {
            format!(
                " and anchor the commercial conversation around a recommended price of {}",
                format_currency(price)
            )
        })
        .unwrap_or_default();

    CommunicationPlan {
        communication_strategy: format!(
            "Show {name} how {product} outperforms {nba_baseline} by translating quantified savings ({differentiator_total}) into clear payback stories{price_anchor}."
        ),
        tco_guidance: guidance(
            format!("Use interactive TCO tools to reveal lifetime savings versus {nba_baseline}."),
            &[
                "Segment-specific TCO calculator",
                "Custom ROI case deck",
                "Operational benchmarking sheet",
            ],
            "Demonstrate a fast, dependable payback window tailored to their usage profile.",
            (
                "Configure segment persona calculator",
                format!(
                    "Pre-load {name} assumptions (usage, costs, incentives) to accelerate workshops."
                ),
                "Collaborate with finance and sustainability teams to validate inputs.",
            ),
        ),
        incentive_guidance: guidance(
            "Package the incentive capture process into a guided journey.".to_string(),
            &[
                "Incentive eligibility checklist",
                "Application playbook",
                "Funding timeline tracker",
            ],
            "De-risk the administrative burden and accelerate incentive access.",
            (
                "Launch incentive concierge",
                "Provide white-glove support to gather documentation and submit applications."
                    .to_string(),
                "Align legal and finance resources to streamline compliance reviews.",
            ),
        ),
        lifetime_guidance: guidance(
            "Highlight durability, uptime, and warranty protections that safeguard operations."
                .to_string(),
            &[
                "Warranty comparison sheet",
                "Reliability benchmark",
                "Lifecycle service plan",
            ],
            "Assure stakeholders that premium pricing protects long-term performance.",
            (
                "Bundle lifecycle assurance kit",
                "Offer optional service packages tying uptime guarantees to measurable KPIs."
                    .to_string(),
                "Coordinate product, service, and customer success teams on delivery model.",
            ),
        ),
        storytelling_themes: vec![
            format!("{name} captures measurable ROI and risk mitigation with {product}."),
            "Incentive enablement removes friction and offsets upfront investment.".to_string(),
            "Long-term reliability and warranty support reduce operational surprises.".to_string(),
        ],
        extra: Default::default(),
    }
}

fn company_guidance(product: &str, ctx: &FallbackContext<'_>) -> CompanyGuidance {
    let name = &ctx.segment.name;
    let differentiators = upstream_differentiator_total(ctx.results).filter(|v| *v != 0.0);
    let willingness = ctx
        .results
        .willingness_to_pay
        .as_ref()
        .and_then(|w| w.total_willingness_to_pay)
        .filter(|v| *v != 0.0)
        .or(differentiators)
        .map_or_else(
            || "segment willingness-to-pay".to_string(),
            |v| format!("{} willingness-to-pay", format_currency(v)),
        );
    let differentiators = differentiators.map_or_else(
        || "the quantified differentiator value".to_string(),
        format_currency,
    );

    CompanyGuidance {
        value_driver_strengths: vec![Strength {
            driver: "Quantified ROI Storytelling".to_string(),
            current_strength:
                "Commercial teams already leverage TCO calculators and success stories.".to_string(),
            strength_level: "medium".to_string(),
            evidence: "Existing case studies and ROI templates referenced in recent deals."
                .to_string(),
            enhancement_opportunities: vec![Opportunity {
                opportunity: "Segment-persona proof packs".to_string(),
                action: format!("Create tailored ROI and incentive artefacts for {name}."),
                expected_impact: format!(
                    "Protect {differentiators} in value creation by aligning with segment priorities."
                ),
            }],
        }],
        value_driver_weaknesses: vec![Weakness {
            driver: "Incentive Execution".to_string(),
            current_weakness:
                "Fragmented ownership of incentive research and application support.".to_string(),
            weakness_level: "high".to_string(),
            root_cause: "Limited dedicated resources for sustainability financing programmes."
                .to_string(),
            improvement_plan: vec![Improvement {
                improvement: "Build incentive desk capability".to_string(),
                action: "Centralise programme intelligence and create repeatable workflows."
                    .to_string(),
                expected_impact: format!(
                    "Accelerate capture of the incentive upside within {differentiators}."
                ),
            }],
        }],
        competitive_positioning: Some(Positioning {
            current_position: format!(
                "{product} is perceived as a high-quality premium option but not always linked to {name} business outcomes."
            ),
            positioning_gaps:
                "Messaging does not consistently quantify economics or incentive enablement."
                    .to_string(),
            positioning_opportunities: vec![Opportunity {
                opportunity: "Value-based messaging cadence".to_string(),
                action: format!(
                    "Embed {name} persona stories across marketing, sales, and customer success motions."
                ),
                expected_impact: format!(
                    "Align go-to-market with the {willingness} benchmark to defend premium pricing."
                ),
            }],
        }),
        extra: Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::random::SeededRandom;
    use crate::segment::{default_segment, normalize_segments};

    fn product() -> ProductInput {
        ProductInput::new("EcoBike 3000", "electric bike with recycled frame")
    }

    fn run_segment(segment: &Segment, rng: &dyn RandomSource) -> SegmentResults {
        let mut results = SegmentResults::default();
        for stage in StageId::SEGMENT_STAGES {
            let output = generate(
                stage,
                &product(),
                &FallbackContext {
                    segment,
                    results: &results,
                },
                rng,
            );
            assert_eq!(output.stage(), stage);
            results.record(output);
        }
        results
    }

    #[test]
    fn nba_prices_respect_segment_multiplier() {
        let rng = SeededRandom::from_entropy();
        for segment in normalize_segments(&segments::segmentation().segments) {
            let factor = sensitivity_factor(segment.pricing_sensitivity);
            let results = SegmentResults::default();
            let analysis = nba_analysis(
                "EcoBike 3000",
                &FallbackContext {
                    segment: &segment,
                    results: &results,
                },
                &rng,
            );
            let prices = analysis.price_points();
            assert_eq!(prices.len(), 2);
            assert!(prices[0] >= (1400.0 * factor).floor() && prices[0] <= (2300.0 * factor).ceil());
            assert!(
                prices[1] >= (1000.0 * factor * 0.95).floor()
                    && prices[1] <= (1800.0 * factor * 0.95).ceil()
            );
        }
    }

    #[test]
    fn nba_value_averages_upstream_prices() {
        let segment = default_segment();
        let mut results = SegmentResults::default();
        results.record(StageOutput::NbaAnalysis(NbaAnalysis {
            identified_alternatives: vec![
                Alternative {
                    estimated_price: Some(1000.0),
                    ..Alternative::default()
                },
                Alternative {
                    estimated_price: Some(3000.0),
                    ..Alternative::default()
                },
            ],
            ..NbaAnalysis::default()
        }));

        let value = nba_value(
            "EcoBike 3000",
            &FallbackContext {
                segment: &segment,
                results: &results,
            },
            &SeededRandom::from_seed(3),
        );
        assert_eq!(value.nba_value, 2000.0);
        assert_eq!(value.confidence_level, "medium-high");
    }

    fn differentiators_after_nba(nba_value: f64, seed: u64) -> ValueDifferentiators {
        let segment = default_segment();
        let mut results = SegmentResults::default();
        results.record(StageOutput::NbaValue(NbaValuation {
            nba_value,
            ..NbaValuation::default()
        }));

        value_differentiators(
            &FallbackContext {
                segment: &segment,
                results: &results,
            },
            &SeededRandom::from_seed(seed),
        )
    }

    #[test]
    fn differentiators_scale_off_upstream_nba_value() {
        let low = differentiators_after_nba(500.0, 3);
        let high = differentiators_after_nba(6000.0, 3);

        assert_eq!(low.differentiators.len(), high.differentiators.len());
        for (small, large) in low.differentiators.iter().zip(&high.differentiators) {
            assert!(
                large.value > small.value * 10.0,
                "{}: {} vs {}",
                large.name,
                small.value,
                large.value
            );
        }

        // Medium sensitivity: TCO is 75-105% of the NBA value
        assert!((4500.0..=6300.0).contains(&high.differentiators[0].value));
        assert_eq!(high.total_differentiator_value, Some(high.itemized_total()));
    }

    #[test]
    fn differentiators_follow_realistic_nba_values() {
        for seed in [1, 7, 42] {
            let cheaper = differentiators_after_nba(1500.0, seed);
            let pricier = differentiators_after_nba(2500.0, seed);
            assert!(pricier.itemized_total() > cheaper.itemized_total());
        }
    }

    #[test]
    fn willingness_follows_upstream_figures() {
        let segments = normalize_segments(&segments::segmentation().segments);
        let rng = SeededRandom::from_seed(11);

        for segment in &segments {
            let results = run_segment(segment, &rng);
            let nba = results.nba_value.as_ref().map(|v| v.nba_value).unwrap();
            let diff = results
                .value_differentiators
                .as_ref()
                .map(ValueDifferentiators::itemized_total)
                .unwrap();
            let wtp = results.willingness_to_pay.as_ref().unwrap();
            let recommendation = wtp.price_recommendation.as_ref().unwrap();
            let recommended = recommendation.recommended_price.unwrap();

            assert_eq!(wtp.nba_value, Some(nba));
            assert_eq!(wtp.differentiator_value, Some(diff));
            assert!(recommended < wtp.total_willingness_to_pay.unwrap());
            assert!(recommendation.floor_price.unwrap() < recommended);
            assert!(recommendation.stretch_price.unwrap() > recommended);
        }
    }

    #[test]
    fn narratives_quote_upstream_figures() {
        let segment = default_segment();
        let results = run_segment(&segment, &SeededRandom::from_seed(5));

        let plan = results.customer_communication.as_ref().unwrap();
        let nba = results.nba_value.as_ref().unwrap().nba_value;
        assert!(plan.communication_strategy.contains(&format_currency(nba)));
        assert!(plan.communication_strategy.contains("recommended price of $"));
        assert!(plan.tco_guidance.is_some() && plan.lifetime_guidance.is_some());

        let guidance = results.company_guidance.as_ref().unwrap();
        let total = results
            .willingness_to_pay
            .as_ref()
            .and_then(|w| w.total_willingness_to_pay)
            .unwrap();
        let positioning = guidance.competitive_positioning.as_ref().unwrap();
        assert!(positioning.positioning_opportunities[0]
            .expected_impact
            .contains(&format_currency(total)));
    }

    #[test]
    fn narratives_without_upstream_use_placeholders() {
        let segment = default_segment();
        let results = SegmentResults::default();
        let ctx = FallbackContext {
            segment: &segment,
            results: &results,
        };

        let plan = customer_communication("EcoBike 3000", &ctx);
        assert!(plan.communication_strategy.contains("the NBA benchmark price"));
        assert!(!plan.communication_strategy.contains("recommended price"));

        let guidance = company_guidance("EcoBike 3000", &ctx);
        let strength = &guidance.value_driver_strengths[0].enhancement_opportunities[0];
        assert!(strength.expected_impact.contains("the quantified differentiator value"));
        assert!(!strength.expected_impact.contains("$0"));
        let positioning = guidance.competitive_positioning.as_ref().unwrap();
        let impact = &positioning.positioning_opportunities[0].expected_impact;
        assert!(impact.contains("segment willingness-to-pay"));
        assert!(!impact.contains("$0"));
    }

    #[test]
    fn narratives_name_the_product() {
        let segment = default_segment();
        let results = run_segment(&segment, &SeededRandom::from_seed(9));

        let analysis = results.nba_analysis.as_ref().unwrap();
        assert!(analysis.market_positioning.contains("EcoBike 3000"));
        let plan = results.customer_communication.as_ref().unwrap();
        assert!(plan.communication_strategy.contains("EcoBike 3000"));
        let guidance = results.company_guidance.as_ref().unwrap();
        let positioning = guidance.competitive_positioning.as_ref().unwrap();
        assert!(positioning.current_position.starts_with("EcoBike 3000"));
    }
}
