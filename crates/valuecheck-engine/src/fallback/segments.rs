use crate::outputs::{RawSegment, SegmentationOutput};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Canonical three-segment split used when segmentation cannot come from the model.
#[must_use]
pub fn segmentation() -> SegmentationOutput {
    SegmentationOutput {
        segmentation_approach: "Heuristic segmentation based on sustainability maturity, budget posture, and decision criteria observed across similar product launches.".to_string(),
        key_observations: strings(&[
            "Willingness to pay increases with sustainability mandates and access to incentives.",
            "Operational ROI remains critical for mainstream segments even when sustainability is valued.",
            "Budget-sensitive buyers still convert when lifetime savings and financing support are explicit.",
        ]),
        segments: vec![eco_leaders(), roi_optimisers(), cost_pragmatists()],
        extra: Default::default(),
    }
}

fn eco_leaders() -> RawSegment {
    RawSegment {
        id: "eco-leaders".to_string(),
        name: "Eco Leaders".to_string(),
        description: "Sustainability-first enterprises with mandates to aggressively reduce Scope 1 & 2 emissions.".to_string(),
        primary_needs: strings(&[
            "Verified sustainability impact",
            "Innovation leadership and brand differentiation",
            "Partnership on reporting and compliance",
        ]),
        buying_criteria: strings(&[
            "Documented emissions reduction",
            "Proven ROI within 24-36 months",
            "Enterprise-grade support and integration",
        ]),
        pricing_sensitivity: "low".to_string(),
        representative_share: "25%".to_string(),
        value_drivers_focus: strings(&[
            "Carbon reduction monetisation",
            "Brand leadership halo effects",
            "Access to incentives and credits",
        ]),
        risk_factors: strings(&[
            "Requires robust measurement and verification capabilities",
            "Long procurement cycles with extensive stakeholder reviews",
        ]),
    }
}

fn roi_optimisers() -> RawSegment {
    RawSegment {
        id: "roi-optimisers".to_string(),
        name: "ROI-Focused Operators".to_string(),
        description: "Operational leaders balancing sustainability goals with strict payback thresholds.".to_string(),
        primary_needs: strings(&[
            "Clear total cost of ownership savings",
            "Minimal disruption to operations",
            "Proof of stable performance",
        ]),
        buying_criteria: strings(&[
            "Payback in under 3 years",
            "Demonstrated maintenance savings",
            "Training and enablement support",
        ]),
        pricing_sensitivity: "medium".to_string(),
        representative_share: "40%".to_string(),
        value_drivers_focus: strings(&[
            "Operating expense reductions",
            "Uptime and reliability improvements",
            "Maintenance simplification",
        ]),
        risk_factors: strings(&[
            "Need quantifiable business case data",
            "Sceptical of untested sustainability claims",
        ]),
    }
}

fn cost_pragmatists() -> RawSegment {
    RawSegment {
        id: "cost-pragmatists".to_string(),
        name: "Cost-Conscious Pragmatists".to_string(),
        description: "Budget-driven buyers open to sustainability upgrades when economics are compelling.".to_string(),
        primary_needs: strings(&[
            "Competitive upfront price",
            "Financing or incentive support",
            "Assurance of long-term durability",
        ]),
        buying_criteria: strings(&[
            "Low capital requirement",
            "Bundled incentives and financing",
            "Peer proof points",
        ]),
        pricing_sensitivity: "high".to_string(),
        representative_share: "35%".to_string(),
        value_drivers_focus: strings(&[
            "Subsidies and rebates",
            "Maintenance avoidance",
            "Extended warranty coverage",
        ]),
        risk_factors: strings(&[
            "High sensitivity to initial price premium",
            "Need references from similar budget profiles",
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::normalize_segments;
    use valuecheck_utils::types::PricingSensitivity;

    #[test]
    fn canonical_segments_cover_each_sensitivity() {
        let segments = normalize_segments(&segmentation().segments);
        let ids: Vec<_> = segments.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["eco-leaders-1", "roi-optimisers-2", "cost-pragmatists-3"]);

        let sensitivities: Vec<_> = segments.iter().map(|s| s.pricing_sensitivity).collect();
        assert_eq!(
            sensitivities,
            [
                PricingSensitivity::Low,
                PricingSensitivity::Medium,
                PricingSensitivity::High
            ]
        );
    }
}
