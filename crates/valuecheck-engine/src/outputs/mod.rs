//! Typed stage outputs.
//!
//! Every stage has an explicit schema. Model JSON is checked against the
//! stage's required fields, then coerced into the schema by the lenient
//! deserializers in [`lenient`]. Fallback generators build the same types,
//! so real and synthetic output always share one shape.

pub mod lenient;
mod narrative;
mod nba;
mod segmentation;
mod value;

pub use narrative::{
    ActionStep, CommunicationPlan, CompanyGuidance, Guidance, Improvement, Opportunity,
    Positioning, Strength, Weakness,
};
pub use nba::{Alternative, MarketData, NbaAnalysis, NbaValuation, PriceSource, ProofPoints};
pub use segmentation::{RawSegment, SegmentationOutput};
pub use value::{
    Calculation, Confidence, Differentiator, PriceRecommendation, RECONCILIATION_TOLERANCE,
    SegmentWillingness, SensitivityFactor, Substep, ValueDifferentiators, WillingnessToPay,
};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use valuecheck_utils::error::AssessmentError;
use valuecheck_utils::types::StageId;

/// Output of one stage, tagged by stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StageOutput {
    Segmentation(SegmentationOutput),
    NbaAnalysis(NbaAnalysis),
    NbaValue(NbaValuation),
    ValueDifferentiators(ValueDifferentiators),
    WillingnessToPay(WillingnessToPay),
    CustomerCommunication(CommunicationPlan),
    CompanyGuidance(CompanyGuidance),
}

impl StageOutput {
    #[must_use]
    pub fn stage(&self) -> StageId {
        match self {
            StageOutput::Segmentation(_) => StageId::Segmentation,
            StageOutput::NbaAnalysis(_) => StageId::NbaAnalysis,
            StageOutput::NbaValue(_) => StageId::NbaValue,
            StageOutput::ValueDifferentiators(_) => StageId::ValueDifferentiators,
            StageOutput::WillingnessToPay(_) => StageId::WillingnessToPay,
            StageOutput::CustomerCommunication(_) => StageId::CustomerCommunication,
            StageOutput::CompanyGuidance(_) => StageId::CompanyGuidance,
        }
    }

    /// Validate parsed model JSON against `stage`'s contract and coerce it.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::Shape` when the value is not an object or a
    /// required field is missing or unusable.
    pub fn from_value(stage: StageId, value: Value) -> Result<Self, AssessmentError> {
        let shape = |reason: &str| AssessmentError::Shape {
            stage,
            reason: reason.to_string(),
        };

        let Some(object) = value.as_object() else {
            return Err(shape("expected a JSON object"));
        };
        let present = |key: &str| object.get(key).is_some_and(|v| !v.is_null());

        match stage {
            StageId::Segmentation => {}
            StageId::NbaAnalysis => {
                if !object
                    .get("identifiedAlternatives")
                    .is_some_and(Value::is_array)
                {
                    return Err(shape("identifiedAlternatives must be an array"));
                }
            }
            StageId::NbaValue => {
                if object
                    .get("nbaValue")
                    .and_then(lenient::coerce_number)
                    .is_none()
                {
                    return Err(shape("nbaValue must be a finite number"));
                }
            }
            StageId::ValueDifferentiators => {
                if !object.get("differentiators").is_some_and(Value::is_array) {
                    return Err(shape("differentiators must be an array"));
                }
            }
            StageId::WillingnessToPay => {
                if !["totalWillingnessToPay", "priceRecommendation", "customerSegments"]
                    .into_iter()
                    .any(|key| present(key))
                {
                    return Err(shape(
                        "expected totalWillingnessToPay, priceRecommendation or customerSegments",
                    ));
                }
            }
            StageId::CustomerCommunication => {
                let strategy = object
                    .get("communicationStrategy")
                    .map(lenient::coerce_text)
                    .unwrap_or_default();
                if strategy.trim().is_empty() {
                    return Err(shape("communicationStrategy is missing"));
                }
            }
            StageId::CompanyGuidance => {
                if ![
                    "valueDriverStrengths",
                    "valueDriverWeaknesses",
                    "competitivePositioning",
                ]
                .into_iter()
                .any(|key| present(key))
                {
                    return Err(shape(
                        "expected valueDriverStrengths, valueDriverWeaknesses or competitivePositioning",
                    ));
                }
            }
        }

        let output = match stage {
            StageId::Segmentation => StageOutput::Segmentation(decode(stage, value)?),
            StageId::NbaAnalysis => StageOutput::NbaAnalysis(decode(stage, value)?),
            StageId::NbaValue => StageOutput::NbaValue(decode(stage, value)?),
            StageId::ValueDifferentiators => {
                let mut differentiators: ValueDifferentiators = decode(stage, value)?;
                if let Some(declared) = differentiators.reconcile() {
                    warn!(
                        stage = %stage,
                        declared,
                        itemized = differentiators.itemized_total(),
                        "Declared differentiator total disagrees with items, using itemized sum"
                    );
                }
                StageOutput::ValueDifferentiators(differentiators)
            }
            StageId::WillingnessToPay => StageOutput::WillingnessToPay(decode(stage, value)?),
            StageId::CustomerCommunication => {
                StageOutput::CustomerCommunication(decode(stage, value)?)
            }
            StageId::CompanyGuidance => StageOutput::CompanyGuidance(decode(stage, value)?),
        };

        Ok(output)
    }
}

fn decode<T: DeserializeOwned>(stage: StageId, value: Value) -> Result<T, AssessmentError> {
    serde_json::from_value(value).map_err(|e| AssessmentError::Shape {
        stage,
        reason: e.to_string(),
    })
}

/// Per-segment stage outputs, filled in stage order.
///
/// Serialized under the `step*` keys consumers expect.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SegmentResults {
    #[serde(rename = "step1_nbaAnalysis", skip_serializing_if = "Option::is_none")]
    pub nba_analysis: Option<NbaAnalysis>,
    #[serde(rename = "step1_nbaValue", skip_serializing_if = "Option::is_none")]
    pub nba_value: Option<NbaValuation>,
    #[serde(
        rename = "step2_valueDifferentiators",
        skip_serializing_if = "Option::is_none"
    )]
    pub value_differentiators: Option<ValueDifferentiators>,
    #[serde(rename = "step3_willingnessToPay", skip_serializing_if = "Option::is_none")]
    pub willingness_to_pay: Option<WillingnessToPay>,
    #[serde(
        rename = "step5_customerCommunication",
        skip_serializing_if = "Option::is_none"
    )]
    pub customer_communication: Option<CommunicationPlan>,
    #[serde(rename = "step6_companyGuidance", skip_serializing_if = "Option::is_none")]
    pub company_guidance: Option<CompanyGuidance>,
}

impl SegmentResults {
    /// Store a per-segment stage output. Segmentation output has no slot here
    /// and is ignored.
    pub fn record(&mut self, output: StageOutput) {
        match output {
            StageOutput::Segmentation(_) => {}
            StageOutput::NbaAnalysis(v) => self.nba_analysis = Some(v),
            StageOutput::NbaValue(v) => self.nba_value = Some(v),
            StageOutput::ValueDifferentiators(v) => self.value_differentiators = Some(v),
            StageOutput::WillingnessToPay(v) => self.willingness_to_pay = Some(v),
            StageOutput::CustomerCommunication(v) => self.customer_communication = Some(v),
            StageOutput::CompanyGuidance(v) => self.company_guidance = Some(v),
        }
    }

    #[must_use]
    pub fn contains(&self, stage: StageId) -> bool {
        match stage {
            StageId::Segmentation => false,
            StageId::NbaAnalysis => self.nba_analysis.is_some(),
            StageId::NbaValue => self.nba_value.is_some(),
            StageId::ValueDifferentiators => self.value_differentiators.is_some(),
            StageId::WillingnessToPay => self.willingness_to_pay.is_some(),
            StageId::CustomerCommunication => self.customer_communication.is_some(),
            StageId::CompanyGuidance => self.company_guidance.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shape_reason(stage: StageId, value: Value) -> String {
        match StageOutput::from_value(stage, value) {
            Err(AssessmentError::Shape { stage: s, reason }) => {
                assert_eq!(s, stage);
                reason
            }
            other => panic!("expected shape error for {stage}, got {other:?}"),
        }
    }

    #[test]
    fn required_fields_are_enforced() {
        assert!(shape_reason(StageId::NbaAnalysis, json!({"identifiedAlternatives": "x"}))
            .contains("identifiedAlternatives"));
        assert!(shape_reason(StageId::NbaValue, json!({"nbaValue": "unknown"})).contains("nbaValue"));
        assert!(shape_reason(StageId::ValueDifferentiators, json!({})).contains("differentiators"));
        assert!(
            shape_reason(StageId::WillingnessToPay, json!({"calculation": "x"}))
                .contains("totalWillingnessToPay")
        );
        assert!(
            shape_reason(StageId::CustomerCommunication, json!({"communicationStrategy": " "}))
                .contains("communicationStrategy")
        );
        assert!(
            shape_reason(StageId::CompanyGuidance, json!({"competitivePositioning": null}))
                .contains("valueDriverStrengths")
        );
        assert!(shape_reason(StageId::Segmentation, json!([1, 2])).contains("object"));
    }

    #[test]
    fn minimal_outputs_are_accepted() {
        let cases = [
            (StageId::Segmentation, json!({})),
            (StageId::NbaAnalysis, json!({"identifiedAlternatives": []})),
            (StageId::NbaValue, json!({"nbaValue": "$2,000"})),
            (StageId::ValueDifferentiators, json!({"differentiators": []})),
            (StageId::WillingnessToPay, json!({"customerSegments": []})),
            (
                StageId::CustomerCommunication,
                json!({"communicationStrategy": "Lead with TCO"}),
            ),
            (StageId::CompanyGuidance, json!({"valueDriverStrengths": []})),
        ];

        for (stage, value) in cases {
            let output = StageOutput::from_value(stage, value).unwrap();
            assert_eq!(output.stage(), stage);
        }
    }

    #[test]
    fn differentiator_totals_are_reconciled_at_the_boundary() {
        let output = StageOutput::from_value(
            StageId::ValueDifferentiators,
            json!({
                "differentiators": [{"name": "a", "value": 4000}, {"name": "b", "value": 5000}],
                "totalDifferentiatorValue": 9500
            }),
        )
        .unwrap();

        let StageOutput::ValueDifferentiators(vd) = output else {
            panic!("wrong variant");
        };
        assert_eq!(vd.total_differentiator_value, Some(9000.0));
    }

    #[test]
    fn results_serialize_under_step_keys() {
        let mut results = SegmentResults::default();
        results.record(StageOutput::NbaValue(NbaValuation {
            nba_value: 2100.0,
            ..NbaValuation::default()
        }));
        results.record(StageOutput::Segmentation(SegmentationOutput::default()));

        assert!(results.contains(StageId::NbaValue));
        assert!(!results.contains(StageId::NbaAnalysis));

        let value = serde_json::to_value(&results).unwrap();
        assert_eq!(value["step1_nbaValue"]["nbaValue"], json!(2100));
        assert!(value.get("step1_nbaAnalysis").is_none());
    }
}
