use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::lenient;

/// Largest gap tolerated between a declared total and the itemised sum
pub const RECONCILIATION_TOLERANCE: f64 = 1.0;

/// Quantified value drivers versus the NBA set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueDifferentiators {
    #[serde(default, deserialize_with = "lenient::list")]
    pub differentiators: Vec<Differentiator>,
    /// Declared total; made to agree with the items by [`Self::reconcile`]
    #[serde(
        default,
        deserialize_with = "lenient::number",
        serialize_with = "lenient::opt_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_differentiator_value: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ValueDifferentiators {
    /// Sum of the itemised values.
    #[must_use]
    pub fn itemized_total(&self) -> f64 {
        self.differentiators
            .iter()
            .map(|d| d.value)
            .filter(|v| v.is_finite())
            .sum()
    }

    /// Replace a missing or disagreeing declared total with the itemised sum.
    ///
    /// Returns the discarded declared total when one was overwritten.
    pub fn reconcile(&mut self) -> Option<f64> {
        let itemized = self.itemized_total();
        match self.total_differentiator_value {
            Some(declared) if (declared - itemized).abs() <= RECONCILIATION_TOLERANCE => None,
            declared => {
                self.total_differentiator_value = Some(itemized.round());
                declared
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Differentiator {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "lenient::number_or_zero",
        serialize_with = "lenient::amount"
    )]
    pub value: f64,
    #[serde(default, deserialize_with = "calculation")]
    pub calculation: Option<Calculation>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub economic_rationale: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub evidence: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calculation {
    #[serde(default, deserialize_with = "lenient::text")]
    pub methodology: String,
    #[serde(default, deserialize_with = "lenient::list")]
    pub substeps: Vec<Substep>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub total_calculation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Substep {
    #[serde(default, deserialize_with = "lenient::text")]
    pub step: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub calculation: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub assumptions: String,
}

/// A prose-only calculation is kept as its methodology.
fn calculation<'de, D>(deserializer: D) -> Result<Option<Calculation>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(methodology) => Some(Calculation {
            methodology,
            ..Calculation::default()
        }),
        obj @ Value::Object(_) => serde_json::from_value(obj).ok(),
        _ => None,
    })
}

/// Willingness to pay and price guidance for one segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WillingnessToPay {
    #[serde(default, deserialize_with = "lenient::text")]
    pub calculation: String,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        serialize_with = "lenient::opt_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub nba_value: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        serialize_with = "lenient::opt_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub differentiator_value: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        serialize_with = "lenient::opt_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_willingness_to_pay: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::record",
        skip_serializing_if = "Option::is_none"
    )]
    pub price_recommendation: Option<PriceRecommendation>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub customer_segments: Vec<SegmentWillingness>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub sensitivity_analysis: Vec<SensitivityFactor>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecommendation {
    #[serde(
        default,
        deserialize_with = "lenient::number",
        serialize_with = "lenient::opt_amount"
    )]
    pub recommended_price: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        serialize_with = "lenient::opt_amount"
    )]
    pub floor_price: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        serialize_with = "lenient::opt_amount"
    )]
    pub stretch_price: Option<f64>,
    #[serde(default, deserialize_with = "confidence")]
    pub confidence: Option<Confidence>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub rationale: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentWillingness {
    #[serde(default, deserialize_with = "lenient::text")]
    pub segment: String,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        serialize_with = "lenient::opt_amount"
    )]
    pub willingness_to_pay: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub reasoning: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityFactor {
    #[serde(default, deserialize_with = "lenient::text")]
    pub factor: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub impact: String,
}

/// Confidence as the model stated it: a score or a qualitative label.
#[derive(Debug, Clone, PartialEq)]
pub enum Confidence {
    Score(f64),
    Label(String),
}

impl Serialize for Confidence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Confidence::Score(score) => lenient::amount(score, serializer),
            Confidence::Label(label) => serializer.serialize_str(label),
        }
    }
}

/// `"85%"` and `85` are scores; other text is a label.
fn confidence<'de, D>(deserializer: D) -> Result<Option<Confidence>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).map(Confidence::Score),
        Value::String(s) => {
            let trimmed = s.trim();
            match trimmed.trim_end_matches('%').trim().parse::<f64>() {
                Ok(score) if score.is_finite() => Some(Confidence::Score(score)),
                _ if trimmed.is_empty() => None,
                _ => Some(Confidence::Label(trimmed.to_string())),
            }
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn differentiators(values: &[f64], declared: Option<f64>) -> ValueDifferentiators {
        ValueDifferentiators {
            differentiators: values
                .iter()
                .map(|v| Differentiator {
                    name: "d".into(),
                    value: *v,
                    ..Differentiator::default()
                })
                .collect(),
            total_differentiator_value: declared,
            extra: Map::new(),
        }
    }

    #[test]
    fn reconcile_replaces_wrong_totals() {
        let mut vd = differentiators(&[4000.0, 5000.0], Some(9500.0));
        assert_eq!(vd.reconcile(), Some(9500.0));
        assert_eq!(vd.total_differentiator_value, Some(9000.0));
    }

    #[test]
    fn reconcile_keeps_totals_within_a_dollar() {
        let mut vd = differentiators(&[4000.4, 5000.0], Some(9000.0));
        assert_eq!(vd.reconcile(), None);
        assert_eq!(vd.total_differentiator_value, Some(9000.0));
    }

    #[test]
    fn reconcile_fills_missing_total() {
        let mut vd = differentiators(&[100.0, 250.0], None);
        assert_eq!(vd.reconcile(), None);
        assert_eq!(vd.total_differentiator_value, Some(350.0));
    }

    #[test]
    fn prose_calculation_is_kept() {
        let d: Differentiator = serde_json::from_value(json!({
            "name": "Energy",
            "value": "$1,500",
            "calculation": "kWh saved x rate"
        }))
        .unwrap();
        assert_eq!(d.value, 1500.0);
        assert_eq!(
            d.calculation.map(|c| c.methodology).as_deref(),
            Some("kWh saved x rate")
        );
    }

    #[test]
    fn confidence_reads_scores_and_labels() {
        let rec: PriceRecommendation =
            serde_json::from_value(json!({"confidence": "85%"})).unwrap();
        assert_eq!(rec.confidence, Some(Confidence::Score(85.0)));

        let rec: PriceRecommendation =
            serde_json::from_value(json!({"confidence": "Medium-High"})).unwrap();
        assert_eq!(rec.confidence, Some(Confidence::Label("Medium-High".into())));

        let rec: PriceRecommendation = serde_json::from_value(json!({"confidence": ""})).unwrap();
        assert_eq!(rec.confidence, None);
    }
}
