use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;

/// Next best alternatives identified for one segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NbaAnalysis {
    #[serde(default, deserialize_with = "lenient::text")]
    pub search_methodology: String,
    #[serde(default, deserialize_with = "lenient::list")]
    pub identified_alternatives: Vec<Alternative>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub market_positioning: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub confidence_level: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NbaAnalysis {
    /// Positive alternative prices, in listed order.
    #[must_use]
    pub fn price_points(&self) -> Vec<f64> {
        self.identified_alternatives
            .iter()
            .filter_map(|alt| alt.estimated_price)
            .filter(|price| *price > 0.0)
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alternative {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub reasoning: String,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        serialize_with = "lenient::opt_amount"
    )]
    pub estimated_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub price_range: String,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub key_differences: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub market_share: String,
    #[serde(default, deserialize_with = "lenient::record")]
    pub proof_points: Option<ProofPoints>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofPoints {
    #[serde(default, deserialize_with = "lenient::list")]
    pub price_sources: Vec<PriceSource>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub market_data: Vec<MarketData>,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub segment_specific_notes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSource {
    #[serde(default, deserialize_with = "lenient::text")]
    pub source: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub url: String,
    /// Display price as quoted by the source
    #[serde(default, deserialize_with = "lenient::text")]
    pub price: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub reliability: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    #[serde(default, deserialize_with = "lenient::text")]
    pub source: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub data: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub reliability: String,
}

/// Single representative NBA price for one segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NbaValuation {
    #[serde(
        default,
        deserialize_with = "lenient::number_or_zero",
        serialize_with = "lenient::amount"
    )]
    pub nba_value: f64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub valuation_methodology: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub justification: String,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub assumptions: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub confidence_level: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn price_points_skip_missing_and_non_positive() {
        let analysis: NbaAnalysis = serde_json::from_value(json!({
            "identifiedAlternatives": [
                {"name": "A", "estimatedPrice": "$1,200"},
                {"name": "B", "estimatedPrice": 0},
                {"name": "C"},
                "not an alternative",
                {"name": "D", "estimatedPrice": 800}
            ]
        }))
        .unwrap();

        assert_eq!(analysis.identified_alternatives.len(), 4);
        assert_eq!(analysis.price_points(), vec![1200.0, 800.0]);
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let valuation: NbaValuation = serde_json::from_value(json!({
            "nbaValue": "2,150",
            "currency": "USD"
        }))
        .unwrap();

        let back = serde_json::to_value(&valuation).unwrap();
        assert_eq!(back["nbaValue"], json!(2150));
        assert_eq!(back["currency"], json!("USD"));
    }
}
