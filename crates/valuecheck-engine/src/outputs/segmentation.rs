use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;

/// Output of the segmentation stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentationOutput {
    #[serde(default, deserialize_with = "lenient::text")]
    pub segmentation_approach: String,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub key_observations: Vec<String>,
    /// Segments as proposed by the model; normalised separately
    #[serde(default, deserialize_with = "raw_segments")]
    pub segments: Vec<RawSegment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One segment as the model described it, before id assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSegment {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub primary_needs: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub buying_criteria: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub pricing_sensitivity: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub representative_share: String,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub value_drivers_focus: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub risk_factors: Vec<String>,
}

/// Segments list where a bare string names a segment and anything that is
/// not an array yields no segments at all.
fn raw_segments<'de, D>(deserializer: D) -> Result<Vec<RawSegment>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(name) if !name.trim().is_empty() => Some(RawSegment {
                name,
                ..RawSegment::default()
            }),
            obj @ Value::Object(_) => serde_json::from_value(obj).ok(),
            _ => None,
        })
        .collect())
}
