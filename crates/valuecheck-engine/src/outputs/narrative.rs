use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;

/// Customer-facing messaging plan for one segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationPlan {
    #[serde(default, deserialize_with = "lenient::text")]
    pub communication_strategy: String,
    #[serde(
        default,
        deserialize_with = "lenient::record",
        skip_serializing_if = "Option::is_none"
    )]
    pub tco_guidance: Option<Guidance>,
    #[serde(
        default,
        deserialize_with = "lenient::record",
        skip_serializing_if = "Option::is_none"
    )]
    pub incentive_guidance: Option<Guidance>,
    #[serde(
        default,
        deserialize_with = "lenient::record",
        skip_serializing_if = "Option::is_none"
    )]
    pub lifetime_guidance: Option<Guidance>,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub storytelling_themes: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guidance {
    #[serde(default, deserialize_with = "lenient::text")]
    pub message: String,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub tools: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub objectives: String,
    #[serde(default, deserialize_with = "lenient::list")]
    pub actionable_steps: Vec<ActionStep>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionStep {
    #[serde(default, deserialize_with = "lenient::text")]
    pub step: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub implementation: String,
}

/// Organisational strengths, gaps and positioning for one segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyGuidance {
    #[serde(default, deserialize_with = "lenient::list")]
    pub value_driver_strengths: Vec<Strength>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub value_driver_weaknesses: Vec<Weakness>,
    #[serde(
        default,
        deserialize_with = "lenient::record",
        skip_serializing_if = "Option::is_none"
    )]
    pub competitive_positioning: Option<Positioning>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strength {
    #[serde(default, deserialize_with = "lenient::text")]
    pub driver: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub current_strength: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub strength_level: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub evidence: String,
    #[serde(default, deserialize_with = "lenient::list")]
    pub enhancement_opportunities: Vec<Opportunity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weakness {
    #[serde(default, deserialize_with = "lenient::text")]
    pub driver: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub current_weakness: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub weakness_level: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub root_cause: String,
    #[serde(default, deserialize_with = "lenient::list")]
    pub improvement_plan: Vec<Improvement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    #[serde(default, deserialize_with = "lenient::text")]
    pub opportunity: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub action: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub expected_impact: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Improvement {
    #[serde(default, deserialize_with = "lenient::text")]
    pub improvement: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub action: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub expected_impact: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Positioning {
    #[serde(default, deserialize_with = "lenient::text")]
    pub current_position: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub positioning_gaps: String,
    #[serde(default, deserialize_with = "lenient::list")]
    pub positioning_opportunities: Vec<Opportunity>,
}
