use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stage identifiers for the assessment pipeline.
///
/// The pipeline runs [`StageId::Segmentation`] once, then the six
/// per-segment stages in [`StageId::SEGMENT_STAGES`] order for every segment.
///
/// # Example
///
/// ```rust
/// use valuecheck_utils::types::StageId;
///
/// assert_eq!(StageId::NbaValue.as_str(), "nba-value");
/// assert_eq!(StageId::NbaValue.result_key(), "step1_nbaValue");
/// assert_eq!("willingness-to-pay".parse::<StageId>(), Ok(StageId::WillingnessToPay));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageId {
    Segmentation,
    NbaAnalysis,
    NbaValue,
    ValueDifferentiators,
    WillingnessToPay,
    CustomerCommunication,
    CompanyGuidance,
}

impl StageId {
    /// Every stage in execution order.
    pub const ALL: [StageId; 7] = [
        StageId::Segmentation,
        StageId::NbaAnalysis,
        StageId::NbaValue,
        StageId::ValueDifferentiators,
        StageId::WillingnessToPay,
        StageId::CustomerCommunication,
        StageId::CompanyGuidance,
    ];

    /// The six stages executed once per segment, in dependency order.
    pub const SEGMENT_STAGES: [StageId; 6] = [
        StageId::NbaAnalysis,
        StageId::NbaValue,
        StageId::ValueDifferentiators,
        StageId::WillingnessToPay,
        StageId::CustomerCommunication,
        StageId::CompanyGuidance,
    ];

    /// Stable identifier reported to progress observers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            StageId::Segmentation => "segmentation",
            StageId::NbaAnalysis => "nba-analysis",
            StageId::NbaValue => "nba-value",
            StageId::ValueDifferentiators => "value-differentiators",
            StageId::WillingnessToPay => "willingness-to-pay",
            StageId::CustomerCommunication => "customer-communication",
            StageId::CompanyGuidance => "company-guidance",
        }
    }

    /// Key under which the stage output is stored in a segment's results.
    #[must_use]
    pub const fn result_key(self) -> &'static str {
        match self {
            StageId::Segmentation => "segmentation",
            StageId::NbaAnalysis => "step1_nbaAnalysis",
            StageId::NbaValue => "step1_nbaValue",
            StageId::ValueDifferentiators => "step2_valueDifferentiators",
            StageId::WillingnessToPay => "step3_willingnessToPay",
            StageId::CustomerCommunication => "step5_customerCommunication",
            StageId::CompanyGuidance => "step6_companyGuidance",
        }
    }

    /// Human readable label for progress displays and logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            StageId::Segmentation => "Customer Segmentation",
            StageId::NbaAnalysis => "NBA Analysis",
            StageId::NbaValue => "NBA Value Estimation",
            StageId::ValueDifferentiators => "Value Differentiators",
            StageId::WillingnessToPay => "Willingness to Pay",
            StageId::CustomerCommunication => "Customer Communication",
            StageId::CompanyGuidance => "Company Guidance",
        }
    }

    /// Position of this stage in the pipeline (segmentation is 0).
    #[must_use]
    pub const fn ordinal(self) -> usize {
        match self {
            StageId::Segmentation => 0,
            StageId::NbaAnalysis => 1,
            StageId::NbaValue => 2,
            StageId::ValueDifferentiators => 3,
            StageId::WillingnessToPay => 4,
            StageId::CustomerCommunication => 5,
            StageId::CompanyGuidance => 6,
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StageId::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| format!("unknown stage id: {s}"))
    }
}

/// How strongly a customer segment reacts to price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingSensitivity {
    Low,
    #[default]
    Medium,
    High,
}

impl PricingSensitivity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PricingSensitivity::Low => "low",
            PricingSensitivity::Medium => "medium",
            PricingSensitivity::High => "high",
        }
    }

    /// Interpret free text such as `"High"`, `"low-to-moderate"` or `"very high"`.
    ///
    /// Anything unrecognised is treated as [`PricingSensitivity::Medium`].
    #[must_use]
    pub fn from_free_text(text: &str) -> Self {
        let value = text.trim().to_ascii_lowercase();
        match value.as_str() {
            "low" => return PricingSensitivity::Low,
            "medium" | "moderate" | "mid" => return PricingSensitivity::Medium,
            "high" => return PricingSensitivity::High,
            _ => {}
        }

        // Mixed phrases like "medium-high" stay medium.
        if value.contains("medium") || value.contains("moderate") {
            PricingSensitivity::Medium
        } else if value.contains("high") {
            PricingSensitivity::High
        } else if value.contains("low") {
            PricingSensitivity::Low
        } else {
            PricingSensitivity::Medium
        }
    }
}

impl fmt::Display for PricingSensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of a configuration value.
///
/// Used by `effective_config()` to report where each value came from.
///
/// ```rust
/// use valuecheck_utils::types::ConfigSource;
///
/// let json = serde_json::to_string(&ConfigSource::Cli).unwrap();
/// assert_eq!(json, r#""cli""#);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// Value provided via CLI argument (highest precedence).
    Cli,
    /// Value loaded from configuration file.
    Config,
    /// Value provided programmatically (e.g., `Config::builder()`).
    Programmatic,
    /// Built-in default value (lowest precedence).
    Default,
}

impl ConfigSource {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigSource::Cli => "cli",
            ConfigSource::Config => "config",
            ConfigSource::Programmatic => "programmatic",
            ConfigSource::Default => "default",
        }
    }
}
