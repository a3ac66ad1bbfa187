use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use valuecheck_utils::types::ConfigSource;

/// Default environment variable holding the API credential
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default OpenAI-compatible chat completions endpoint
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default model identifier
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default completion token cap
pub const DEFAULT_MAX_TOKENS: u32 = 3000;

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.6;

/// Default per-call timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default characters of each extracted document quoted in prompts
pub const DEFAULT_DOC_EXCERPT_CHARS: usize = 500;

/// Effective configuration for one valuecheck process.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmSettings,
    pub assessment: AssessmentSettings,
    /// Where each effective key came from
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// `[llm]` section: how to reach the model.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LlmSettings {
    /// Name of the environment variable that holds the API key.
    /// The key itself never lives in the config file.
    pub api_key_env: Option<String>,
    pub api_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub request_timeout_secs: Option<u64>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key_env: Some(DEFAULT_API_KEY_ENV.to_string()),
            api_url: Some(DEFAULT_API_URL.to_string()),
            model: Some(DEFAULT_MODEL.to_string()),
            max_tokens: Some(DEFAULT_MAX_TOKENS),
            temperature: Some(DEFAULT_TEMPERATURE),
            request_timeout_secs: Some(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// `[assessment]` section: run-time behaviour of the orchestrator.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AssessmentSettings {
    pub use_fallback: Option<bool>,
    pub verify_connectivity: Option<bool>,
    /// Seed for fallback data; unseeded when absent
    pub seed: Option<u64>,
    pub doc_excerpt_chars: Option<usize>,
}

impl Default for AssessmentSettings {
    fn default() -> Self {
        Self {
            use_fallback: Some(true),
            verify_connectivity: Some(false),
            seed: None,
            doc_excerpt_chars: Some(DEFAULT_DOC_EXCERPT_CHARS),
        }
    }
}

impl Config {
    #[must_use]
    pub fn api_key_env(&self) -> &str {
        self.llm.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV)
    }

    /// Look up the API credential in the configured environment variable.
    ///
    /// Empty values count as missing.
    #[must_use]
    pub fn api_key(&self) -> Option<String> {
        std::env::var(self.api_key_env())
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    #[must_use]
    pub fn api_url(&self) -> &str {
        self.llm.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    #[must_use]
    pub fn model(&self) -> &str {
        self.llm.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    #[must_use]
    pub fn max_tokens(&self) -> u32 {
        self.llm.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    #[must_use]
    pub fn temperature(&self) -> f32 {
        self.llm.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.llm
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    #[must_use]
    pub fn use_fallback(&self) -> bool {
        self.assessment.use_fallback.unwrap_or(true)
    }

    #[must_use]
    pub fn verify_connectivity(&self) -> bool {
        self.assessment.verify_connectivity.unwrap_or(false)
    }

    #[must_use]
    pub fn seed(&self) -> Option<u64> {
        self.assessment.seed
    }

    #[must_use]
    pub fn doc_excerpt_chars(&self) -> usize {
        self.assessment
            .doc_excerpt_chars
            .unwrap_or(DEFAULT_DOC_EXCERPT_CHARS)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmSettings::default(),
            assessment: AssessmentSettings::default(),
            source_attribution: HashMap::new(),
        }
    }
}
