use std::collections::HashMap;
use std::time::Duration;

use valuecheck_utils::error::ConfigError;
use valuecheck_utils::types::ConfigSource;

use super::{AssessmentSettings, Config, LlmSettings};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// Use this when embedding valuecheck in another application: no
    /// environment variables (other than the API key lookup) or config
    /// files are consulted.
    ///
    /// # Example
    ///
    /// ```rust
    /// use valuecheck_config::Config;
    /// use std::time::Duration;
    ///
    /// let config = Config::builder()
    ///     .model("gpt-4o")
    ///     .request_timeout(Duration::from_secs(20))
    ///     .use_fallback(false)
    ///     .build()
    ///     .expect("valid config");
    /// assert_eq!(config.model(), "gpt-4o");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for programmatic configuration.
///
/// All values set via the builder are attributed to
/// `ConfigSource::Programmatic`.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    llm: LlmSettings,
    assessment: AssessmentSettings,
    set_keys: Vec<&'static str>,
}

impl ConfigBuilder {
    /// Create a new `ConfigBuilder` with every value at its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn api_key_env(mut self, name: impl Into<String>) -> Self {
        self.llm.api_key_env = Some(name.into());
        self.set_keys.push("api_key_env");
        self
    }

    #[must_use]
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.llm.api_url = Some(url.into());
        self.set_keys.push("api_url");
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.llm.model = Some(model.into());
        self.set_keys.push("model");
        self
    }

    #[must_use]
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.llm.max_tokens = Some(max_tokens);
        self.set_keys.push("max_tokens");
        self
    }

    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.llm.temperature = Some(temperature);
        self.set_keys.push("temperature");
        self
    }

    /// Per-call timeout. Sub-second precision is truncated.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.llm.request_timeout_secs = Some(timeout.as_secs());
        self.set_keys.push("request_timeout_secs");
        self
    }

    #[must_use]
    pub fn use_fallback(mut self, enabled: bool) -> Self {
        self.assessment.use_fallback = Some(enabled);
        self.set_keys.push("use_fallback");
        self
    }

    #[must_use]
    pub fn verify_connectivity(mut self, enabled: bool) -> Self {
        self.assessment.verify_connectivity = Some(enabled);
        self.set_keys.push("verify_connectivity");
        self
    }

    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.assessment.seed = Some(seed);
        self.set_keys.push("seed");
        self
    }

    #[must_use]
    pub fn doc_excerpt_chars(mut self, chars: usize) -> Self {
        self.assessment.doc_excerpt_chars = Some(chars);
        self.set_keys.push("doc_excerpt_chars");
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when a value is out of range.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut source_attribution = HashMap::new();
        for key in super::discovery::CONFIG_KEYS {
            source_attribution.insert(key.to_string(), ConfigSource::Default);
        }
        for key in self.set_keys {
            source_attribution.insert(key.to_string(), ConfigSource::Programmatic);
        }

        let config = Config {
            llm: self.llm,
            assessment: self.assessment,
            source_attribution,
        };
        config.validate()?;
        Ok(config)
    }
}
