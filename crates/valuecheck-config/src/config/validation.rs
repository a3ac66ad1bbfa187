use valuecheck_utils::error::ConfigError;

use super::Config;

fn invalid(key: &str, value: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.into(),
    }
}

impl Config {
    /// Validate configuration values
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if let Some(timeout) = self.llm.request_timeout_secs {
            if timeout == 0 {
                return Err(invalid("request_timeout_secs", "must be greater than 0"));
            }
            if timeout > 600 {
                return Err(invalid(
                    "request_timeout_secs",
                    "exceeds maximum limit of 600 seconds",
                ));
            }
        }

        if let Some(temperature) = self.llm.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(invalid(
                "temperature",
                format!("{temperature} is outside 0.0..=2.0"),
            ));
        }

        if let Some(max_tokens) = self.llm.max_tokens
            && !(1..=32_000).contains(&max_tokens)
        {
            return Err(invalid(
                "max_tokens",
                format!("{max_tokens} is outside 1..=32000"),
            ));
        }

        if let Some(url) = self.llm.api_url.as_deref()
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(invalid("api_url", format!("'{url}' is not an http(s) URL")));
        }

        if let Some(model) = self.llm.model.as_deref()
            && model.trim().is_empty()
        {
            return Err(invalid("model", "must not be empty"));
        }

        if let Some(env_name) = self.llm.api_key_env.as_deref()
            && env_name.trim().is_empty()
        {
            return Err(invalid("api_key_env", "must name an environment variable"));
        }

        if let Some(chars) = self.assessment.doc_excerpt_chars
            && !(1..=3000).contains(&chars)
        {
            return Err(invalid(
                "doc_excerpt_chars",
                format!("{chars} is outside 1..=3000"),
            ));
        }

        Ok(())
    }
}
