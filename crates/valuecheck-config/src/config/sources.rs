use std::collections::BTreeMap;

use valuecheck_utils::types::ConfigSource;

use super::Config;
use super::discovery::CONFIG_KEYS;

impl Config {
    /// Effective configuration as `key -> (value, source)`.
    ///
    /// Keys without a value (an unset seed) are omitted.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut config = BTreeMap::new();

        for key in CONFIG_KEYS {
            let value = match key {
                "api_key_env" => Some(self.api_key_env().to_string()),
                "api_url" => Some(self.api_url().to_string()),
                "model" => Some(self.model().to_string()),
                "max_tokens" => Some(self.max_tokens().to_string()),
                "temperature" => Some(self.temperature().to_string()),
                "request_timeout_secs" => Some(self.request_timeout().as_secs().to_string()),
                "use_fallback" => Some(self.use_fallback().to_string()),
                "verify_connectivity" => Some(self.verify_connectivity().to_string()),
                "seed" => self.seed().map(|seed| seed.to_string()),
                "doc_excerpt_chars" => Some(self.doc_excerpt_chars().to_string()),
                _ => None,
            };

            if let Some(value) = value {
                let source = self
                    .source_attribution
                    .get(key)
                    .unwrap_or(&ConfigSource::Default)
                    .as_str()
                    .to_string();
                config.insert(key.to_string(), (value, source));
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_config_reports_sources() {
        let config = Config::builder().model("gpt-4o").build().unwrap();
        let effective = config.effective_config();

        assert_eq!(
            effective.get("model"),
            Some(&("gpt-4o".to_string(), "programmatic".to_string()))
        );
        assert_eq!(
            effective.get("request_timeout_secs"),
            Some(&("30".to_string(), "default".to_string()))
        );
        assert!(!effective.contains_key("seed"));
    }
}
