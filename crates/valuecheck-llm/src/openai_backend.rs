//! OpenAI-compatible chat completions backend
//!
//! Sends `{model, messages, max_completion_tokens, temperature}` to the
//! configured endpoint and returns `choices[0].message.content`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use valuecheck_config::{Config, DEFAULT_API_URL};

use crate::LlmError;
use crate::http_client::HttpClient;
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};

const PROVIDER: &str = "openai";

/// Sampling parameters sent with every request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for HttpParams {
    fn default() -> Self {
        Self {
            max_tokens: valuecheck_config::DEFAULT_MAX_TOKENS,
            temperature: valuecheck_config::DEFAULT_TEMPERATURE,
        }
    }
}

#[derive(Clone)]
pub struct OpenAiBackend {
    client: Arc<HttpClient>,
    api_url: String,
    api_key: Option<String>,
    /// Environment variable the key was read from, for error messages
    api_key_env: String,
    default_model: String,
    default_params: HttpParams,
}

impl OpenAiBackend {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be constructed
    pub fn new(
        api_key: Option<String>,
        api_url: Option<String>,
        default_model: impl Into<String>,
        default_params: HttpParams,
    ) -> Result<Self, LlmError> {
        let client = HttpClient::new()?;

        Ok(Self {
            client: Arc::new(client),
            api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_key,
            api_key_env: valuecheck_config::DEFAULT_API_KEY_ENV.to_string(),
            default_model: default_model.into(),
            default_params,
        })
    }

    /// Build from configuration, reading the key from `[llm].api_key_env`.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be constructed
    pub fn new_from_config(config: &Config) -> Result<Self, LlmError> {
        let params = HttpParams {
            max_tokens: config.max_tokens(),
            temperature: config.temperature(),
        };
        let mut backend = Self::new(
            config.api_key(),
            Some(config.api_url().to_string()),
            config.model(),
            params,
        )?;
        backend.api_key_env = config.api_key_env().to_string();
        Ok(backend)
    }

    /// `inv.model` overrides the default model; `max_tokens` and
    /// `temperature` metadata override the default parameters.
    fn resolve_params(&self, inv: &LlmInvocation) -> (String, HttpParams) {
        let model = if inv.model.is_empty() {
            self.default_model.clone()
        } else {
            inv.model.clone()
        };

        let max_tokens = inv
            .metadata
            .get("max_tokens")
            .and_then(serde_json::Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(self.default_params.max_tokens);

        let temperature = inv
            .metadata
            .get("temperature")
            .and_then(serde_json::Value::as_f64)
            .map_or(self.default_params.temperature, |v| v as f32);

        (
            model,
            HttpParams {
                max_tokens,
                temperature,
            },
        )
    }

    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|msg| ChatMessage {
                role: match msg.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                content: msg.content.clone(),
            })
            .collect()
    }

    fn missing_key_error(&self) -> LlmError {
        LlmError::Misconfiguration(format!(
            "API key not found in environment variable '{}'",
            self.api_key_env
        ))
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| self.missing_key_error())?;
        let (model, params) = self.resolve_params(&inv);

        debug!(
            provider = PROVIDER,
            stage = %inv.stage_id,
            segment = inv.segment_id.as_deref().unwrap_or("-"),
            model = %model,
            timeout_secs = inv.timeout.as_secs(),
            "Invoking chat completions"
        );

        let request_body = ChatRequest {
            model: &model,
            messages: Self::convert_messages(&inv.messages),
            max_completion_tokens: params.max_tokens,
            temperature: params.temperature,
        };

        let request = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&request_body);

        let response = self.client.execute(request, inv.timeout, PROVIDER).await?;

        let response_body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(format!("Failed to decode {PROVIDER} response: {e}")))?;

        let content = response_body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                LlmError::Transport(format!("Empty response content from {PROVIDER}"))
            })?;

        let mut result =
            LlmResult::new(content, PROVIDER, model).with_timeout_seconds(inv.timeout.as_secs());
        if let Some(usage) = response_body.usage {
            result = result.with_tokens(usage.prompt_tokens, usage.completion_tokens);
        }

        debug!(
            provider = PROVIDER,
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            "Chat completion received"
        );

        Ok(result)
    }

    fn check_configuration(&self) -> Result<(), LlmError> {
        match self.api_key {
            Some(_) => Ok(()),
            None => Err(self.missing_key_error()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_completion_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(server: &MockServer, key: Option<&str>) -> OpenAiBackend {
        OpenAiBackend::new(
            key.map(str::to_string),
            Some(format!("{}/v1/chat/completions", server.uri())),
            "gpt-4o-mini",
            HttpParams::default(),
        )
        .unwrap()
    }

    fn invocation(timeout: Duration) -> LlmInvocation {
        LlmInvocation::new(
            "nba-analysis",
            "",
            timeout,
            vec![
                Message::system("You are a sustainability and pricing expert."),
                Message::user("STEP 1"),
            ],
        )
    }

    #[test]
    fn resolve_params_prefers_invocation_values() {
        let backend = OpenAiBackend::new(
            Some("k".into()),
            None,
            "default-model",
            HttpParams {
                max_tokens: 1000,
                temperature: 0.5,
            },
        )
        .unwrap();

        let inv = invocation(Duration::from_secs(1));
        let (model, params) = backend.resolve_params(&inv);
        assert_eq!(model, "default-model");
        assert_eq!(params.max_tokens, 1000);

        let mut inv = invocation(Duration::from_secs(1))
            .with_metadata("max_tokens", json!(256))
            .with_metadata("temperature", json!(0.1));
        inv.model = "gpt-4o".into();
        let (model, params) = backend.resolve_params(&inv);
        assert_eq!(model, "gpt-4o");
        assert_eq!(params.max_tokens, 256);
        assert!((params.temperature - 0.1).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system"},
                    {"role": "user", "content": "STEP 1"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"ok\":true}"}}],
                "usage": {"prompt_tokens": 12, "completion_tokens": 4}
            })))
            .mount(&server)
            .await;

        let result = backend_for(&server, Some("test-key"))
            .invoke(invocation(Duration::from_secs(5)))
            .await
            .unwrap();

        assert_eq!(result.raw_response, "{\"ok\":true}");
        assert_eq!(result.provider, "openai");
        assert_eq!(result.tokens_input, Some(12));
        assert_eq!(result.tokens_output, Some(4));
    }

    #[tokio::test]
    async fn unauthorized_maps_to_provider_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = backend_for(&server, Some("bad-key"))
            .invoke(invocation(Duration::from_secs(5)))
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::ProviderAuth(_)));
    }

    #[tokio::test]
    async fn server_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let err = backend_for(&server, Some("k"))
            .invoke(invocation(Duration::from_secs(5)))
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::ProviderOutage(_)));
    }

    #[tokio::test]
    async fn empty_content_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": ""}}]
            })))
            .mount(&server)
            .await;

        let err = backend_for(&server, Some("k"))
            .invoke(invocation(Duration::from_secs(5)))
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Transport(msg) if msg.contains("Empty response")));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(3))
                    .set_body_json(json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let err = backend_for(&server, Some("k"))
            .invoke(invocation(Duration::from_millis(200)))
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Timeout { .. }));
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let backend = backend_for(&server, None);
        assert!(backend.check_configuration().is_err());
        let err = backend
            .invoke(invocation(Duration::from_secs(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Misconfiguration(_)));
    }
}
