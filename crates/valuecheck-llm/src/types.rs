//! Core types for LLM backend abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::LlmError;

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Input to an LLM backend invocation
#[derive(Debug, Clone)]
pub struct LlmInvocation {
    /// Stage this call belongs to (for logging and test scripting)
    pub stage_id: String,
    /// Segment this call belongs to, `None` for segmentation and probes
    pub segment_id: Option<String>,
    /// Model override; empty uses the backend default
    pub model: String,
    /// Deadline for this call
    pub timeout: Duration,
    pub messages: Vec<Message>,
    /// Provider-specific parameters (e.g., temperature, max_tokens)
    pub metadata: HashMap<String, serde_json::Value>,
}

impl LlmInvocation {
    #[must_use]
    pub fn new(
        stage_id: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
        messages: Vec<Message>,
    ) -> Self {
        Self {
            stage_id: stage_id.into(),
            segment_id: None,
            model: model.into(),
            timeout,
            messages,
            metadata: HashMap::new(),
        }
    }

    #[must_use]
    pub fn for_segment(mut self, segment_id: impl Into<String>) -> Self {
        self.segment_id = Some(segment_id.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Content of the last user message, the prompt proper.
    #[must_use]
    pub fn prompt(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map_or("", |m| m.content.as_str())
    }
}

/// Result from an LLM backend invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResult {
    /// Raw assistant text
    pub raw_response: String,
    pub provider: String,
    pub model_used: String,
    pub tokens_input: Option<u64>,
    pub tokens_output: Option<u64>,
    pub timeout_seconds: Option<u64>,
    pub extensions: HashMap<String, serde_json::Value>,
}

impl LlmResult {
    #[must_use]
    pub fn new(
        raw_response: impl Into<String>,
        provider: impl Into<String>,
        model_used: impl Into<String>,
    ) -> Self {
        Self {
            raw_response: raw_response.into(),
            provider: provider.into(),
            model_used: model_used.into(),
            tokens_input: None,
            tokens_output: None,
            timeout_seconds: None,
            extensions: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_tokens(mut self, input: u64, output: u64) -> Self {
        self.tokens_input = Some(input);
        self.tokens_output = Some(output);
        self
    }

    #[must_use]
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    #[must_use]
    pub fn with_extension(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }
}

/// Trait for LLM backend implementations
///
/// The orchestrator works against this trait only; tests substitute scripted
/// implementations.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Invoke the LLM with the given invocation parameters
    ///
    /// # Errors
    ///
    /// Returns `LlmError` for transport failures, provider errors (auth,
    /// quota, outage) and timeouts.
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError>;

    /// Report whether the backend has what it needs (credentials) to make calls.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` describing what is missing.
    fn check_configuration(&self) -> Result<(), LlmError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_is_last_user_message() {
        let inv = LlmInvocation::new(
            "nba-value",
            "",
            Duration::from_secs(5),
            vec![Message::system("be terse"), Message::user("STEP 1B")],
        )
        .for_segment("eco-leaders-1");

        assert_eq!(inv.prompt(), "STEP 1B");
        assert_eq!(inv.segment_id.as_deref(), Some("eco-leaders-1"));
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::assistant("ok")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"ok"}"#);
    }
}
