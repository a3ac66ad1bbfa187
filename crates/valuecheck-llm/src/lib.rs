//! LLM backend abstraction
//!
//! The assessment engine depends only on [`LlmBackend`]: send a list of
//! messages, get text back within a timeout, or an [`LlmError`]. The one
//! shipped implementation speaks the OpenAI chat-completions protocol, which
//! also covers compatible gateways reachable through `[llm].api_url`.

pub(crate) mod http_client;
mod openai_backend;
mod types;

pub use types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};
pub use valuecheck_utils::error::LlmError;

pub use openai_backend::{HttpParams, OpenAiBackend};

use valuecheck_config::Config;

/// Construct the LLM backend described by `config`.
///
/// A missing API key does not fail construction. It is reported by
/// [`LlmBackend::check_configuration`] so that callers can validate their
/// own input first.
///
/// # Errors
///
/// Returns `LlmError::Misconfiguration` if the HTTP client cannot be built.
pub fn from_config(config: &Config) -> Result<Box<dyn LlmBackend>, LlmError> {
    let backend = OpenAiBackend::new_from_config(config)?;
    Ok(Box::new(backend))
}
