//! Shared HTTP client for HTTP-based LLM providers
//!
//! One `reqwest::Client` per backend, reused across stage calls. Each request
//! is attempted exactly once: a failed call is the caller's signal to
//! substitute fallback data or abort, never to retry.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use valuecheck_utils::redaction::redact_secrets;

use crate::LlmError;

/// Upper bound on any single HTTP request (10 minutes)
const DEFAULT_MAX_HTTP_TIMEOUT: Duration = Duration::from_secs(600);

/// Default connect timeout (30 seconds)
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub(crate) struct HttpClient {
    client: Arc<Client>,
    max_timeout: Duration,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the client cannot be constructed
    pub fn new() -> Result<Self, LlmError> {
        Self::with_max_timeout(DEFAULT_MAX_HTTP_TIMEOUT)
    }

    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the client cannot be constructed
    pub fn with_max_timeout(max_timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(4)
            .use_rustls_tls()
            .build()
            .map_err(|e| LlmError::Misconfiguration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client: Arc::new(client),
            max_timeout,
        })
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    /// Send a request once with `min(request_timeout, max_timeout)` as deadline.
    ///
    /// # Errors
    ///
    /// - `LlmError::ProviderAuth` for 401/403
    /// - `LlmError::ProviderQuota` for 429
    /// - `LlmError::ProviderOutage` for 5xx
    /// - `LlmError::Timeout` when the deadline passes
    /// - `LlmError::Transport` for other client errors and network failures
    pub async fn execute(
        &self,
        request_builder: RequestBuilder,
        request_timeout: Duration,
        provider_name: &str,
    ) -> Result<Response, LlmError> {
        let effective_timeout = request_timeout.min(self.max_timeout);

        let request = request_builder
            .timeout(effective_timeout)
            .build()
            .map_err(|e| {
                LlmError::Transport(format!(
                    "Failed to build request: {}",
                    redact_secrets(&e.to_string())
                ))
            })?;

        debug!(
            provider = provider_name,
            timeout_secs = effective_timeout.as_secs(),
            "Executing HTTP request"
        );

        match self.client.execute(request).await {
            Ok(response) => {
                let status = response.status();
                if status.is_client_error() {
                    return Err(map_client_error(status, provider_name));
                }
                if status.is_server_error() {
                    return Err(LlmError::ProviderOutage(format!(
                        "{provider_name} returned server error: {status}"
                    )));
                }
                Ok(response)
            }
            Err(e) if e.is_timeout() => Err(LlmError::Timeout {
                duration: effective_timeout,
            }),
            Err(e) => Err(LlmError::Transport(format!(
                "{provider_name} request failed: {}",
                redact_secrets(&e.to_string())
            ))),
        }
    }
}

/// Map HTTP client error status codes to LlmError variants
fn map_client_error(status: StatusCode, provider_name: &str) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LlmError::ProviderAuth(format!("{provider_name} authentication failed: {status}"))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            LlmError::ProviderQuota(format!("{provider_name} rate limit exceeded: {status}"))
        }
        _ => LlmError::Transport(format!("{provider_name} returned client error: {status}")),
    }
}
