use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::exit_codes::ExitCode;
use crate::redaction::redact_secrets;
use crate::types::StageId;

/// Error returned by an assessment run.
///
/// Variants split into two groups:
///
/// | Group | Variants | Behaviour |
/// |-------|----------|-----------|
/// | Precondition | `Validation`, `Configuration`, `Connectivity` | Always fatal, raised before any stage runs |
/// | Stage | `Transport`, `Timeout`, `Parse`, `Shape` | Replaced with fallback output when fallback is enabled |
///
/// When fallback is disabled a stage error is wrapped in
/// [`AssessmentError::StageFailed`] so callers can see which stage and
/// segment aborted the run.
///
/// # Example
///
/// ```rust
/// use valuecheck_utils::error::AssessmentError;
/// use valuecheck_utils::exit_codes::ExitCode;
/// use valuecheck_utils::types::StageId;
///
/// let err = AssessmentError::Parse("no JSON object found".to_string())
///     .in_stage(StageId::NbaValue, Some("eco-leaders-1"));
/// assert!(err.is_recoverable());
/// assert_eq!(err.stage(), Some(StageId::NbaValue));
/// assert_eq!(err.to_exit_code(), ExitCode::STAGE_FAILURE);
/// ```
#[derive(Error, Debug)]
pub enum AssessmentError {
    #[error("Invalid product input: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connectivity check failed: {0}")]
    Connectivity(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("LLM call timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unexpected response shape for stage {stage}: {reason}")]
    Shape { stage: StageId, reason: String },

    #[error(
        "Stage {stage} failed{}: {source}",
        .segment.as_deref().map(|s| format!(" for segment {s}")).unwrap_or_default()
    )]
    StageFailed {
        stage: StageId,
        segment: Option<String>,
        source: Box<AssessmentError>,
    },
}

impl AssessmentError {
    /// Attach the stage and segment where this error occurred.
    #[must_use]
    pub fn in_stage(self, stage: StageId, segment: Option<&str>) -> Self {
        match self {
            already @ AssessmentError::StageFailed { .. } => already,
            other => AssessmentError::StageFailed {
                stage,
                segment: segment.map(str::to_string),
                source: Box::new(other),
            },
        }
    }

    /// Whether fallback substitution may absorb this error.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            AssessmentError::Transport(_)
            | AssessmentError::Timeout { .. }
            | AssessmentError::Parse(_)
            | AssessmentError::Shape { .. } => true,
            AssessmentError::StageFailed { source, .. } => source.is_recoverable(),
            AssessmentError::Validation(_)
            | AssessmentError::Configuration(_)
            | AssessmentError::Connectivity(_) => false,
        }
    }

    /// Stage the error is attributed to, if any.
    #[must_use]
    pub fn stage(&self) -> Option<StageId> {
        match self {
            AssessmentError::Shape { stage, .. } | AssessmentError::StageFailed { stage, .. } => {
                Some(*stage)
            }
            _ => None,
        }
    }

    /// Innermost error with stage wrappers removed.
    #[must_use]
    pub fn root(&self) -> &AssessmentError {
        match self {
            AssessmentError::StageFailed { source, .. } => source.root(),
            other => other,
        }
    }

    /// Map this error to the CLI exit code.
    ///
    /// | Exit Code | Error |
    /// |-----------|-------|
    /// | 2 | Configuration |
    /// | 3 | Validation |
    /// | 5 | Connectivity |
    /// | 10 | Timeout |
    /// | 70 | Transport, parse or shape failure |
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self.root() {
            AssessmentError::Validation(_) => ExitCode::INVALID_INPUT,
            AssessmentError::Configuration(_) => ExitCode::CLI_ARGS,
            AssessmentError::Connectivity(_) => ExitCode::CONNECTIVITY,
            AssessmentError::Timeout { .. } => ExitCode::STAGE_TIMEOUT,
            AssessmentError::Transport(_)
            | AssessmentError::Parse(_)
            | AssessmentError::Shape { .. } => ExitCode::STAGE_FAILURE,
            AssessmentError::StageFailed { .. } => ExitCode::INTERNAL,
        }
    }

    /// User-facing message with context and suggestions, secrets redacted.
    #[must_use]
    pub fn display_for_user(&self) -> String {
        render_for_user(self)
    }
}

impl From<LlmError> for AssessmentError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout { duration } => AssessmentError::Timeout { duration },
            other => AssessmentError::Transport(other.to_string()),
        }
    }
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Validation,
    Connectivity,
    LlmIntegration,
    StageExecution,
    ResourceLimits,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Validation => write!(f, "Validation"),
            Self::Connectivity => write!(f, "Connectivity"),
            Self::LlmIntegration => write!(f, "LLM Integration"),
            Self::StageExecution => write!(f, "Stage Execution"),
            Self::ResourceLimits => write!(f, "Resource Limits"),
        }
    }
}

/// Render any [`UserFriendlyError`] as an `Error / Context / Suggestions` block.
pub fn render_for_user(err: &dyn UserFriendlyError) -> String {
    let mut output = format!("Error: {}\n", err.user_message());

    if let Some(ctx) = err.context() {
        output.push_str(&format!("\nContext: {ctx}\n"));
    }

    let suggestions = err.suggestions();
    if !suggestions.is_empty() {
        output.push_str("\nSuggestions:\n");
        for suggestion in suggestions {
            output.push_str(&format!("  • {suggestion}\n"));
        }
    }

    redact_secrets(&output)
}

impl UserFriendlyError for AssessmentError {
    fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => format!("Product input is invalid: {msg}"),
            Self::Configuration(msg) => format!("Assessment is not configured: {msg}"),
            Self::Connectivity(msg) => format!("Could not reach the LLM provider: {msg}"),
            Self::Transport(msg) => format!("LLM request failed: {msg}"),
            Self::Timeout { duration } => {
                format!("LLM request timed out after {}s", duration.as_secs())
            }
            Self::Parse(msg) => format!("LLM response was not valid JSON: {msg}"),
            Self::Shape { stage, reason } => {
                format!("LLM response for '{}' is missing data: {reason}", stage.label())
            }
            Self::StageFailed {
                stage,
                segment,
                source,
            } => match segment {
                Some(segment) => format!(
                    "'{}' failed for segment '{segment}': {}",
                    stage.label(),
                    source.user_message()
                ),
                None => format!("'{}' failed: {}", stage.label(), source.user_message()),
            },
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Validation(_) => Some(
                "A product name and description are required before any analysis starts."
                    .to_string(),
            ),
            Self::Configuration(_) => Some(
                "The assessment needs an API credential for the configured LLM endpoint."
                    .to_string(),
            ),
            Self::Connectivity(_) => Some(
                "A connectivity probe runs before the assessment when verification is enabled."
                    .to_string(),
            ),
            Self::Transport(_) | Self::Timeout { .. } | Self::Parse(_) | Self::Shape { .. } => {
                Some(
                    "Stage failures abort the run only when fallback generation is disabled."
                        .to_string(),
                )
            }
            Self::StageFailed { source, .. } => source.context(),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Validation(_) => vec![
                "Pass --name and --description, or provide both fields in the --input file"
                    .to_string(),
            ],
            Self::Configuration(_) => vec![
                "Export the API key variable named by [llm].api_key_env (default OPENAI_API_KEY)"
                    .to_string(),
                "Run 'valuecheck offline' to produce a fallback-only assessment".to_string(),
            ],
            Self::Connectivity(_) => vec![
                "Check network access to the configured api_url".to_string(),
                "Disable verification with verify_connectivity = false".to_string(),
            ],
            Self::Transport(_) | Self::Parse(_) | Self::Shape { .. } => vec![
                "Re-run without --no-fallback to substitute generated data for failed stages"
                    .to_string(),
                "Run with --verbose to see the failing stage and raw error".to_string(),
            ],
            Self::Timeout { .. } => vec![
                "Increase [llm].request_timeout_secs or pass --timeout".to_string(),
                "Re-run without --no-fallback to tolerate slow stages".to_string(),
            ],
            Self::StageFailed { source, .. } => source.suggestions(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Connectivity(_) => ErrorCategory::Connectivity,
            Self::Transport(_) => ErrorCategory::LlmIntegration,
            Self::Timeout { .. } | Self::Parse(_) | Self::Shape { .. } => {
                ErrorCategory::StageExecution
            }
            Self::StageFailed { source, .. } => source.category(),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => {
                format!("Configuration file has invalid format: {reason}")
            }
            Self::MissingRequired(key) => {
                format!("Required configuration '{key}' is missing")
            }
            Self::InvalidValue { key, value } => {
                format!("Configuration '{key}' has invalid value: {value}")
            }
            Self::NotFound { path } => {
                format!("Configuration file not found: {path}")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => Some(
                "Configuration files must be valid TOML with optional [llm] and [assessment] sections."
                    .to_string(),
            ),
            Self::MissingRequired(_) => None,
            Self::InvalidValue { key, .. } => Some(format!(
                "The '{key}' configuration option has specific range requirements."
            )),
            Self::NotFound { .. } => Some(
                "valuecheck searches for .valuecheck/config.toml starting from the current directory upward."
                    .to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax using a TOML validator".to_string(),
                "Compare with the example configuration in the README".to_string(),
            ],
            Self::MissingRequired(key) => vec![format!(
                "Add '{key}' to .valuecheck/config.toml or pass it as a CLI flag"
            )],
            Self::InvalidValue { key, .. } => match key.as_str() {
                "request_timeout_secs" => {
                    vec!["Use a timeout between 1 and 600 seconds".to_string()]
                }
                "temperature" => vec!["Use a temperature between 0.0 and 2.0".to_string()],
                "api_url" => vec!["Use an http:// or https:// chat completions URL".to_string()],
                _ => vec![
                    "Check the documentation for valid values for this option".to_string(),
                    "Remove the option to use the default value".to_string(),
                ],
            },
            Self::NotFound { .. } => vec![
                "Create .valuecheck/config.toml in your project root".to_string(),
                "Check the path passed to --config".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Errors from an LLM backend invocation.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Transport-level failure (HTTP connectivity, malformed provider payload)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403)
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider quota/rate limit exceeded (429)
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Provider service outage (5xx errors)
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// Invocation timed out
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Configuration error (missing API key, unbuildable client)
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),

    /// Unsupported provider or feature
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl UserFriendlyError for LlmError {
    fn user_message(&self) -> String {
        match self {
            Self::Transport(msg) => format!("LLM transport error: {msg}"),
            Self::ProviderAuth(msg) => format!("LLM provider authentication failed: {msg}"),
            Self::ProviderQuota(msg) => format!("LLM provider quota exceeded: {msg}"),
            Self::ProviderOutage(msg) => format!("LLM provider service outage: {msg}"),
            Self::Timeout { duration } => {
                format!("LLM invocation timed out after {duration:?}")
            }
            Self::Misconfiguration(msg) => format!("LLM configuration error: {msg}"),
            Self::Unsupported(msg) => format!("LLM feature not supported: {msg}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::ProviderAuth(_) => Some(
                "Authentication errors indicate missing or invalid API keys.".to_string(),
            ),
            Self::ProviderQuota(_) => Some(
                "Quota errors occur when rate limits or usage limits are exceeded.".to_string(),
            ),
            Self::Timeout { .. } => Some(
                "Each LLM call is bounded by the configured request timeout.".to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Transport(_) | Self::ProviderOutage(_) => vec![
                "Verify network connectivity to the provider".to_string(),
                "Wait a few minutes and try again".to_string(),
            ],
            Self::ProviderAuth(_) => vec![
                "Check that the API key environment variable is set".to_string(),
                "Verify the API key is valid and not expired".to_string(),
            ],
            Self::ProviderQuota(_) => vec![
                "Wait a few minutes and try again".to_string(),
                "Check your provider's rate limits and usage dashboard".to_string(),
            ],
            Self::Timeout { .. } => {
                vec!["Increase [llm].request_timeout_secs in configuration".to_string()]
            }
            Self::Misconfiguration(_) | Self::Unsupported(_) => {
                vec!["Check the [llm] section of .valuecheck/config.toml".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) | Self::ProviderOutage(_) => ErrorCategory::LlmIntegration,
            Self::ProviderAuth(_) | Self::Misconfiguration(_) | Self::Unsupported(_) => {
                ErrorCategory::Configuration
            }
            Self::ProviderQuota(_) => ErrorCategory::ResourceLimits,
            Self::Timeout { .. } => ErrorCategory::StageExecution,
        }
    }
}
