use std::path::PathBuf;

/// Configuration overrides supplied on the command line.
///
/// Every field is optional; `None` leaves the file or default value in place.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub model: Option<String>,
    pub api_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub use_fallback: Option<bool>,
    pub verify_connectivity: Option<bool>,
    pub seed: Option<u64>,
}
