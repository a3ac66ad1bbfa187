//! Configuration for valuecheck
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > file > defaults. The TOML file has two optional sections,
//! `[llm]` and `[assessment]`:
//!
//! ```toml
//! [llm]
//! api_key_env = "OPENAI_API_KEY"
//! model = "gpt-4o-mini"
//! request_timeout_secs = 30
//!
//! [assessment]
//! use_fallback = true
//! verify_connectivity = false
//! ```

mod config;

pub use config::*;
pub use valuecheck_utils::error::ConfigError;
pub use valuecheck_utils::types::ConfigSource;
