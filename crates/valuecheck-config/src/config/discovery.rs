use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

use valuecheck_utils::error::ConfigError;
use valuecheck_utils::types::ConfigSource;

use super::{AssessmentSettings, CliArgs, Config, LlmSettings};

/// Environment variable naming a directory that holds `config.toml`
pub const HOME_ENV: &str = "VALUECHECK_HOME";

/// Keys reported by `effective_config()`, in display order
pub(crate) const CONFIG_KEYS: [&str; 10] = [
    "api_key_env",
    "api_url",
    "model",
    "max_tokens",
    "temperature",
    "request_timeout_secs",
    "use_fallback",
    "verify_connectivity",
    "seed",
    "doc_excerpt_chars",
];

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    llm: Option<LlmSettings>,
    assessment: Option<AssessmentSettings>,
}

/// Copy `$file.$field` over `$target.$field` when present and record the source.
macro_rules! apply_field {
    ($target:expr, $file:expr, $field:ident, $attr:expr, $source:expr) => {
        if $file.$field.is_some() {
            $target.$field = $file.$field;
            $attr.insert(stringify!($field).to_string(), $source.clone());
        }
    };
}

impl Config {
    /// Discover and load configuration with precedence: CLI > file > defaults
    ///
    /// The config file is, in order: `cli_args.config_path`,
    /// `$VALUECHECK_HOME/config.toml`, or the nearest `.valuecheck/config.toml`
    /// found searching upward from the current directory.
    pub fn discover(cli_args: &CliArgs) -> Result<Self> {
        let start_dir = env::current_dir().context("Failed to get current directory")?;
        let home = env::var_os(HOME_ENV).map(PathBuf::from);
        Self::discover_with(&start_dir, home.as_deref(), cli_args)
    }

    /// Discover configuration starting from a specific directory.
    ///
    /// Path-driven variant used by tests to avoid process-global state; it
    /// ignores `VALUECHECK_HOME`.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self> {
        Self::discover_with(start_dir, None, cli_args)
    }

    fn discover_with(start_dir: &Path, home: Option<&Path>, cli_args: &CliArgs) -> Result<Self> {
        let mut source_attribution = HashMap::new();
        for key in CONFIG_KEYS {
            source_attribution.insert(key.to_string(), ConfigSource::Default);
        }

        let mut llm = LlmSettings::default();
        let mut assessment = AssessmentSettings::default();

        let config_path = match &cli_args.config_path {
            Some(explicit) => {
                if !explicit.exists() {
                    return Err(ConfigError::NotFound {
                        path: explicit.display().to_string(),
                    }
                    .into());
                }
                Some(explicit.clone())
            }
            None => match home.map(|dir| dir.join("config.toml")) {
                Some(home_config) if home_config.exists() => Some(home_config),
                _ => Self::discover_config_file_from(start_dir),
            },
        };

        if let Some(path) = &config_path {
            debug!(path = %path.display(), "Loading config file");
            let file_config = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;
            let source = ConfigSource::Config;

            if let Some(file_llm) = file_config.llm {
                apply_field!(llm, file_llm, api_key_env, source_attribution, source);
                apply_field!(llm, file_llm, api_url, source_attribution, source);
                apply_field!(llm, file_llm, model, source_attribution, source);
                apply_field!(llm, file_llm, max_tokens, source_attribution, source);
                apply_field!(llm, file_llm, temperature, source_attribution, source);
                apply_field!(llm, file_llm, request_timeout_secs, source_attribution, source);
            }

            if let Some(file_assessment) = file_config.assessment {
                apply_field!(assessment, file_assessment, use_fallback, source_attribution, source);
                apply_field!(
                    assessment,
                    file_assessment,
                    verify_connectivity,
                    source_attribution,
                    source
                );
                apply_field!(assessment, file_assessment, seed, source_attribution, source);
                apply_field!(
                    assessment,
                    file_assessment,
                    doc_excerpt_chars,
                    source_attribution,
                    source
                );
            }
        }

        // CLI overrides everything
        let overrides = cli_args.clone();
        let cli = ConfigSource::Cli;
        apply_field!(llm, overrides, model, source_attribution, cli);
        apply_field!(llm, overrides, api_url, source_attribution, cli);
        apply_field!(llm, overrides, request_timeout_secs, source_attribution, cli);
        apply_field!(assessment, overrides, use_fallback, source_attribution, cli);
        apply_field!(assessment, overrides, verify_connectivity, source_attribution, cli);
        apply_field!(assessment, overrides, seed, source_attribution, cli);

        let config = Self {
            llm,
            assessment,
            source_attribution,
        };

        config.validate()?;

        Ok(config)
    }

    /// Walk up from `start_dir` looking for `.valuecheck/config.toml`.
    ///
    /// Stops at repository root markers (.git, .hg, .svn) or the filesystem root.
    #[must_use]
    pub fn discover_config_file_from(start_dir: &Path) -> Option<PathBuf> {
        let mut current_dir = Some(start_dir);

        while let Some(dir) = current_dir {
            let config_path = dir.join(".valuecheck").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            if dir.join(".git").exists() || dir.join(".hg").exists() || dir.join(".svn").exists()
            {
                break;
            }

            current_dir = dir.parent();
        }

        None
    }

    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::InvalidFile(format!("{}: {e}", path.display())))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let config_dir = dir.join(".valuecheck");
        fs::create_dir_all(&config_dir).unwrap();
        let path = config_dir.join("config.toml");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn defaults_apply_without_a_file() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();

        let config = Config::discover_from(temp.path(), &CliArgs::default()).unwrap();

        assert_eq!(config.model(), "gpt-4o-mini");
        assert_eq!(config.request_timeout().as_secs(), 30);
        assert!(config.use_fallback());
        assert!(!config.verify_connectivity());
        assert_eq!(config.seed(), None);
        assert_eq!(
            config.source_attribution.get("model"),
            Some(&ConfigSource::Default)
        );
    }

    #[test]
    fn file_values_are_found_from_nested_directories() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(
            temp.path(),
            r#"
[llm]
model = "gpt-4o"
request_timeout_secs = 45

[assessment]
use_fallback = false
seed = 7
"#,
        );
        let nested = temp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let config = Config::discover_from(&nested, &CliArgs::default()).unwrap();

        assert_eq!(config.model(), "gpt-4o");
        assert_eq!(config.request_timeout().as_secs(), 45);
        assert!(!config.use_fallback());
        assert_eq!(config.seed(), Some(7));
        assert_eq!(config.api_url(), super::super::DEFAULT_API_URL);
        assert_eq!(
            config.source_attribution.get("seed"),
            Some(&ConfigSource::Config)
        );
        assert_eq!(
            config.source_attribution.get("api_url"),
            Some(&ConfigSource::Default)
        );
    }

    #[test]
    fn cli_overrides_file() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(temp.path(), "[llm]\nmodel = \"gpt-4o\"\n");

        let cli_args = CliArgs {
            model: Some("gpt-4.1-mini".to_string()),
            use_fallback: Some(false),
            ..CliArgs::default()
        };
        let config = Config::discover_from(temp.path(), &cli_args).unwrap();

        assert_eq!(config.model(), "gpt-4.1-mini");
        assert!(!config.use_fallback());
        assert_eq!(config.source_attribution.get("model"), Some(&ConfigSource::Cli));
        assert_eq!(
            config.source_attribution.get("use_fallback"),
            Some(&ConfigSource::Cli)
        );
    }

    #[test]
    fn home_directory_config_wins_over_upward_search() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(temp.path(), "[llm]\nmodel = \"from-project\"\n");
        let home = TempDir::new().unwrap();
        fs::write(home.path().join("config.toml"), "[llm]\nmodel = \"from-home\"\n").unwrap();

        let config =
            Config::discover_with(temp.path(), Some(home.path()), &CliArgs::default()).unwrap();

        assert_eq!(config.model(), "from-home");
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let temp = TempDir::new().unwrap();
        let cli_args = CliArgs {
            config_path: Some(temp.path().join("nope.toml")),
            ..CliArgs::default()
        };

        let err = Config::discover_from(temp.path(), &cli_args).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(temp.path(), "[llm]\nprovider = \"openrouter\"\n");

        let err = Config::discover_from(temp.path(), &CliArgs::default()).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid configuration file"));
    }

    #[test]
    fn out_of_range_file_values_fail_validation() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(temp.path(), "[llm]\ntemperature = 3.5\n");

        let err = Config::discover_from(temp.path(), &CliArgs::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::InvalidValue { key, .. }) if key == "temperature"
        ));
    }

    #[test]
    fn search_stops_at_repository_root() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "[llm]\nmodel = \"outer\"\n");
        let repo = temp.path().join("repo");
        fs::create_dir_all(repo.join(".git")).unwrap();

        assert!(Config::discover_config_file_from(&repo).is_none());
        assert!(Config::discover_config_file_from(temp.path()).is_some());
    }
}
