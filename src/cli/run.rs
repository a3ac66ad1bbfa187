//! CLI entry point and dispatch logic
//!
//! This module owns the `run()` function which:
//! - Parses CLI arguments
//! - Builds CliArgs and discovers Config
//! - Creates the tokio runtime
//! - Dispatches to command handlers
//! - Handles all error output

use anyhow::Result;
use clap::Parser;

use super::args::{Cli, Commands};
use super::commands;

use crate::{AssessmentError, CliArgs, Config, ConfigError, ExitCode};
use valuecheck_utils::error::render_for_user;
use valuecheck_utils::logging::init_tracing;
use valuecheck_utils::redaction::redact_secrets;

/// Main CLI execution function.
///
/// Handles ALL output including errors. On failure the error has already
/// been printed and the returned [`ExitCode`] is all main.rs needs.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("✗ Failed to initialize logging: {e}");
    }

    let cli_args = build_cli_args(&cli);

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => return Err(report_error(&err)),
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let result: Result<()> = rt.block_on(async {
        match cli.command {
            Commands::Assess {
                product,
                pretty,
                progress,
                ..
            } => {
                let product = commands::load_product(&product)?;
                commands::execute_assess_command(&product, &config, pretty, progress).await
            }
            Commands::Offline {
                product, pretty, ..
            } => {
                let product = commands::load_product(&product)?;
                commands::execute_offline_command(&product, &config, pretty)
            }
            Commands::Config { json } => commands::execute_config_command(&config, json),
        }
    });

    result.map_err(|err| report_error(&err))
}

/// Map the global and per-command flags onto configuration overrides.
pub fn build_cli_args(cli: &Cli) -> CliArgs {
    let mut args = CliArgs {
        config_path: cli.config.clone(),
        model: cli.model.clone(),
        api_url: cli.api_url.clone(),
        request_timeout_secs: cli.timeout,
        ..CliArgs::default()
    };

    match &cli.command {
        Commands::Assess {
            no_fallback,
            verify_connectivity,
            seed,
            ..
        } => {
            args.use_fallback = no_fallback.then_some(false);
            args.verify_connectivity = verify_connectivity.then_some(true);
            args.seed = *seed;
        }
        Commands::Offline { seed, .. } => args.seed = *seed,
        Commands::Config { .. } => {}
    }

    args
}

/// Print `error` for the user and pick the exit code.
fn report_error(error: &anyhow::Error) -> ExitCode {
    if let Some(err) = error.downcast_ref::<AssessmentError>() {
        eprint!("{}", render_for_user(err));
        return err.to_exit_code();
    }

    if let Some(err) = error.downcast_ref::<ConfigError>() {
        eprint!("{}", render_for_user(err));
        return ExitCode::CLI_ARGS;
    }

    eprintln!("✗ Unexpected error: {}", redact_secrets(&format!("{error:#}")));
    eprintln!("\n  General troubleshooting:");
    eprintln!("    - Run with --verbose for more detailed output");
    eprintln!("    - Run `valuecheck config` to check the effective configuration");

    ExitCode::INTERNAL
}
