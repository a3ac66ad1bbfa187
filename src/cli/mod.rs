//! Command-line interface for valuecheck
//!
//! ## Module Structure
//!
//! - `args`: CLI argument definitions and parsing structures (clap)
//! - `run`: Main entry point and command dispatch
//! - `commands`: Command implementations and helpers
//! - `tests`: Test module (cfg(test) only)

pub mod args;
mod commands;
mod run;


pub use args::{Cli, Commands, ProductArgs};
pub use commands::{describe_event, emit_result_json, load_product};
pub use run::{build_cli_args, run};
