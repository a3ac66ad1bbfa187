//! CLI argument definitions and parsing structures
//!
//! This module defines the command-line interface structure using clap,
//! including the main `Cli` struct and all subcommand enums.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// valuecheck - economic value assessment for sustainable products
#[derive(Parser)]
#[command(name = "valuecheck")]
#[command(about = "Estimate customer-segment willingness to pay for sustainable products")]
#[command(long_about = r#"
valuecheck runs a fixed sequence of LLM analysis stages for each customer
segment of a product and aggregates the answers into one JSON report.

EXAMPLES:
  # Assess a product (requires OPENAI_API_KEY)
  valuecheck assess --name "EcoBike" --description "E-bike with recycled frame" --pretty

  # Attach supporting documents and known alternatives
  valuecheck assess --input product.json --doc datasheet.txt --alternatives "Legacy Cruiser"

  # Fail fast instead of substituting synthetic stage outputs
  valuecheck assess --input product.json --no-fallback --verify-connectivity

  # Stream stage progress to stderr
  valuecheck assess --input product.json --progress

  # Produce a synthetic report without any LLM calls
  valuecheck offline --name "EcoBike" --description "E-bike with recycled frame" --seed 7

  # Show the effective configuration and where each value came from
  valuecheck config

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > config file > defaults
  Config file is discovered by searching upward from CWD for .valuecheck/config.toml
  Use --config to specify an explicit config file path

STAGES (per segment):
  Segmentation → NBA Analysis → NBA Value → Value Differentiators →
  Willingness to Pay → Customer Communication → Company Guidance
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Model to use for LLM provider calls
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Chat-completions endpoint URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Per-call timeout in seconds
    #[arg(long = "timeout", global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Product facts accepted by `assess` and `offline`.
#[derive(Args, Debug, Clone, Default)]
pub struct ProductArgs {
    /// Product JSON file (name, description, alternatives, additionalInfo, documents)
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Product name (overrides --input)
    #[arg(long)]
    pub name: Option<String>,

    /// Product description (overrides --input)
    #[arg(long)]
    pub description: Option<String>,

    /// Known alternative products, free text
    #[arg(long)]
    pub alternatives: Option<String>,

    /// Additional product information, free text
    #[arg(long)]
    pub info: Option<String>,

    /// Supporting document to quote in prompts (repeatable)
    #[arg(long = "doc", value_name = "PATH")]
    pub docs: Vec<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Assess a product with the configured LLM provider
    Assess {
        #[command(flatten)]
        product: ProductArgs,

        /// Abort on the first failed stage instead of substituting synthetic output
        #[arg(long)]
        no_fallback: bool,

        /// Probe the provider with one lightweight call before the run
        #[arg(long)]
        verify_connectivity: bool,

        /// Seed for synthetic fallback figures
        #[arg(long)]
        seed: Option<u64>,

        /// Pretty-print the result JSON
        #[arg(long)]
        pretty: bool,

        /// Report stage progress on stderr
        #[arg(long)]
        progress: bool,
    },

    /// Produce a fully synthetic assessment without calling any LLM
    Offline {
        #[command(flatten)]
        product: ProductArgs,

        /// Seed for synthetic figures
        #[arg(long)]
        seed: Option<u64>,

        /// Pretty-print the result JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Show the effective configuration with value sources
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
