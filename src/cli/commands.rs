//! Command handlers for the valuecheck CLI
//!
//! Every handler writes its result to stdout and anything human-facing to
//! stderr, so `valuecheck assess ... > report.json` stays clean.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::warn;

use super::args::ProductArgs;
use crate::extraction::extract_documents;
use crate::{
    AssessmentError, AssessmentEvent, AssessmentResult, ChannelObserver, Config,
    NoopObserver, ProductInput, SeededRandom, SegmentOrchestrator, StageId, full_assessment,
};

/// Assemble the product from `--input` and the individual flags.
///
/// Flags override fields read from the input file. Documents from `--doc`
/// are appended after any listed in the file.
///
/// # Errors
///
/// Returns `AssessmentError::Validation` when the input file cannot be read
/// or parsed. Blank name or description is left for the orchestrator to
/// reject.
pub fn load_product(args: &ProductArgs) -> Result<ProductInput, AssessmentError> {
    let mut product = match &args.input {
        Some(path) => read_product_file(path)?,
        None => ProductInput::default(),
    };

    if let Some(name) = &args.name {
        product.name = name.clone();
    }
    if let Some(description) = &args.description {
        product.description = description.clone();
    }
    if let Some(alternatives) = &args.alternatives {
        product.alternatives = Some(alternatives.clone());
    }
    if let Some(info) = &args.info {
        product.additional_info = Some(info.clone());
    }
    product.documents.extend(extract_documents(&args.docs));

    Ok(product)
}

fn read_product_file(path: &Path) -> Result<ProductInput, AssessmentError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AssessmentError::Validation(format!("cannot read {}: {e}", path.display()))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        AssessmentError::Validation(format!("{} is not a valid product file: {e}", path.display()))
    })
}

/// Run a full assessment against the configured provider.
pub async fn execute_assess_command(
    product: &ProductInput,
    config: &Config,
    pretty: bool,
    progress: bool,
) -> Result<()> {
    let orchestrator = SegmentOrchestrator::from_config(config)?;

    let result = if progress {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let printer = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Some(line) = describe_event(&event) {
                    eprintln!("{line}");
                }
            }
        });

        let observer = ChannelObserver::new(tx);
        let result = orchestrator.assess_product(product, &observer).await;
        drop(observer);
        if let Err(e) = printer.await {
            warn!(error = %e, "progress printer task failed");
        }
        result?
    } else {
        orchestrator.assess_product(product, &NoopObserver).await?
    };

    report_degraded(&result);
    println!("{}", emit_result_json(&result, pretty)?);
    Ok(())
}

/// Produce a synthetic assessment without any LLM calls.
pub fn execute_offline_command(product: &ProductInput, config: &Config, pretty: bool) -> Result<()> {
    product.validate()?;
    let rng = SeededRandom::from_optional_seed(config.seed());
    let result = full_assessment(product, &rng);
    println!("{}", emit_result_json(&result, pretty)?);
    Ok(())
}

#[derive(Serialize)]
struct ConfigEntry<'a> {
    value: &'a str,
    source: &'a str,
}

/// Print the effective configuration with the source of each value.
pub fn execute_config_command(config: &Config, json: bool) -> Result<()> {
    let effective = config.effective_config();

    if json {
        let entries: BTreeMap<&str, ConfigEntry<'_>> = effective
            .iter()
            .map(|(key, (value, source))| {
                (
                    key.as_str(),
                    ConfigEntry {
                        value: value.as_str(),
                        source: source.as_str(),
                    },
                )
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).context("Failed to serialize configuration")?
        );
        return Ok(());
    }

    println!("Effective configuration:");
    let width = effective.keys().map(String::len).max().unwrap_or(0);
    for (key, (value, source)) in &effective {
        println!("  {key:<width$} = {value}  ({source})");
    }
    if config.api_key().is_none() {
        println!(
            "\n  note: ${} is not set; only `valuecheck offline` will work",
            config.api_key_env()
        );
    }
    Ok(())
}

/// Serialize a result for stdout.
pub fn emit_result_json(result: &AssessmentResult, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(result)
    } else {
        serde_json::to_string(result)
    };
    json.context("Failed to serialize assessment result")
}

/// One stderr line per progress event. Partial snapshots are not printed.
#[must_use]
pub fn describe_event(event: &AssessmentEvent) -> Option<String> {
    match event {
        AssessmentEvent::StepStarted(stage) => Some(format!(
            "→ [{}/{}] {}",
            stage.ordinal() + 1,
            StageId::ALL.len(),
            stage.label()
        )),
        AssessmentEvent::StepCompleted {
            stage,
            success: true,
            ..
        } => Some(format!("✓ {}", stage.label())),
        AssessmentEvent::StepCompleted {
            stage,
            success: false,
            error,
        } => Some(match error {
            Some(error) => format!("⚠ {} failed: {error}", stage.label()),
            None => format!("⚠ {} failed", stage.label()),
        }),
        AssessmentEvent::PartialResult(_) => None,
    }
}

fn report_degraded(result: &AssessmentResult) {
    if !result.is_degraded() {
        return;
    }
    let failed = result.failed_stages().count();
    eprintln!(
        "⚠ {failed} stage call(s) failed and were replaced with synthetic output; \
         figures marked _source=fallback are estimates"
    );
}
