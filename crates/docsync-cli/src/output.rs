//! Rendering of command results
//!
//! Each result is rendered to a string first and printed by [`Output`]. Human
//! output is aligned text; `--json` output is one JSON document per command
//! with progress messages suppressed.

use anyhow::{Context, Result};
use serde_json::json;

use docsync_core::config::{Config, ValidationError};
use docsync_sync::SyncSummary;

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Counter labels of a sync run, in display order
pub fn summary_rows(summary: &SyncSummary) -> [(&'static str, u64); 7] {
    [
        ("Total files processed", summary.total_processed),
        ("Successful uploads", summary.successful),
        ("Invalid files", summary.invalid),
        ("Skipped (unsupported)", summary.skipped),
        ("Unchanged", summary.unchanged),
        ("Folders pruned", summary.pruned_folders),
        ("Records written", summary.records_flushed),
    ]
}

/// Renders the end-of-run summary
pub fn render_summary(summary: &SyncSummary, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(summary).context("Failed to serialize sync summary")
        }
        OutputFormat::Human => {
            let rows = summary_rows(summary);
            let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
            let mut out = String::from("\u{2713} Synchronization completed");
            for (label, value) in rows {
                out.push_str(&format!("\n  {label:<width$}  {value}"));
            }
            Ok(out)
        }
    }
}

/// Renders the effective configuration as YAML or JSON
pub fn render_config(config: &Config, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(config)
            .context("Failed to serialize configuration to JSON"),
        OutputFormat::Human => {
            let yaml = serde_yaml::to_string(config)
                .context("Failed to serialize configuration to YAML")?;
            Ok(yaml.trim_end().to_string())
        }
    }
}

/// Renders the outcome of `config validate`
pub fn render_validation(errors: &[ValidationError], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let list: Vec<_> = errors
                .iter()
                .map(|e| json!({"field": e.field, "message": e.message}))
                .collect();
            json!({"valid": errors.is_empty(), "errors": list}).to_string()
        }
        OutputFormat::Human if errors.is_empty() => "\u{2713} Configuration is valid".to_string(),
        OutputFormat::Human => errors
            .iter()
            .map(|e| format!("\u{2717} {}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Prints rendered results to stdout
#[derive(Debug, Clone, Copy)]
pub struct Output {
    format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Progress line; dropped in JSON mode so stdout stays parseable
    pub fn progress(&self, message: &str) {
        if self.format == OutputFormat::Human {
            println!("{message}");
        }
    }

    pub fn summary(&self, summary: &SyncSummary) -> Result<()> {
        println!("{}", render_summary(summary, self.format)?);
        Ok(())
    }

    pub fn config(&self, config: &Config) -> Result<()> {
        println!("{}", render_config(config, self.format)?);
        Ok(())
    }

    /// Validation errors go to stderr in human mode
    pub fn validation(&self, errors: &[ValidationError]) {
        let rendered = render_validation(errors, self.format);
        if self.format == OutputFormat::Human && !errors.is_empty() {
            eprintln!("{rendered}");
        } else {
            println!("{rendered}");
        }
    }
}
