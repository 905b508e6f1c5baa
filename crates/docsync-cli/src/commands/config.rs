//! Config command - Inspect DocSync configuration
//!
//! Provides the `docsync config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Validates the configuration and reports every error

use anyhow::{bail, Result};
use clap::Subcommand;

use docsync_core::config::Config;

use crate::output::{Output, OutputFormat};

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Validate the configuration
    Validate,
}

impl ConfigCommand {
    /// Execute the config command
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        match self {
            ConfigCommand::Show => execute_show(config, format),
            ConfigCommand::Validate => execute_validate(config, format),
        }
    }
}

fn execute_show(config: &Config, format: OutputFormat) -> Result<()> {
    Output::new(format).config(config)
}

fn execute_validate(config: &Config, format: OutputFormat) -> Result<()> {
    let errors = config.validate();
    Output::new(format).validation(&errors);

    if !errors.is_empty() {
        bail!("{} configuration error(s)", errors.len());
    }
    Ok(())
}
