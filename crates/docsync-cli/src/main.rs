//! DocSync CLI - Command-line interface for DocSync
//!
//! Provides commands for:
//! - Running an incremental Box to vector store sync
//! - Inspecting and validating configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;
mod secrets;

use commands::{config::ConfigCommand, sync::SyncCommand};
use docsync_core::config::Config;
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "docsync", version, about = "Sync Box documents into a vector store")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upload new and changed documents
    Sync(SyncCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Loads the file named by `--config`, or the default file if it exists
fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Ok(Config::load(path)?),
        None => Ok(Config::load_or_default(&Config::default_path())),
    }
}

/// `RUST_LOG` wins; otherwise `-v` raises the configured level
fn init_tracing(verbose: u8, configured: &str) {
    let level = match verbose {
        0 => configured,
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(err) => {
            init_tracing(cli.verbose, "info");
            tracing::error!("{err:#}");
            std::process::exit(1);
        }
    };
    init_tracing(cli.verbose, &config.logging.level);

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    let result = match &cli.command {
        Commands::Sync(cmd) => cmd.execute(&config, format).await,
        Commands::Config(cmd) => cmd.execute(&config, format).await,
    };

    if let Err(err) = result {
        tracing::error!("{err:#}");
        std::process::exit(1);
    }
    Ok(())
}
