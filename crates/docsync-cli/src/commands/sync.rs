//! Sync command - Upload changed Box documents into the vector store
//!
//! Provides the `docsync sync` CLI command which:
//! 1. Loads and validates configuration
//! 2. Resolves run parameters and secrets
//! 3. Creates the adapters (Box, vector store, SQLite)
//! 4. Runs the TreeWalker and reports the summary

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::{info, warn};

use docsync_box::auth::{BoxAuth, BoxCredentials, BoxSubject};
use docsync_box::client::BoxClient;
use docsync_box::provider::BoxSourceTree;
use docsync_cache::{DatabasePool, SqliteSyncStateStore};
use docsync_core::config::{Config, RunOptions, SourceConfig};
use docsync_core::domain::{FolderId, RunClock};
use docsync_core::ports::ISecretsProvider;
use docsync_index::client::VectorStoreClient;
use docsync_index::provider::VectorStoreIndex;
use docsync_sync::{RetryPolicy, TreeWalker, UploadCoordinator, WalkerOptions};

use crate::output::{Output, OutputFormat};
use crate::secrets::{build_provider, Parameters};

/// Sync command with clap options
#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Deployment environment, e.g. dev or prod
    #[arg(long)]
    pub environment: Option<String>,

    /// Box folder to start from
    #[arg(long)]
    pub folder_id: Option<String>,

    /// Dataset name; state is written to `<name>_files_<environment>`
    #[arg(long)]
    pub table_name: Option<String>,

    /// Name part of the vector store id secret
    #[arg(long)]
    pub vector_store: Option<String>,

    /// Visit every folder and upload every supported file
    #[arg(long)]
    pub full_load: bool,

    /// Run parameter as name=value (repeatable)
    #[arg(long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,
}

impl SyncCommand {
    /// Run parameters from `--param` pairs, then the dedicated flags
    fn parameters(&self) -> Result<Parameters> {
        let mut params = Parameters::parse(&self.params)?;
        params.insert_default("environment", self.environment.clone());
        params.insert_default("box_folder_id", self.folder_id.clone());
        params.insert_default("dbx_table_name", self.table_name.clone());
        params.insert_default("vs_id_secret_name", self.vector_store.clone());
        if self.full_load {
            params.insert_default("full_load", Some("true".to_string()));
        }
        Ok(params)
    }

    /// Wires up all adapters, runs one sync and displays the results
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let output = Output::new(format);

        config.ensure_valid()?;

        let secrets = build_provider(&config.secrets, self.parameters()?);
        let options = RunOptions::resolve(secrets.as_ref(), &config.run)?;
        info!(
            environment = %options.environment,
            folder_id = %options.box_folder_id,
            table = %options.table_name(),
            full_load = options.full_load,
            "Resolved run options"
        );

        let clock = RunClock::now_in(&config.sync.timezone)?;
        let root = FolderId::new(options.box_folder_id.as_str())?;

        let source = Arc::new(build_source(&config.source, secrets.as_ref())?);
        let index = Arc::new(build_index(config, &options, secrets.as_ref())?);

        let db_path = config.database_path();
        let pool = DatabasePool::new(Path::new(&db_path))
            .await
            .context("Failed to open state database")?;
        let store = Arc::new(
            SqliteSyncStateStore::open(pool.pool().clone(), &options.table_name())
                .await
                .context("Failed to open state table")?,
        );

        let uploader = UploadCoordinator::new(index, RetryPolicy::from_config(&config.upload));
        let mut walker = TreeWalker::new(
            source,
            store,
            uploader,
            clock,
            WalkerOptions::from_config(config, options.full_load),
        );

        output.progress("Starting synchronization...");

        let summary = match walker.sync(&root).await {
            Ok(summary) => summary,
            Err(err) => {
                // Keep what was already processed before giving up.
                let pending = walker.pending_records().len();
                if pending > 0 {
                    match walker.flush().await {
                        Ok(written) => info!(records = written, "Flushed records after failure"),
                        Err(e) => warn!(records = pending, error = %e, "Pending records lost"),
                    }
                }
                pool.close().await;
                return Err(err.into());
            }
        };

        pool.close().await;
        output.summary(&summary)
    }
}

/// Builds the Box source tree from the configured service account
fn build_source(config: &SourceConfig, secrets: &dyn ISecretsProvider) -> Result<BoxSourceTree> {
    let subject = match (&config.enterprise_id, &config.impersonate_user_id) {
        (Some(enterprise), _) => BoxSubject::Enterprise(enterprise.clone()),
        (None, Some(user)) => BoxSubject::User(user.clone()),
        (None, None) => bail!("Set source.enterprise_id or source.impersonate_user_id"),
    };
    let acts_as_enterprise = matches!(subject, BoxSubject::Enterprise(_));

    let credentials = BoxCredentials {
        client_id: secrets.get_secret(&config.client_id_secret)?,
        client_secret: secrets.get_secret(&config.client_secret_secret)?,
        subject,
    };
    let auth = Arc::new(BoxAuth::new(credentials, &config.token_url)?);

    let mut client = BoxClient::new(auth, config.api_base_url.as_str());
    if acts_as_enterprise {
        if let Some(user) = &config.impersonate_user_id {
            client = client.as_user(user.as_str());
        }
    }
    Ok(BoxSourceTree::new(client))
}

/// Builds the vector store index for this run's environment
fn build_index(
    config: &Config,
    options: &RunOptions,
    secrets: &dyn ISecretsProvider,
) -> Result<VectorStoreIndex> {
    let api_key = secrets.get_secret(&config.index.api_key_secret)?;
    let vs_secret = options.vector_store_secret_name(&config.index.vector_store_secret_template);
    let vector_store_id = secrets.get_secret(&vs_secret)?;
    info!(secret = %vs_secret, "Resolved vector store");

    let client = VectorStoreClient::new(api_key, vector_store_id, config.index.api_base_url.as_str())
        .with_polling(
            Duration::from_millis(config.index.poll_interval_ms),
            Duration::from_secs(config.index.poll_timeout_secs),
        );
    Ok(VectorStoreIndex::new(client).with_tag_attribute(config.index.tag_attribute.as_str()))
}
