//! Configuration module for DocSync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.
//! Run options (environment, root folder, full-load flag) are resolved separately
//! through an [`ISecretsProvider`] so command-line parameters can override the
//! configured defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{parse_timezone, ExtensionFilter};
use crate::ports::ISecretsProvider;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while loading configuration or resolving secrets and parameters
///
/// All of these are fatal and surface before any traversal starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for [`Config`]
    #[error("Invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The configuration parsed but failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// A required secret is not present in the secrets backend
    #[error("Missing secret: {0}")]
    MissingSecret(String),

    /// A required run parameter was not supplied and has no default
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    /// The secrets backend itself failed
    #[error("Secrets backend error: {0}")]
    Backend(String),
}

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for DocSync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub upload: UploadConfig,
    pub source: SourceConfig,
    pub index: IndexConfig,
    pub state: StateConfig,
    pub secrets: SecretsConfig,
    pub logging: LoggingConfig,
    pub run: RunDefaults,
}

/// Traversal and buffering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Extensions uploaded to the index; everything else is recorded as skipped.
    pub supported_extensions: Vec<String>,
    /// Records held in memory before a batch write to the state store.
    pub max_buffer_size: usize,
    /// Entries requested per folder listing page.
    pub page_size: u32,
    /// IANA timezone for the run clock and stored timestamps.
    pub timezone: String,
}

/// Upload retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Attempts per file before the upload is recorded as failed.
    pub max_retries: u32,
    /// Base of the exponential backoff; attempt `n` waits `base * 2^n` seconds.
    pub base_delay_secs: u64,
}

/// Box content API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub api_base_url: String,
    pub token_url: String,
    /// User the service account acts as. `None` uses the service account itself.
    pub impersonate_user_id: Option<String>,
    /// Enterprise the service account belongs to, used for the token subject.
    pub enterprise_id: Option<String>,
    /// Name of the secret holding the OAuth client id.
    pub client_id_secret: String,
    /// Name of the secret holding the OAuth client secret.
    pub client_secret_secret: String,
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub api_base_url: String,
    /// Name of the secret holding the API key.
    pub api_key_secret: String,
    /// Secret name pattern for the vector store id; `{name}` and `{environment}`
    /// are substituted.
    pub vector_store_secret_template: String,
    /// Delay between status polls while the index processes an upload.
    pub poll_interval_ms: u64,
    /// Give up polling after this many seconds.
    pub poll_timeout_secs: u64,
    /// Attribute that receives the source file id after a successful upload.
    pub tag_attribute: String,
}

/// Sync state database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Directory holding the SQLite database.
    pub database_dir: PathBuf,
    /// Database file stem; tables inside it are named per run.
    pub table_catalog: String,
}

/// Where secrets are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretsBackend {
    /// System keyring (Secret Service)
    Keyring,
    /// Process environment
    Env,
}

/// Secrets settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    pub backend: SecretsBackend,
    /// Keyring service name, or environment variable prefix for the `env` backend.
    pub vault_name: String,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

/// Fallback values for run parameters not given on the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunDefaults {
    pub environment: String,
    pub vs_id_secret_name: Option<String>,
    pub box_folder_id: Option<String>,
    pub dbx_table_name: Option<String>,
    pub full_load: String,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/docsync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("docsync")
            .join("config.yaml")
    }

    /// Extension filter built from `sync.supported_extensions`.
    pub fn extension_filter(&self) -> ExtensionFilter {
        ExtensionFilter::new(&self.sync.supported_extensions)
    }

    /// Path of the SQLite database holding sync state.
    pub fn database_path(&self) -> PathBuf {
        self.state
            .database_dir
            .join(format!("{}.db", self.state.table_catalog))
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            supported_extensions: ExtensionFilter::default().extensions().to_vec(),
            max_buffer_size: 50,
            page_size: 1000,
            timezone: "America/New_York".to_string(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_secs: 2,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.box.com/2.0".to_string(),
            token_url: "https://api.box.com/oauth2/token".to_string(),
            impersonate_user_id: None,
            enterprise_id: None,
            client_id_secret: "Box-CLI-Automation-ClientID".to_string(),
            client_secret_secret: "Box-CLI-Automation-ClientSecret".to_string(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.openai.com/v1".to_string(),
            api_key_secret: "OpenAI-API-Key".to_string(),
            vector_store_secret_template: "OpenAI-API-{name}-{environment}-VectorStoreID"
                .to_string(),
            poll_interval_ms: 1000,
            poll_timeout_secs: 300,
            tag_attribute: "box_file_id".to_string(),
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            database_dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("docsync"),
            table_catalog: "vector_store_files".to_string(),
        }
    }
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            backend: SecretsBackend::Keyring,
            vault_name: "docsync".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self {
            environment: "dev".to_string(),
            vs_id_secret_name: None,
            box_folder_id: None,
            dbx_table_name: None,
            full_load: "false".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.page_size"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Largest page the Box listing endpoint serves.
const MAX_PAGE_SIZE: u32 = 1000;

fn require_positive(errors: &mut Vec<ValidationError>, field: &str, value: u64) {
    if value == 0 {
        errors.push(ValidationError {
            field: field.into(),
            message: "must be greater than 0".into(),
        });
    }
}

fn require_url(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        errors.push(ValidationError {
            field: field.into(),
            message: format!("must be an http(s) URL, got '{value}'"),
        });
    }
}

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- sync ---
        if self.extension_filter().extensions().is_empty() {
            errors.push(ValidationError {
                field: "sync.supported_extensions".into(),
                message: "at least one extension is required".into(),
            });
        }
        require_positive(
            &mut errors,
            "sync.max_buffer_size",
            self.sync.max_buffer_size as u64,
        );
        if self.sync.page_size == 0 || self.sync.page_size > MAX_PAGE_SIZE {
            errors.push(ValidationError {
                field: "sync.page_size".into(),
                message: format!("must be in range 1..={MAX_PAGE_SIZE}"),
            });
        }
        if let Err(e) = parse_timezone(&self.sync.timezone) {
            errors.push(ValidationError {
                field: "sync.timezone".into(),
                message: e.to_string(),
            });
        }

        // --- upload ---
        require_positive(
            &mut errors,
            "upload.max_retries",
            u64::from(self.upload.max_retries),
        );

        // --- source ---
        require_url(&mut errors, "source.api_base_url", &self.source.api_base_url);
        require_url(&mut errors, "source.token_url", &self.source.token_url);

        // --- index ---
        require_url(&mut errors, "index.api_base_url", &self.index.api_base_url);
        if !self.index.vector_store_secret_template.contains("{name}") {
            errors.push(ValidationError {
                field: "index.vector_store_secret_template".into(),
                message: "must contain the {name} placeholder".into(),
            });
        }
        require_positive(
            &mut errors,
            "index.poll_interval_ms",
            self.index.poll_interval_ms,
        );
        require_positive(
            &mut errors,
            "index.poll_timeout_secs",
            self.index.poll_timeout_secs,
        );
        if self.index.tag_attribute.trim().is_empty() {
            errors.push(ValidationError {
                field: "index.tag_attribute".into(),
                message: "must not be empty".into(),
            });
        }

        // --- state ---
        if self.state.table_catalog.trim().is_empty() {
            errors.push(ValidationError {
                field: "state.table_catalog".into(),
                message: "must not be empty".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }

    /// Validate and fold all errors into one [`ConfigError::Invalid`].
    pub fn ensure_valid(&self) -> Result<(), ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            let joined: Vec<String> = errors.iter().map(ToString::to_string).collect();
            Err(ConfigError::Invalid(joined.join("; ")))
        }
    }
}

// ---------------------------------------------------------------------------
// Run options
// ---------------------------------------------------------------------------

/// Parameters of one sync run, resolved from the command line and config defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub environment: String,
    pub vs_id_secret_name: String,
    pub box_folder_id: String,
    pub dbx_table_name: String,
    pub full_load: bool,
}

impl RunOptions {
    /// Resolves every run parameter through `secrets`, falling back to `defaults`
    ///
    /// # Errors
    /// [`ConfigError::MissingParameter`] when a parameter has neither a supplied
    /// value nor a default.
    pub fn resolve(
        secrets: &dyn ISecretsProvider,
        defaults: &RunDefaults,
    ) -> Result<Self, ConfigError> {
        let required = |name: &str, default: Option<&str>| -> Result<String, ConfigError> {
            let value = secrets.get_parameter(name, default.unwrap_or(""))?;
            if value.trim().is_empty() {
                return Err(ConfigError::MissingParameter(name.to_string()));
            }
            Ok(value)
        };

        Ok(Self {
            environment: required("environment", Some(defaults.environment.as_str()))?,
            vs_id_secret_name: required(
                "vs_id_secret_name",
                defaults.vs_id_secret_name.as_deref(),
            )?,
            box_folder_id: required("box_folder_id", defaults.box_folder_id.as_deref())?,
            dbx_table_name: required("dbx_table_name", defaults.dbx_table_name.as_deref())?,
            full_load: secrets
                .get_parameter("full_load", &defaults.full_load)?
                .trim()
                .eq_ignore_ascii_case("true"),
        })
    }

    /// State table for this run: `{dbx_table_name}_files_{environment}`
    pub fn table_name(&self) -> String {
        format!("{}_files_{}", self.dbx_table_name, self.environment)
    }

    /// Secret name holding the vector store id, rendered from `template`
    ///
    /// The environment is capitalized (`dev` becomes `Dev`).
    pub fn vector_store_secret_name(&self, template: &str) -> String {
        template
            .replace("{name}", &self.vs_id_secret_name)
            .replace("{environment}", &capitalize(&self.environment))
    }
}

/// Uppercases the first character and lowercases the rest.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use docsync_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .sync_max_buffer_size(10)
///     .upload_max_retries(5)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- sync ---

    pub fn sync_supported_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.sync.supported_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn sync_max_buffer_size(mut self, size: usize) -> Self {
        self.config.sync.max_buffer_size = size;
        self
    }

    pub fn sync_page_size(mut self, size: u32) -> Self {
        self.config.sync.page_size = size;
        self
    }

    pub fn sync_timezone(mut self, tz: impl Into<String>) -> Self {
        self.config.sync.timezone = tz.into();
        self
    }

    // --- upload ---

    pub fn upload_max_retries(mut self, n: u32) -> Self {
        self.config.upload.max_retries = n;
        self
    }

    pub fn upload_base_delay_secs(mut self, seconds: u64) -> Self {
        self.config.upload.base_delay_secs = seconds;
        self
    }

    // --- source ---

    pub fn source_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.source.api_base_url = url.into();
        self
    }

    pub fn source_token_url(mut self, url: impl Into<String>) -> Self {
        self.config.source.token_url = url.into();
        self
    }

    pub fn source_impersonate_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.config.source.impersonate_user_id = Some(user_id.into());
        self
    }

    // --- index ---

    pub fn index_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.index.api_base_url = url.into();
        self
    }

    pub fn index_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.index.poll_interval_ms = ms;
        self
    }

    pub fn index_tag_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.config.index.tag_attribute = attribute.into();
        self
    }

    // --- state ---

    pub fn state_database_dir(mut self, dir: PathBuf) -> Self {
        self.config.state.database_dir = dir;
        self
    }

    // --- secrets ---

    pub fn secrets_backend(mut self, backend: SecretsBackend) -> Self {
        self.config.secrets.backend = backend;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
