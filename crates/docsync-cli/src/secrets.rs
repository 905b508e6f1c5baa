//! Secrets accessors
//!
//! Two [`ISecretsProvider`] backends: the system keyring and the process
//! environment. Both resolve run parameters from the values given on the
//! command line, falling back to the caller's default.

use std::collections::HashMap;

use anyhow::{bail, Result};
use tracing::debug;

use docsync_core::config::{ConfigError, SecretsBackend, SecretsConfig};
use docsync_core::ports::ISecretsProvider;

/// Run parameters supplied on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters(HashMap<String, String>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` unless it was already given
    pub fn insert_default(&mut self, name: &str, value: Option<String>) {
        if let Some(value) = value {
            self.0.entry(name.to_string()).or_insert(value);
        }
    }

    /// Parses `name=value` pairs; a later pair overrides an earlier one
    pub fn parse<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut params = HashMap::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let Some((name, value)) = pair.split_once('=') else {
                bail!("Invalid parameter '{pair}', expected name=value");
            };
            let name = name.trim();
            if name.is_empty() {
                bail!("Invalid parameter '{pair}', name is empty");
            }
            params.insert(name.to_string(), value.to_string());
        }
        Ok(Self(params))
    }

    fn get(&self, name: &str, default: &str) -> String {
        self.0
            .get(name)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }
}

/// Builds the accessor selected by `config.backend`
pub fn build_provider(config: &SecretsConfig, params: Parameters) -> Box<dyn ISecretsProvider> {
    match config.backend {
        SecretsBackend::Keyring => Box::new(KeyringSecrets::new(&config.vault_name, params)),
        SecretsBackend::Env => Box::new(EnvSecrets::new(&config.vault_name, params)),
    }
}

// ============================================================================
// KeyringSecrets
// ============================================================================

/// Reads secrets from the system keyring, one entry per secret name
pub struct KeyringSecrets {
    service: String,
    params: Parameters,
}

impl KeyringSecrets {
    pub fn new(service: &str, params: Parameters) -> Self {
        Self {
            service: service.to_string(),
            params,
        }
    }
}

impl ISecretsProvider for KeyringSecrets {
    fn get_secret(&self, name: &str) -> Result<String, ConfigError> {
        let entry = keyring::Entry::new(&self.service, name)
            .map_err(|e| ConfigError::Backend(format!("keyring entry {name}: {e}")))?;

        match entry.get_password() {
            Ok(secret) => {
                debug!(service = %self.service, name, "Loaded secret from keyring");
                Ok(secret)
            }
            Err(keyring::Error::NoEntry) => Err(ConfigError::MissingSecret(name.to_string())),
            Err(e) => Err(ConfigError::Backend(format!("keyring entry {name}: {e}"))),
        }
    }

    fn get_parameter(&self, name: &str, default: &str) -> Result<String, ConfigError> {
        Ok(self.params.get(name, default))
    }
}

// ============================================================================
// EnvSecrets
// ============================================================================

/// Reads secrets from environment variables named `{PREFIX}_{NAME}`
///
/// Both parts are uppercased and every character outside `[A-Z0-9]` becomes
/// `_`, so `OpenAI-API-Key` with prefix `docsync` is `DOCSYNC_OPENAI_API_KEY`.
pub struct EnvSecrets {
    prefix: String,
    params: Parameters,
}

impl EnvSecrets {
    pub fn new(prefix: &str, params: Parameters) -> Self {
        Self {
            prefix: prefix.to_string(),
            params,
        }
    }

    /// Environment variable holding the secret `name`
    pub fn variable_name(&self, name: &str) -> String {
        let raw = if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}_{}", self.prefix, name)
        };
        raw.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl ISecretsProvider for EnvSecrets {
    fn get_secret(&self, name: &str) -> Result<String, ConfigError> {
        let var = self.variable_name(name);
        match std::env::var(&var) {
            Ok(value) if !value.is_empty() => Ok(value),
            Ok(_) | Err(std::env::VarError::NotPresent) => {
                Err(ConfigError::MissingSecret(format!("{name} (${var})")))
            }
            Err(e) => Err(ConfigError::Backend(format!("${var}: {e}"))),
        }
    }

    fn get_parameter(&self, name: &str, default: &str) -> Result<String, ConfigError> {
        Ok(self.params.get(name, default))
    }
}
