//! Secrets provider port
//!
//! Credentials and run parameters are read through one accessor that is
//! constructed once at process start and passed to every consumer.
//!
//! ## Design Notes
//!
//! The methods are synchronous: backends are local (keyring, environment)
//! and are only consulted while wiring the service, before any async work.

use crate::config::ConfigError;

/// Port trait for secrets and run parameters
pub trait ISecretsProvider: Send + Sync {
    /// Returns the secret stored under `name`
    ///
    /// # Errors
    /// [`ConfigError::MissingSecret`] if the backend has no such entry
    fn get_secret(&self, name: &str) -> Result<String, ConfigError>;

    /// Returns the run parameter `name`, or `default` when it was not supplied
    fn get_parameter(&self, name: &str, default: &str) -> Result<String, ConfigError>;
}
