//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including identifier validation, status parsing, and timezone lookup.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid source-system identifier
    #[error("Invalid source ID: {0}")]
    InvalidId(String),

    /// A stored status string could not be interpreted
    #[error("Unknown sync status: {0}")]
    UnknownStatus(String),

    /// The configured civil timezone is not a known IANA zone
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
