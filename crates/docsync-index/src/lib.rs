//! DocSync Index - vector store client
//!
//! Uploads documents into a vector store and manages the resulting entries:
//! - Multipart file upload followed by attach-and-poll
//! - Attribute tagging of processed entries
//! - Deletion of rejected entries
//!
//! ## Modules
//!
//! - [`client`] - HTTP client for the files and vector store endpoints
//! - [`provider`] - [`IIndexClient`](docsync_core::ports::IIndexClient) implementation

pub mod client;
pub mod provider;

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when communicating with the vector store API
#[derive(Debug, Error)]
pub enum IndexError {
    /// The API key was refused
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The vector store or entry does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// A server-side error occurred (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The entry was still being processed when polling gave up
    #[error("Entry {entry_id} still in progress after {waited:?}")]
    PollTimeout { entry_id: String, waited: Duration },

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl IndexError {
    /// Maps a non-success HTTP status to an error, keeping the response body as detail
    pub fn from_status(status: StatusCode, path: &str, body: &str) -> Self {
        let detail = if body.is_empty() {
            format!("{status} for {path}")
        } else {
            format!("{status} for {path}: {body}")
        };
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized(detail),
            StatusCode::NOT_FOUND => Self::NotFound(detail),
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited(detail),
            s if s.is_server_error() => Self::ServerError(detail),
            _ => Self::InvalidResponse(detail),
        }
    }
}
