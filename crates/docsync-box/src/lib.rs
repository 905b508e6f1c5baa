//! DocSync Box - Box content API client
//!
//! Provides async access to the parts of the Box API the sync engine reads:
//! - Client-credentials authentication with token caching
//! - Paginated folder listing
//! - Folder and file metadata
//! - File download
//!
//! ## Modules
//!
//! - [`auth`] - OAuth2 client-credentials grant for a service account
//! - [`client`] - Box content API HTTP client
//! - [`provider`] - [`ISourceTree`](docsync_core::ports::ISourceTree) implementation

pub mod auth;
pub mod client;
pub mod provider;

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when communicating with the Box API
#[derive(Debug, Error)]
pub enum BoxError {
    /// Authentication credentials are invalid or expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The service account may not access the resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested folder or file does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded; retry after the specified duration
    #[error("Too many requests, retry after {retry_after:?}")]
    TooManyRequests {
        /// Duration to wait before retrying
        retry_after: Duration,
    },

    /// A server-side error occurred (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The token endpoint refused the client credentials
    #[error("Token request failed: {0}")]
    TokenRequest(String),

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl BoxError {
    /// Maps a non-success HTTP status to an error, keeping the response body as detail
    pub fn from_status(status: StatusCode, path: &str, body: &str) -> Self {
        let detail = if body.is_empty() {
            format!("{status} for {path}")
        } else {
            format!("{status} for {path}: {body}")
        };
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized(detail),
            StatusCode::FORBIDDEN => Self::Forbidden(detail),
            StatusCode::NOT_FOUND => Self::NotFound(detail),
            s if s.is_server_error() => Self::ServerError(detail),
            _ => Self::InvalidResponse(detail),
        }
    }
}
