//! Box content API client
//!
//! Provides a typed HTTP client for the Box endpoints the sync engine uses.
//! Handles authentication headers, user impersonation, 429 back-off and JSON
//! deserialization.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use docsync_box::client::BoxClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = BoxClient::with_base_url("developer-token", "https://api.box.com/2.0");
//! let page = client.list_folder_items("0", 100, 0).await?;
//! println!("{} entries", page.entries.len());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use docsync_core::domain::NodeKind;

use crate::auth::BoxAuth;
use crate::BoxError;

/// Base URL for the Box content API
pub const BOX_BASE_URL: &str = "https://api.box.com/2.0";

/// Fields requested for folder listings
const ITEM_FIELDS: &str = "id,type,name,modified_at";

/// Default retry-after duration when the header is missing
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Maximum number of retries for 429 responses
const DEFAULT_MAX_RETRIES: u32 = 5;

// ============================================================================
// Box API response types
// ============================================================================

/// One page of `GET /folders/{id}/items`
#[derive(Debug, Clone, Deserialize)]
pub struct ItemsPage {
    #[serde(default)]
    pub total_count: Option<u64>,
    pub entries: Vec<BoxItem>,
}

/// A listing entry (file, folder or web link)
#[derive(Debug, Clone, Deserialize)]
pub struct BoxItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub modified_at: Option<DateTime<FixedOffset>>,
}

/// Response of `GET /folders/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct BoxFolder {
    pub id: String,
    pub modified_at: Option<DateTime<FixedOffset>>,
}

/// Response of `GET /files/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct BoxFile {
    pub id: String,
    #[serde(default)]
    pub content_modified_at: Option<DateTime<FixedOffset>>,
}

// ============================================================================
// BoxClient
// ============================================================================

/// Where the bearer token comes from
enum TokenSource {
    /// A fixed token, e.g. a developer token
    Static(String),
    /// Service-account tokens fetched and refreshed on demand
    ClientCredentials(Arc<BoxAuth>),
}

/// HTTP client for Box content API calls
pub struct BoxClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for API requests
    base_url: String,
    token: TokenSource,
    /// User id sent in the `As-User` header
    as_user: Option<String>,
    max_retries: u32,
}

impl BoxClient {
    /// Creates a client that authenticates through `auth`
    pub fn new(auth: Arc<BoxAuth>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            token: TokenSource::ClientCredentials(auth),
            as_user: None,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Creates a client with a fixed access token and a custom base URL
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            token: TokenSource::Static(access_token.into()),
            as_user: None,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Acts on behalf of `user_id` for every request
    pub fn as_user(mut self, user_id: impl Into<String>) -> Self {
        self.as_user = Some(user_id.into());
        self
    }

    /// Sets how many times a 429 response is retried
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Returns the base URL for API requests
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn access_token(&self) -> Result<String> {
        match &self.token {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::ClientCredentials(auth) => auth.access_token().await,
        }
    }

    /// Sends an authenticated request, backing off on 429 and refreshing the
    /// token once on 401
    ///
    /// Non-success statuses are returned as [`BoxError`].
    async fn send(&self, method: Method, path: &str, query: &[(&str, String)]) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut refreshed = false;
        let mut attempt: u32 = 0;

        loop {
            let mut request = self
                .client
                .request(method.clone(), &url)
                .bearer_auth(self.access_token().await?)
                .query(query);
            if let Some(user) = &self.as_user {
                request = request.header("As-User", user);
            }

            let response = request
                .send()
                .await
                .map_err(BoxError::from)
                .with_context(|| format!("Failed to send request to {path}"))?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_RETRY_AFTER);

                if attempt >= self.max_retries {
                    warn!(path, attempts = attempt + 1, "429 retry limit exhausted");
                    return Err(BoxError::TooManyRequests { retry_after }.into());
                }

                info!(
                    path,
                    attempt,
                    retry_after_ms = retry_after.as_millis() as u64,
                    "Received 429, backing off"
                );
                tokio::time::sleep(retry_after).await;
                attempt += 1;
                continue;
            }

            if status == StatusCode::UNAUTHORIZED && !refreshed {
                if let TokenSource::ClientCredentials(auth) = &self.token {
                    debug!(path, "Received 401, refreshing token");
                    auth.invalidate().await;
                    refreshed = true;
                    continue;
                }
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(BoxError::from_status(status, path, &body).into());
            }

            return Ok(response);
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        self.send(Method::GET, path, query)
            .await?
            .json()
            .await
            .map_err(|e| BoxError::InvalidResponse(e.to_string()))
            .with_context(|| format!("Failed to parse {path} response"))
    }

    /// Lists one page of a folder's children
    ///
    /// Makes `GET /folders/{id}/items?limit=&offset=&fields=`.
    pub async fn list_folder_items(&self, folder_id: &str, limit: u32, offset: u32) -> Result<ItemsPage> {
        debug!(folder_id, limit, offset, "Listing Box folder");
        self.get_json(
            &format!("/folders/{folder_id}/items"),
            &[
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
                ("fields", ITEM_FIELDS.to_string()),
            ],
        )
        .await
    }

    /// Fetches a folder's metadata
    pub async fn get_folder(&self, folder_id: &str) -> Result<BoxFolder> {
        self.get_json(
            &format!("/folders/{folder_id}"),
            &[("fields", "id,modified_at".to_string())],
        )
        .await
    }

    /// Fetches a file's metadata
    pub async fn get_file(&self, file_id: &str) -> Result<BoxFile> {
        self.get_json(
            &format!("/files/{file_id}"),
            &[("fields", "id,content_modified_at".to_string())],
        )
        .await
    }

    /// Downloads a file's content
    ///
    /// `GET /files/{id}/content` redirects to a download URL, which reqwest
    /// follows.
    pub async fn download_file(&self, file_id: &str) -> Result<Vec<u8>> {
        let path = format!("/files/{file_id}/content");
        let bytes = self
            .send(Method::GET, &path, &[])
            .await?
            .bytes()
            .await
            .context("Failed to read download response body")?;

        debug!(file_id, bytes = bytes.len(), "Downloaded file");
        Ok(bytes.to_vec())
    }
}
