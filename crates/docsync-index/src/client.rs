//! Vector store HTTP client
//!
//! Thin typed wrapper over the files and vector store endpoints. Every call is
//! authenticated with the API key as a bearer token; non-success statuses are
//! returned as [`IndexError`].

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::IndexError;

/// Base URL for the hosted API
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Purpose attached to uploaded files
const FILE_PURPOSE: &str = "assistants";

// ============================================================================
// API response types
// ============================================================================

/// Response of `POST /files`
#[derive(Debug, Clone, Deserialize)]
pub struct FileObject {
    pub id: String,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Processing state of a vector store entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    InProgress,
    Completed,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl EntryStatus {
    /// Returns true once the index has finished with the entry
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// Error attached to an entry the index could not process
#[derive(Debug, Clone, Deserialize)]
pub struct LastError {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// A file attached to a vector store
#[derive(Debug, Clone, Deserialize)]
pub struct VectorStoreFile {
    pub id: String,
    pub status: EntryStatus,
    #[serde(default)]
    pub last_error: Option<LastError>,
}

#[derive(Serialize)]
struct AttachRequest<'a> {
    file_id: &'a str,
}

#[derive(Serialize)]
struct AttributesRequest<'a> {
    attributes: &'a HashMap<String, String>,
}

// ============================================================================
// VectorStoreClient
// ============================================================================

/// HTTP client bound to one vector store
pub struct VectorStoreClient {
    client: Client,
    base_url: String,
    api_key: String,
    vector_store_id: String,
    poll_interval: Duration,
    poll_timeout: Duration,
}

impl VectorStoreClient {
    /// Creates a client for `vector_store_id` at `base_url`
    pub fn new(
        api_key: impl Into<String>,
        vector_store_id: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            vector_store_id: vector_store_id.into(),
            poll_interval: Duration::from_secs(1),
            poll_timeout: Duration::from_secs(300),
        }
    }

    /// Sets how often and for how long processing status is polled
    pub fn with_polling(mut self, interval: Duration, timeout: Duration) -> Self {
        self.poll_interval = interval;
        self.poll_timeout = timeout;
        self
    }

    pub fn vector_store_id(&self) -> &str {
        &self.vector_store_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
    }

    async fn send(&self, request: RequestBuilder, path: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(IndexError::from)
            .with_context(|| format!("Failed to send request to {path}"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IndexError::from_status(status, path, &body).into());
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, path: &str) -> Result<T> {
        self.send(request, path)
            .await?
            .json()
            .await
            .map_err(|e| IndexError::InvalidResponse(e.to_string()))
            .with_context(|| format!("Failed to parse {path} response"))
    }

    fn entry_path(&self, entry_id: &str) -> String {
        format!("/vector_stores/{}/files/{}", self.vector_store_id, entry_id)
    }

    /// Uploads raw content as a file object
    ///
    /// Makes `POST /files` with a multipart body.
    pub async fn upload_file(&self, name: &str, content: &[u8]) -> Result<FileObject> {
        let part = Part::bytes(content.to_vec()).file_name(name.to_string());
        let form = Form::new().text("purpose", FILE_PURPOSE).part("file", part);

        debug!(file = name, bytes = content.len(), "Uploading file object");
        let request = self.request(Method::POST, "/files").multipart(form);
        self.send_json(request, "/files").await
    }

    /// Attaches an uploaded file object to the vector store
    pub async fn attach(&self, file_id: &str) -> Result<VectorStoreFile> {
        let path = format!("/vector_stores/{}/files", self.vector_store_id);
        let request = self
            .request(Method::POST, &path)
            .json(&AttachRequest { file_id });
        self.send_json(request, &path).await
    }

    /// Fetches the current state of an entry
    pub async fn get_entry(&self, entry_id: &str) -> Result<VectorStoreFile> {
        let path = self.entry_path(entry_id);
        self.send_json(self.request(Method::GET, &path), &path).await
    }

    /// Polls an entry until the index has finished processing it
    ///
    /// Returns [`IndexError::PollTimeout`] if the entry is still in progress
    /// after the configured timeout.
    pub async fn wait_until_processed(&self, entry: VectorStoreFile) -> Result<VectorStoreFile> {
        let started = tokio::time::Instant::now();
        let mut entry = entry;

        while !entry.status.is_terminal() {
            if started.elapsed() >= self.poll_timeout {
                return Err(IndexError::PollTimeout {
                    entry_id: entry.id,
                    waited: self.poll_timeout,
                }
                .into());
            }
            tokio::time::sleep(self.poll_interval).await;
            entry = self.get_entry(&entry.id).await?;
        }

        debug!(entry_id = %entry.id, status = ?entry.status, "Entry processed");
        Ok(entry)
    }

    /// Replaces the attributes of an entry
    pub async fn update_attributes(
        &self,
        entry_id: &str,
        attributes: &HashMap<String, String>,
    ) -> Result<VectorStoreFile> {
        let path = self.entry_path(entry_id);
        let request = self
            .request(Method::POST, &path)
            .json(&AttributesRequest { attributes });
        self.send_json(request, &path).await
    }

    /// Detaches an entry from the vector store
    pub async fn detach(&self, entry_id: &str) -> Result<()> {
        let path = self.entry_path(entry_id);
        self.send(self.request(Method::DELETE, &path), &path).await?;
        Ok(())
    }

    /// Deletes the underlying file object
    pub async fn delete_file(&self, file_id: &str) -> Result<()> {
        let path = format!("/files/{file_id}");
        self.send(self.request(Method::DELETE, &path), &path).await?;
        Ok(())
    }
}
