//! Index client port (driven/secondary port)
//!
//! This module defines the interface for the semantic search index
//! ("vector store") that source files are uploaded into.
//!
//! ## Design Notes
//!
//! The two failure modes are kept apart in the signature:
//! - `Err(_)` from [`IIndexClient::upload`] is a transport failure (retryable)
//! - `Ok(IndexUpload { error_code: Some(_), .. })` means the transfer worked but
//!   the index rejected the content (terminal)

/// Result of one upload call that reached the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexUpload {
    /// Identifier of the entry the index created
    pub entry_id: String,
    /// Error code reported by the index when it rejected the content
    pub error_code: Option<String>,
}

impl IndexUpload {
    /// An upload the index accepted
    pub fn accepted(entry_id: impl Into<String>) -> Self {
        Self {
            entry_id: entry_id.into(),
            error_code: None,
        }
    }

    /// An upload the index rejected with `error_code`
    pub fn rejected(entry_id: impl Into<String>, error_code: impl Into<String>) -> Self {
        Self {
            entry_id: entry_id.into(),
            error_code: Some(error_code.into()),
        }
    }

    /// Returns true if the index accepted the content
    pub fn is_accepted(&self) -> bool {
        self.error_code.is_none()
    }
}

/// Port trait for the vector store
#[async_trait::async_trait]
pub trait IIndexClient: Send + Sync {
    /// Uploads `content` under `name` and waits until the index has processed it
    async fn upload(&self, name: &str, content: &[u8]) -> anyhow::Result<IndexUpload>;

    /// Attaches the source identifier to an index entry
    async fn tag(&self, entry_id: &str, external_id: &str) -> anyhow::Result<()>;

    /// Removes an entry from the index
    async fn delete(&self, entry_id: &str) -> anyhow::Result<()>;
}
