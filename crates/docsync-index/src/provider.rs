//! VectorStoreIndex - IIndexClient implementation
//!
//! An upload is complete only when the index has finished processing the
//! entry. An entry that ends in any state other than `completed` is reported
//! as a rejection carrying the index's error code.
//!
//! If attaching or polling fails after the file object was created, the
//! object and its entry are removed before the error is returned, so a retry
//! starts from a clean store.

use std::collections::HashMap;

use anyhow::Result;
use tracing::{debug, warn};

use docsync_core::ports::{IIndexClient, IndexUpload};

use crate::client::{EntryStatus, VectorStoreClient, VectorStoreFile};

/// Attribute that receives the source file id by default
pub const DEFAULT_TAG_ATTRIBUTE: &str = "box_file_id";

/// Vector store backed index
pub struct VectorStoreIndex {
    client: VectorStoreClient,
    tag_attribute: String,
}

impl VectorStoreIndex {
    pub fn new(client: VectorStoreClient) -> Self {
        Self {
            client,
            tag_attribute: DEFAULT_TAG_ATTRIBUTE.to_string(),
        }
    }

    /// Sets the attribute written by [`IIndexClient::tag`]
    pub fn with_tag_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.tag_attribute = attribute.into();
        self
    }

    pub fn client(&self) -> &VectorStoreClient {
        &self.client
    }

    /// Removes a half-finished upload, logging instead of failing
    async fn discard(&self, file_id: &str, attached: bool) {
        if attached {
            if let Err(e) = self.client.detach(file_id).await {
                warn!(file_id, error = %e, "Failed to detach abandoned entry");
            }
        }
        if let Err(e) = self.client.delete_file(file_id).await {
            warn!(file_id, error = %e, "Failed to delete abandoned file object");
        }
    }
}

/// Converts a processed entry into the port result
fn to_index_upload(entry: VectorStoreFile) -> IndexUpload {
    match (entry.status, entry.last_error) {
        (EntryStatus::Completed, None) => IndexUpload::accepted(entry.id),
        (_, Some(error)) => IndexUpload::rejected(entry.id, error.code),
        (EntryStatus::Cancelled, None) => IndexUpload::rejected(entry.id, "cancelled"),
        (_, None) => IndexUpload::rejected(entry.id, "failed"),
    }
}

#[async_trait::async_trait]
impl IIndexClient for VectorStoreIndex {
    async fn upload(&self, name: &str, content: &[u8]) -> Result<IndexUpload> {
        let file = self.client.upload_file(name, content).await?;

        let attached = match self.client.attach(&file.id).await {
            Ok(attached) => attached,
            Err(e) => {
                self.discard(&file.id, false).await;
                return Err(e);
            }
        };

        let entry = match self.client.wait_until_processed(attached).await {
            Ok(entry) => entry,
            Err(e) => {
                self.discard(&file.id, true).await;
                return Err(e);
            }
        };

        debug!(file = name, entry_id = %entry.id, status = ?entry.status, "Upload processed");
        Ok(to_index_upload(entry))
    }

    async fn tag(&self, entry_id: &str, external_id: &str) -> Result<()> {
        let attributes = HashMap::from([(self.tag_attribute.clone(), external_id.to_string())]);
        self.client.update_attributes(entry_id, &attributes).await?;
        debug!(entry_id, attribute = %self.tag_attribute, external_id, "Tagged entry");
        Ok(())
    }

    async fn delete(&self, entry_id: &str) -> Result<()> {
        self.client.detach(entry_id).await?;
        // The entry id is also the file object id; the object is removed separately.
        if let Err(e) = self.client.delete_file(entry_id).await {
            warn!(entry_id, error = %e, "Failed to delete file object");
        }
        Ok(())
    }
}
