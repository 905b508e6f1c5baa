//! BoxSourceTree - ISourceTree implementation for the Box content API
//!
//! Wraps the [`BoxClient`] and converts Box response types into the
//! port-level types of `docsync-core`.

use anyhow::Result;
use tracing::debug;

use docsync_core::domain::{FileId, FileNode, FolderId};
use docsync_core::ports::{FileInfo, FolderInfo, ISourceTree};

use crate::client::{BoxClient, BoxItem};
use crate::BoxError;

/// Source tree backed by a Box enterprise account
pub struct BoxSourceTree {
    client: BoxClient,
}

impl BoxSourceTree {
    pub fn new(client: BoxClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &BoxClient {
        &self.client
    }
}

fn to_file_node(item: BoxItem) -> Result<FileNode> {
    Ok(FileNode {
        id: FileId::new(item.id)?,
        name: item.name,
        kind: item.kind,
        modified_at: item.modified_at,
    })
}

#[async_trait::async_trait]
impl ISourceTree for BoxSourceTree {
    async fn list_children(
        &self,
        folder_id: &FolderId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<FileNode>> {
        let page = self
            .client
            .list_folder_items(folder_id.as_str(), limit, offset)
            .await?;
        debug!(
            folder_id = %folder_id,
            entries = page.entries.len(),
            total = page.total_count,
            "BoxSourceTree::list_children"
        );
        page.entries.into_iter().map(to_file_node).collect()
    }

    async fn get_folder(&self, folder_id: &FolderId) -> Result<FolderInfo> {
        let folder = self.client.get_folder(folder_id.as_str()).await?;
        let modified_at = folder.modified_at.ok_or_else(|| {
            BoxError::InvalidResponse(format!("folder {} has no modified_at", folder.id))
        })?;
        Ok(FolderInfo { modified_at })
    }

    async fn get_file(&self, file_id: &FileId) -> Result<FileInfo> {
        let file = self.client.get_file(file_id.as_str()).await?;
        Ok(FileInfo {
            content_modified_at: file.content_modified_at,
        })
    }

    async fn download(&self, file_id: &FileId) -> Result<Vec<u8>> {
        self.client.download_file(file_id.as_str()).await
    }
}
