//! Source tree port (driven/secondary port)
//!
//! This module defines the interface for reading the hierarchical file
//! service that documents are synchronized from. The sync engine never
//! writes to the source.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are adapter-specific
//!   and don't need domain-level classification.
//! - Listing entries may omit timestamps; authoritative values come from
//!   [`ISourceTree::get_folder`] and [`ISourceTree::get_file`].

use chrono::{DateTime, FixedOffset};

use crate::domain::{FileId, FileNode, FolderId};

/// Authoritative folder metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderInfo {
    /// Last modification of the folder itself
    pub modified_at: DateTime<FixedOffset>,
}

/// Authoritative file metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// When the file content was last changed; `None` if the source omits it
    pub content_modified_at: Option<DateTime<FixedOffset>>,
}

/// Port trait for the file service being synchronized from
///
/// ## Implementation Notes
///
/// - `list_children` returns one page; callers keep paging until a page holds
///   fewer than `limit` entries.
/// - No method retries internally beyond what the HTTP client does; failures
///   abort the run.
#[async_trait::async_trait]
pub trait ISourceTree: Send + Sync {
    /// Lists one page of a folder's direct children
    ///
    /// # Arguments
    /// * `folder_id` - Folder to list
    /// * `limit` - Maximum number of entries in the page
    /// * `offset` - Index of the first entry to return
    async fn list_children(
        &self,
        folder_id: &FolderId,
        limit: u32,
        offset: u32,
    ) -> anyhow::Result<Vec<FileNode>>;

    /// Fetches a folder's authoritative metadata
    async fn get_folder(&self, folder_id: &FolderId) -> anyhow::Result<FolderInfo>;

    /// Fetches a file's authoritative metadata
    async fn get_file(&self, file_id: &FileId) -> anyhow::Result<FileInfo>;

    /// Downloads a file's full content
    async fn download(&self, file_id: &FileId) -> anyhow::Result<Vec<u8>>;
}
