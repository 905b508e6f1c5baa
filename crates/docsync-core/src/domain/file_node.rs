//! Source tree entries
//!
//! A [`FileNode`] is a read-only snapshot of one entry returned by a folder
//! listing. It may be stale by the time it is processed; authoritative
//! timestamps are fetched separately through the source-tree port.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::newtypes::FileId;

/// Kind of a source tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Folder,
    /// Anything else the listing returns (e.g. web links); never processed
    #[serde(other)]
    Other,
}

/// One entry of a folder listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    /// Stable source identifier
    pub id: FileId,
    /// Display name, extension casing as stored in the source
    pub name: String,
    /// Entry kind
    pub kind: NodeKind,
    /// Modification time if the listing carries it
    pub modified_at: Option<DateTime<FixedOffset>>,
}

impl FileNode {
    /// Creates a file entry without a listing timestamp
    pub fn file(id: FileId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: NodeKind::File,
            modified_at: None,
        }
    }

    /// Creates a folder entry without a listing timestamp
    pub fn folder(id: FileId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: NodeKind::Folder,
            modified_at: None,
        }
    }

    /// Returns true if this entry is a file
    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    /// Returns true if this entry is a folder
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }
}
