//! Persisted per-file sync outcomes
//!
//! A [`SyncRecord`] captures what one run did with one source file. The state
//! store keeps at most one current record per `file_id`; a later record for
//! the same file overwrites the earlier one.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::FileId;

/// Detail recorded when uploads exhausted their retries without an index error code
pub const UNKNOWN_FAILURE: &str = "unknown";

/// Outcome of processing one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SyncStatus {
    /// The index accepted the file
    Uploaded,
    /// The upload failed; carries the index error code or a failure detail
    Failed(String),
    /// Unsupported file type, deliberately not processed
    Skipping,
}

impl SyncStatus {
    /// Builds a failed status from an optional index error code
    pub fn failed(detail: Option<&str>) -> Self {
        Self::Failed(detail.unwrap_or(UNKNOWN_FAILURE).to_string())
    }

    /// Returns true for [`SyncStatus::Uploaded`]
    pub fn is_uploaded(&self) -> bool {
        matches!(self, Self::Uploaded)
    }

    /// Returns true for [`SyncStatus::Failed`]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl Display for SyncStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uploaded => write!(f, "uploaded"),
            Self::Failed(detail) => write!(f, "failed: {detail}"),
            Self::Skipping => write!(f, "skipping"),
        }
    }
}

impl FromStr for SyncStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploaded" => Ok(Self::Uploaded),
            "skipping" | "Skipping" => Ok(Self::Skipping),
            s if s.starts_with("failed:") => Ok(Self::Failed(s[7..].trim_start().to_string())),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for SyncStatus {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SyncStatus> for String {
    fn from(status: SyncStatus) -> Self {
        status.to_string()
    }
}

/// The last-processed state of one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    /// Source file identifier; the state store key
    pub file_id: FileId,
    /// Normalized file name at the time of the run
    pub file_name: String,
    /// When the run observed the file, in the run's civil timezone
    pub run_timestamp: DateTime<FixedOffset>,
    /// What the run did with the file
    pub status: SyncStatus,
}

impl SyncRecord {
    /// Creates a new record
    pub fn new(
        file_id: FileId,
        file_name: impl Into<String>,
        run_timestamp: DateTime<FixedOffset>,
        status: SyncStatus,
    ) -> Self {
        Self {
            file_id,
            file_name: file_name.into(),
            run_timestamp,
            status,
        }
    }

    /// Returns true if a file last modified at `content_modified_at` has not
    /// changed since this record was written
    pub fn is_current_for(&self, content_modified_at: &DateTime<FixedOffset>) -> bool {
        *content_modified_at <= self.run_timestamp
    }
}
