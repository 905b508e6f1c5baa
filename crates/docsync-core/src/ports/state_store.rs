//! Sync state store port (driven/secondary port)
//!
//! This module defines the interface for persisting per-file sync records.
//!
//! ## Design Notes
//!
//! - Records are keyed by `file_id`; `upsert_many` overwrites existing rows,
//!   so replaying the same batch leaves the store unchanged.
//! - `upsert_many` must be all-or-nothing: on error no record of the batch
//!   may be considered written.

use crate::domain::{FileId, SyncRecord};

/// Port trait for persistent sync state
#[async_trait::async_trait]
pub trait ISyncStateStore: Send + Sync {
    /// Retrieves the current record for a file, if any
    async fn get_record(&self, file_id: &FileId) -> anyhow::Result<Option<SyncRecord>>;

    /// Inserts or replaces a batch of records keyed by `file_id`
    ///
    /// When the batch holds several records for one file, the last one wins.
    async fn upsert_many(&self, records: &[SyncRecord]) -> anyhow::Result<()>;
}
