//! Bounded buffer of pending sync records
//!
//! Records accumulate in memory while the walker processes files and are
//! written to the state store in batches. A flush either writes and clears the
//! whole buffer or leaves it untouched, so a failed batch can be retried as is.

use tracing::info;

use docsync_core::domain::SyncRecord;
use docsync_core::ports::ISyncStateStore;

/// Pending sync records awaiting a batch write
#[derive(Debug, Clone)]
pub struct SyncBuffer {
    records: Vec<SyncRecord>,
    max_size: usize,
}

impl SyncBuffer {
    /// Creates an empty buffer that reports full at `max_size` records
    pub fn new(max_size: usize) -> Self {
        Self {
            records: Vec::with_capacity(max_size),
            max_size: max_size.max(1),
        }
    }

    pub fn push(&mut self, record: SyncRecord) {
        self.records.push(record);
    }

    /// Returns true once the buffer holds `max_size` records or more
    pub fn is_full(&self) -> bool {
        self.records.len() >= self.max_size
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Records waiting to be written, in insertion order
    pub fn records(&self) -> &[SyncRecord] {
        &self.records
    }

    /// Writes every pending record to `store` in one batch
    ///
    /// The buffer is cleared only after the store accepts the batch. On error
    /// nothing is removed and the error is returned unchanged.
    ///
    /// # Returns
    /// The number of records written (0 if the buffer was empty).
    pub async fn flush(&mut self, store: &dyn ISyncStateStore) -> anyhow::Result<usize> {
        if self.records.is_empty() {
            return Ok(0);
        }

        let count = self.records.len();
        info!(records = count, "Saving sync records");
        store.upsert_many(&self.records).await?;
        self.records.clear();
        Ok(count)
    }
}
