//! Tree walker
//!
//! The [`TreeWalker`] runs one incremental sync from a root folder of the
//! source tree into the index.
//!
//! ## Sync Flow
//!
//! 1. **List**: page through the folder's children until a short page
//! 2. **Files**: normalize name, filter by extension, detect changes,
//!    download, upload, buffer the outcome
//! 3. **Folders**: fetch authoritative metadata; recurse when modified on or
//!    after the cutoff date (or in full-load mode), then flush. Otherwise the
//!    whole subtree is pruned.
//! 4. **Bookkeeping**: final flush, summary log, return [`SyncSummary`]
//!
//! Folder pruning trusts the folder's own `modified_at` as a proxy for its
//! descendants. That only holds if the source propagates child modification
//! times to ancestors.
//!
//! Source and state-store failures abort the run with [`SyncError`]. Records
//! still buffered at that point stay in the walker and can be written later
//! with [`TreeWalker::flush`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use docsync_core::config::Config;
use docsync_core::domain::{
    ExtensionFilter, FileNode, FolderId, NodeKind, RunClock, SyncRecord, SyncStatus,
};
use docsync_core::ports::{ISourceTree, ISyncStateStore};

use crate::buffer::SyncBuffer;
use crate::uploader::UploadCoordinator;
use crate::SyncError;

// ============================================================================
// SyncSummary
// ============================================================================

/// Totals of one completed sync run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    /// Files handed to the upload coordinator
    pub total_processed: u64,
    /// Files the index accepted
    pub successful: u64,
    /// Rejected files and files whose upload attempts were exhausted
    pub invalid: u64,
    /// Files with an unsupported extension
    pub skipped: u64,
    /// Files unchanged since their last recorded run
    pub unchanged: u64,
    /// Folders not visited because they predate the cutoff
    pub pruned_folders: u64,
    /// Records written to the state store
    pub records_flushed: u64,
}

// ============================================================================
// WalkerOptions
// ============================================================================

/// Traversal settings for a [`TreeWalker`]
#[derive(Debug, Clone)]
pub struct WalkerOptions {
    pub filter: ExtensionFilter,
    pub page_size: u32,
    pub max_buffer_size: usize,
    /// Disables cutoff pruning and change detection
    pub full_load: bool,
}

impl WalkerOptions {
    pub fn from_config(config: &Config, full_load: bool) -> Self {
        Self {
            filter: config.extension_filter(),
            page_size: config.sync.page_size,
            max_buffer_size: config.sync.max_buffer_size,
            full_load,
        }
    }
}

impl Default for WalkerOptions {
    fn default() -> Self {
        Self::from_config(&Config::default(), false)
    }
}

// ============================================================================
// TreeWalker
// ============================================================================

type WalkFuture<'a> = Pin<Box<dyn Future<Output = Result<(), SyncError>> + Send + 'a>>;

/// Incremental source-to-index synchronization
///
/// ## Dependencies
///
/// - `source`: folder listing, metadata and download
/// - `state_store`: last recorded outcome per file
/// - `uploader`: index upload with retry and run counters
/// - `clock`: run instant and cutoff date, fixed at construction
pub struct TreeWalker {
    source: Arc<dyn ISourceTree>,
    state_store: Arc<dyn ISyncStateStore>,
    uploader: UploadCoordinator,
    clock: RunClock,
    options: WalkerOptions,
    buffer: SyncBuffer,
    summary: SyncSummary,
}

impl TreeWalker {
    pub fn new(
        source: Arc<dyn ISourceTree>,
        state_store: Arc<dyn ISyncStateStore>,
        uploader: UploadCoordinator,
        clock: RunClock,
        options: WalkerOptions,
    ) -> Self {
        info!(
            cutoff = %clock.cutoff(),
            today = %clock.today(),
            timezone = %clock.timezone(),
            full_load = options.full_load,
            "Processing documents modified since cutoff"
        );
        Self {
            source,
            state_store,
            uploader,
            clock,
            buffer: SyncBuffer::new(options.max_buffer_size),
            options,
            summary: SyncSummary::default(),
        }
    }

    pub fn clock(&self) -> &RunClock {
        &self.clock
    }

    /// Records buffered but not yet written to the state store
    pub fn pending_records(&self) -> &[SyncRecord] {
        self.buffer.records()
    }

    /// Syncs every reachable file under `root`
    ///
    /// Returns after the whole tree was visited and every buffered record was
    /// written. Counters are reset at the start of each call.
    pub async fn sync(&mut self, root: &FolderId) -> Result<SyncSummary, SyncError> {
        self.uploader.reset_counters();
        self.summary = SyncSummary::default();

        info!(folder_id = %root, "Syncing source folder");
        self.walk_folder(root.clone(), 0).await?;
        self.flush().await?;

        let counters = self.uploader.counters();
        self.summary.total_processed = counters.total_processed;
        self.summary.successful = counters.successful;
        self.summary.invalid = counters.invalid;

        let s = self.summary;
        info!(
            total_processed = s.total_processed,
            successful = s.successful,
            invalid = s.invalid,
            skipped = s.skipped,
            unchanged = s.unchanged,
            pruned_folders = s.pruned_folders,
            records_flushed = s.records_flushed,
            "Sync complete"
        );
        Ok(s)
    }

    /// Writes all buffered records to the state store
    ///
    /// On failure the buffer is left as it was, so calling this again retries
    /// the same batch.
    pub async fn flush(&mut self) -> Result<usize, SyncError> {
        let written = self
            .buffer
            .flush(self.state_store.as_ref())
            .await
            .map_err(SyncError::from_state_store("failed to save sync records"))?;
        self.summary.records_flushed += written as u64;
        Ok(written)
    }

    fn walk_folder(&mut self, folder_id: FolderId, depth: usize) -> WalkFuture<'_> {
        Box::pin(async move {
            let limit = self.options.page_size;
            let mut offset: u32 = 0;

            loop {
                let page = self
                    .source
                    .list_children(&folder_id, limit, offset)
                    .await
                    .map_err(SyncError::from_source(format!(
                        "failed to list folder {folder_id} at offset {offset}"
                    )))?;
                debug!(folder_id = %folder_id, offset, entries = page.len(), "Listed folder page");

                for node in &page {
                    match node.kind {
                        NodeKind::File => self.process_file(node).await?,
                        NodeKind::Folder => self.process_folder(node, depth).await?,
                        NodeKind::Other => {
                            debug!(id = %node.id, name = %node.name, "Ignoring non-file entry")
                        }
                    }
                }

                if page.len() < limit as usize {
                    break;
                }
                offset = offset.saturating_add(limit);
            }

            Ok(())
        })
    }

    async fn process_folder(&mut self, node: &FileNode, depth: usize) -> Result<(), SyncError> {
        let folder_id = FolderId::from(node.id.clone());
        let info = self
            .source
            .get_folder(&folder_id)
            .await
            .map_err(SyncError::from_source(format!(
                "failed to fetch folder {folder_id}"
            )))?;
        let modified = info
            .modified_at
            .with_timezone(&self.clock.timezone())
            .date_naive();

        if self.options.full_load || self.clock.is_on_or_after_cutoff(&info.modified_at) {
            info!(folder = %node.name, depth, modified = %modified, "Recursing into folder");
            self.walk_folder(folder_id, depth + 1).await?;
            self.flush().await?;
        } else {
            info!(folder = %node.name, depth, modified = %modified, "Skipping folder not modified since cutoff");
            self.summary.pruned_folders += 1;
        }
        Ok(())
    }

    async fn process_file(&mut self, node: &FileNode) -> Result<(), SyncError> {
        let name = self.options.filter.normalize(&node.name);

        if !self.options.filter.is_supported(&name) {
            info!(file = %node.name, "Skipping unsupported file type");
            self.summary.skipped += 1;
            self.record(node, name, SyncStatus::Skipping).await?;
            return Ok(());
        }

        if !self.options.full_load && self.is_current(node).await? {
            info!(file = %name, "No update needed");
            self.summary.unchanged += 1;
            return Ok(());
        }

        info!(file = %name, "Downloading");
        let content = self
            .source
            .download(&node.id)
            .await
            .map_err(SyncError::from_source(format!(
                "failed to download file {}",
                node.id
            )))?;

        let outcome = self.uploader.upload(&name, &node.id, &content).await;
        self.record(node, name, outcome.to_status()).await
    }

    /// Returns true if the file has a record and was not modified after it
    async fn is_current(&self, node: &FileNode) -> Result<bool, SyncError> {
        let Some(record) = self
            .state_store
            .get_record(&node.id)
            .await
            .map_err(SyncError::from_state_store(format!(
                "failed to look up file {}",
                node.id
            )))?
        else {
            return Ok(false);
        };

        let info = self
            .source
            .get_file(&node.id)
            .await
            .map_err(SyncError::from_source(format!(
                "failed to fetch file {}",
                node.id
            )))?;

        let last_run = SyncRecord {
            run_timestamp: self.clock.interpret_stored(&record.run_timestamp),
            ..record
        };
        Ok(info
            .content_modified_at
            .is_some_and(|modified| last_run.is_current_for(&modified)))
    }

    async fn record(
        &mut self,
        node: &FileNode,
        name: String,
        status: SyncStatus,
    ) -> Result<(), SyncError> {
        self.buffer.push(SyncRecord::new(
            node.id.clone(),
            name,
            self.clock.timestamp(),
            status,
        ));
        if self.buffer.is_full() {
            self.flush().await?;
        }
        Ok(())
    }
}
