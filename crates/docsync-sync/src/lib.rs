//! DocSync Sync - Incremental synchronization engine
//!
//! Provides:
//! - Depth-first traversal of the source tree with cutoff-based folder pruning
//! - Per-file change detection against recorded sync state
//! - Upload with bounded retry and exponential backoff
//! - Buffered batch write-back of sync records
//!
//! ## Modules
//!
//! - [`walker`] - Tree walker orchestrating one sync run
//! - [`uploader`] - Upload coordinator (retry, rejection cleanup, tagging, counters)
//! - [`buffer`] - Bounded buffer of pending sync records

pub mod buffer;
pub mod uploader;
pub mod walker;

pub use buffer::SyncBuffer;
pub use uploader::{RetryPolicy, Sleeper, TokioSleeper, UploadCoordinator, UploadOutcome};
pub use walker::{SyncSummary, TreeWalker, WalkerOptions};

use thiserror::Error;

/// Errors that abort a sync run
///
/// File-scoped upload failures never surface here; they are recorded as
/// `failed` sync records and the run continues.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Listing, metadata or download call to the source tree failed
    #[error("Source tree error: {context}")]
    Source {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    /// Lookup or batch write against the state store failed
    #[error("State store error: {context}")]
    StateStore {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    /// A domain-level error propagated from docsync-core
    #[error("Domain error: {0}")]
    Domain(#[from] docsync_core::domain::DomainError),
}

impl SyncError {
    pub(crate) fn from_source(context: impl Into<String>) -> impl FnOnce(anyhow::Error) -> Self {
        let context = context.into();
        move |source| Self::Source { context, source }
    }

    pub(crate) fn from_state_store(context: impl Into<String>) -> impl FnOnce(anyhow::Error) -> Self {
        let context = context.into();
        move |source| Self::StateStore { context, source }
    }
}
