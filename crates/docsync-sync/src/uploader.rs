//! Upload coordinator
//!
//! Wraps a single index upload with bounded retry. Two failure classes are
//! handled differently:
//!
//! - **Transport failures** (the index client returns `Err`) are retried with
//!   exponential backoff: `base_delay * 2^attempt` after each failed attempt.
//!   With the defaults that is 2s, 4s, 8s.
//! - **Content rejections** (the index reports an error code) are terminal.
//!   The rejected entry is deleted and the code is returned without retrying.
//!
//! On success the index entry is tagged with the source file id.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use docsync_core::config::UploadConfig;
use docsync_core::domain::{FileId, RunCounters, SyncStatus};
use docsync_core::ports::IIndexClient;

// ============================================================================
// Backoff
// ============================================================================

/// Waits between upload attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by `tokio::time::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Attempt cap and backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_secs(config.base_delay_secs),
        )
    }

    /// Wait after the failed attempt with zero-based index `attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&UploadConfig::default())
    }
}

// ============================================================================
// UploadOutcome
// ============================================================================

/// Result of one coordinated upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The index accepted the file
    Uploaded,
    /// The index rejected the content with this error code
    Rejected(String),
    /// Every attempt failed at the transport level
    Exhausted,
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Uploaded)
    }

    /// Index error code, if the index reported one
    pub fn error_detail(&self) -> Option<&str> {
        match self {
            Self::Rejected(code) => Some(code),
            _ => None,
        }
    }

    /// Status recorded for the file
    pub fn to_status(&self) -> SyncStatus {
        match self {
            Self::Uploaded => SyncStatus::Uploaded,
            _ => SyncStatus::failed(self.error_detail()),
        }
    }
}

// ============================================================================
// UploadCoordinator
// ============================================================================

/// Uploads files into the index with retry, cleanup and tagging
///
/// Owns the run counters; the walker resets them at the start of each run.
pub struct UploadCoordinator {
    index: Arc<dyn IIndexClient>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    counters: RunCounters,
}

impl UploadCoordinator {
    /// Creates a coordinator that waits with [`TokioSleeper`]
    pub fn new(index: Arc<dyn IIndexClient>, policy: RetryPolicy) -> Self {
        Self::with_sleeper(index, policy, Arc::new(TokioSleeper))
    }

    /// Creates a coordinator with a custom backoff sleeper
    pub fn with_sleeper(
        index: Arc<dyn IIndexClient>,
        policy: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            index,
            sleeper,
            policy,
            counters: RunCounters::default(),
        }
    }

    pub fn counters(&self) -> RunCounters {
        self.counters
    }

    pub fn reset_counters(&mut self) {
        self.counters.reset();
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Uploads `content` as `name` and tags the entry with `source_id`
    pub async fn upload(&mut self, name: &str, source_id: &FileId, content: &[u8]) -> UploadOutcome {
        self.counters.total_processed += 1;

        for attempt in 0..self.policy.max_retries {
            match self.index.upload(name, content).await {
                Ok(upload) => match upload.error_code {
                    None => {
                        info!(file = name, entry_id = %upload.entry_id, "Uploaded to vector store");
                        self.tag(&upload.entry_id, source_id, name).await;
                        self.counters.successful += 1;
                        return UploadOutcome::Uploaded;
                    }
                    Some(code) => {
                        error!(file = name, code = %code, "Vector store rejected file");
                        self.cleanup(&upload.entry_id, name).await;
                        self.counters.invalid += 1;
                        return UploadOutcome::Rejected(code);
                    }
                },
                Err(err) => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        file = name,
                        attempt = attempt + 1,
                        max_retries = self.policy.max_retries,
                        delay_secs = delay.as_secs(),
                        error = %err,
                        "Upload failed"
                    );
                    debug!(error = ?err, "Upload error details");
                    self.sleeper.sleep(delay).await;
                }
            }
        }

        self.counters.invalid += 1;
        error!(
            file = name,
            max_retries = self.policy.max_retries,
            "Upload failed after all attempts"
        );
        UploadOutcome::Exhausted
    }

    async fn tag(&self, entry_id: &str, source_id: &FileId, name: &str) {
        if let Err(err) = self.index.tag(entry_id, source_id.as_str()).await {
            warn!(file = name, entry_id, error = %err, "Failed to tag vector store entry");
        }
    }

    async fn cleanup(&self, entry_id: &str, name: &str) {
        match self.index.delete(entry_id).await {
            Ok(()) => info!(file = name, entry_id, "Deleted rejected file from vector store"),
            Err(err) => warn!(
                file = name,
                entry_id,
                error = %err,
                "Failed to delete rejected file from vector store"
            ),
        }
    }
}

impl std::fmt::Debug for UploadCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadCoordinator")
            .field("policy", &self.policy)
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}
