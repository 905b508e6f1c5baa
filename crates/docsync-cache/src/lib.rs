//! DocSync Cache - Sync state persistence
//!
//! SQLite-backed store of the last-processed state of every source file.
//!
//! ## Architecture
//!
//! This crate implements the `ISyncStateStore` port from `docsync-core`
//! using SQLite as the storage backend. It is a driven (secondary) adapter
//! in the hexagonal architecture.
//!
//! ## Key Components
//!
//! - [`DatabasePool`] - Connection pool setup
//! - [`SqliteSyncStateStore`] - `ISyncStateStore` implementation over one table
//! - [`CacheError`] - Error types for cache operations
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use docsync_cache::{DatabasePool, SqliteSyncStateStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/var/lib/docsync/vector_store_files.db")).await?;
//! let store = SqliteSyncStateStore::open(pool.pool().clone(), "hr_docs_files_dev").await?;
//! // Use store as ISyncStateStore...
//! # Ok(())
//! # }
//! ```

pub mod pool;
pub mod store;

pub use pool::DatabasePool;
pub use store::SqliteSyncStateStore;

/// Errors that can occur during cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Creating the state table failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// The table name is not a plain SQL identifier
    #[error("Invalid table name: {0:?}")]
    InvalidTableName(String),

    /// A stored value could not be converted back to a domain type
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for CacheError {
    fn from(e: sqlx::Error) -> Self {
        CacheError::QueryFailed(e.to_string())
    }
}
