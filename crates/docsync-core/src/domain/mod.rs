//! Domain entities and business rules
//!
//! This module contains the core domain types for DocSync:
//! - Newtypes for source-system identifiers
//! - Source tree entries (`FileNode`)
//! - Persisted per-file outcomes (`SyncRecord`, `SyncStatus`)
//! - Run-scoped state (`RunClock`, `RunCounters`)
//! - File name normalization and extension filtering
//! - Domain-specific error types

pub mod errors;
pub mod file_node;
pub mod naming;
pub mod newtypes;
pub mod run;
pub mod sync_record;

pub use errors::DomainError;
pub use file_node::{FileNode, NodeKind};
pub use naming::ExtensionFilter;
pub use newtypes::{FileId, FolderId};
pub use run::{compute_cutoff, localize_in, parse_timezone, RunClock, RunCounters};
pub use sync_record::{SyncRecord, SyncStatus};
