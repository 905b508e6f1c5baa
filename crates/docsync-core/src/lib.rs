//! DocSync Core - Domain logic and port definitions
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `FileNode`, `SyncRecord`, `SyncStatus`, `RunCounters`
//! - **Run rules** - cutoff date computation and file name normalization
//! - **Port definitions** - Traits for adapters: `ISourceTree`, `IIndexClient`,
//!   `ISyncStateStore`, `ISecretsProvider`
//! - **Configuration** - YAML-backed settings with validation
//!
//! # Architecture
//!
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement.
//! The sync engine in `docsync-sync` orchestrates domain types through ports.

pub mod config;
pub mod domain;
pub mod ports;
