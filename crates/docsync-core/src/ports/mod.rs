//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the sync engine
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`ISourceTree`] - Folder listing, metadata and download from the file service
//! - [`IIndexClient`] - Upload, tagging and deletion in the vector store
//! - [`ISyncStateStore`] - Lookup and batch upsert of per-file sync records
//! - [`ISecretsProvider`] - Secrets and run parameters

pub mod index_client;
pub mod secrets;
pub mod source_tree;
pub mod state_store;

pub use index_client::{IIndexClient, IndexUpload};
pub use secrets::ISecretsProvider;
pub use source_tree::{FileInfo, FolderInfo, ISourceTree};
pub use state_store::ISyncStateStore;
