//! vaultql Record Stores
//!
//! A record store hands the query engine an immutable snapshot of every
//! public document record in a vault. Building and refreshing the index is
//! the index builder's job; stores here only persist and serve its output.
//!
//! # Implementations
//!
//! - `InMemoryRecordStore` - process-local store with incremental upserts
//! - `JsonRecordStore` - one JSON snapshot file per vault

pub mod json;
pub mod memory;
pub mod options;
pub mod store;

pub use json::JsonRecordStore;
pub use memory::{InMemoryRecordStore, UpsertOutcome};
pub use options::JsonStoreConfig;
pub use store::{RecordStore, StoredRecord, Visibility};
