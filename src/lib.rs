//! vaultql - Structured queries over knowledge-vault documents
//!
//! This is the main library crate that re-exports all vaultql components.

pub use vaultql_core as core;
pub use vaultql_query as query;
pub use vaultql_store as store;

// Re-export commonly used types
pub use vaultql_core::{ContentHash, DocumentRecord, Error, Link, OutLink, Result, Value};

pub use vaultql_query::{
    Column, EngineConfig, ExecutionPlan, Operator, Query, QueryEngine, QueryPlanner, QueryResult,
    SortDirection, SortKey, Source, execute,
};
pub use vaultql_store::{
    InMemoryRecordStore, JsonRecordStore, JsonStoreConfig, RecordStore, StoredRecord, Visibility,
};
