//! vaultql Core Library
//!
//! This crate provides the fundamental types and error handling shared by
//! the vaultql record stores and query engine.
//!
//! # Modules
//!
//! - `value` - The front-matter value union (`Value`) and link values
//! - `record` - Indexed document records as supplied by a record store
//! - `error` - Error types and result aliases

pub mod error;
pub mod record;
pub mod value;

pub use error::{Error, Result};
pub use record::{ContentHash, DocumentRecord, OutLink};
pub use value::{Link, Value};
