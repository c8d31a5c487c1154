//! Record store abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vaultql_core::{DocumentRecord, Result};

/// Whether a document may be returned to query callers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// A record as persisted, together with its visibility flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    #[serde(flatten)]
    pub record: DocumentRecord,

    #[serde(default, skip_serializing_if = "is_public")]
    pub private: bool,
}

fn is_public(private: &bool) -> bool {
    !*private
}

impl StoredRecord {
    /// Wrap a record with the given visibility
    pub fn new(record: DocumentRecord, visibility: Visibility) -> Self {
        Self {
            record,
            private: visibility == Visibility::Private,
        }
    }

    /// Visibility of this record
    pub fn visibility(&self) -> Visibility {
        if self.private {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }
}

/// Source of document-record snapshots
///
/// Implementations must never return private records, must be safe to call
/// repeatedly, and must report failure as `Err` rather than an empty vault.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch every public record of a vault
    async fn fetch_public_records(&self, vault_key: &str) -> Result<Vec<DocumentRecord>>;
}
