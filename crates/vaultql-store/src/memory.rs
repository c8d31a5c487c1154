//! In-memory record store
//!
//! Keeps each vault's records in insertion order. Upserts compare content
//! hashes so re-indexing an unchanged document is a no-op.

use crate::store::{RecordStore, StoredRecord, Visibility};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;
use vaultql_core::{DocumentRecord, Result};

/// Outcome of an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No record existed at this path
    Inserted,
    /// An existing record was replaced
    Updated,
    /// Same content hash and visibility; nothing was written
    Unchanged,
}

/// Process-local record store
pub struct InMemoryRecordStore {
    vaults: tokio::sync::RwLock<HashMap<String, Vec<StoredRecord>>>,
}

impl InMemoryRecordStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            vaults: tokio::sync::RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace the record at `record.path`
    pub async fn upsert(
        &self,
        vault_key: &str,
        record: DocumentRecord,
        visibility: Visibility,
    ) -> UpsertOutcome {
        let mut vaults = self.vaults.write().await;
        let records = vaults.entry(vault_key.to_string()).or_default();

        match records.iter_mut().find(|r| r.record.path == record.path) {
            Some(existing)
                if existing.record.content_hash == record.content_hash
                    && existing.visibility() == visibility =>
            {
                debug!("Skipped unchanged record {} in vault {}", record.path, vault_key);
                UpsertOutcome::Unchanged
            }
            Some(existing) => {
                debug!("Updated record {} in vault {}", record.path, vault_key);
                *existing = StoredRecord::new(record, visibility);
                UpsertOutcome::Updated
            }
            None => {
                debug!("Inserted record {} in vault {}", record.path, vault_key);
                records.push(StoredRecord::new(record, visibility));
                UpsertOutcome::Inserted
            }
        }
    }

    /// Remove the record at `path`; returns whether one existed
    pub async fn remove(&self, vault_key: &str, path: &str) -> bool {
        let mut vaults = self.vaults.write().await;
        let Some(records) = vaults.get_mut(vault_key) else {
            return false;
        };
        let before = records.len();
        records.retain(|r| r.record.path != path);
        records.len() != before
    }

    /// Number of records (public and private) in a vault
    pub async fn record_count(&self, vault_key: &str) -> usize {
        let vaults = self.vaults.read().await;
        vaults.get(vault_key).map(Vec::len).unwrap_or(0)
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn fetch_public_records(&self, vault_key: &str) -> Result<Vec<DocumentRecord>> {
        let vaults = self.vaults.read().await;
        Ok(vaults
            .get(vault_key)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| !r.private)
                    .map(|r| r.record.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}
