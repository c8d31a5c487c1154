//! JSON snapshot record store
//!
//! Each vault is one file `<root>/<vault_key>.<extension>` holding a JSON
//! array of stored records. Snapshots are replaced atomically (write to a
//! temporary sibling, then rename), so a reader sees either the old or the
//! new snapshot.

use crate::options::JsonStoreConfig;
use crate::store::{RecordStore, StoredRecord};
use async_trait::async_trait;
use tracing::{debug, info, warn};
use vaultql_core::{DocumentRecord, Error, Result};

/// File-backed record store
pub struct JsonRecordStore {
    config: JsonStoreConfig,
}

impl JsonRecordStore {
    /// Open a store rooted at `config.root`, creating the directory if needed
    pub async fn open(config: JsonStoreConfig) -> Result<Self> {
        tokio::fs::create_dir_all(&config.root).await?;
        info!("Opened JSON record store at {:?}", config.root);
        Ok(Self { config })
    }

    /// Get the store configuration
    pub fn config(&self) -> &JsonStoreConfig {
        &self.config
    }

    /// Replace the snapshot of a vault
    pub async fn write_snapshot(&self, vault_key: &str, records: &[StoredRecord]) -> Result<()> {
        validate_vault_key(vault_key)?;

        let bytes = serde_json::to_vec_pretty(records)
            .map_err(|e| Error::Serialization(format!("Failed to encode snapshot: {}", e)))?;

        let path = self.config.snapshot_path(vault_key);
        let tmp = path.with_extension(format!("{}.tmp", self.config.extension));
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!("Wrote {} records to {:?}", records.len(), path);
        Ok(())
    }

    async fn read_snapshot(&self, vault_key: &str) -> Result<Vec<StoredRecord>> {
        validate_vault_key(vault_key)?;

        let path = self.config.snapshot_path(vault_key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::VaultNotFound(vault_key.to_string()));
            }
            Err(e) => {
                warn!("Failed to read snapshot {:?}: {}", path, e);
                return Err(Error::Io(e));
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            Error::Deserialization(format!("Malformed snapshot for vault {}: {}", vault_key, e))
        })
    }
}

/// Reject keys that could escape the store root
fn validate_vault_key(vault_key: &str) -> Result<()> {
    if vault_key.is_empty()
        || vault_key.contains('/')
        || vault_key.contains('\\')
        || vault_key.contains("..")
    {
        return Err(Error::InvalidVaultKey(vault_key.to_string()));
    }
    Ok(())
}

#[async_trait]
impl RecordStore for JsonRecordStore {
    async fn fetch_public_records(&self, vault_key: &str) -> Result<Vec<DocumentRecord>> {
        let stored = self.read_snapshot(vault_key).await?;
        let total = stored.len();
        let records: Vec<DocumentRecord> = stored
            .into_iter()
            .filter(|r| !r.private)
            .map(|r| r.record)
            .collect();
        debug!(
            "Loaded {} public of {} records from vault {}",
            records.len(),
            total,
            vault_key
        );
        Ok(records)
    }
}
