//! Store configuration options

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Options for the JSON snapshot store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonStoreConfig {
    /// Directory holding one snapshot file per vault
    pub root: PathBuf,

    /// Snapshot file extension, without the dot
    pub extension: String,
}

impl Default for JsonStoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./index"),
            extension: "json".to_string(),
        }
    }
}

impl JsonStoreConfig {
    /// Create options for snapshots under `root`
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Create options for a temporary test directory
    pub fn for_testing<P: Into<PathBuf>>(root: P) -> Self {
        Self::new(root).extension("test.json")
    }

    /// Builder: set the snapshot file extension
    pub fn extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Snapshot file path for a vault key (the key must already be validated)
    pub fn snapshot_path(&self, vault_key: &str) -> PathBuf {
        self.root.join(format!("{}.{}", vault_key, self.extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = JsonStoreConfig::default();
        assert_eq!(config.extension, "json");
        assert_eq!(config.snapshot_path("notes"), PathBuf::from("./index/notes.json"));
    }

    #[test]
    fn test_builder() {
        let config = JsonStoreConfig::new("/data").extension(".idx");
        assert_eq!(config.snapshot_path("v"), PathBuf::from("/data/v.idx"));
    }
}
