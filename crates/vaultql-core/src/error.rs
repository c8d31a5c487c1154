//! Error types for vaultql
//!
//! Only the record-store boundary can fail. Field resolution, predicate
//! evaluation and the pipeline stages are total and never produce these.

use thiserror::Error;

/// The main error type for vaultql operations
#[derive(Error, Debug)]
pub enum Error {
    // ========== Storage Errors ==========
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Vault not found: {0}")]
    VaultNotFound(String),

    #[error("Invalid vault key: {0}")]
    InvalidVaultKey(String),

    // ========== Serialization Errors ==========
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ========== IO Errors ==========
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ========== Configuration Errors ==========
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ========== Internal Errors ==========
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for vaultql operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns true if the caller may retry the failed store operation
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Storage(_) | Error::Io(_))
    }

    /// Returns true if the addressed vault does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::VaultNotFound(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Deserialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::VaultNotFound("notes".to_string());
        assert_eq!(err.to_string(), "Vault not found: notes");
    }

    #[test]
    fn test_error_recoverable() {
        assert!(Error::Storage("unreachable".to_string()).is_recoverable());
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        assert!(Error::from(io).is_recoverable());
        assert!(!Error::InvalidVaultKey("../x".to_string()).is_recoverable());
    }

    #[test]
    fn test_error_not_found() {
        assert!(Error::VaultNotFound("v".to_string()).is_not_found());
        assert!(!Error::Storage("v".to_string()).is_not_found());
    }

    #[test]
    fn test_json_error_conversion() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(Error::from(err), Error::Deserialization(_)));
    }
}
