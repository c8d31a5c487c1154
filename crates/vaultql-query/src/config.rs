//! Engine configuration

use serde::{Deserialize, Serialize};

/// Query engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Hard ceiling on returned rows (or groups), applied on top of a query's own limit
    pub max_limit: Option<usize>,

    /// Queries slower than this are logged at warn level
    pub slow_query_threshold_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_limit: None,
            slow_query_threshold_ms: 500,
        }
    }
}

impl EngineConfig {
    /// Create a default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration for tests: no ceiling, never warns
    pub fn for_testing() -> Self {
        Self {
            max_limit: None,
            slow_query_threshold_ms: u64::MAX,
        }
    }

    /// Builder: set the row ceiling; zero removes it
    pub fn max_limit(mut self, limit: usize) -> Self {
        self.max_limit = (limit > 0).then_some(limit);
        self
    }

    /// Builder: set the slow-query threshold
    pub fn slow_query_threshold_ms(mut self, ms: u64) -> Self {
        self.slow_query_threshold_ms = ms;
        self
    }

    /// Combine a query's limit with the configured ceiling
    pub fn effective_limit(&self, requested: Option<usize>) -> Option<usize> {
        match (requested, self.max_limit) {
            (Some(r), Some(m)) => Some(r.min(m)),
            (r, m) => r.or(m),
        }
    }
}
