//! Query engine
//!
//! Ties a record store to the executor. The fetch is the only await point;
//! the rest of a query runs synchronously over the fetched snapshot.

use crate::config::EngineConfig;
use crate::executor::QueryExecutor;
use crate::query::Query;
use crate::result::QueryResult;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use vaultql_store::RecordStore;

/// Executes queries against a record store
pub struct QueryEngine<S: RecordStore + ?Sized> {
    store: Arc<S>,
    config: EngineConfig,
}

impl<S: RecordStore + ?Sized> QueryEngine<S> {
    /// Create an engine with the default configuration
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    /// Create an engine with an explicit configuration
    pub fn with_config(store: Arc<S>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The backing store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Execute one query against a vault
    ///
    /// A store failure becomes a failed result carrying the error text; no
    /// stage runs after a failed fetch.
    pub async fn execute_query(&self, query: &Query, vault_key: &str) -> QueryResult {
        let start = Instant::now();

        let snapshot = match self.store.fetch_public_records(vault_key).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Failed to fetch records for vault {}: {}", vault_key, e);
                return QueryResult::failure(e.to_string());
            }
        };
        debug!("Fetched {} records from vault {}", snapshot.len(), vault_key);

        let result = QueryExecutor::new(self.config.clone()).execute(query, &snapshot);

        let elapsed_ms = start.elapsed().as_millis() as u64;
        if elapsed_ms > self.config.slow_query_threshold_ms {
            warn!(
                "Slow query on vault {}: {}ms ({} rows)",
                vault_key,
                elapsed_ms,
                result.row_count()
            );
        }

        result
    }

    /// Execute several queries concurrently; results keep input order
    pub async fn execute_many(&self, queries: &[(Query, String)]) -> Vec<QueryResult> {
        join_all(
            queries
                .iter()
                .map(|(query, vault_key)| self.execute_query(query, vault_key)),
        )
        .await
    }
}

impl<S: RecordStore + ?Sized> Clone for QueryEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}
