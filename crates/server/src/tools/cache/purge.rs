//! cache_purge tool implementation.
//!
//! Empties one store, or deletes stores that do not belong to the running
//! version.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use stowaway_core::Error;
use stowaway_worker::ServiceWorker;

use crate::tools::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Remove every entry of this store; the store itself is kept.
    #[serde(default)]
    pub store: Option<String>,

    /// Delete every store outside the running version's pair.
    #[serde(default)]
    pub stale_stores: bool,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachePurgeOutput {
    /// Number of entries removed from `store`.
    pub entries_deleted: u64,
    /// Stores deleted outright.
    pub stores_deleted: Vec<String>,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(worker: &ServiceWorker, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    if params.store.is_none() && !params.stale_stores {
        return Err(Error::InvalidInput("At least one of store or stale_stores must be specified".to_string()).into());
    }

    let mut output = CachePurgeOutput { entries_deleted: 0, stores_deleted: Vec::new() };

    if let Some(store) = &params.store {
        output.entries_deleted = worker.db().purge_store(store).await?;
        tracing::info!(store = %store, deleted = output.entries_deleted, "purged cache store");
    }

    if params.stale_stores {
        output.stores_deleted = worker.stores().activate_latest().await?;
    }

    json_result(&output)
}
