//! cache_stores tool implementation.
//!
//! Lists every cache store with its entry count.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde::Serialize;
use stowaway_worker::{ServiceWorker, WorkerState};

use crate::tools::json_result;

#[derive(Debug, Clone, Serialize)]
pub struct StoreSummary {
    pub name: String,
    pub entries: u64,
    /// Whether the store belongs to the running version.
    pub current: bool,
}

/// Output from the cache_stores tool.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStoresOutput {
    pub version: String,
    pub state: WorkerState,
    pub stores: Vec<StoreSummary>,
    pub pending_writes: usize,
}

/// Implementation of the cache_stores tool.
pub async fn stores_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let db = worker.db();
    let config = worker.config();
    let current = [config.static_store(), config.dynamic_store()];

    let mut stores = Vec::new();
    for name in db.store_names().await? {
        let entries = db.entry_count(&name).await?;
        stores.push(StoreSummary { current: current.contains(&name), name, entries });
    }

    let output = CacheStoresOutput {
        version: worker.version_id(),
        state: worker.state().await,
        stores,
        pending_writes: db.pending_writes().await?.len(),
    };
    json_result(&output)
}
