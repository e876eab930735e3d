//! cache_get tool implementation.
//!
//! Looks up a cached response by request identity.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use stowaway_core::{CacheDb, Error, RequestKey};
use stowaway_worker::fetch::resolve;
use url::Url;

use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Only look in this store; all stores are searched when absent.
    #[serde(default)]
    pub store: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize)]
pub struct CacheGetOutput {
    pub store: String,
    pub key_hash: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub stored_at: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(cache: &CacheDb, origin: &str, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let origin = Url::parse(origin).map_err(|e| Error::InvalidUrl(format!("origin: {e}")))?;
    let url = resolve(&origin, &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let key = RequestKey::new(&params.method, url.as_str());

    let entry = match &params.store {
        Some(store) => cache.match_in_store(store, &key).await?,
        None => cache.match_any(&key).await?,
    }
    .ok_or_else(|| Error::CacheMiss(key.to_string()))?;

    let output = CacheGetOutput {
        store: entry.store,
        key_hash: entry.key.hash(),
        method: entry.key.method,
        url: entry.key.url,
        status: entry.response.status,
        body: entry.response.text().into_owned(),
        headers: entry.response.headers,
        stored_at: entry.stored_at,
    };
    json_result(&output)
}
