//! MCP tool implementations.
//!
//! Every `worker_*` tool turns its arguments into one lifecycle event and
//! reports the outcome; `cache_*` tools inspect and maintain the stores.

pub mod cache;
pub mod events;
pub mod fetch;
pub mod lifecycle;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::HostError;

/// Pretty-printed JSON tool result.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(HostError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
