//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::tools::cache::{CacheGetParams, CachePurgeParams, get_impl, purge_impl, stores_impl};
use crate::tools::events::{
    WorkerMessageParams, WorkerNotificationClickParams, WorkerPushParams, WorkerSyncParams, message_impl,
    notification_click_impl, push_impl, sync_impl,
};
use crate::tools::fetch::{WorkerFetchParams, fetch_impl};
use crate::tools::lifecycle::{WorkerInstallParams, activate_impl, install_impl};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use std::sync::Arc;
use stowaway_worker::ServiceWorker;

/// The main MCP server handler for stowaway.
#[derive(Clone)]
pub struct StowawayServer {
    worker: Arc<ServiceWorker>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl StowawayServer {
    /// Create a new server handler around one worker.
    pub fn new(worker: Arc<ServiceWorker>) -> Self {
        Self { worker, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Install the worker: fetch the install manifest into the static cache store. All-or-nothing. Activates immediately when the worker skips waiting."
    )]
    async fn worker_install(&self, params: Parameters<WorkerInstallParams>) -> Result<CallToolResult, McpError> {
        install_impl(&self.worker, params.0).await
    }

    #[tool(description = "Activate the installed worker: delete cache stores of other versions and claim clients.")]
    async fn worker_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.worker).await
    }

    #[tool(
        description = "Send a request through the worker. Returns the strategy used, where the response came from, and the response itself."
    )]
    async fn worker_fetch(&self, params: Parameters<WorkerFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, params.0).await
    }

    #[tool(description = "Fire a background sync event. Tag \"background-sync\" replays queued offline writes.")]
    async fn worker_sync(&self, params: Parameters<WorkerSyncParams>) -> Result<CallToolResult, McpError> {
        sync_impl(&self.worker, params.0).await
    }

    #[tool(description = "Deliver a push message. Returns the notification the host should show.")]
    async fn worker_push(&self, params: Parameters<WorkerPushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.worker, params.0).await
    }

    #[tool(description = "Report a notification click. Returns whether to open a window and where.")]
    async fn worker_notification_click(
        &self, params: Parameters<WorkerNotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        notification_click_impl(&self.worker, params.0).await
    }

    #[tool(description = "Post a message to the worker. Supports {\"type\":\"SKIP_WAITING\"} and {\"type\":\"GET_VERSION\"}.")]
    async fn worker_message(&self, params: Parameters<WorkerMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.worker, params.0).await
    }

    #[tool(description = "List cache stores with entry counts, the worker state and queued writes.")]
    async fn cache_stores(&self) -> Result<CallToolResult, McpError> {
        stores_impl(&self.worker).await
    }

    #[tool(description = "Look up a cached response by method and URL, in one store or across all stores.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(self.worker.db(), &self.worker.config().origin, params.0).await
    }

    #[tool(description = "Empty one cache store, or delete stores that belong to other versions.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.worker, params.0).await
    }
}

impl ServerHandler for StowawayServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "stowaway".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(format!("Offline cache worker for {}.", self.worker.config().app_name)),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
