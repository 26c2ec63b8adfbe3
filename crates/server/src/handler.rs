//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the worker's event handlers.
use std::sync::Arc;

use crate::tools::{
    CacheKeysParams, NotificationClickParams, OutboxEnqueueParams, SessionCloseParams, SessionOpenParams,
    WorkerFetchParams, WorkerMessageParams, WorkerPushParams, WorkerSyncParams, cache, notification_click, session,
    worker_fetch, worker_message, worker_push, worker_sync,
};

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
use sworker_worker::ServiceWorker;

/// The main MCP server handler for sworker.
#[derive(Clone)]
pub struct SworkerServer {
    worker: Arc<ServiceWorker>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl SworkerServer {
    /// Create a new server handler around a started worker.
    pub fn new(worker: Arc<ServiceWorker>) -> Self {
        Self { worker, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Dispatch a fetch event through the worker. Returns status, source (network, cache, offline or passthrough), classification and body."
    )]
    async fn worker_fetch(&self, params: Parameters<WorkerFetchParams>) -> Result<CallToolResult, McpError> {
        worker_fetch::fetch_impl(&self.worker, params.0).await
    }

    #[tool(description = "Post a control message to the worker. CACHE_CLEANUP deletes every stale cache store.")]
    async fn worker_message(&self, params: Parameters<WorkerMessageParams>) -> Result<CallToolResult, McpError> {
        worker_message::message_impl(&self.worker, params.0).await
    }

    #[tool(description = "Deliver a push message. The worker shows a notification and returns it.")]
    async fn worker_push(&self, params: Parameters<WorkerPushParams>) -> Result<CallToolResult, McpError> {
        worker_push::push_impl(&self.worker, params.0).await
    }

    #[tool(description = "Click a shown notification, optionally on its view or close action.")]
    async fn notification_click(
        &self, params: Parameters<NotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        notification_click::click_impl(&self.worker, params.0).await
    }

    #[tool(
        description = "Open a page of the site. Pages opened after activation are controlled by the worker; earlier ones are claimed on activation."
    )]
    async fn session_open(&self, params: Parameters<SessionOpenParams>) -> Result<CallToolResult, McpError> {
        session::open_impl(&self.worker, params.0).await
    }

    #[tool(description = "Close a page opened with session_open.")]
    async fn session_close(&self, params: Parameters<SessionCloseParams>) -> Result<CallToolResult, McpError> {
        session::close_impl(&self.worker, params.0).await
    }

    #[tool(description = "Fire a background sync event. contact-form-sync replays queued contact-form submissions.")]
    async fn worker_sync(&self, params: Parameters<WorkerSyncParams>) -> Result<CallToolResult, McpError> {
        worker_sync::sync_impl(&self.worker, params.0).await
    }

    #[tool(description = "Queue a contact-form submission for the next contact-form-sync.")]
    async fn outbox_enqueue(&self, params: Parameters<OutboxEnqueueParams>) -> Result<CallToolResult, McpError> {
        cache::enqueue_impl(&self.worker, params.0).await
    }

    #[tool(description = "List cache stores with their entry counts and the worker's lifecycle state.")]
    async fn cache_keys(&self, params: Parameters<CacheKeysParams>) -> Result<CallToolResult, McpError> {
        cache::keys_impl(&self.worker, params.0).await
    }
}

impl ServerHandler for SworkerServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "sworker".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
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
