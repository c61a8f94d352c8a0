//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use folio_client::Worker;
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

use crate::tools::cache::{CacheGetParams, CachePurgeParams, get_impl, purge_impl};
use crate::tools::contact_queue::{ContactQueueParams, queue_impl};
use crate::tools::sw_fetch::{SwFetchParams, fetch_impl};
use crate::tools::sw_message::{SwMessageParams, message_impl};
use crate::tools::sw_push::{SwPushParams, push_impl};
use crate::tools::sw_status::status_impl;
use crate::tools::sw_sync::{SwSyncParams, sync_impl};

/// The main MCP server handler for folio-sw.
#[derive(Clone)]
pub struct FolioServer {
    worker: Arc<Worker>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl FolioServer {
    /// Create a new server handler around a started worker.
    pub fn new(worker: Arc<Worker>) -> Self {
        Self { worker, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Fetch a URL through the offline worker. Reports whether it was intercepted, the caching strategy used and where the response came from (network, cache or synthetic fallback)."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, params.0).await
    }

    #[tool(description = "Post a control message to the worker: \"skipWaiting\" or \"clearCache\".")]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.worker, params.0).await
    }

    #[tool(description = "Show the worker lifecycle state, its caches with entry counts, and the sync queue length.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.worker).await
    }

    #[tool(description = "Deliver a push message and return the notification the worker shows.")]
    async fn sw_push(&self, params: Parameters<SwPushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.worker, params.0).await
    }

    #[tool(description = "Fire a background sync event. \"contact-form-sync\" replays queued contact form submissions.")]
    async fn sw_sync(&self, params: Parameters<SwSyncParams>) -> Result<CallToolResult, McpError> {
        sync_impl(&self.worker, params.0).await
    }

    #[tool(description = "Queue a contact form submission for background sync, or list the queue.")]
    async fn contact_queue(&self, params: Parameters<ContactQueueParams>) -> Result<CallToolResult, McpError> {
        queue_impl(&self.worker, params.0).await
    }

    #[tool(description = "Read a stored response by URL, or list the keys of a named cache.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.worker, params.0).await
    }

    #[tool(description = "Delete a cache entry, trim a cache to N entries, delete a cache, or clear all caches.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.worker, params.0).await
    }
}

impl ServerHandler for FolioServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "folio-sw".into(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::worker;

    #[tokio::test]
    async fn test_all_tools_listed() {
        let (worker, _) = worker().await;
        let server = FolioServer::new(worker);

        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(
            names,
            vec!["cache_get", "cache_purge", "contact_queue", "sw_fetch", "sw_message", "sw_push", "sw_status", "sw_sync"]
        );
    }
}
