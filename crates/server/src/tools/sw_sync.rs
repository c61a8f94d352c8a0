//! sw_sync tool implementation.
//!
//! Fires a background sync event at the worker.

use folio_client::Worker;
use folio_client::worker::CONTACT_SYNC_TAG;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::error::ToolError;

/// Input parameters for the sw_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwSyncParams {
    /// Sync tag (default: "contact-form-sync").
    #[serde(default = "default_tag")]
    pub tag: String,
}

fn default_tag() -> String {
    CONTACT_SYNC_TAG.into()
}

/// Output structure for the sw_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwSyncOutput {
    pub tag: String,
    pub delivered: usize,
    pub failed: usize,
    pub remaining: usize,
}

/// Implementation of the sw_sync tool.
pub async fn sync_impl(worker: &Worker, params: SwSyncParams) -> Result<CallToolResult, McpError> {
    if params.tag.trim().is_empty() {
        return Err(ToolError::InvalidParams("tag cannot be empty".into()).into());
    }

    let outcome = worker.handle_sync(&params.tag).await?;

    let output = SwSyncOutput {
        tag: params.tag,
        delivered: outcome.delivered,
        failed: outcome.failed,
        remaining: outcome.remaining,
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{output, url, worker};
    use folio_core::Response;
    use serde_json::json;

    #[tokio::test]
    async fn test_sync_delivers_queue() {
        let (worker, network) = worker().await;
        network.route(&url("/api/contact"), Response::ok("application/json", "{}"));
        worker.queue_submission(&json!({"email": "ada@example.com"})).await.unwrap();

        let out: SwSyncOutput = output(&sync_impl(&worker, SwSyncParams { tag: default_tag() }).await.unwrap());
        assert_eq!(out.delivered, 1);
        assert_eq!(out.remaining, 0);
    }

    #[tokio::test]
    async fn test_sync_unknown_tag_is_noop() {
        let (worker, _) = worker().await;
        worker.queue_submission(&json!({"email": "ada@example.com"})).await.unwrap();

        let out: SwSyncOutput = output(&sync_impl(&worker, SwSyncParams { tag: "other".into() }).await.unwrap());
        assert_eq!(out.delivered, 0);
        assert_eq!(worker.manager().db().pending_submissions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sync_empty_tag() {
        let (worker, _) = worker().await;
        assert!(sync_impl(&worker, SwSyncParams { tag: " ".into() }).await.is_err());
    }
}
