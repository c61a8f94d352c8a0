//! contact_queue tool implementation.
//!
//! Queues a contact form submission for background sync, or lists the
//! queue when no payload is given.

use folio_client::Worker;
use folio_core::PendingSubmission;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::error::ToolError;

/// Input parameters for the contact_queue tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ContactQueueParams {
    /// Form fields as a JSON object. Omit to only list the queue.
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

/// Output structure for the contact_queue tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ContactQueueOutput {
    /// Id of the submission just queued.
    pub queued: Option<i64>,
    /// Queue contents, oldest first.
    pub pending: Vec<PendingSubmission>,
}

/// Implementation of the contact_queue tool.
pub async fn queue_impl(worker: &Worker, params: ContactQueueParams) -> Result<CallToolResult, McpError> {
    let queued = match params.payload {
        Some(payload) if payload.is_object() => Some(worker.queue_submission(&payload).await?),
        Some(_) => return Err(ToolError::InvalidParams("payload must be a JSON object".into()).into()),
        None => None,
    };

    let pending = worker.manager().db().pending_submissions().await?;
    json_result(&ContactQueueOutput { queued, pending })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{output, worker};
    use serde_json::json;

    #[tokio::test]
    async fn test_queue_and_list() {
        let (worker, _) = worker().await;
        let params = ContactQueueParams { payload: Some(json!({"name": "Ada", "message": "hello"})) };

        let out: ContactQueueOutput = output(&queue_impl(&worker, params).await.unwrap());
        assert!(out.queued.is_some());
        assert_eq!(out.pending.len(), 1);
        assert_eq!(out.pending[0].payload["name"], "Ada");
        assert_eq!(out.pending[0].attempts, 0);

        let listed: ContactQueueOutput = output(&queue_impl(&worker, ContactQueueParams { payload: None }).await.unwrap());
        assert!(listed.queued.is_none());
        assert_eq!(listed.pending.len(), 1);
    }

    #[tokio::test]
    async fn test_queue_rejects_non_object() {
        let (worker, _) = worker().await;
        let params = ContactQueueParams { payload: Some(json!("just text")) };
        assert!(queue_impl(&worker, params).await.is_err());
    }
}
