//! sw_message tool implementation.
//!
//! Posts a control message to the worker.

use folio_client::Worker;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// The posted message: the JSON string "skipWaiting" or "clearCache".
    pub message: serde_json::Value,
}

/// Output structure for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageOutput {
    pub accepted: bool,
    pub message: String,
    /// Worker lifecycle state after handling the message.
    pub state: String,
}

/// Implementation of the sw_message tool.
pub async fn message_impl(worker: &Worker, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    let message = worker.post_message(&params.message).await?;

    let output =
        SwMessageOutput { accepted: true, message: message.to_string(), state: worker.state().await.to_string() };
    json_result(&output)
}
