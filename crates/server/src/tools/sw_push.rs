//! sw_push tool implementation.
//!
//! Delivers a push message to the worker and returns the notification it
//! shows.

use folio_client::Worker;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for the sw_push tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwPushParams {
    /// Raw push data, normally JSON like `{"title": "...", "body": "..."}`.
    /// Omit for a push without data.
    #[serde(default)]
    pub data: Option<String>,
}

/// Output structure for the sw_push tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwPushOutput {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
}

/// Implementation of the sw_push tool.
pub async fn push_impl(worker: &Worker, params: SwPushParams) -> Result<CallToolResult, McpError> {
    let notification = worker.handle_push(params.data.as_deref().map(str::as_bytes));

    let output = SwPushOutput {
        title: notification.title,
        body: notification.body,
        icon: notification.icon,
        badge: notification.badge,
        vibrate: notification.vibrate,
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{output, worker};

    #[tokio::test]
    async fn test_push_with_payload() {
        let (worker, _) = worker().await;
        let params = SwPushParams { data: Some(r#"{"title":"New project","body":"Check it out"}"#.into()) };

        let out: SwPushOutput = output(&push_impl(&worker, params).await.unwrap());
        assert_eq!(out.title, "New project");
        assert_eq!(out.body, "Check it out");
        assert_eq!(out.vibrate, vec![200, 100, 200]);
    }

    #[tokio::test]
    async fn test_push_without_data() {
        let (worker, _) = worker().await;

        let out: SwPushOutput = output(&push_impl(&worker, SwPushParams { data: None }).await.unwrap());
        assert_eq!(out.title, "Portfolio Update");
        assert_eq!(out.body, "New update available");
        assert_eq!(out.icon, "/icon-192.png");
    }
}
