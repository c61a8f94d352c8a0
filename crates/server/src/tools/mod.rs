//! MCP tool implementations.
//!
//! Each tool is a plain `*_impl` function over a [`folio_client::Worker`] so
//! it can be tested without a transport.

pub mod cache;
pub mod contact_queue;
pub mod sw_fetch;
pub mod sw_message;
pub mod sw_push;
pub mod sw_status;
pub mod sw_sync;

use folio_core::Response;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ToolError;

/// Render a tool output as pretty-printed JSON text.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(ToolError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Body as text for textual content types; binary bodies are only counted.
pub(crate) fn body_text(response: &Response) -> Option<String> {
    let content_type = response.content_type().unwrap_or("text/plain").to_ascii_lowercase();
    let textual = content_type.starts_with("text/")
        || ["json", "xml", "javascript", "svg"]
            .iter()
            .any(|marker| content_type.contains(marker));
    textual.then(|| String::from_utf8_lossy(&response.body).into_owned())
}
