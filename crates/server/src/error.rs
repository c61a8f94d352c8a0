//! Structured errors for the folio-sw server.
//!
//! Worker and cache errors convert through `folio_core::Error`; these cover
//! tool parameters that never reach the worker.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Tool-level errors of the folio-sw server.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid or conflicting tool parameters.
    #[error("INVALID_PARAMS: {0}")]
    InvalidParams(String),

    /// Tool output could not be serialized.
    #[error("OUTPUT_FAILED: {0}")]
    Output(String),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let code = match &err {
            ToolError::InvalidParams(_) => -32602,
            ToolError::Output(_) => -32603,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::Output(err.to_string())
    }
}
