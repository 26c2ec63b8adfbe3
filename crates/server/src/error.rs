//! Errors raised by the tool layer itself.
//!
//! Domain failures arrive as `sworker_core::Error` and carry their own codes;
//! these cover what only a tool call can get wrong.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use sworker_worker::NetworkError;
use sworker_worker::fetch::UrlError;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid input parameters (e.g., an unknown HTTP method).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The URL could not be resolved against the site origin.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(#[from] UrlError),

    /// A passthrough request could not reach the network.
    #[error("NETWORK_ERROR: {0}")]
    Network(#[from] NetworkError),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let (code, message) = match &err {
            ToolError::InvalidInput(msg) => (-32602, msg.clone()),
            ToolError::InvalidUrl(e) => (-32003, e.to_string()),
            ToolError::Network(e) => (-32001, e.to_string()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
