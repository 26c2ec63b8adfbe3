//! MCP tool implementations.
//!
//! One tool per worker event, plus page sessions and the cache inspection tools.

pub mod cache;
pub mod notification_click;
pub mod session;
pub mod worker_fetch;
pub mod worker_message;
pub mod worker_push;
pub mod worker_sync;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use sworker_core::Error;

pub use cache::{CacheKeysParams, OutboxEnqueueParams};
pub use notification_click::NotificationClickParams;
pub use session::{SessionCloseParams, SessionOpenParams};
pub use worker_fetch::WorkerFetchParams;
pub use worker_message::WorkerMessageParams;
pub use worker_push::WorkerPushParams;
pub use worker_sync::WorkerSyncParams;

/// Wrap a tool output as pretty-printed JSON text.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
