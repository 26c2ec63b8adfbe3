//! worker_sync tool implementation.
//!
//! Fires a background sync event with the given tag.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sworker_worker::{ServiceWorker, SyncReport};

use super::json_result;

/// Input parameters for the worker_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerSyncParams {
    /// Sync tag, e.g. "contact-form-sync".
    pub tag: String,
}

/// Implementation of the worker_sync tool.
pub async fn sync_impl(worker: &ServiceWorker, params: WorkerSyncParams) -> Result<CallToolResult, McpError> {
    let report: SyncReport = worker.sync(params.tag.trim()).await?;
    json_result(&report)
}
