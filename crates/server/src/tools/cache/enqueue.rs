//! outbox_enqueue tool implementation.
//!
//! Queues a contact-form submission for the next background sync.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sworker_core::Error;
use sworker_worker::fetch::resolve;
use sworker_worker::{CONTACT_FORM_SYNC, ServiceWorker};

use crate::error::ToolError;
use crate::tools::json_result;

/// Parameters for the outbox_enqueue tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OutboxEnqueueParams {
    /// Form action URL, absolute or relative to the site origin.
    pub url: String,

    /// Raw request body.
    pub body: String,

    /// Content-Type of the body (default: application/x-www-form-urlencoded).
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Output from the outbox_enqueue tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OutboxEnqueueOutput {
    /// Outbox id of the queued submission.
    pub id: i64,
    /// Sync tag that will replay it.
    pub tag: String,
}

/// Implementation of the outbox_enqueue tool.
pub async fn enqueue_impl(worker: &ServiceWorker, params: OutboxEnqueueParams) -> Result<CallToolResult, McpError> {
    let outbox = worker
        .outbox()
        .ok_or_else(|| Error::InvalidState("no outbox is attached to the worker".into()))?;
    let url = resolve(&params.url, &worker.router().manifest().origin).map_err(ToolError::from)?;
    let content_type = params
        .content_type
        .as_deref()
        .unwrap_or("application/x-www-form-urlencoded");

    let id = outbox
        .enqueue_submission(CONTACT_FORM_SYNC, "POST", url.as_str(), Some(content_type), params.body.as_bytes())
        .await?;
    tracing::info!(id, "queued submission to {} for background sync", url);

    json_result(&OutboxEnqueueOutput { id, tag: CONTACT_FORM_SYNC.to_string() })
}
