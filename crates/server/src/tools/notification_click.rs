//! notification_click tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sworker_worker::{ClickOutcome, ServiceWorker};

use super::json_result;

/// Input parameters for the notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NotificationClickParams {
    /// Id of a shown notification.
    pub id: String,

    /// Action button clicked: "view" or "close". Absent for a body click.
    #[serde(default)]
    pub action: Option<String>,
}

/// Output structure for the notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NotificationClickOutput {
    pub result: ClickOutcome,
}

/// Implementation of the notification_click tool.
pub async fn click_impl(
    worker: &ServiceWorker, params: NotificationClickParams,
) -> Result<CallToolResult, McpError> {
    let result = worker
        .notification_click(&params.id, params.action.as_deref())
        .await?;
    json_result(&NotificationClickOutput { result })
}
