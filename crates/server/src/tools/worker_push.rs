//! worker_push tool implementation.
//!
//! Delivers a push message; the worker shows a notification for it.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sworker_worker::{Notification, ServiceWorker};

use super::json_result;

/// Input parameters for the worker_push tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerPushParams {
    /// Push payload text. Absent or empty uses the default body.
    #[serde(default)]
    pub body: Option<String>,
}

/// Output structure for the worker_push tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerPushOutput {
    /// The notification that was shown.
    pub notification: Notification,
}

/// Implementation of the worker_push tool.
pub async fn push_impl(worker: &ServiceWorker, params: WorkerPushParams) -> Result<CallToolResult, McpError> {
    let notification = worker.push(params.body.as_deref()).await;
    json_result(&WorkerPushOutput { notification })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{output, worker};

    #[tokio::test]
    async fn test_push_shows_notification() {
        let sw = worker();
        let result = push_impl(&sw, WorkerPushParams { body: Some("New case study".into()) })
            .await
            .unwrap();
        let out: WorkerPushOutput = output(&result);

        assert_eq!(out.notification.body, "New case study");
        assert_eq!(out.notification.title, "Ahmed Portfolio Update");
        assert_eq!(sw.notifications().await, vec![out.notification]);
    }

    #[tokio::test]
    async fn test_push_without_body() {
        let sw = worker();
        let out: WorkerPushOutput = output(&push_impl(&sw, WorkerPushParams { body: None }).await.unwrap());
        assert_eq!(out.notification.body, "Portfolio update available");
    }
}
