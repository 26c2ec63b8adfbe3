//! worker_message tool implementation.
//!
//! Posts a control message to the worker. Unrecognised message types are
//! ignored, as the worker itself does.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sworker_worker::{CleanupReport, ControlMessage, ServiceWorker};

use super::json_result;

/// Input parameters for the worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageParams {
    /// Message type, e.g. "CACHE_CLEANUP".
    #[serde(rename = "type")]
    pub kind: String,
}

/// Output structure for the worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageOutput {
    /// Whether the worker recognised the message.
    pub handled: bool,
    /// Store names deleted by a cleanup.
    pub deleted: Vec<String>,
    /// Store names left in place.
    pub kept: Vec<String>,
}

/// Implementation of the worker_message tool.
pub async fn message_impl(worker: &ServiceWorker, params: WorkerMessageParams) -> Result<CallToolResult, McpError> {
    let output = match ControlMessage::from_type(params.kind.trim()) {
        Some(message) => {
            let CleanupReport { deleted, kept } = worker.message(message).await?;
            WorkerMessageOutput { handled: true, deleted, kept }
        }
        None => {
            tracing::debug!("ignoring unknown message type {:?}", params.kind);
            WorkerMessageOutput { handled: false, deleted: Vec::new(), kept: Vec::new() }
        }
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{output, worker};
    use sworker_core::CacheStorage;

    #[tokio::test]
    async fn test_cache_cleanup_message() {
        let sw = worker();
        sw.router().storage().open("static-cache-v0.1").await.unwrap();
        sw.router().storage().open("static-cache-v1.0").await.unwrap();

        let result = message_impl(&sw, WorkerMessageParams { kind: "CACHE_CLEANUP".into() })
            .await
            .unwrap();
        let out: WorkerMessageOutput = output(&result);
        assert!(out.handled);
        assert_eq!(out.deleted, vec!["static-cache-v0.1".to_string()]);
        assert_eq!(out.kept, vec!["static-cache-v1.0".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_message_ignored() {
        let sw = worker();
        sw.router().storage().open("leftover").await.unwrap();

        let result = message_impl(&sw, WorkerMessageParams { kind: "SKIP_WAITING".into() })
            .await
            .unwrap();
        let out: WorkerMessageOutput = output(&result);
        assert!(!out.handled);
        assert_eq!(sw.router().storage().keys().await.unwrap(), vec!["leftover".to_string()]);
    }
}
