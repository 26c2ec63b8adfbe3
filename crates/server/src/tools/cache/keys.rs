//! cache_keys tool implementation.
//!
//! Lists every cache store with its entry count.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sworker_core::StoreInfo;
use sworker_worker::{ServiceWorker, WorkerState};

use crate::tools::json_result;

/// Parameters for the cache_keys tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysParams {}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    /// Current worker lifecycle state.
    pub state: WorkerState,
    /// Stores in creation order.
    pub stores: Vec<StoreInfo>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(worker: &ServiceWorker, _params: CacheKeysParams) -> Result<CallToolResult, McpError> {
    let stores = worker.router().storage().stats().await?;
    json_result(&CacheKeysOutput { state: worker.state().await, stores })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{output, worker};

    #[tokio::test]
    async fn test_keys_after_start() {
        let sw = worker();
        sw.start().await.unwrap();

        let out: CacheKeysOutput = output(&keys_impl(&sw, CacheKeysParams::default()).await.unwrap());
        assert_eq!(out.state, WorkerState::Activated);
        assert_eq!(out.stores.len(), 2);
        let statics = out.stores.iter().find(|s| s.name == "static-cache-v1.0").unwrap();
        assert_eq!(statics.entries, 18);
        let dynamics = out.stores.iter().find(|s| s.name == "dynamic-cache-v1.0").unwrap();
        assert_eq!(dynamics.entries, 3);
    }

    #[tokio::test]
    async fn test_keys_empty() {
        let sw = worker();
        let out: CacheKeysOutput = output(&keys_impl(&sw, CacheKeysParams::default()).await.unwrap());
        assert_eq!(out.state, WorkerState::Parsed);
        assert!(out.stores.is_empty());
    }
}
