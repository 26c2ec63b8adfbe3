//! session_open and session_close tool implementations.
//!
//! Pages of the site register here so the worker can claim them on
//! activation and bring one back to the front from a notification.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sworker_worker::fetch::resolve;
use sworker_worker::{ServiceWorker, Session};

use super::json_result;
use crate::error::ToolError;

/// Input parameters for the session_open tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionOpenParams {
    /// Page URL on the site, absolute or as a path (default: "/").
    #[serde(default = "default_page")]
    pub url: String,
}

fn default_page() -> String {
    "/".into()
}

/// Input parameters for the session_close tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionCloseParams {
    /// Id returned by session_open.
    pub id: u64,
}

/// Output structure for both session tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionOutput {
    /// The page opened, or absent after a close.
    pub session: Option<Session>,
    /// Whether session_close found the page.
    pub closed: bool,
    /// Every page still open.
    pub open: Vec<Session>,
}

/// Implementation of the session_open tool.
pub async fn open_impl(worker: &ServiceWorker, params: SessionOpenParams) -> Result<CallToolResult, McpError> {
    let origin = &worker.router().manifest().origin;
    let url = resolve(&params.url, origin).map_err(ToolError::from)?;
    if url.origin() != origin.origin() {
        return Err(ToolError::InvalidInput(format!("{url} is not a page of {origin}")).into());
    }
    let page = match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    };

    let session = worker.open_page(&page).await;
    json_result(&SessionOutput { session: Some(session), closed: false, open: worker.sessions().list().await })
}

/// Implementation of the session_close tool.
pub async fn close_impl(worker: &ServiceWorker, params: SessionCloseParams) -> Result<CallToolResult, McpError> {
    let closed = worker.close_page(params.id).await;
    json_result(&SessionOutput { session: None, closed, open: worker.sessions().list().await })
}
