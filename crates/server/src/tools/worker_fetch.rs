//! worker_fetch tool implementation.
//!
//! Dispatches a fetch event through the worker, as a page would.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sworker_core::WorkerRequest;
use sworker_worker::fetch::{Method, header::ACCEPT, resolve};
use sworker_worker::{ServiceWorker, Source};

use super::json_result;
use crate::error::ToolError;

/// Input parameters for the worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchParams {
    /// Absolute URL, or a path resolved against the site origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Optional Accept header, e.g. "text/html" for page navigations.
    #[serde(default)]
    pub accept: Option<String>,

    /// Optional request body, sent only when the request passes through.
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for the worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchOutput {
    /// The resolved request URL.
    pub url: String,
    /// HTTP status code of the response the page receives.
    pub status: u16,
    /// Where the response came from.
    pub source: Source,
    /// Request classification; absent when the request was not intercepted.
    pub classification: Option<String>,
    /// Content-Type header.
    pub content_type: Option<String>,
    /// Response body as text (lossy UTF-8).
    pub body: String,
}

/// Implementation of the worker_fetch tool.
pub async fn fetch_impl(worker: &ServiceWorker, params: WorkerFetchParams) -> Result<CallToolResult, McpError> {
    let url = resolve(&params.url, &worker.router().manifest().origin).map_err(ToolError::from)?;
    let method = Method::from_bytes(params.method.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| ToolError::InvalidInput(format!("unsupported method: {}", params.method)))?;

    let mut request = WorkerRequest::new(method, url);
    if let Some(accept) = params.accept.as_deref() {
        request = request.with_header(ACCEPT, accept);
    }
    if let Some(body) = params.body {
        request = request.with_body(body);
    }

    let handled = worker.fetch(&request).await.map_err(ToolError::from)?;
    let response = handled.response();

    let output = WorkerFetchOutput {
        url: request.url.to_string(),
        status: response.status.as_u16(),
        source: handled.source(),
        classification: handled.kind().map(|k| k.as_str().to_string()),
        content_type: response.content_type().map(str::to_string),
        body: String::from_utf8_lossy(&response.body).to_string(),
    };

    json_result(&output)
}
