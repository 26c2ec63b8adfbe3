//! sworker server entry point.
//!
//! Boots the worker (install + activate) and exposes its event handlers
//! as MCP tools on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use sworker_core::{AppConfig, CacheDb};
use sworker_worker::{FetchConfig, HttpFetcher, Router, ServiceWorker};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(origin = %config.origin, version = %config.cache_version, "starting sworker on stdio transport");

    let db = CacheDb::open(&config.db_path).await?;
    let fetcher = HttpFetcher::new(FetchConfig::from(&config))?;
    let router = Router::new(config.manifest()?, config.store_names(), Arc::new(db.clone()), Arc::new(fetcher));
    let worker = ServiceWorker::new(router).with_outbox(db);

    if let Err(e) = worker.start().await {
        tracing::warn!("worker did not activate, requests will pass through: {}", e);
    }

    let handler = handler::SworkerServer::new(Arc::new(worker));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
