//! Caching strategies.
//!
//! Each strategy is a plain async function from a request to an
//! [`Outcome`]. None of them can fail: transport errors turn into a cache
//! fallback or a synthetic 503, and storage errors are logged and treated
//! as a miss (reads) or skipped (writes).

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sworker_core::{CacheStorage, RequestKind, StoreNames, WorkerRequest, WorkerResponse};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::fetch::Fetcher;

/// Body of the 503 returned by cache-first when nothing can answer.
pub const CACHE_FIRST_UNAVAILABLE: &str = "Offline content unavailable";

/// Body of the 503 returned by stale-while-revalidate without a copy.
pub const REVALIDATE_UNAVAILABLE: &str = "Service Unavailable";

/// Body of the 503 returned by the network-first strategies.
pub const OFFLINE: &str = "Offline";

/// How a request was resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Fresh response from the network, whatever its status.
    Network(WorkerResponse),
    /// Served from a cache store.
    Cached(WorkerResponse),
    /// Neither network nor cache could answer; a synthetic 503.
    Offline(WorkerResponse),
}

/// Where an outcome's response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Network,
    Cache,
    Offline,
    Passthrough,
}

impl Outcome {
    pub fn response(&self) -> &WorkerResponse {
        match self {
            Outcome::Network(r) | Outcome::Cached(r) | Outcome::Offline(r) => r,
        }
    }

    pub fn into_response(self) -> WorkerResponse {
        match self {
            Outcome::Network(r) | Outcome::Cached(r) | Outcome::Offline(r) => r,
        }
    }

    pub fn source(&self) -> Source {
        match self {
            Outcome::Network(_) => Source::Network,
            Outcome::Cached(_) => Source::Cache,
            Outcome::Offline(_) => Source::Offline,
        }
    }
}

/// Background work started by a strategy, awaited by [`Background::settle`].
#[derive(Clone, Default)]
pub struct Background {
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl Background {
    pub async fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().await;
        while tasks.try_join_next().is_some() {}
        tasks.spawn(task);
    }

    /// Wait for every task spawned so far. Returns how many were awaited.
    pub async fn settle(&self) -> usize {
        let mut tasks = std::mem::take(&mut *self.tasks.lock().await);
        let mut settled = 0;
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                tracing::warn!("background task failed: {}", e);
            }
            settled += 1;
        }
        settled
    }
}

/// Everything a strategy needs. Cloning is cheap.
#[derive(Clone)]
pub struct StrategyContext {
    pub storage: Arc<dyn CacheStorage>,
    pub fetcher: Arc<dyn Fetcher>,
    pub names: StoreNames,
    pub background: Background,
}

impl StrategyContext {
    pub fn new(storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>, names: StoreNames) -> Self {
        Self { storage, fetcher, names, background: Background::default() }
    }

    async fn lookup_any(&self, request: &WorkerRequest) -> Option<WorkerResponse> {
        self.storage.match_any(request).await.unwrap_or_else(|e| {
            tracing::warn!("cache lookup failed for {}: {}", request.url, e);
            None
        })
    }

    async fn lookup_in(&self, store: &str, request: &WorkerRequest) -> Option<WorkerResponse> {
        self.storage.match_in(store, request).await.unwrap_or_else(|e| {
            tracing::warn!("cache lookup in {} failed for {}: {}", store, request.url, e);
            None
        })
    }

    /// Write a response if it is cacheable. Failures are logged only.
    async fn store(&self, store: &str, request: &WorkerRequest, response: &WorkerResponse) {
        if !response.is_cacheable() {
            return;
        }
        if let Err(e) = self.storage.put(store, request, response).await {
            tracing::warn!("cache write to {} failed for {}: {}", store, request.url, e);
        }
    }
}

/// Caching policy, one per request classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    CacheFirst,
    StaleWhileRevalidate,
    NetworkFirst,
    NetworkWithCacheFallback,
}

impl Strategy {
    /// Dispatch table from classification to policy.
    pub fn for_kind(kind: RequestKind) -> Self {
        match kind {
            RequestKind::StaticAsset => Strategy::CacheFirst,
            RequestKind::ExternalAsset => Strategy::StaleWhileRevalidate,
            RequestKind::HtmlDocument => Strategy::NetworkFirst,
            RequestKind::Other => Strategy::NetworkWithCacheFallback,
        }
    }

    pub async fn run(self, ctx: &StrategyContext, request: &WorkerRequest) -> Outcome {
        match self {
            Strategy::CacheFirst => cache_first(ctx, request).await,
            Strategy::StaleWhileRevalidate => stale_while_revalidate(ctx, request).await,
            Strategy::NetworkFirst => network_first(ctx, request).await,
            Strategy::NetworkWithCacheFallback => network_with_cache_fallback(ctx, request).await,
        }
    }
}

/// Any cached copy wins; otherwise the network, caching a 200 into STATIC.
pub async fn cache_first(ctx: &StrategyContext, request: &WorkerRequest) -> Outcome {
    if let Some(hit) = ctx.lookup_any(request).await {
        tracing::debug!("cache first hit: {}", request.url);
        return Outcome::Cached(hit);
    }

    match ctx.fetcher.fetch(request).await {
        Ok(response) => {
            ctx.store(&ctx.names.static_store, request, &response).await;
            Outcome::Network(response)
        }
        Err(e) => {
            tracing::debug!("cache first failed for {}: {}", request.url, e);
            Outcome::Offline(WorkerResponse::offline(CACHE_FIRST_UNAVAILABLE))
        }
    }
}

/// Serve DYNAMIC immediately and refresh it in the background.
///
/// Without a cached copy the caller waits for the network.
pub async fn stale_while_revalidate(ctx: &StrategyContext, request: &WorkerRequest) -> Outcome {
    let dynamic = &ctx.names.dynamic_store;

    if let Some(hit) = ctx.lookup_in(dynamic, request).await {
        tracing::debug!("serving stale copy of {} while revalidating", request.url);
        let background = ctx.clone();
        let request = request.clone();
        ctx.background
            .spawn(async move {
                revalidate(&background, &request).await;
            })
            .await;
        return Outcome::Cached(hit);
    }

    if let Some(response) = revalidate(ctx, request).await {
        return Outcome::Network(response);
    }

    // A concurrent revalidation may have filled the store meanwhile.
    match ctx.lookup_in(dynamic, request).await {
        Some(hit) => Outcome::Cached(hit),
        None => Outcome::Offline(WorkerResponse::offline(REVALIDATE_UNAVAILABLE)),
    }
}

async fn revalidate(ctx: &StrategyContext, request: &WorkerRequest) -> Option<WorkerResponse> {
    match ctx.fetcher.fetch(request).await {
        Ok(response) => {
            ctx.store(&ctx.names.dynamic_store, request, &response).await;
            Some(response)
        }
        Err(e) => {
            tracing::debug!("revalidation of {} failed: {}", request.url, e);
            None
        }
    }
}

/// Network, caching a 200 into DYNAMIC; any cached copy when offline.
pub async fn network_first(ctx: &StrategyContext, request: &WorkerRequest) -> Outcome {
    match ctx.fetcher.fetch(request).await {
        Ok(response) => {
            ctx.store(&ctx.names.dynamic_store, request, &response).await;
            Outcome::Network(response)
        }
        Err(e) => {
            tracing::debug!("network first falling back to cache for {}: {}", request.url, e);
            match ctx.lookup_any(request).await {
                Some(hit) => Outcome::Cached(hit),
                None => Outcome::Offline(WorkerResponse::offline(OFFLINE)),
            }
        }
    }
}

/// Network without writing; any cached copy when offline.
pub async fn network_with_cache_fallback(ctx: &StrategyContext, request: &WorkerRequest) -> Outcome {
    match ctx.fetcher.fetch(request).await {
        Ok(response) => Outcome::Network(response),
        Err(e) => {
            tracing::debug!("network failed for {}: {}", request.url, e);
            match ctx.lookup_any(request).await {
                Some(hit) => Outcome::Cached(hit),
                None => Outcome::Offline(WorkerResponse::offline(OFFLINE)),
            }
        }
    }
}
