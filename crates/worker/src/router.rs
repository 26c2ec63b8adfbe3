//! Cache policy router.
//!
//! Decides whether a request is intercepted at all, classifies it, and
//! hands it to the strategy for its class.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sworker_core::{CacheStorage, Manifest, RequestKind, StoreNames, WorkerRequest, WorkerResponse, classify};

use crate::fetch::{Fetcher, NetworkError, is_internal_scheme};
use crate::strategy::{Outcome, Source, Strategy, StrategyContext};

/// Why a request was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Bypass {
    NonGet,
    InternalScheme,
    NotActive,
}

/// Result of an intercepted request.
#[derive(Debug, Clone, PartialEq)]
pub struct Intercepted {
    pub kind: RequestKind,
    pub strategy: Strategy,
    pub outcome: Outcome,
}

/// A fully handled fetch, intercepted or not.
#[derive(Debug, Clone, PartialEq)]
pub enum Handled {
    Intercepted(Intercepted),
    Passthrough { reason: Bypass, response: WorkerResponse },
}

impl Handled {
    pub fn response(&self) -> &WorkerResponse {
        match self {
            Handled::Intercepted(i) => i.outcome.response(),
            Handled::Passthrough { response, .. } => response,
        }
    }

    pub fn source(&self) -> Source {
        match self {
            Handled::Intercepted(i) => i.outcome.source(),
            Handled::Passthrough { .. } => Source::Passthrough,
        }
    }

    pub fn kind(&self) -> Option<RequestKind> {
        match self {
            Handled::Intercepted(i) => Some(i.kind),
            Handled::Passthrough { .. } => None,
        }
    }
}

/// Routes requests to caching strategies.
#[derive(Clone)]
pub struct Router {
    manifest: Arc<Manifest>,
    ctx: StrategyContext,
}

impl Router {
    pub fn new(
        manifest: Manifest, names: StoreNames, storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self { manifest: Arc::new(manifest), ctx: StrategyContext::new(storage, fetcher, names) }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn names(&self) -> &StoreNames {
        &self.ctx.names
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.ctx.storage
    }

    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.ctx.fetcher
    }

    /// Whether the router would leave this request to the network.
    pub fn bypass_reason(&self, request: &WorkerRequest) -> Option<Bypass> {
        if !request.is_get() {
            Some(Bypass::NonGet)
        } else if is_internal_scheme(&request.url) {
            Some(Bypass::InternalScheme)
        } else {
            None
        }
    }

    /// Classify without touching any store.
    pub fn classify(&self, request: &WorkerRequest) -> RequestKind {
        classify(&self.manifest, request)
    }

    /// Resolve a request through its strategy.
    ///
    /// Returns `None` when the request is not intercepted; in that case no
    /// store has been read or written.
    pub async fn intercept(&self, request: &WorkerRequest) -> Option<Intercepted> {
        if let Some(reason) = self.bypass_reason(request) {
            tracing::trace!(?reason, "not intercepting {} {}", request.method, request.url);
            return None;
        }
        Some(self.dispatch(request).await)
    }

    async fn dispatch(&self, request: &WorkerRequest) -> Intercepted {
        let kind = self.classify(request);
        let strategy = Strategy::for_kind(kind);
        tracing::debug!(kind = %kind, ?strategy, "intercepting {}", request.url);

        let outcome = strategy.run(&self.ctx, request).await;
        Intercepted { kind, strategy, outcome }
    }

    /// Intercept, or send the request straight to the network.
    ///
    /// Only a passthrough can fail; intercepted requests always resolve.
    pub async fn handle(&self, request: &WorkerRequest) -> Result<Handled, NetworkError> {
        match self.bypass_reason(request) {
            Some(reason) => self.passthrough(request, reason).await,
            None => Ok(Handled::Intercepted(self.dispatch(request).await)),
        }
    }

    pub(crate) async fn passthrough(&self, request: &WorkerRequest, reason: Bypass) -> Result<Handled, NetworkError> {
        let response = self.ctx.fetcher.fetch(request).await?;
        Ok(Handled::Passthrough { reason, response })
    }

    /// Await background revalidations started so far.
    pub async fn settle(&self) -> usize {
        self.ctx.background.settle().await
    }
}
