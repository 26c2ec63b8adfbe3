//! Scripted network for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use reqwest::StatusCode;
use sworker_core::{WorkerRequest, WorkerResponse};
use tokio::sync::Semaphore;

use crate::fetch::{Fetcher, NetworkError};

pub const ORIGIN: &str = "https://portfolio.test";

/// Fetcher that answers from a URL -> (status, body) table.
///
/// Unknown URLs fail with a transport error, as does everything while
/// offline. An optional gate holds every fetch until it is released; the
/// gate is a zero-permit semaphore that is closed on release, so a release
/// that happens before a fetch starts is not lost.
#[derive(Default)]
pub struct ScriptedFetcher {
    routes: Mutex<HashMap<String, (StatusCode, Vec<u8>)>>,
    calls: Mutex<Vec<WorkerRequest>>,
    offline: AtomicBool,
    gate: Option<Semaphore>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches wait on `release()` before answering.
    pub fn gated() -> Self {
        Self { gate: Some(Semaphore::new(0)), ..Self::default() }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.close();
        }
    }

    pub fn route(&self, url: &str, status: StatusCode, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, body.as_bytes().to_vec()));
    }

    pub fn ok(&self, url: &str, body: &str) {
        self.route(url, StatusCode::OK, body);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Every request seen so far, in arrival order.
    pub fn requests(&self) -> Vec<WorkerRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.requests().iter().map(|r| r.url.to_string()).collect()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls().iter().filter(|c| *c == url).count()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &WorkerRequest) -> Result<WorkerResponse, NetworkError> {
        let url = request.url.to_string();
        self.calls.lock().unwrap().push(request.clone());

        if let Some(gate) = &self.gate {
            let _ = gate.acquire().await;
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(NetworkError::Unreachable(format!("offline: {url}")));
        }

        let route = self.routes.lock().unwrap().get(&url).cloned();
        match route {
            Some((status, body)) => Ok(WorkerResponse::new(status, body)),
            None => Err(NetworkError::Unreachable(format!("no route to {url}"))),
        }
    }
}

pub fn site_url(path: &str) -> String {
    format!("{ORIGIN}{path}")
}

pub fn get(url: &str) -> WorkerRequest {
    WorkerRequest::get(url::Url::parse(url).unwrap())
}
