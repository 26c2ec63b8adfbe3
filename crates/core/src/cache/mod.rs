//! Named cache stores for the worker.
//!
//! A store maps a request (method + URL) to a stored response. The worker
//! only ever talks to stores through [`CacheStorage`], so the durable
//! SQLite backend and the in-memory backend are interchangeable.
//!
//! - SQLite backend with async access via tokio-rusqlite and WAL mode
//! - Automatic schema migrations
//! - Request keys hashed with SHA-256
//! - A durable outbox for background sync

pub mod connection;
pub mod entries;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod outbox;

pub use crate::Error;

pub use connection::CacheDb;
pub use memory::MemoryStorage;
pub use outbox::PendingSubmission;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::request::{WorkerRequest, WorkerResponse};

/// Summary of one store, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StoreInfo {
    pub name: String,
    pub entries: u64,
}

/// Store manager: the set of named cache stores.
///
/// Each method is atomic on its own. Sequences of calls are not; a
/// concurrent writer may land between a `match_in` and a `put`.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the store if it does not exist yet.
    async fn open(&self, name: &str) -> Result<(), Error>;

    /// Names of all existing stores, in creation order.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Delete a store and everything in it. Returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool, Error>;

    /// Look a request up in a single store.
    async fn match_in(&self, name: &str, request: &WorkerRequest) -> Result<Option<WorkerResponse>, Error>;

    /// Look a request up across all stores, oldest store first.
    async fn match_any(&self, request: &WorkerRequest) -> Result<Option<WorkerResponse>, Error>;

    /// Store a response, replacing any previous entry for the same request.
    ///
    /// Opens the store first if needed.
    async fn put(&self, name: &str, request: &WorkerRequest, response: &WorkerResponse) -> Result<(), Error>;

    /// Store a batch of responses into one store as a single unit.
    async fn put_all(&self, name: &str, entries: &[(WorkerRequest, WorkerResponse)]) -> Result<(), Error>;

    /// Names and entry counts of all stores.
    async fn stats(&self) -> Result<Vec<StoreInfo>, Error>;
}
