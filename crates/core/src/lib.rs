//! Core types and shared functionality for sworker.
//!
//! This crate provides:
//! - Request/response values and request classification
//! - The embedded asset manifest and versioned store names
//! - Cache stores (SQLite and in-memory) behind one trait
//! - Unified error types and layered configuration

pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod manifest;
pub mod request;

pub use cache::{CacheDb, CacheStorage, MemoryStorage, PendingSubmission, StoreInfo};
pub use classify::{RequestKind, classify};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use manifest::{Manifest, StoreNames};
pub use request::{WorkerRequest, WorkerResponse};
