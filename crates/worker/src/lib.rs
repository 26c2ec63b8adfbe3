//! The offline cache worker.
//!
//! This crate provides:
//! - Network access behind the [`Fetcher`] seam
//! - The four caching strategies and the router that picks one per request
//! - Install/activate lifecycle, notifications, page sessions, background sync
//! - [`ServiceWorker`], which ties them together behind its event handlers

pub mod clients;
pub mod fetch;
pub mod lifecycle;
pub mod notify;
pub mod router;
pub mod strategy;
pub mod sync;
pub mod worker;

#[cfg(test)]
mod testing;

pub use clients::{Session, Sessions, ShowOutcome};
pub use fetch::{FetchConfig, Fetcher, HttpFetcher, NetworkError};
pub use lifecycle::{CleanupReport, InstallReport};
pub use notify::{Notification, NotificationCenter};
pub use router::{Bypass, Handled, Intercepted, Router};
pub use strategy::{Outcome, Source, Strategy};
pub use sync::{CONTACT_FORM_SYNC, SyncReport};
pub use worker::{ClickOutcome, ControlMessage, ServiceWorker, WorkerState};
