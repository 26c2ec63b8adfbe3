//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting the stores and feeding the
//! background sync outbox.

pub mod enqueue;
pub mod keys;

pub use enqueue::{OutboxEnqueueParams, enqueue_impl};
pub use keys::{CacheKeysParams, keys_impl};
