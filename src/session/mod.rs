// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Shared Session Store
//!
//! Session records live in a key-value store reachable by both tiers. The web
//! tier writes a record at login; the API tier only reads it.
//!
//! ## Key Layout
//!
//! ```text
//! session:<session_id>  ->  {"username": "...", "created_at": 1700000000}
//! ```
//!
//! Records are plain JSON. A record that fails to decode is reported as
//! [`SessionError::Malformed`], never as a crash or a default identity.
//!
//! ## Lifecycle
//!
//! [`SessionStore::connect`] retries the backend a bounded number of times at
//! startup. When the budget is exhausted the store stays *degraded* for the
//! life of the process and every call fails with
//! [`SessionError::Unavailable`] without attempting to reconnect.

pub mod backend;
pub mod memory;
pub mod record;
pub mod redis_backend;
pub mod store;

pub use backend::{BackendError, SessionBackend, StoreConnector};
pub use memory::MemoryBackend;
pub use record::{session_key, SessionRecord};
pub use redis_backend::{RedisBackend, RedisConnector};
pub use store::{RetryPolicy, SessionError, SessionStore};
