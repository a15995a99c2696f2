// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Storage backend seam for session records.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Backend-level failure.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The store could not be reached or did not answer in time.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The store answered with a value of the wrong type.
    #[error("invalid stored value: {0}")]
    InvalidValue(String),
}

/// Raw key-value access to the shared store.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, BackendError>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), BackendError>;

    async fn delete(&self, key: &str) -> Result<(), BackendError>;

    /// Round-trip over the existing connection.
    async fn ping(&self) -> Result<(), BackendError>;
}

/// Opens a backend connection. Called only during startup.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn SessionBackend>, BackendError>;

    /// Human-readable target for logs (no credentials).
    fn target(&self) -> String;
}
