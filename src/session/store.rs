// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process-wide session store handle with an explicit connected/degraded state.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info, warn};

use super::backend::{BackendError, SessionBackend, StoreConnector};
use super::record::{session_key, SessionRecord};

/// Upper bound for any single store call made on a request path.
pub const MAX_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// Default number of startup connection attempts.
const DEFAULT_CONNECT_ATTEMPTS: u32 = 5;

/// Default pause between startup connection attempts.
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Startup connection retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    /// Fixed pause between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_CONNECT_ATTEMPTS,
            backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

/// Session lookup failure as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No record under this session id (never written, expired, or deleted).
    #[error("session not found")]
    NotFound,
    /// A record exists but cannot be used.
    #[error("session record is malformed: {0}")]
    Malformed(String),
    /// The store is degraded, unreachable, or too slow.
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

impl From<BackendError> for SessionError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Unavailable(msg) => SessionError::Unavailable(msg),
            BackendError::InvalidValue(msg) => SessionError::Malformed(msg),
        }
    }
}

enum StoreState {
    Connected(Arc<dyn SessionBackend>),
    Degraded { reason: String },
}

/// Shared session store.
///
/// Cheap to clone; all clones share one backend connection.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<StoreState>,
    timeout: Duration,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("connected", &self.is_connected())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SessionStore {
    /// Connect with bounded retries. Never fails: an exhausted budget yields a
    /// degraded store.
    pub async fn connect(connector: &dyn StoreConnector, policy: RetryPolicy, timeout: Duration) -> Self {
        let attempts = policy.attempts.max(1);
        let target = connector.target();
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match connector.connect().await {
                Ok(backend) => {
                    info!(target = %target, attempt, "Connected to session store");
                    return Self::from_backend(backend, timeout);
                }
                Err(e) => {
                    warn!(
                        target = %target,
                        attempt,
                        max_attempts = attempts,
                        error = %e,
                        "Session store connection failed"
                    );
                    last_error = e.to_string();
                }
            }

            if attempt < attempts && !policy.backoff.is_zero() {
                tokio::time::sleep(policy.backoff).await;
            }
        }

        error!(
            target = %target,
            attempts,
            "Session store unreachable, running degraded"
        );
        Self::degraded(last_error)
    }

    /// Wrap an already connected backend.
    pub fn from_backend(backend: Arc<dyn SessionBackend>, timeout: Duration) -> Self {
        Self {
            state: Arc::new(StoreState::Connected(backend)),
            timeout: timeout.min(MAX_LOOKUP_TIMEOUT),
        }
    }

    /// A store that fails every call with [`SessionError::Unavailable`].
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            state: Arc::new(StoreState::Degraded {
                reason: reason.into(),
            }),
            timeout: MAX_LOOKUP_TIMEOUT,
        }
    }

    /// Whether startup connection succeeded.
    pub fn is_connected(&self) -> bool {
        matches!(*self.state, StoreState::Connected(_))
    }

    /// Ping over the existing connection. Degraded stores never reconnect.
    pub async fn probe(&self) -> bool {
        match self.backend() {
            Ok(backend) => self.bounded(backend.ping()).await.is_ok(),
            Err(_) => false,
        }
    }

    /// Look up a session record.
    pub async fn get(&self, session_id: &str) -> Result<SessionRecord, SessionError> {
        let backend = self.backend()?;
        let raw = self
            .bounded(backend.get(&session_key(session_id)))
            .await?
            .ok_or(SessionError::NotFound)?;
        SessionRecord::decode(&raw).map_err(SessionError::Malformed)
    }

    /// Write a session record with a TTL.
    pub async fn put(
        &self,
        session_id: &str,
        record: &SessionRecord,
        ttl: Duration,
    ) -> Result<(), SessionError> {
        let backend = self.backend()?;
        let raw = record
            .encode()
            .map_err(|e| SessionError::Malformed(e.to_string()))?;
        self.bounded(backend.set(&session_key(session_id), &raw, ttl))
            .await
    }

    /// Delete a session record. Deleting a missing record is not an error.
    pub async fn remove(&self, session_id: &str) -> Result<(), SessionError> {
        let backend = self.backend()?;
        self.bounded(backend.delete(&session_key(session_id))).await
    }

    fn backend(&self) -> Result<&Arc<dyn SessionBackend>, SessionError> {
        match &*self.state {
            StoreState::Connected(backend) => Ok(backend),
            StoreState::Degraded { reason } => Err(SessionError::Unavailable(reason.clone())),
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, BackendError>>,
    ) -> Result<T, SessionError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(SessionError::from),
            Err(_) => Err(SessionError::Unavailable(format!(
                "store call exceeded {} ms",
                self.timeout.as_millis()
            ))),
        }
    }
}
