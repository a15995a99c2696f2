// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Redis session backend.
//!
//! Uses one multiplexed connection per process. The connection is opened at
//! startup by [`RedisConnector`]; per-request commands reuse it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, AsyncConnectionConfig, ErrorKind, RedisError};

use super::backend::{BackendError, SessionBackend, StoreConnector};

/// Key probed after connecting to confirm the server answers commands.
const PROBE_KEY: &str = "session:__probe__";

fn map_redis_error(e: RedisError) -> BackendError {
    match e.kind() {
        ErrorKind::TypeError => BackendError::InvalidValue(e.to_string()),
        _ => BackendError::Unavailable(e.to_string()),
    }
}

/// Connection parameters for the shared Redis instance.
#[derive(Debug, Clone)]
pub struct RedisConnector {
    pub host: String,
    pub port: u16,
    /// Budget for establishing the TCP connection and handshake.
    pub connect_timeout: Duration,
    /// Budget for each command round-trip.
    pub response_timeout: Duration,
}

impl RedisConnector {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: timeout,
            response_timeout: timeout,
        }
    }

    fn url(&self) -> String {
        format!("redis://{}:{}/", self.host, self.port)
    }
}

#[async_trait]
impl StoreConnector for RedisConnector {
    async fn connect(&self) -> Result<Arc<dyn SessionBackend>, BackendError> {
        let client = redis::Client::open(self.url()).map_err(map_redis_error)?;

        let config = AsyncConnectionConfig::new()
            .set_connection_timeout(self.connect_timeout)
            .set_response_timeout(self.response_timeout);
        let connecting = client.get_multiplexed_async_connection_with_config(&config);
        let conn = tokio::time::timeout(self.connect_timeout, connecting)
            .await
            .map_err(|_| BackendError::Unavailable(format!("connect to {} timed out", self.target())))?
            .map_err(map_redis_error)?;

        let backend = RedisBackend { conn };
        backend.ping().await?;
        Ok(Arc::new(backend))
    }

    fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// [`SessionBackend`] over a multiplexed Redis connection.
#[derive(Clone)]
pub struct RedisBackend {
    conn: MultiplexedConnection,
}

#[async_trait]
impl SessionBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(map_redis_error)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), BackendError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
            .await
            .map_err(map_redis_error)
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(map_redis_error)
    }

    async fn ping(&self) -> Result<(), BackendError> {
        let mut conn = self.conn.clone();
        conn.exists::<_, bool>(PROBE_KEY)
            .await
            .map(|_| ())
            .map_err(map_redis_error)
    }
}
