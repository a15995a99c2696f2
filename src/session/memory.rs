// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process LRU session backend.
//!
//! For tests and for embedding both tiers in one process through the library
//! API; the binaries always use Redis. Entries expire after their TTL and the
//! least recently used entry is evicted once capacity is reached.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;

use super::backend::{BackendError, SessionBackend, StoreConnector};

/// Default number of sessions kept in memory.
const DEFAULT_CAPACITY: usize = 10_000;

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// LRU-backed [`SessionBackend`].
#[derive(Clone)]
pub struct MemoryBackend {
    cache: Arc<Mutex<LruCache<String, CacheEntry>>>,
}

impl MemoryBackend {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: Arc::new(Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            ))),
        }
    }

    /// Number of live and not-yet-evicted entries.
    pub fn len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned() -> BackendError {
        BackendError::Unavailable("memory backend lock poisoned".to_string())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl SessionBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        let mut cache = self.cache.lock().map_err(|_| Self::poisoned())?;
        if let Some(entry) = cache.get(key) {
            if entry.expires_at > Instant::now() {
                return Ok(Some(entry.value.clone()));
            }
            // Expired, drop it
            cache.pop(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), BackendError> {
        let mut cache = self.cache.lock().map_err(|_| Self::poisoned())?;
        cache.put(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        let mut cache = self.cache.lock().map_err(|_| Self::poisoned())?;
        cache.pop(key);
        Ok(())
    }

    async fn ping(&self) -> Result<(), BackendError> {
        self.cache.lock().map(|_| ()).map_err(|_| Self::poisoned())
    }
}

#[async_trait]
impl StoreConnector for MemoryBackend {
    async fn connect(&self) -> Result<Arc<dyn SessionBackend>, BackendError> {
        Ok(Arc::new(self.clone()))
    }

    fn target(&self) -> String {
        "memory".to_string()
    }
}
