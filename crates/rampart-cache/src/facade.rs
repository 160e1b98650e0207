//! Cache facade.
//!
//! Unifies the remote backend and the in-process fallback store behind one
//! key/value/TTL API. On every operation the facade asks the health monitor
//! whether the remote backend is currently reachable and delegates
//! accordingly; callers never see which side served them.
//!
//! ## Degraded-mode semantics
//!
//! Plain key/value operations behave identically in both modes. Numeric
//! counters, `KEYS` matching, and hash-field operations exist only in the
//! remote backend's native feature set; while degraded they fail with an
//! explicit [`CacheError::UnsupportedInFallback`] so callers can tell a real
//! zero from a capability gap.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::health::HealthMonitor;
use crate::memory::MemoryStore;
use crate::remote::RemoteBackend;
use crate::CacheResult;

/// Resilient key/value cache over a remote backend with in-process fallback.
pub struct CacheFacade {
    remote: Option<RemoteBackend>,
    fallback: MemoryStore,
    health: HealthMonitor,
}

impl CacheFacade {
    /// Builds a facade from configuration.
    ///
    /// # Errors
    /// Returns an error if the configured remote URL cannot be parsed.
    /// An unreachable-but-well-formed remote is not an error; the facade
    /// starts in fallback mode and recovers when the backend comes up.
    pub fn new(config: CacheConfig) -> CacheResult<Self> {
        let remote = match &config.redis_url {
            Some(url) => Some(RemoteBackend::connect(url)?),
            None => None,
        };
        let health = HealthMonitor::new(
            remote.clone(),
            config.health_check_window,
            config.health_probe_timeout,
        );
        Ok(Self {
            remote,
            fallback: MemoryStore::open(config.persist_path),
            health,
        })
    }

    /// Returns the remote backend handle, if one was configured.
    ///
    /// Consumers needing raw bit operations (the remote bloom filter) attach
    /// here rather than going through key/value semantics.
    #[must_use]
    pub fn remote(&self) -> Option<&RemoteBackend> {
        self.remote.as_ref()
    }

    /// Whether operations are currently delegated to the remote backend.
    pub async fn is_remote_healthy(&self) -> bool {
        self.health.is_healthy().await
    }

    async fn active_remote(&self) -> Option<&RemoteBackend> {
        if self.health.is_healthy().await {
            self.remote.as_ref()
        } else {
            None
        }
    }

    /// Serializes `value` and stores it under `key`.
    ///
    /// `ttl` of `None` means the entry never expires.
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        let payload =
            serde_json::to_string(value).map_err(|e| CacheError::serialization(e.to_string()))?;
        self.set_string(key, &payload, ttl).await
    }

    /// Fetches the value under `key`, deserialized into `T`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<T> {
        let payload = self.get_string(key).await?;
        serde_json::from_str(&payload).map_err(|e| CacheError::deserialization(e.to_string()))
    }

    /// Stores a raw string payload without serialization.
    pub async fn set_string(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()> {
        match self.active_remote().await {
            Some(remote) => remote.set(key, value, ttl).await,
            None => self.fallback.set(key, value.to_string(), ttl),
        }
    }

    /// Fetches a raw string payload.
    pub async fn get_string(&self, key: &str) -> CacheResult<String> {
        match self.active_remote().await {
            Some(remote) => remote
                .get(key)
                .await?
                .ok_or_else(|| CacheError::not_found(key)),
            None => self.fallback.get(key),
        }
    }

    /// Deletes the given keys. Missing keys are not an error.
    pub async fn del(&self, keys: &[&str]) -> CacheResult<()> {
        match self.active_remote().await {
            Some(remote) => remote.del(keys).await,
            None => self.fallback.remove(keys),
        }
    }

    /// Returns whether `key` holds a live entry.
    pub async fn exists(&self, key: &str) -> CacheResult<bool> {
        match self.active_remote().await {
            Some(remote) => remote.exists(key).await,
            None => Ok(self.fallback.exists(key)),
        }
    }

    /// Resets the expiry of an existing key.
    pub async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<()> {
        match self.active_remote().await {
            Some(remote) => remote.expire(key, ttl).await,
            None => self.fallback.expire(key, ttl),
        }
    }

    /// Returns the remaining time-to-live of `key`.
    ///
    /// `Ok(None)` means the key exists without an expiry.
    pub async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        match self.active_remote().await {
            Some(remote) => remote.ttl(key).await,
            None => self.fallback.ttl(key),
        }
    }

    /// Drops every entry from the active store.
    pub async fn flush(&self) -> CacheResult<()> {
        match self.active_remote().await {
            Some(remote) => remote.flush_db().await,
            None => self.fallback.clear(),
        }
    }

    /// Atomically increments the counter at `key` by one.
    pub async fn incr(&self, key: &str) -> CacheResult<i64> {
        match self.active_remote().await {
            Some(remote) => remote.incr_by(key, 1).await,
            None => Err(CacheError::unsupported("INCR")),
        }
    }

    /// Atomically increments the counter at `key` by `delta`.
    pub async fn incr_by(&self, key: &str, delta: i64) -> CacheResult<i64> {
        match self.active_remote().await {
            Some(remote) => remote.incr_by(key, delta).await,
            None => Err(CacheError::unsupported("INCRBY")),
        }
    }

    /// Atomically decrements the counter at `key` by one.
    pub async fn decr(&self, key: &str) -> CacheResult<i64> {
        match self.active_remote().await {
            Some(remote) => remote.incr_by(key, -1).await,
            None => Err(CacheError::unsupported("DECR")),
        }
    }

    /// Returns all keys matching `pattern`.
    pub async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>> {
        match self.active_remote().await {
            Some(remote) => remote.keys(pattern).await,
            None => Err(CacheError::unsupported("KEYS")),
        }
    }

    /// Sets a single hash field.
    pub async fn hset(&self, key: &str, field: &str, value: &str) -> CacheResult<()> {
        match self.active_remote().await {
            Some(remote) => remote.hset(key, field, value).await,
            None => Err(CacheError::unsupported("HSET")),
        }
    }

    /// Fetches a single hash field.
    pub async fn hget(&self, key: &str, field: &str) -> CacheResult<Option<String>> {
        match self.active_remote().await {
            Some(remote) => remote.hget(key, field).await,
            None => Err(CacheError::unsupported("HGET")),
        }
    }

    /// Fetches all fields of a hash.
    pub async fn hget_all(&self, key: &str) -> CacheResult<HashMap<String, String>> {
        match self.active_remote().await {
            Some(remote) => remote.hget_all(key).await,
            None => Err(CacheError::unsupported("HGETALL")),
        }
    }

    /// Deletes the given hash fields.
    pub async fn hdel(&self, key: &str, fields: &[&str]) -> CacheResult<()> {
        match self.active_remote().await {
            Some(remote) => remote.hdel(key, fields).await,
            None => Err(CacheError::unsupported("HDEL")),
        }
    }
}

impl std::fmt::Debug for CacheFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheFacade")
            .field("remote_configured", &self.remote.is_some())
            .field("fallback", &self.fallback)
            .finish()
    }
}
