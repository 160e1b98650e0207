//! Remote cache backend.
//!
//! Thin typed wrapper around a pooled redis connection. The facade decides
//! *whether* to talk to the remote backend; this module only knows *how*.
//! All failures surface as [`CacheError::Backend`] for the facade to handle.

use std::collections::HashMap;
use std::time::Duration;

use deadpool_redis::{Config as PoolConfig, Pool, Runtime};
use redis::AsyncCommands;

use crate::error::CacheError;
use crate::CacheResult;

/// Pooled connection to the remote key/value backend.
#[derive(Clone)]
pub struct RemoteBackend {
    pool: Pool,
}

impl RemoteBackend {
    /// Creates a backend from a connection URL.
    ///
    /// Pool creation validates the URL shape only; no connection is
    /// established until the first command runs.
    ///
    /// # Errors
    /// Returns an error if the URL cannot be parsed into a pool config.
    pub fn connect(url: &str) -> CacheResult<Self> {
        let pool = PoolConfig::from_url(url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| CacheError::backend(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Returns the underlying pool handle.
    ///
    /// Used by consumers that need raw bit operations rather than key/value
    /// semantics (the remote bloom filter variant).
    #[must_use]
    pub fn pool(&self) -> Pool {
        self.pool.clone()
    }

    async fn conn(&self) -> CacheResult<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::backend(e.to_string()))
    }

    /// Issues a PING, returning `Ok(())` only on a live connection.
    pub async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(CacheError::from)?;
        Ok(())
    }

    /// Stores `value` under `key`, with an expiry when `ttl` is given.
    pub async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        match ttl {
            Some(ttl) => {
                conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
                    .await?
            }
            None => conn.set::<_, _, ()>(key, value).await?,
        }
        Ok(())
    }

    /// Fetches the raw value stored under `key`.
    pub async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn().await?;
        Ok(conn.get::<_, Option<String>>(key).await?)
    }

    /// Deletes the given keys. Missing keys are not an error.
    pub async fn del(&self, keys: &[&str]) -> CacheResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn().await?;
        conn.del::<_, ()>(keys).await?;
        Ok(())
    }

    /// Returns whether `key` currently exists.
    pub async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.conn().await?;
        Ok(conn.exists::<_, bool>(key).await?)
    }

    /// Sets the expiry of an existing key.
    ///
    /// Returns [`CacheError::NotFound`] if the key does not exist.
    pub async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        let applied: bool = conn.expire(key, ttl.as_secs().max(1) as i64).await?;
        if applied {
            Ok(())
        } else {
            Err(CacheError::not_found(key))
        }
    }

    /// Returns the remaining time-to-live of `key`.
    ///
    /// `Ok(None)` means the key exists but carries no expiry. A missing key
    /// maps to [`CacheError::NotFound`].
    pub async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        let mut conn = self.conn().await?;
        let secs: i64 = conn.ttl(key).await?;
        match secs {
            -2 => Err(CacheError::not_found(key)),
            -1 => Ok(None),
            s => Ok(Some(Duration::from_secs(s.max(0) as u64))),
        }
    }

    /// Atomically increments the counter at `key` by `delta`.
    pub async fn incr_by(&self, key: &str, delta: i64) -> CacheResult<i64> {
        let mut conn = self.conn().await?;
        Ok(conn.incr(key, delta).await?)
    }

    /// Returns all keys matching `pattern`.
    pub async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>> {
        let mut conn = self.conn().await?;
        Ok(conn.keys(pattern).await?)
    }

    /// Removes every key from the current database.
    pub async fn flush_db(&self) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        redis::cmd("FLUSHDB")
            .query_async::<()>(&mut conn)
            .await
            .map_err(CacheError::from)?;
        Ok(())
    }

    /// Sets a single hash field.
    pub async fn hset(&self, key: &str, field: &str, value: &str) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        conn.hset::<_, _, _, ()>(key, field, value).await?;
        Ok(())
    }

    /// Fetches a single hash field.
    pub async fn hget(&self, key: &str, field: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn().await?;
        Ok(conn.hget::<_, _, Option<String>>(key, field).await?)
    }

    /// Fetches all fields of a hash.
    pub async fn hget_all(&self, key: &str) -> CacheResult<HashMap<String, String>> {
        let mut conn = self.conn().await?;
        Ok(conn.hgetall::<_, HashMap<String, String>>(key).await?)
    }

    /// Deletes the given hash fields.
    pub async fn hdel(&self, key: &str, fields: &[&str]) -> CacheResult<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn().await?;
        conn.hdel::<_, _, ()>(key, fields).await?;
        Ok(())
    }
}

impl std::fmt::Debug for RemoteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteBackend").finish_non_exhaustive()
    }
}
