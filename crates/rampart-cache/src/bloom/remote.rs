//! Remote-backed bloom filter variant.
//!
//! Keeps the bit array in the remote backend under a single key, so several
//! backend instances can share one filter. Each operation issues its k
//! single-bit commands as one pipelined round trip. This variant talks to
//! the backend directly rather than through the cache facade: it needs raw
//! bit operations, not key/value semantics, and has no fallback because
//! membership answers from a partial bit array would be wrong.

use deadpool_redis::Pool;

use super::FilterParams;
use crate::error::CacheError;
use crate::CacheResult;

/// Bloom filter whose bit array lives in the remote backend.
pub struct RedisBloomFilter {
    pool: Pool,
    key: String,
    params: FilterParams,
}

impl RedisBloomFilter {
    /// Creates a filter stored under `key`, sized for `expected_items`
    /// insertions at the target `false_positive_rate`.
    #[must_use]
    pub fn new(
        pool: Pool,
        key: impl Into<String>,
        expected_items: u64,
        false_positive_rate: f64,
    ) -> Self {
        Self {
            pool,
            key: key.into(),
            params: FilterParams::for_capacity(expected_items, false_positive_rate),
        }
    }

    /// Returns the derived sizing parameters, fixed for the filter's lifetime.
    #[must_use]
    pub fn params(&self) -> FilterParams {
        self.params
    }

    async fn conn(&self) -> CacheResult<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::backend(e.to_string()))
    }

    /// Records `item` as a member.
    pub async fn add(&self, item: &str) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        let mut pipe = redis::pipe();
        for index in self.params.indices(item) {
            pipe.cmd("SETBIT").arg(&self.key).arg(index).arg(1).ignore();
        }
        pipe.query_async::<()>(&mut conn)
            .await
            .map_err(CacheError::from)?;
        Ok(())
    }

    /// Tests membership of `item`.
    ///
    /// `false` is definitive; `true` means possible presence with the
    /// configured false-positive probability.
    pub async fn contains(&self, item: &str) -> CacheResult<bool> {
        let mut conn = self.conn().await?;
        let mut pipe = redis::pipe();
        for index in self.params.indices(item) {
            pipe.cmd("GETBIT").arg(&self.key).arg(index);
        }
        let bits: Vec<u8> = pipe
            .query_async(&mut conn)
            .await
            .map_err(CacheError::from)?;
        Ok(bits.iter().all(|&bit| bit == 1))
    }
}

impl std::fmt::Debug for RedisBloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBloomFilter")
            .field("key", &self.key)
            .field("size_bits", &self.params.size_bits)
            .field("hash_count", &self.params.hash_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteBackend;

    fn backend_from_env() -> Option<RemoteBackend> {
        let url = std::env::var("REDIS_URL").ok()?;
        RemoteBackend::connect(&url).ok()
    }

    // Requires a reachable redis; run with REDIS_URL set:
    // `REDIS_URL=redis://127.0.0.1:6379 cargo test -- --ignored`
    #[tokio::test]
    #[ignore = "needs a live redis instance"]
    async fn test_remote_filter_has_no_false_negatives() {
        let backend = backend_from_env().expect("REDIS_URL must point at a live redis");
        let filter = RedisBloomFilter::new(backend.pool(), "test:bloom:fn", 1000, 0.01);

        for i in 0..1000 {
            filter.add(&format!("member-{i}")).await.unwrap();
        }
        for i in 0..1000 {
            assert!(filter.contains(&format!("member-{i}")).await.unwrap());
        }

        backend.del(&["test:bloom:fn"]).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "needs a live redis instance"]
    async fn test_remote_membership_scenario() {
        let backend = backend_from_env().expect("REDIS_URL must point at a live redis");
        let filter = RedisBloomFilter::new(backend.pool(), "test:bloom:scenario", 100, 0.05);

        filter.add("alpha").await.unwrap();
        filter.add("beta").await.unwrap();
        assert!(filter.contains("alpha").await.unwrap());
        assert!(filter.contains("beta").await.unwrap());

        backend.del(&["test:bloom:scenario"]).await.unwrap();
    }
}
