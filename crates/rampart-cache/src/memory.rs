//! In-process fallback store.
//!
//! A key→entry map behind a read/write lock, rewritten wholesale to a local
//! file on every mutation while the write lock is held. Persistence is
//! therefore strictly serialized with in-memory mutation, at the cost of
//! O(total store size) work per write: acceptable for low-volume fallback
//! use, not for high-throughput caching.
//!
//! Entries whose expiry has passed are logically absent: any read path that
//! encounters one deletes it before reporting a miss.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::CacheError;
use crate::CacheResult;

/// A single persisted entry: serialized payload plus optional absolute expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredEntry {
    pub value: String,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub expires_at: Option<OffsetDateTime>,
}

impl StoredEntry {
    fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Lock-guarded in-process store with whole-file persistence.
///
/// The raw map is never exposed; all access goes through the guarded
/// methods below.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, StoredEntry>>,
    path: PathBuf,
}

impl MemoryStore {
    /// Opens the store, rehydrating from the persistence file if present.
    ///
    /// A missing file yields an empty store. An unreadable or corrupt file
    /// is logged and treated as an empty store, never as a fatal error.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::load(&path);
        Self {
            entries: RwLock::new(entries),
            path,
        }
    }

    fn load(path: &Path) -> HashMap<String, StoredEntry> {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(_) => return HashMap::new(),
        };
        match serde_json::from_slice(&data) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt cache persistence file, starting empty");
                HashMap::new()
            }
        }
    }

    /// Rewrites the persistence file from the full map. Caller must hold the
    /// write lock.
    fn persist(&self, entries: &HashMap<String, StoredEntry>) -> CacheResult<()> {
        let data = serde_json::to_vec_pretty(entries)
            .map_err(|e| CacheError::serialization(e.to_string()))?;
        std::fs::write(&self.path, data).map_err(|e| {
            tracing::error!(path = %self.path.display(), error = %e, "failed to persist fallback store");
            CacheError::persistence(e.to_string())
        })
    }

    /// Stores `value` under `key` with an optional relative TTL.
    pub fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        let expires_at = ttl.map(|ttl| OffsetDateTime::now_utc() + ttl);
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), StoredEntry { value, expires_at });
        self.persist(&entries)
    }

    /// Fetches the payload stored under `key`.
    ///
    /// An expired entry is deleted and reported as [`CacheError::NotFound`].
    pub fn get(&self, key: &str) -> CacheResult<String> {
        let now = OffsetDateTime::now_utc();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return Err(CacheError::not_found(key)),
                Some(entry) if !entry.is_expired(now) => return Ok(entry.value.clone()),
                Some(_) => {}
            }
        }
        self.evict_expired(key, now);
        Err(CacheError::not_found(key))
    }

    /// Removes the given keys. Missing keys are not an error.
    pub fn remove(&self, keys: &[&str]) -> CacheResult<()> {
        let mut entries = self.entries.write();
        for key in keys {
            entries.remove(*key);
        }
        self.persist(&entries)
    }

    /// Returns whether `key` holds a live entry.
    pub fn exists(&self, key: &str) -> bool {
        let now = OffsetDateTime::now_utc();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return false,
                Some(entry) if !entry.is_expired(now) => return true,
                Some(_) => {}
            }
        }
        self.evict_expired(key, now);
        false
    }

    /// Resets the expiry of an existing key.
    pub fn expire(&self, key: &str, ttl: Duration) -> CacheResult<()> {
        let mut entries = self.entries.write();
        match entries.get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(OffsetDateTime::now_utc() + ttl);
            }
            None => return Err(CacheError::not_found(key)),
        }
        self.persist(&entries)
    }

    /// Returns the remaining time-to-live of `key`.
    ///
    /// `Ok(None)` means the entry never expires.
    pub fn ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        let now = OffsetDateTime::now_utc();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return Err(CacheError::not_found(key)),
                Some(entry) => match entry.expires_at {
                    None => return Ok(None),
                    Some(at) if at > now => {
                        return Ok(Some((at - now).try_into().unwrap_or(Duration::ZERO)));
                    }
                    Some(_) => {}
                },
            }
        }
        self.evict_expired(key, now);
        Err(CacheError::not_found(key))
    }

    /// Drops every entry.
    pub fn clear(&self) -> CacheResult<()> {
        let mut entries = self.entries.write();
        entries.clear();
        self.persist(&entries)
    }

    /// Number of entries currently held, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` when the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Deletes `key` if it is still expired once the write lock is held.
    ///
    /// Persistence failures during lazy eviction are logged rather than
    /// propagated; the read path still reports a miss either way.
    fn evict_expired(&self, key: &str, now: OffsetDateTime) {
        let mut entries = self.entries.write();
        let still_expired = entries.get(key).is_some_and(|e| e.is_expired(now));
        if still_expired {
            entries.remove(key);
            if let Err(e) = self.persist(&entries) {
                tracing::warn!(key = %key, error = %e, "failed to persist lazy eviction");
            }
        }
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("path", &self.path)
            .field("entries", &self.len())
            .finish()
    }
}
