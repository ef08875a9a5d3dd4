//! # Key-Value Stores
//!
//! [`CacheStore`] is the boundary a cache backend implements: byte values
//! under string keys, with an optional time-to-live. [`MemoryStore`] is the
//! in-process implementation used by default and in tests.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::error::CacheError;

/// Source of the current time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// The wall clock.
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// A key-value store with per-entry expiry.
pub trait CacheStore: Send + Sync {
    /// The bytes stored under `key`, if present and not expired.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store `bytes` under `key`; `ttl` of `None` never expires.
    fn write(&self, key: &str, bytes: Vec<u8>, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Remove `key`. Returns whether it was present.
    fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Remove every key in `keys`. Returns how many were present.
    fn delete_multi(&self, keys: &[String]) -> Result<usize, CacheError> {
        let mut removed = 0;
        for key in keys {
            if self.delete(key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    bytes: Vec<u8>,
    expires_at: Option<DateTime<Utc>>,
}

/// Thread-safe, cloneable in-memory store.
///
/// Clones share the same map. Expired entries are invisible to reads and
/// are dropped on the next write.
#[derive(Clone)]
pub struct MemoryStore {
    data: Arc<RwLock<HashMap<String, Entry>>>,
    clock: Clock,
}

impl MemoryStore {
    /// An empty store on the wall clock.
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    /// An empty store on a caller-supplied clock.
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = (self.clock)();
        self.data
            .read()
            .values()
            .filter(|entry| is_live(entry, now))
            .count()
    }

    /// Whether the store holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn is_live(entry: &Entry, now: DateTime<Utc>) -> bool {
    entry.expires_at.map_or(true, |at| at > now)
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.data.read().len())
            .finish()
    }
}

impl CacheStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = (self.clock)();
        Ok(self
            .data
            .read()
            .get(key)
            .filter(|entry| is_live(entry, now))
            .map(|entry| entry.bytes.clone()))
    }

    fn write(&self, key: &str, bytes: Vec<u8>, ttl: Option<Duration>) -> Result<(), CacheError> {
        let now = (self.clock)();
        let expires_at = match ttl {
            Some(ttl) => {
                let ttl = chrono::Duration::from_std(ttl)
                    .map_err(|e| CacheError::Store(format!("ttl out of range: {e}")))?;
                Some(now + ttl)
            }
            None => None,
        };
        let mut data = self.data.write();
        data.retain(|_, entry| is_live(entry, now));
        data.insert(key.to_string(), Entry { bytes, expires_at });
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.data.write().remove(key).is_some())
    }
}
