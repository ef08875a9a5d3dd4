//! # Record Keeper
//!
//! The keeper is the index of one namespace: every cached key with its
//! expiry as unix seconds. It is stored as JSON under the namespace key
//! itself, so any process sharing the store sees the same index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Cached keys of one namespace and their expiry times.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKeeper {
    entries: BTreeMap<String, i64>,
}

impl RecordKeeper {
    /// Decode a stored keeper. Missing or unreadable bytes give an empty
    /// keeper; unreadable bytes are logged.
    pub fn decode(bytes: Option<&[u8]>) -> Self {
        let Some(bytes) = bytes else {
            return Self::default();
        };
        match serde_json::from_slice(bytes) {
            Ok(keeper) => keeper,
            Err(e) => {
                tracing::warn!(error = %e, "unreadable record keeper; starting empty");
                Self::default()
            }
        }
    }

    /// Encode for storage.
    pub fn encode(&self) -> Result<Vec<u8>, CacheError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Track `key` until `expires_at`.
    pub fn insert(&mut self, key: impl Into<String>, expires_at: i64) {
        self.entries.insert(key.into(), expires_at);
    }

    /// Stop tracking `key`.
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop every entry expiring at or before `now`. Returns how many were
    /// dropped.
    pub fn prune(&mut self, now: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, expires_at| *expires_at > now);
        before - self.entries.len()
    }

    /// Keys still live at `now`, in key order.
    pub fn live_keys(&self, now: i64) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, expires_at)| **expires_at > now)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Every tracked key, expired or not.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
