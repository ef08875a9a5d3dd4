//! # Record Cache
//!
//! [`RecordCache`] persists records of a schema under
//! `<namespace>:<key>` and tracks them in the namespace's
//! [`RecordKeeper`]. Attached to a schema as an observer, it caches every
//! successfully constructed record and, when `update_on_change` is set,
//! evicts a record's entry before a reassignment and rewrites it after, so
//! keys derived from the old state never linger.
//!
//! A record built with a custom key (see
//! [`Schema::construct_keyed`](schematize_schema::Schema::construct_keyed))
//! passes that key to the key function in every hook, so its entry is
//! evicted and rewritten under the key it was stored with.
//!
//! Cached payloads are the record's JSON rendering. Reading them back goes
//! through [`Schema::restore`], which never notifies observers, so listing
//! the cache does not write to it.

use std::sync::Arc;

use parking_lot::Mutex;
use schematize_schema::{Record, RecordObserver, Schema, Value};

use crate::config::{configuration, CacheConfiguration};
use crate::error::CacheError;
use crate::keeper::RecordKeeper;

/// Caches records of any schema it observes.
pub struct RecordCache {
    config: CacheConfiguration,
    // Serializes read-modify-write cycles on keepers within this process.
    keeper_lock: Mutex<()>,
}

impl RecordCache {
    /// A cache with its own configuration.
    pub fn new(config: CacheConfiguration) -> Self {
        Self {
            config,
            keeper_lock: Mutex::new(()),
        }
    }

    /// A cache using the process-wide configuration.
    pub fn from_global() -> Self {
        Self::new(configuration().clone())
    }

    /// The cache's configuration.
    pub fn config(&self) -> &CacheConfiguration {
        &self.config
    }

    /// Namespace for records of `schema`.
    pub fn namespace(&self, schema: &Schema) -> String {
        self.config.namespace_for(schema.name())
    }

    /// Full cache key of `record`.
    pub fn cache_key(&self, record: &Record, custom: Option<&str>) -> String {
        let suffix = (self.config.key_fn())(record, custom);
        format!("{}:{suffix}", self.namespace(record.schema()))
    }

    fn now(&self) -> i64 {
        (self.config.clock())().timestamp()
    }

    fn load_keeper(&self, namespace: &str) -> Result<RecordKeeper, CacheError> {
        let bytes = self.config.client().read(namespace)?;
        Ok(RecordKeeper::decode(bytes.as_deref()))
    }

    fn save_keeper(&self, namespace: &str, keeper: &RecordKeeper) -> Result<(), CacheError> {
        self.config.client().write(namespace, keeper.encode()?, None)
    }

    /// Cache `record` under its own key: the custom key it was built with,
    /// if any.
    pub fn store(&self, record: &Record) -> Result<String, CacheError> {
        self.store_as(record, record.custom_key())
    }

    /// Cache `record`, passing `custom` to the key function.
    pub fn store_as(&self, record: &Record, custom: Option<&str>) -> Result<String, CacheError> {
        let namespace = self.namespace(record.schema());
        let key = self.cache_key(record, custom);
        let ttl = self.config.ttl();
        let expires_at = self.now() + i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX / 2);

        let payload = serde_json::to_vec(&record.to_json())?;
        {
            let _guard = self.keeper_lock.lock();
            let mut keeper = self.load_keeper(&namespace)?;
            keeper.insert(key.clone(), expires_at);
            self.save_keeper(&namespace, &keeper)?;
        }
        self.config.client().write(&key, payload, Some(ttl))?;
        tracing::debug!(namespace = %namespace, key = %key, "cached record");
        Ok(key)
    }

    /// Remove `record`'s entry under its own key.
    pub fn evict(&self, record: &Record) -> Result<bool, CacheError> {
        self.evict_as(record, record.custom_key())
    }

    /// Remove `record`'s entry, passing `custom` to the key function.
    pub fn evict_as(&self, record: &Record, custom: Option<&str>) -> Result<bool, CacheError> {
        let namespace = self.namespace(record.schema());
        let key = self.cache_key(record, custom);
        let removed = self.config.client().delete(&key)?;
        let _guard = self.keeper_lock.lock();
        let mut keeper = self.load_keeper(&namespace)?;
        if keeper.remove(&key) {
            self.save_keeper(&namespace, &keeper)?;
        }
        tracing::debug!(namespace = %namespace, key = %key, removed, "evicted record");
        Ok(removed)
    }

    /// Keys of `schema`'s namespace that have not expired.
    pub fn cached_keys(&self, schema: &Schema) -> Result<Vec<String>, CacheError> {
        let keeper = self.load_keeper(&self.namespace(schema))?;
        Ok(keeper.live_keys(self.now()))
    }

    /// Rebuild every live cached record of `schema`, optionally only those
    /// whose key contains `key_includes`.
    ///
    /// With probability `1 - stochastic_bust`, expired keeper entries are
    /// pruned first. Entries whose payload has disappeared are skipped, as
    /// are entries that no longer restore; those are logged.
    pub fn cached_items(
        &self,
        schema: &Arc<Schema>,
        key_includes: Option<&str>,
    ) -> Result<Vec<Record>, CacheError> {
        if rand::random::<f64>() > self.config.stochastic_bust() {
            self.clear_unscored_items(schema)?;
        }

        let mut records = Vec::new();
        for key in self.cached_keys(schema)? {
            if key_includes.is_some_and(|needle| !key.contains(needle)) {
                continue;
            }
            let Some(bytes) = self.config.client().read(&key)? else {
                continue;
            };
            let json: serde_json::Value = serde_json::from_slice(&bytes)?;
            match schema.restore(&Value::from(json)) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "skipping cached entry that no longer restores");
                }
            }
        }
        Ok(records)
    }

    /// Drop expired entries from `schema`'s keeper. Returns how many were
    /// dropped.
    pub fn clear_unscored_items(&self, schema: &Schema) -> Result<usize, CacheError> {
        let namespace = self.namespace(schema);
        let _guard = self.keeper_lock.lock();
        let mut keeper = self.load_keeper(&namespace)?;
        let removed = keeper.prune(self.now());
        if removed > 0 {
            self.save_keeper(&namespace, &keeper)?;
            tracing::debug!(namespace = %namespace, removed, "pruned expired keys");
        }
        Ok(removed)
    }

    /// Remove every entry of `schema`'s namespace, keeper included. Returns
    /// how many store entries were removed.
    pub fn clear_cache(&self, schema: &Schema) -> Result<usize, CacheError> {
        let namespace = self.namespace(schema);
        let _guard = self.keeper_lock.lock();
        let keeper = self.load_keeper(&namespace)?;
        let keys: Vec<String> = std::iter::once(namespace.clone())
            .chain(keeper.keys().map(str::to_string))
            .collect();
        let removed = self.config.client().delete_multi(&keys)?;
        tracing::debug!(namespace = %namespace, removed, "cleared cache");
        Ok(removed)
    }
}

impl RecordObserver for RecordCache {
    fn after_construct(&self, record: &Record) {
        if let Err(e) = self.store(record) {
            tracing::warn!(schema = %record.schema().name(), error = %e, "failed to cache record");
        }
    }

    fn before_mutation(&self, record: &Record, field: &str, _value: &Value) {
        if !self.config.update_on_change() {
            return;
        }
        if let Err(e) = self.evict(record) {
            tracing::warn!(schema = %record.schema().name(), field, error = %e, "failed to evict record");
        }
    }

    fn after_mutation(&self, record: &Record, field: &str) {
        if !self.config.update_on_change() {
            return;
        }
        if let Err(e) = self.store(record) {
            tracing::warn!(schema = %record.schema().name(), field, error = %e, "failed to re-cache record");
        }
    }
}

impl std::fmt::Debug for RecordCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCache")
            .field("config", &self.config)
            .finish()
    }
}
