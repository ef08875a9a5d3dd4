//! # Cache Configuration
//!
//! [`CacheConfiguration`] holds every cache option. Setters validate on
//! assignment and return [`ConfigError`] for out-of-range values, so an
//! installed configuration is always usable.
//!
//! ## Process-wide installation
//!
//! [`configure`] installs a configuration once per process; [`configuration`]
//! returns it, falling back to the defaults when nothing was installed.
//! [`CacheSettings`] is the serializable subset, loadable from YAML or JSON.
//!
//! ## Defaults
//!
//! | Option | Default |
//! |---|---|
//! | client | a fresh [`MemoryStore`] |
//! | namespace | `jss:<lowercased schema name>` |
//! | key | custom key when given, else SHA-256 hex of the record's JSON |
//! | ttl | one day |
//! | stochastic bust | 0.8 |
//! | update on change | true |

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use schematize_schema::Record;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ConfigError;
use crate::store::{system_clock, CacheStore, Clock, MemoryStore};

/// Derives the record-specific part of a cache key.
pub type KeyFn = Arc<dyn Fn(&Record, Option<&str>) -> String + Send + Sync>;

/// One day.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60 * 24);

/// Default probability threshold for pruning on `cached_items`.
pub const DEFAULT_STOCHASTIC_BUST: f64 = 0.8;

/// Prefix of the default namespace.
pub const NAMESPACE_PREFIX: &str = "jss";

/// The default key: the custom key when given, otherwise the SHA-256 hex
/// digest of the record's JSON rendering.
pub fn default_key(record: &Record, custom: Option<&str>) -> String {
    if let Some(custom) = custom {
        return custom.to_string();
    }
    let json = record.to_json().to_string();
    Sha256::digest(json.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Every cache option.
#[derive(Clone)]
pub struct CacheConfiguration {
    client: Arc<dyn CacheStore>,
    namespace: Option<String>,
    key: KeyFn,
    ttl: Duration,
    stochastic_bust: f64,
    update_on_change: bool,
    clock: Clock,
}

impl Default for CacheConfiguration {
    fn default() -> Self {
        Self {
            client: Arc::new(MemoryStore::new()),
            namespace: None,
            key: Arc::new(default_key),
            ttl: DEFAULT_TTL,
            stochastic_bust: DEFAULT_STOCHASTIC_BUST,
            update_on_change: true,
            clock: system_clock(),
        }
    }
}

impl CacheConfiguration {
    /// Apply serialized settings over the defaults.
    pub fn from_settings(settings: &CacheSettings) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(namespace) = &settings.namespace {
            config.set_namespace(namespace.clone())?;
        }
        if let Some(ttl) = settings.ttl_seconds {
            config.set_ttl(Duration::from_secs(ttl))?;
        }
        if let Some(bust) = settings.stochastic_bust {
            config.set_stochastic_bust(bust)?;
        }
        if let Some(update) = settings.update_on_change {
            config.set_update_on_change(update);
        }
        Ok(config)
    }

    /// The backing store.
    pub fn client(&self) -> &Arc<dyn CacheStore> {
        &self.client
    }

    /// Replace the backing store.
    pub fn set_client(&mut self, client: Arc<dyn CacheStore>) -> &mut Self {
        self.client = client;
        self
    }

    /// The configured namespace, if one overrides the per-schema default.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Use one namespace for every schema.
    pub fn set_namespace(&mut self, namespace: impl Into<String>) -> Result<&mut Self, ConfigError> {
        let namespace = namespace.into();
        if namespace.trim().is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        self.namespace = Some(namespace);
        Ok(self)
    }

    /// The namespace used for records of `schema_name`.
    pub fn namespace_for(&self, schema_name: &str) -> String {
        match &self.namespace {
            Some(namespace) => namespace.clone(),
            None => format!("{NAMESPACE_PREFIX}:{}", schema_name.to_lowercase()),
        }
    }

    /// The key function.
    pub fn key_fn(&self) -> &KeyFn {
        &self.key
    }

    /// Replace the key function.
    pub fn set_key_fn<F>(&mut self, key: F) -> &mut Self
    where
        F: Fn(&Record, Option<&str>) -> String + Send + Sync + 'static,
    {
        self.key = Arc::new(key);
        self
    }

    /// Entry lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Set the entry lifetime; at least one second.
    pub fn set_ttl(&mut self, ttl: Duration) -> Result<&mut Self, ConfigError> {
        if ttl.as_secs() == 0 {
            return Err(ConfigError::ZeroTtl);
        }
        self.ttl = ttl;
        Ok(self)
    }

    /// Threshold above which a random draw triggers pruning.
    pub fn stochastic_bust(&self) -> f64 {
        self.stochastic_bust
    }

    /// Set the pruning threshold; a probability in `[0, 1]`.
    pub fn set_stochastic_bust(&mut self, bust: f64) -> Result<&mut Self, ConfigError> {
        if !(0.0..=1.0).contains(&bust) {
            return Err(ConfigError::StochasticBustOutOfRange(bust));
        }
        self.stochastic_bust = bust;
        Ok(self)
    }

    /// Whether reassignments refresh the cache.
    pub fn update_on_change(&self) -> bool {
        self.update_on_change
    }

    /// Toggle refreshing the cache on reassignment.
    pub fn set_update_on_change(&mut self, update: bool) -> &mut Self {
        self.update_on_change = update;
        self
    }

    /// The clock used for expiry.
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Replace the clock.
    pub fn set_clock(&mut self, clock: Clock) -> &mut Self {
        self.clock = clock;
        self
    }

    /// The serializable subset of this configuration.
    pub fn settings(&self) -> CacheSettings {
        CacheSettings {
            namespace: self.namespace.clone(),
            ttl_seconds: Some(self.ttl.as_secs()),
            stochastic_bust: Some(self.stochastic_bust),
            update_on_change: Some(self.update_on_change),
        }
    }
}

impl fmt::Debug for CacheConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfiguration")
            .field("namespace", &self.namespace)
            .field("ttl", &self.ttl)
            .field("stochastic_bust", &self.stochastic_bust)
            .field("update_on_change", &self.update_on_change)
            .finish_non_exhaustive()
    }
}

/// Serializable cache options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSettings {
    /// Namespace for every schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Entry lifetime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<u64>,
    /// Pruning threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stochastic_bust: Option<f64>,
    /// Refresh on reassignment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_on_change: Option<bool>,
}

impl CacheSettings {
    /// Parse settings from YAML (JSON is accepted too).
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|e| ConfigError::Settings(e.to_string()))
    }
}

static GLOBAL: OnceLock<CacheConfiguration> = OnceLock::new();

/// Install the process-wide configuration. Fails if one is already
/// installed, or if [`configuration`] already fell back to the defaults.
pub fn configure(config: CacheConfiguration) -> Result<(), ConfigError> {
    GLOBAL.set(config).map_err(|_| ConfigError::AlreadyConfigured)?;
    tracing::debug!("cache configuration installed");
    Ok(())
}

/// The process-wide configuration.
pub fn configuration() -> &'static CacheConfiguration {
    GLOBAL.get_or_init(CacheConfiguration::default)
}
