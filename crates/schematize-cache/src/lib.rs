//! # schematize-cache: Record Caching
//!
//! Persists constructed records against a pluggable key-value store and
//! reads them back.
//!
//! ## Pieces
//!
//! - [`CacheStore`]: the store boundary (`read`, `write` with TTL,
//!   `delete`, `delete_multi`); [`MemoryStore`] is the in-process
//!   implementation.
//! - [`RecordKeeper`]: per-namespace index of cached keys and their expiry,
//!   stored in the same store under the namespace key.
//! - [`RecordCache`]: a [`RecordObserver`](schematize_schema::RecordObserver)
//!   that caches records on construction and refreshes them on
//!   reassignment, plus listing and cleanup operations.
//! - [`CacheConfiguration`]: validated options, installable once per
//!   process with [`configure`].
//!
//! ```
//! use std::sync::Arc;
//! use schematize_cache::{CacheConfiguration, RecordCache};
//! use schematize_schema::{FieldDecl, SchemaBuilder, TypeTag, Value};
//!
//! let cache = Arc::new(RecordCache::new(CacheConfiguration::default()));
//! let mut builder = SchemaBuilder::new("Order");
//! builder.declare_field(FieldDecl::new("id").of(TypeTag::Integer))?;
//! builder.observer(cache.clone());
//! let schema = builder.build();
//!
//! schema.construct(&Value::map([("id", 7)]))?;
//! assert_eq!(cache.cached_keys(&schema)?.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Crate Policy
//!
//! - Depends only on `schematize-schema` internally.
//! - Observer hooks cannot fail construction: store errors inside hooks are
//!   logged, never propagated.
//! - Configuration values are validated when assigned, never at use.

pub mod cache;
pub mod config;
pub mod error;
pub mod keeper;
pub mod store;

pub use cache::RecordCache;
pub use config::{
    configuration, configure, default_key, CacheConfiguration, CacheSettings, KeyFn, DEFAULT_STOCHASTIC_BUST,
    DEFAULT_TTL,
};
pub use error::{CacheError, ConfigError};
pub use keeper::RecordKeeper;
pub use store::{system_clock, CacheStore, Clock, MemoryStore};
