//! # Cache Error Types
//!
//! [`ConfigError`] covers invalid configuration values and is always raised
//! at assignment. [`CacheError`] covers store and payload failures at use
//! time.

use thiserror::Error;

/// An invalid cache configuration value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The cleanup threshold must be a probability.
    #[error("stochastic bust threshold must be within [0, 1]; given {0}")]
    StochasticBustOutOfRange(f64),

    /// Entries must live for at least one second.
    #[error("cache ttl must be at least one second")]
    ZeroTtl,

    /// A namespace prefixes every key and cannot be blank.
    #[error("cache namespace must not be empty")]
    EmptyNamespace,

    /// The process-wide configuration can be installed once.
    #[error("cache configuration is already installed")]
    AlreadyConfigured,

    /// A settings document could not be parsed.
    #[error("invalid cache settings: {0}")]
    Settings(String),
}

/// A cache operation failed.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The backing store reported a failure.
    #[error("cache store failure: {0}")]
    Store(String),

    /// A payload could not be encoded or decoded.
    #[error("cache payload error: {0}")]
    Payload(#[from] serde_json::Error),
}
