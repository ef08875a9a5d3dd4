//! # Error Types
//!
//! Errors raised while parsing the foundational types from text. All errors
//! use `thiserror` for derive-based `Display` and `Error` implementations.

use thiserror::Error;

/// Error produced by the foundational types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A path mode spelling did not name one of the known modes.
    #[error("unknown path mode '{0}'; expected one of [symbol, string, declared]")]
    UnknownPathMode(String),
}
