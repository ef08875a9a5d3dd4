//! # schematize-core: Foundational Types for schematize
//!
//! This crate defines the small vocabulary every other schematize crate
//! shares: symbolic atoms, the keys a generic input map may carry, and the
//! segments of an extraction path. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Text and symbols are distinct.** A map key is either `Text` or
//!    `Symbol`; a text path segment never matches a symbol key. Which one a
//!    field looks for is decided once, at declaration, by its [`PathMode`].
//!
//! 2. **Paths are data.** A [`PathSegment`] is a plain value that can be
//!    normalized, displayed and compared. Walking a path through a document
//!    is the job of the schema crate, which owns the document tree.
//!
//! 3. **Identifiers are checked, not assumed.** [`is_identifier`] is the
//!    single definition of a valid field name.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `schematize-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod path;
pub mod symbol;

// Re-export primary types for ergonomic imports.
pub use error::CoreError;
pub use path::{MapKey, PathMode, PathSegment};
pub use symbol::{is_identifier, Symbol};
