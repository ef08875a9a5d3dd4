//! # schematize-cli: Command-Line Front End
//!
//! Drives the schema engine from declarative descriptor files.
//!
//! ## Subcommands
//!
//! - `introspect`: describe a schema's fields by dotted path
//! - `construct`: build a record from a JSON or YAML document
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers; handlers are plain
//!   functions over text so they can be tested without files.
//! - No schema logic lives here: descriptors compile to `schematize-schema`
//!   declarations and everything else is delegated.

use std::path::Path;

use anyhow::{Context, Result};

pub mod construct;
pub mod descriptor;
pub mod introspect;

/// Read a UTF-8 file, naming it in the error.
pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
