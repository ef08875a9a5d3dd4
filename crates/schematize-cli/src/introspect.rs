//! # Introspect Subcommand
//!
//! Prints the dotted-path field description of a schema as JSON.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::descriptor::Registry;
use crate::read_text;

/// Arguments for `schematize introspect`.
#[derive(Args, Debug)]
pub struct IntrospectArgs {
    /// Schema descriptor file (YAML or JSON).
    #[arg(long, value_name = "FILE")]
    pub schema: PathBuf,

    /// Schema to describe; defaults to the last one declared.
    #[arg(long, value_name = "NAME")]
    pub root: Option<String>,

    /// Recurse into nested schemas.
    #[arg(long)]
    pub deep: bool,
}

/// Execute the introspect subcommand.
pub fn run_introspect(args: &IntrospectArgs) -> Result<u8> {
    let descriptor = read_text(&args.schema)?;
    let output = introspect_document(&descriptor, args.root.as_deref(), args.deep)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(0)
}

/// Introspect the `root` schema of a descriptor document.
pub fn introspect_document(
    descriptor: &str,
    root: Option<&str>,
    deep: bool,
) -> Result<serde_json::Value> {
    let registry = Registry::compile(&crate::descriptor::parse(descriptor)?)?;
    let schema = registry.root(root)?;
    tracing::debug!(schema = %schema.name(), deep, "introspecting");
    Ok(serde_json::to_value(schema.introspect(deep))?)
}
