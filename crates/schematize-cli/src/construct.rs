//! # Construct Subcommand
//!
//! Builds a record from an input document and prints its serialized form.
//! Data violations print `FAIL:` and exit 1; unreadable files and bad
//! descriptors are errors.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use schematize_schema::{SchemaError, ValidationMode, Value};

use crate::descriptor::Registry;
use crate::read_text;

/// Arguments for `schematize construct`.
#[derive(Args, Debug)]
pub struct ConstructArgs {
    /// Schema descriptor file (YAML or JSON).
    #[arg(long, value_name = "FILE")]
    pub schema: PathBuf,

    /// Input document (YAML or JSON).
    #[arg(long, value_name = "FILE")]
    pub input: PathBuf,

    /// Schema to construct; defaults to the last one declared.
    #[arg(long, value_name = "NAME")]
    pub root: Option<String>,

    /// Keep invalid optional values instead of failing.
    #[arg(long)]
    pub lenient: bool,
}

/// Outcome of constructing one document.
#[derive(Debug)]
pub enum Outcome {
    /// The serialized record, and the optional fields that failed leniently.
    Built {
        /// `Record::to_json` output.
        record: serde_json::Value,
        /// Names of optional fields kept despite failing a check.
        failed: Vec<String>,
    },
    /// Construction was rejected.
    Rejected(SchemaError),
}

/// Execute the construct subcommand.
pub fn run_construct(args: &ConstructArgs) -> Result<u8> {
    let descriptor = read_text(&args.schema)?;
    let input = read_text(&args.input)?;
    let mode = if args.lenient {
        ValidationMode::Lenient
    } else {
        ValidationMode::Strict
    };

    match construct_document(&descriptor, &input, args.root.as_deref(), mode)? {
        Outcome::Built { record, failed } => {
            for field in &failed {
                eprintln!("WARN: optional field '{field}' failed validation");
            }
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(0)
        }
        Outcome::Rejected(e) => {
            println!("FAIL: {e}");
            Ok(1)
        }
    }
}

/// Construct the `root` schema of a descriptor from an input document.
pub fn construct_document(
    descriptor: &str,
    input: &str,
    root: Option<&str>,
    mode: ValidationMode,
) -> Result<Outcome> {
    let registry = Registry::compile(&crate::descriptor::parse(descriptor)?)?;
    let schema = registry.root(root)?;
    let json: serde_json::Value =
        serde_yaml::from_str(input).context("failed to parse input document")?;

    match schema.construct_with(&Value::from(json), mode) {
        Ok(record) => Ok(Outcome::Built {
            record: record.to_json(),
            failed: record.failed_checks().to_vec(),
        }),
        Err(SchemaError::Declaration(e)) => Err(e.into()),
        Err(e) => Ok(Outcome::Rejected(e)),
    }
}
