//! # schematize-schema: Declaration, Coercion and Validation Engine
//!
//! Declare a record type as an ordered set of typed fields, then build
//! typed, validated [`Record`]s from untyped nested input such as a parsed
//! JSON document.
//!
//! ## Declaration (`schema`, `field`, `convert`)
//!
//! A [`SchemaBuilder`] collects [`FieldDecl`]s. Every declaration is
//! finalized on the spot: the type tags, name, path mode, path and
//! converter are checked in a fixed order and the first problem is returned
//! as a [`DeclarationError`]. [`SchemaBuilder::build`] seals the schema into
//! an immutable `Arc<Schema>`.
//!
//! ## Construction (`extract`, `coerce`, `validate`)
//!
//! [`Schema::construct`] walks each field's path through the input, converts
//! the value it finds, and checks it twice: once against the accepted types
//! and once against the field's validator. Required fields always fail
//! hard. Optional fields fail hard unless [`ValidationMode::Lenient`] is
//! chosen.
//!
//! ```
//! use schematize_schema::{FieldDecl, SchemaBuilder, TypeTag, Validator, Value};
//!
//! let schema = SchemaBuilder::new("Counter")
//!     .field(
//!         FieldDecl::new("count")
//!             .of(TypeTag::Integer)
//!             .validator(Validator::named("count >= 5", |v, _| {
//!                 v.as_i64().is_some_and(|n| n >= 5)
//!             })),
//!     )?
//!     .build();
//!
//! let record = schema.construct(&Value::map([("count", "5")]))?;
//! assert_eq!(record.get("count"), Some(&Value::Integer(5)));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Introspection (`introspect`)
//!
//! [`Schema::introspect`] describes fields by dotted path without any data;
//! [`Record::serialize`] and [`Record::deep_inspect`] describe an instance.
//!
//! ## Crate Policy
//!
//! - Depends only on `schematize-core` internally.
//! - Declaration problems are programmer errors and are never tolerated by
//!   a validation mode.
//! - Setters report rejection with `false`; they never return an error.
//! - No `unsafe` code.

mod coerce;
pub mod convert;
pub mod error;
pub mod extract;
pub mod field;
pub mod introspect;
pub mod record;
pub mod schema;
pub mod types;
pub mod validate;
pub mod value;

pub use convert::{ConvertFn, Converter};
pub use error::{ConversionError, DeclarationError, SchemaError};
pub use extract::{dig, Dig};
pub use field::{
    DeclarationDefault, DeclarationDefaults, EmptyValue, FieldDecl, FieldSpec, ModeSpec,
    Multiplicity, TypeSpec, Validator,
};
pub use introspect::{FieldDescriptor, FieldInspection};
pub use record::{FieldAccessor, Record, RecordObserver};
pub use schema::{Schema, SchemaBuilder, ValidationMode};
pub use types::TypeTag;
pub use validate::{
    acceptable_by_validator, acceptable_type, acceptable_value, check_type, check_validator,
    check_value,
};
pub use value::{Map, Value};

pub use schematize_core::{MapKey, PathMode, PathSegment, Symbol};
