//! # Error Types: Declaration, Conversion and Data Validation
//!
//! Three families of errors leave this crate:
//!
//! - [`DeclarationError`]: a field or schema was declared incorrectly. Always
//!   raised, at declaration time, before any data flows. Never gated by a
//!   validation mode.
//! - [`ConversionError`]: a converter could not turn a raw value into the
//!   field's typed value. Wrapped in `SchemaError::Conversion`.
//! - [`SchemaError`]: the umbrella type returned by construction. Its
//!   `TypeMismatch`, `ValidatorMismatch` and `ArrayTypeMismatch` variants are
//!   the data-validation failures.
//!
//! Lenient construction tolerates conversion and data-validation failures
//! on optional fields alike; on required fields every one is raised.

use schematize_core::CoreError;
use thiserror::Error;

/// A field or schema declaration was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeclarationError {
    /// The single declared type is not a known type tag.
    #[error("field '{field}': type expected to be a known type tag; given '{given}'")]
    InvalidType {
        /// Field being declared.
        field: String,
        /// The offending type spelling.
        given: String,
    },

    /// An element of the alternative-types list is not a known type tag.
    #[error("field '{field}': types expected to be a list of known type tags; given '{given}'")]
    InvalidTypes {
        /// Field being declared.
        field: String,
        /// The offending type spelling.
        given: String,
    },

    /// Neither a type nor alternative types were declared.
    #[error("field '{field}': at least one accepted type is required")]
    NoTypes {
        /// Field being declared.
        field: String,
    },

    /// The field name is not an identifier.
    #[error("name expected to be an identifier; given '{0}'")]
    InvalidName(String),

    /// The path mode spelling is unknown.
    #[error("field '{field}': {source}")]
    InvalidPathMode {
        /// Field being declared.
        field: String,
        /// Parse failure from the foundational types.
        source: CoreError,
    },

    /// The extraction path is empty.
    #[error("field '{field}': path expected to be a non-empty sequence")]
    EmptyPath {
        /// Field being declared.
        field: String,
    },

    /// Several accepted types were declared without a converter table.
    #[error("field '{field}': converter expected to be populated with multiple accepted types [{types}]")]
    MissingConverter {
        /// Field being declared.
        field: String,
        /// The accepted types, comma separated.
        types: String,
    },

    /// The converter table's keys differ from the accepted types.
    #[error(
        "field '{field}': converter table keys do not match accepted types; \
         unexpected [{unexpected}], missing [{missing}]"
    )]
    ConverterKeysMismatch {
        /// Field being declared.
        field: String,
        /// Keys present in the table but not accepted (or repeated).
        unexpected: String,
        /// Accepted types without a table entry.
        missing: String,
    },

    /// A field with the same name was already declared on the schema.
    #[error("schema '{schema}' already declares field '{field}'")]
    DuplicateField {
        /// Schema being declared.
        schema: String,
        /// The repeated field name.
        field: String,
    },
}

/// A converter failed to produce a typed value.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// Text or a symbol that does not spell an integer.
    #[error("'{0}' is not a valid Integer")]
    InvalidInteger(String),

    /// Text or a symbol that does not spell a float.
    #[error("'{0}' is not a valid Float")]
    InvalidFloat(String),

    /// A value outside the recognized boolean spellings.
    #[error("'{0}' is not a valid Boolean")]
    UndefinedBoolean(String),

    /// The raw value's kind cannot produce the target type.
    #[error("cannot build {target} from a {kind} value")]
    Unconvertible {
        /// Target type name.
        target: String,
        /// Kind of the raw value.
        kind: &'static str,
    },

    /// A nested schema rejected the raw value.
    #[error("nested {schema} record rejected: {source}")]
    Nested {
        /// The nested schema's name.
        schema: String,
        /// Why the nested construction failed.
        source: Box<SchemaError>,
    },

    /// Failure reported by a caller-supplied converter.
    #[error("{0}")]
    Custom(String),
}

impl ConversionError {
    /// Build a failure for a caller-supplied converter.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}

/// Errors returned by record construction and explicit validation.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A declaration was rejected.
    #[error(transparent)]
    Declaration(#[from] DeclarationError),

    /// The typed value's type is not in the field's accepted set.
    #[error(
        "field '{field}' is an invalid option based on accepted types [{accepted}]{}",
        list_note(.list)
    )]
    TypeMismatch {
        /// Field that failed.
        field: String,
        /// The (extended) accepted types, comma separated.
        accepted: String,
        /// Whether the field holds a list.
        list: bool,
    },

    /// The typed value failed the field's validator.
    #[error(
        "field '{field}' is an invalid option based on validator '{validator}'{}",
        list_note(.list)
    )]
    ValidatorMismatch {
        /// Field that failed.
        field: String,
        /// The validator's name.
        validator: String,
        /// Whether the field holds a list.
        list: bool,
    },

    /// A list field received something other than a sequence.
    #[error("field '{field}' expected a sequence because it holds a list; given {actual}")]
    ArrayTypeMismatch {
        /// Field that failed.
        field: String,
        /// Kind of the value actually received.
        actual: &'static str,
    },

    /// The field's converter failed.
    #[error("field '{field}' could not be converted: {source}")]
    Conversion {
        /// Field that failed.
        field: String,
        /// The converter's own error.
        source: ConversionError,
    },
}

impl SchemaError {
    /// The field this error refers to, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::TypeMismatch { field, .. }
            | Self::ValidatorMismatch { field, .. }
            | Self::ArrayTypeMismatch { field, .. }
            | Self::Conversion { field, .. } => Some(field),
            Self::Declaration(_) => None,
        }
    }

    /// Returns true for the data-validation failures: the value converted
    /// (or had the wrong shape) but was not acceptable.
    pub fn is_data_violation(&self) -> bool {
        matches!(
            self,
            Self::TypeMismatch { .. } | Self::ValidatorMismatch { .. } | Self::ArrayTypeMismatch { .. }
        )
    }
}

fn list_note(list: &bool) -> &'static str {
    if *list {
        " -- list of values"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_mismatch_names_field_and_list() {
        let err = SchemaError::TypeMismatch {
            field: "tags".into(),
            accepted: "Text".into(),
            list: true,
        };
        let msg = err.to_string();
        assert!(msg.contains("'tags'"));
        assert!(msg.contains("[Text]"));
        assert!(msg.ends_with("list of values"));
    }

    #[test]
    fn validator_mismatch_names_validator() {
        let err = SchemaError::ValidatorMismatch {
            field: "count".into(),
            validator: "at least five".into(),
            list: false,
        };
        assert_eq!(
            err.to_string(),
            "field 'count' is an invalid option based on validator 'at least five'"
        );
    }

    #[test]
    fn declaration_errors_are_transparent() {
        let err: SchemaError = DeclarationError::InvalidName("bad name".into()).into();
        assert_eq!(err.to_string(), "name expected to be an identifier; given 'bad name'");
        assert!(err.field().is_none());
        assert!(!err.is_data_violation());
    }

    #[test]
    fn conversion_error_carries_source() {
        let err = SchemaError::Conversion {
            field: "flag".into(),
            source: ConversionError::UndefinedBoolean("maybe".into()),
        };
        assert_eq!(err.field(), Some("flag"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_data_violation());
    }

    #[test]
    fn array_mismatch_is_a_data_violation() {
        let err = SchemaError::ArrayTypeMismatch {
            field: "tags".into(),
            actual: "text",
        };
        assert!(err.is_data_violation());
        assert!(err.to_string().contains("given text"));
    }
}
