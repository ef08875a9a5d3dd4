//! # Type Tags
//!
//! A [`TypeTag`] names the semantic type a field accepts. Membership is
//! decided by tag, never by runtime identity: two `Schema` tags are equal
//! when their schemas share a name.
//!
//! A `Schema` tag carries the nested schema itself, so a field knows at
//! declaration time that it composes another schema. That schema's exposed
//! accepted types (see [`SchemaBuilder::also_accepts`]) are folded into the
//! field's acceptable set once, when the field is finalized.
//!
//! [`SchemaBuilder::also_accepts`]: crate::schema::SchemaBuilder::also_accepts

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::schema::Schema;
use crate::value::Value;

/// The semantic type of a field value.
#[derive(Clone)]
pub enum TypeTag {
    /// Signed integers.
    Integer,
    /// Floating point numbers.
    Float,
    /// Text.
    Text,
    /// Symbolic atoms.
    Symbol,
    /// Booleans.
    Boolean,
    /// The null value.
    Null,
    /// Untyped sequences.
    List,
    /// Untyped maps.
    Map,
    /// Records of a nested schema.
    Schema(Arc<Schema>),
}

impl TypeTag {
    /// Tag for records of `schema`.
    pub fn schema(schema: &Arc<Schema>) -> Self {
        Self::Schema(Arc::clone(schema))
    }

    /// The human-readable type name.
    pub fn name(&self) -> &str {
        match self {
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::Text => "Text",
            Self::Symbol => "Symbol",
            Self::Boolean => "Boolean",
            Self::Null => "Null",
            Self::List => "List",
            Self::Map => "Map",
            Self::Schema(schema) => schema.name(),
        }
    }

    /// The nested schema, for `Schema` tags.
    pub fn as_schema(&self) -> Option<&Arc<Schema>> {
        match self {
            Self::Schema(schema) => Some(schema),
            _ => None,
        }
    }

    /// Returns true when `value` is of this type.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Integer, Value::Integer(_))
            | (Self::Float, Value::Float(_))
            | (Self::Text, Value::Text(_))
            | (Self::Symbol, Value::Symbol(_))
            | (Self::Boolean, Value::Bool(_))
            | (Self::Null, Value::Null)
            | (Self::List, Value::List(_))
            | (Self::Map, Value::Map(_)) => true,
            (Self::Schema(schema), Value::Record(record)) => record.schema().name() == schema.name(),
            _ => false,
        }
    }
}

/// Render a list of tags as `Integer, Text`.
pub fn describe(tags: &[TypeTag]) -> String {
    tags.iter()
        .map(TypeTag::name)
        .collect::<Vec<_>>()
        .join(", ")
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Schema(a), Self::Schema(b)) => a.name() == b.name(),
            (Self::Schema(_), _) | (_, Self::Schema(_)) => false,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl Eq for TypeTag {}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(schema) => write!(f, "Schema({})", schema.name()),
            other => f.write_str(other.name()),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parses the primitive tags. Schema tags cannot be spelled; they are
/// resolved by whoever owns the schemas.
impl FromStr for TypeTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "integer" | "int" => Ok(Self::Integer),
            "float" | "number" => Ok(Self::Float),
            "text" | "string" | "str" => Ok(Self::Text),
            "symbol" => Ok(Self::Symbol),
            "boolean" | "bool" => Ok(Self::Boolean),
            "null" | "nil" => Ok(Self::Null),
            "list" | "array" => Ok(Self::List),
            "map" | "object" | "hash" => Ok(Self::Map),
            _ => Err(s.to_string()),
        }
    }
}
