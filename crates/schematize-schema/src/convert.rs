//! # Converters
//!
//! A converter turns a raw value into a field's typed value. Fields get one
//! of three strategies, settled once at declaration by [`resolve`]:
//!
//! 1. **Explicit function**: a caller-supplied [`Converter::new`] is used
//!    unchanged.
//! 2. **Built-in**: a single accepted type and no converter. Integer, Float,
//!    Text, Symbol and Boolean have dedicated conversions; a nested schema
//!    builds a record from a map (and passes its own records through); List,
//!    Map and Null accept raw values of that kind unchanged.
//! 3. **Dispatch table**: required when several types are accepted. The
//!    table's keys must equal the accepted set, order-independently. At
//!    conversion time the entry whose tag matches the raw value is used,
//!    falling back to the first declared type's entry.

use std::fmt;
use std::sync::Arc;

use crate::error::{ConversionError, DeclarationError};
use crate::types::{describe, TypeTag};
use crate::value::Value;

/// A conversion function.
pub type ConvertFn = Arc<dyn Fn(&Value) -> Result<Value, ConversionError> + Send + Sync>;

/// A caller-supplied conversion strategy.
#[derive(Clone)]
pub enum Converter {
    /// One function for every raw value.
    Single(ConvertFn),
    /// One function per accepted type.
    Table(Vec<(TypeTag, ConvertFn)>),
}

impl Converter {
    /// A single conversion function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, ConversionError> + Send + Sync + 'static,
    {
        Self::Single(Arc::new(f))
    }

    /// An empty dispatch table; add entries with [`Converter::entry`].
    pub fn table() -> Self {
        Self::Table(Vec::new())
    }

    /// A dispatch table using each tag's built-in conversion.
    pub fn builtin_table(tags: &[TypeTag]) -> Self {
        Self::Table(
            tags.iter()
                .map(|tag| {
                    let target = tag.clone();
                    let f: ConvertFn =
                        Arc::new(move |raw: &Value| builtin(&target, raw, Lookup::Path));
                    (tag.clone(), f)
                })
                .collect(),
        )
    }

    /// Add a dispatch entry. Calling this on a single converter discards the
    /// single function and starts a table.
    pub fn entry<F>(self, tag: TypeTag, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, ConversionError> + Send + Sync + 'static,
    {
        let mut entries = match self {
            Self::Table(entries) => entries,
            Self::Single(_) => Vec::new(),
        };
        entries.push((tag, Arc::new(f)));
        Self::Table(entries)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(_) => f.write_str("Converter::Single"),
            Self::Table(entries) => {
                let tags: Vec<TypeTag> = entries.iter().map(|(t, _)| t.clone()).collect();
                write!(f, "Converter::Table[{}]", describe(&tags))
            }
        }
    }
}

/// How nested maps are read when a nested schema builds a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lookup {
    /// Follow each field's declared path (fresh input).
    Path,
    /// Read each field by name (a serialized record being restored).
    Name,
}

/// A field's settled conversion strategy.
#[derive(Clone)]
pub(crate) enum Resolved {
    Custom(ConvertFn),
    Table(Vec<(TypeTag, ConvertFn)>),
    Builtin(TypeTag),
}

impl Resolved {
    pub(crate) fn apply(&self, raw: &Value, lookup: Lookup) -> Result<Value, ConversionError> {
        match self {
            Self::Custom(f) => f(raw),
            Self::Table(entries) => {
                let chosen = entries
                    .iter()
                    .find(|(tag, _)| tag.matches(raw))
                    .or_else(|| entries.first());
                match chosen {
                    Some((_, f)) => f(raw),
                    None => Err(ConversionError::Unconvertible {
                        target: "an empty converter table".into(),
                        kind: raw.kind(),
                    }),
                }
            }
            Self::Builtin(tag) => builtin(tag, raw, lookup),
        }
    }
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(_) => f.write_str("Custom"),
            Self::Table(entries) => {
                let tags: Vec<TypeTag> = entries.iter().map(|(t, _)| t.clone()).collect();
                write!(f, "Table[{}]", describe(&tags))
            }
            Self::Builtin(tag) => write!(f, "Builtin({tag})"),
        }
    }
}

/// Settle a field's conversion strategy.
///
/// `accepted` is the de-duplicated accepted-type list in declaration order.
pub(crate) fn resolve(
    field: &str,
    accepted: &[TypeTag],
    converter: Option<Converter>,
) -> Result<Resolved, DeclarationError> {
    match converter {
        Some(Converter::Single(f)) => Ok(Resolved::Custom(f)),
        Some(Converter::Table(entries)) => resolve_table(field, accepted, entries),
        None => match accepted {
            [single] => Ok(Resolved::Builtin(single.clone())),
            _ => Err(DeclarationError::MissingConverter {
                field: field.to_string(),
                types: describe(accepted),
            }),
        },
    }
}

fn resolve_table(
    field: &str,
    accepted: &[TypeTag],
    entries: Vec<(TypeTag, ConvertFn)>,
) -> Result<Resolved, DeclarationError> {
    let mut unexpected: Vec<TypeTag> = Vec::new();
    for (i, (tag, _)) in entries.iter().enumerate() {
        let repeated = entries[..i].iter().any(|(earlier, _)| earlier == tag);
        if repeated || !accepted.contains(tag) {
            unexpected.push(tag.clone());
        }
    }
    let missing: Vec<TypeTag> = accepted
        .iter()
        .filter(|tag| !entries.iter().any(|(key, _)| key == *tag))
        .cloned()
        .collect();

    if !unexpected.is_empty() || !missing.is_empty() {
        return Err(DeclarationError::ConverterKeysMismatch {
            field: field.to_string(),
            unexpected: describe(&unexpected),
            missing: describe(&missing),
        });
    }

    // Keep the table in accepted-type order so the fallback entry is the
    // first declared type.
    let ordered = accepted
        .iter()
        .filter_map(|tag| entries.iter().find(|(key, _)| key == tag).cloned())
        .collect();
    Ok(Resolved::Table(ordered))
}

fn builtin(tag: &TypeTag, raw: &Value, lookup: Lookup) -> Result<Value, ConversionError> {
    match tag {
        TypeTag::Integer => to_integer(raw),
        TypeTag::Float => to_float(raw),
        TypeTag::Text => to_text(raw),
        TypeTag::Symbol => to_symbol(raw),
        TypeTag::Boolean => to_boolean(raw),
        TypeTag::Schema(schema) => match raw {
            Value::Record(record) if record.schema().name() == schema.name() => Ok(raw.clone()),
            Value::Map(_) => {
                let built = match lookup {
                    Lookup::Path => schema.construct(raw),
                    Lookup::Name => schema.restore(raw),
                };
                built.map(Value::from).map_err(|e| ConversionError::Nested {
                    schema: schema.name().to_string(),
                    source: Box::new(e),
                })
            }
            other => Err(unconvertible(tag, other)),
        },
        TypeTag::Null | TypeTag::List | TypeTag::Map => {
            if tag.matches(raw) {
                Ok(raw.clone())
            } else {
                Err(unconvertible(tag, raw))
            }
        }
    }
}

fn unconvertible(tag: &TypeTag, raw: &Value) -> ConversionError {
    ConversionError::Unconvertible {
        target: tag.name().to_string(),
        kind: raw.kind(),
    }
}

// ── Built-in conversions ─────────────────────────────────────────────

/// Integer conversion: integers pass through, floats truncate, text and
/// symbols must spell an integer (a decimal spelling truncates).
pub fn to_integer(raw: &Value) -> Result<Value, ConversionError> {
    match raw {
        Value::Integer(_) => Ok(raw.clone()),
        Value::Float(f) => truncate(*f).ok_or_else(|| ConversionError::InvalidInteger(f.to_string())),
        Value::Text(s) => parse_integer(s),
        Value::Symbol(s) => parse_integer(s.as_str()),
        other => Err(ConversionError::InvalidInteger(other.to_string())),
    }
}

fn parse_integer(s: &str) -> Result<Value, ConversionError> {
    let trimmed = s.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Ok(Value::Integer(i));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(truncate)
        .ok_or_else(|| ConversionError::InvalidInteger(s.to_string()))
}

// 2^63: the first float past i64::MAX.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Truncate toward zero; `None` when the result does not fit an `i64`.
fn truncate(f: f64) -> Option<Value> {
    let t = f.trunc();
    (t.is_finite() && t >= -I64_BOUND && t < I64_BOUND).then(|| Value::Integer(t as i64))
}

/// Float conversion: numbers widen, text and symbols must spell a number.
pub fn to_float(raw: &Value) -> Result<Value, ConversionError> {
    match raw {
        Value::Float(_) => Ok(raw.clone()),
        Value::Integer(i) => Ok(Value::Float(*i as f64)),
        Value::Text(s) => parse_float(s),
        Value::Symbol(s) => parse_float(s.as_str()),
        other => Err(ConversionError::InvalidFloat(other.to_string())),
    }
}

fn parse_float(s: &str) -> Result<Value, ConversionError> {
    s.trim()
        .parse::<f64>()
        .map(Value::Float)
        .map_err(|_| ConversionError::InvalidFloat(s.to_string()))
}

/// Text conversion: text passes through, scalars render.
pub fn to_text(raw: &Value) -> Result<Value, ConversionError> {
    match raw {
        Value::Text(_) => Ok(raw.clone()),
        Value::Symbol(s) => Ok(Value::text(s.as_str())),
        Value::Integer(_) | Value::Float(_) | Value::Bool(_) => Ok(Value::text(raw.to_string())),
        other => Err(ConversionError::Unconvertible {
            target: "Text".into(),
            kind: other.kind(),
        }),
    }
}

/// Symbol conversion: symbols pass through, text becomes the symbol of the
/// same name.
pub fn to_symbol(raw: &Value) -> Result<Value, ConversionError> {
    match raw {
        Value::Symbol(_) => Ok(raw.clone()),
        Value::Text(s) => Ok(Value::symbol(s.as_str())),
        other => Err(ConversionError::Unconvertible {
            target: "Symbol".into(),
            kind: other.kind(),
        }),
    }
}

/// Spellings accepted as `true`.
pub const TRUE_SPELLINGS: [&str; 3] = ["true", "t", "1"];
/// Spellings accepted as `false`.
pub const FALSE_SPELLINGS: [&str; 3] = ["false", "f", "0"];

/// Boolean conversion over booleans and the recognized text spellings.
pub fn to_boolean(raw: &Value) -> Result<Value, ConversionError> {
    match raw {
        Value::Bool(_) => Ok(raw.clone()),
        Value::Text(s) if TRUE_SPELLINGS.contains(&s.as_str()) => Ok(Value::Bool(true)),
        Value::Text(s) if FALSE_SPELLINGS.contains(&s.as_str()) => Ok(Value::Bool(false)),
        other => Err(ConversionError::UndefinedBoolean(other.to_string())),
    }
}
