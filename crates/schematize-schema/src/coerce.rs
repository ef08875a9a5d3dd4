//! Coercion of an extracted raw value into a field's typed value.

use crate::convert::Lookup;
use crate::error::SchemaError;
use crate::field::FieldSpec;
use crate::value::Value;

/// A coerced value and how it was produced.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Coerced {
    pub(crate) value: Value,
    /// The field's empty value stood in for absent input.
    pub(crate) substituted: bool,
}

impl Coerced {
    fn converted(value: Value) -> Self {
        Self {
            value,
            substituted: false,
        }
    }
}

/// Convert `raw` for `field`.
///
/// An absent (or null) value on an optional field becomes the field's empty
/// value and is flagged as substituted. On a required field it becomes
/// `Null` without running the converter, leaving the type check to reject
/// it. A list field given anything but a sequence fails with
/// `ArrayTypeMismatch`; element conversion failures propagate as
/// `Conversion` errors.
pub(crate) fn coerce(
    field: &FieldSpec,
    raw: Option<&Value>,
    lookup: Lookup,
) -> Result<Coerced, SchemaError> {
    let raw = match raw {
        Some(value) if !value.is_null() => value,
        _ if field.is_required() => return Ok(Coerced::converted(Value::Null)),
        _ => {
            return Ok(Coerced {
                value: field.empty_value(),
                substituted: true,
            })
        }
    };

    let convert = |value: &Value| {
        field
            .converter()
            .apply(value, lookup)
            .map_err(|source| SchemaError::Conversion {
                field: field.name().to_string(),
                source,
            })
    };

    if field.is_list() {
        let items = raw.as_list().ok_or_else(|| SchemaError::ArrayTypeMismatch {
            field: field.name().to_string(),
            actual: raw.kind(),
        })?;
        items
            .iter()
            .map(convert)
            .collect::<Result<Vec<_>, _>>()
            .map(|items| Coerced::converted(Value::List(items)))
    } else {
        convert(raw).map(Coerced::converted)
    }
}
