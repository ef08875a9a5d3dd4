//! # Field Validation
//!
//! Two independent checks run on every coerced value:
//!
//! - **type acceptability**: the value's type must be among the field's
//!   extended accepted types;
//! - **validator**: the field's predicate must accept `(typed, raw)`.
//!
//! Both are list-aware: for a list field every element must pass (logical
//! AND), and the validator sees each element alongside the matching raw
//! element.
//!
//! Neither check knows where a value came from. Construction skips both for
//! an empty value substituted on an optional field; a value that was
//! actually supplied is always checked, even when it equals the field's
//! empty value.
//!
//! Each check exists as a `check_*` function returning the violation and an
//! `acceptable_*` probe returning a boolean. Callers pick per call site.

use crate::error::SchemaError;
use crate::field::FieldSpec;
use crate::types::{describe, TypeTag};
use crate::value::Value;

fn type_matches(types: &[TypeTag], value: &Value) -> bool {
    types.iter().any(|tag| tag.matches(value))
}

/// Returns true when `value`'s type is acceptable for `field`.
pub fn acceptable_type(field: &FieldSpec, value: &Value) -> bool {
    let types = field.extended_types();
    if field.is_list() {
        match value.as_list() {
            Some(items) => items.iter().all(|item| type_matches(types, item)),
            None => false,
        }
    } else {
        type_matches(types, value)
    }
}

/// Check `value`'s type against `field`, naming the accepted set on failure.
pub fn check_type(field: &FieldSpec, value: &Value) -> Result<(), SchemaError> {
    if acceptable_type(field, value) {
        Ok(())
    } else {
        Err(SchemaError::TypeMismatch {
            field: field.name().to_string(),
            accepted: describe(field.extended_types()),
            list: field.is_list(),
        })
    }
}

/// Returns true when `field`'s validator accepts `value`.
pub fn acceptable_by_validator(field: &FieldSpec, value: &Value, raw: &Value) -> bool {
    let validator = field.validator();
    match (field.is_list(), value.as_list()) {
        (true, Some(items)) => items.iter().enumerate().all(|(i, item)| {
            let raw_item = raw.as_list().and_then(|r| r.get(i)).unwrap_or(raw);
            validator.call(item, raw_item)
        }),
        _ => validator.call(value, raw),
    }
}

/// Check `value` against `field`'s validator, naming it on failure.
pub fn check_validator(field: &FieldSpec, value: &Value, raw: &Value) -> Result<(), SchemaError> {
    if acceptable_by_validator(field, value, raw) {
        Ok(())
    } else {
        Err(SchemaError::ValidatorMismatch {
            field: field.name().to_string(),
            validator: field.validator().name().to_string(),
            list: field.is_list(),
        })
    }
}

/// Both checks, type first.
pub fn check_value(field: &FieldSpec, value: &Value, raw: &Value) -> Result<(), SchemaError> {
    check_type(field, value)?;
    check_validator(field, value, raw)
}

/// Both probes, type first.
pub fn acceptable_value(field: &FieldSpec, value: &Value, raw: &Value) -> bool {
    acceptable_type(field, value) && acceptable_by_validator(field, value, raw)
}
