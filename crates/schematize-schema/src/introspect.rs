//! # Introspection
//!
//! [`Schema::introspect`] describes a schema without touching any data.
//! Each field is keyed by its dotted path; with `deep`, a field whose only
//! type is a nested schema also contributes the nested schema's fields
//! under its own path. List fields mark their last segment with `[x]`
//! before recursing, so `children[x].id` reads as "the id of each child".
//!
//! [`Record::deep_inspect`] is the per-instance counterpart.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::field::FieldSpec;
use crate::record::Record;
use crate::schema::Schema;
use crate::types::TypeTag;
use crate::value::Value;

/// Static description of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    /// Whether the field is required.
    pub required: bool,
    /// Human-readable accepted types.
    pub allowed: String,
}

/// Per-instance description of one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldInspection {
    /// Whether the field is required.
    pub required: bool,
    /// The field's extended accepted types, by name.
    pub acceptable_types: Vec<String>,
    /// The field's current value.
    pub value: Value,
    /// The record's raw input, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_input: Option<Value>,
}

fn humanize(field: &FieldSpec) -> String {
    match field.accepted_types() {
        [TypeTag::Schema(schema)] if field.is_list() => format!("Array of {}", schema.name()),
        [single] => single.name().to_string(),
        many => format!(
            "One of [{}]",
            many.iter().map(TypeTag::name).collect::<Vec<_>>().join(", ")
        ),
    }
}

impl Schema {
    /// Describe every field, keyed by dotted path.
    pub fn introspect(&self, deep: bool) -> BTreeMap<String, FieldDescriptor> {
        let mut out = BTreeMap::new();
        self.introspect_into(deep, &[], &mut out);
        out
    }

    fn introspect_into(
        &self,
        deep: bool,
        prefix: &[String],
        out: &mut BTreeMap<String, FieldDescriptor>,
    ) {
        for field in self.fields() {
            let mut naming: Vec<String> = prefix.to_vec();
            naming.extend(field.path().iter().map(|segment| segment.label()));
            out.insert(
                naming.join("."),
                FieldDescriptor {
                    required: field.is_required(),
                    allowed: humanize(field),
                },
            );

            if !deep {
                continue;
            }
            if let Some(nested) = field.nested_schema() {
                if field.is_list() {
                    if let Some(last) = naming.last_mut() {
                        last.push_str("[x]");
                    }
                }
                nested.introspect_into(deep, &naming, out);
            }
        }
    }
}

impl Record {
    /// Describe every field with its current value, in schema order.
    pub fn deep_inspect(&self, with_raw: bool) -> Vec<(String, FieldInspection)> {
        self.schema()
            .fields()
            .iter()
            .zip(self.entries())
            .map(|(field, (name, value))| {
                (
                    name.to_string(),
                    FieldInspection {
                        required: field.is_required(),
                        acceptable_types: field
                            .extended_types()
                            .iter()
                            .map(|t| t.name().to_string())
                            .collect(),
                        value: value.clone(),
                        raw_input: with_raw.then(|| self.raw().clone()),
                    },
                )
            })
            .collect()
    }
}
