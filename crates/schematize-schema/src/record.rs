//! # Records
//!
//! A [`Record`] is one constructed instance of a [`Schema`]. Field values
//! are stored by slot in the schema's field order, so accessors resolve to
//! an index once, when the schema is built.
//!
//! ## Reassignment
//!
//! [`Record::set`] and [`FieldAccessor::set`] re-run both validation checks
//! on the new value. A rejected value leaves the record untouched and the
//! setter returns `false`; setters never fail with an error, whatever mode
//! the record was constructed in. Assigning the declared empty value to an
//! optional field whose types cannot hold it (`Null` on a scalar) clears
//! the field without running the checks. Observers are notified before an
//! accepted value is committed and again after.
//!
//! ## Custom keys
//!
//! A record built with [`Schema::construct_keyed`] carries the caller's key
//! for its whole life; observers read it through [`Record::custom_key`].

use std::fmt;
use std::sync::Arc;

use crate::field::FieldSpec;
use crate::schema::Schema;
use crate::validate::acceptable_value;
use crate::value::Value;

/// Lifecycle hooks fired by construction and reassignment.
pub trait RecordObserver: Send + Sync {
    /// Called once after a successful, fully assigned construction.
    fn after_construct(&self, _record: &Record) {}

    /// Called before an accepted reassignment of `field` to `value` is
    /// committed; `record` still holds the previous value.
    fn before_mutation(&self, _record: &Record, _field: &str, _value: &Value) {}

    /// Called after a reassignment of `field` is committed.
    fn after_mutation(&self, _record: &Record, _field: &str) {}
}

/// Getter and validated setter for one field of one schema.
#[derive(Debug, Clone)]
pub struct FieldAccessor {
    field: Arc<FieldSpec>,
    slot: usize,
}

impl FieldAccessor {
    pub(crate) fn new(field: Arc<FieldSpec>, slot: usize) -> Self {
        Self { field, slot }
    }

    /// The field this accessor is bound to.
    pub fn field(&self) -> &FieldSpec {
        &self.field
    }

    fn belongs_to(&self, record: &Record) -> bool {
        record
            .schema
            .fields()
            .get(self.slot)
            .is_some_and(|f| Arc::ptr_eq(f, &self.field))
    }

    /// The field's current value, or `None` for a record of another schema.
    pub fn get<'r>(&self, record: &'r Record) -> Option<&'r Value> {
        if self.belongs_to(record) {
            record.values.get(self.slot)
        } else {
            None
        }
    }

    /// Replace the field's value if it passes both checks.
    pub fn set(&self, record: &mut Record, value: Value) -> bool {
        if !self.belongs_to(record) {
            return false;
        }
        if !self.field.is_clearing(&value) && !acceptable_value(&self.field, &value, &value) {
            tracing::debug!(
                schema = %record.schema.name(),
                field = %self.field.name(),
                "rejected reassignment"
            );
            return false;
        }

        let schema = Arc::clone(&record.schema);
        for observer in schema.observers() {
            observer.before_mutation(record, self.field.name(), &value);
        }
        record.values[self.slot] = value;
        for observer in schema.observers() {
            observer.after_mutation(record, self.field.name());
        }
        true
    }
}

/// A constructed record.
#[derive(Clone)]
pub struct Record {
    schema: Arc<Schema>,
    values: Vec<Value>,
    fully_assigned: bool,
    raw: Value,
    failed_checks: Vec<String>,
    custom_key: Option<String>,
}

impl Record {
    pub(crate) fn assembled(
        schema: Arc<Schema>,
        values: Vec<Value>,
        raw: Value,
        failed_checks: Vec<String>,
    ) -> Self {
        Self {
            schema,
            values,
            fully_assigned: true,
            raw,
            failed_checks,
            custom_key: None,
        }
    }

    pub(crate) fn with_custom_key(mut self, key: Option<String>) -> Self {
        self.custom_key = key;
        self
    }

    /// The record's schema.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// A field's current value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.schema.accessor(field)?.get(self)
    }

    /// Replace a field's value if it passes both checks. Unknown fields
    /// are rejected.
    pub fn set(&mut self, field: &str, value: Value) -> bool {
        match self.schema.accessor(field).cloned() {
            Some(accessor) => accessor.set(self, value),
            None => false,
        }
    }

    /// Field names and values in schema order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name())
            .zip(self.values.iter())
    }

    /// Whether construction processed every field.
    pub fn is_fully_assigned(&self) -> bool {
        self.fully_assigned
    }

    /// The raw input the record was built from.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Optional fields whose checks failed during lenient construction.
    pub fn failed_checks(&self) -> &[String] {
        &self.failed_checks
    }

    /// The caller-supplied key given at construction, if any.
    pub fn custom_key(&self) -> Option<&str> {
        self.custom_key.as_deref()
    }

    /// Plain data: a map of field name to value, nested records serialized
    /// recursively.
    pub fn serialize(&self) -> Value {
        Value::map(self.entries().map(|(name, value)| (name, value.plain())))
    }

    /// [`Record::serialize`] rendered as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        self.serialize().to_json()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name() == other.schema.name() && self.values == other.values
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct(self.schema.name());
        for (name, value) in self.entries() {
            out.field(name, value);
        }
        out.finish()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let required: Vec<&str> = self
            .schema
            .required_fields()
            .iter()
            .map(|field| field.name())
            .collect();
        write!(
            f,
            "#<{} - required fields: [{}]; ",
            self.schema.name(),
            required.join(", ")
        )?;
        for (i, (name, value)) in self.entries().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}:{value}")?;
        }
        f.write_str(">")
    }
}
