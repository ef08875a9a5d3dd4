//! # Schemas
//!
//! A [`SchemaBuilder`] collects field declarations for one record type and
//! is sealed once by [`SchemaBuilder::build`] into an immutable, shareable
//! `Arc<Schema>`. Declaration and use never interleave: the builder is an
//! owned value, and a built schema cannot gain fields.
//!
//! ## Construction
//!
//! [`Schema::construct_with`] runs extract, coerce and validate for every
//! field. Required fields come first and always fail hard. Optional fields
//! fail hard in [`ValidationMode::Strict`]; in [`ValidationMode::Lenient`]
//! a failing optional field is listed in [`Record::failed_checks`] and
//! keeps its coerced value, or its raw value when conversion itself failed.
//! An empty value substituted for absent optional input skips both checks.
//! Values are committed to the record only after every field has been
//! processed, and observers see the record once, after that.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::coerce::coerce;
use crate::convert::Lookup;
use crate::error::{DeclarationError, SchemaError};
use crate::extract::{by_name, extract};
use crate::field::{DeclarationDefault, DeclarationDefaults, FieldDecl, FieldSpec};
use crate::record::{FieldAccessor, Record, RecordObserver};
use crate::types::TypeTag;
use crate::validate::check_value;
use crate::value::Value;

/// Whether optional-field violations abort construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Every violation aborts construction.
    #[default]
    Strict,
    /// Optional-field violations are logged and recorded instead.
    Lenient,
}

/// Declaration-phase collector for one schema.
pub struct SchemaBuilder {
    name: String,
    required: Vec<FieldSpec>,
    optional: Vec<FieldSpec>,
    defaults: DeclarationDefaults,
    exposed: Vec<TypeTag>,
    observers: Vec<Arc<dyn RecordObserver>>,
}

impl SchemaBuilder {
    /// Start declaring a schema called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: Vec::new(),
            optional: Vec::new(),
            defaults: DeclarationDefaults::default(),
            exposed: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Finalize and add a field.
    pub fn declare_field(&mut self, decl: FieldDecl) -> Result<&mut Self, DeclarationError> {
        if self.has_field(decl.name()) {
            return Err(DeclarationError::DuplicateField {
                schema: self.name.clone(),
                field: decl.name().to_string(),
            });
        }
        let field = FieldSpec::finalize(decl, &self.defaults)?;
        if field.is_required() {
            self.required.push(field);
        } else {
            self.optional.push(field);
        }
        Ok(self)
    }

    /// Consuming form of [`SchemaBuilder::declare_field`].
    pub fn field(mut self, decl: FieldDecl) -> Result<Self, DeclarationError> {
        self.declare_field(decl)?;
        Ok(self)
    }

    /// Set a fallback for fields declared after this call.
    pub fn declaration_default(&mut self, default: DeclarationDefault) -> &mut Self {
        if !self.required.is_empty() || !self.optional.is_empty() {
            tracing::warn!(
                schema = %self.name,
                option = default.option(),
                declared = self.required.len() + self.optional.len(),
                "declaration default set after fields were declared; earlier fields keep their options"
            );
        }
        self.defaults.set(default);
        self
    }

    /// Expose an additional type for structural matching: a field accepting
    /// this schema also accepts values of `tag`.
    pub fn also_accepts(&mut self, tag: TypeTag) -> &mut Self {
        if !self.exposed.contains(&tag) {
            self.exposed.push(tag);
        }
        self
    }

    /// Attach a lifecycle observer.
    pub fn observer(&mut self, observer: Arc<dyn RecordObserver>) -> &mut Self {
        self.observers.push(observer);
        self
    }

    fn has_field(&self, name: &str) -> bool {
        self.required
            .iter()
            .chain(&self.optional)
            .any(|f| f.name() == name)
    }

    /// Seal the schema.
    pub fn build(self) -> Arc<Schema> {
        let required_len = self.required.len();
        let fields: Vec<Arc<FieldSpec>> = self
            .required
            .into_iter()
            .chain(self.optional)
            .map(Arc::new)
            .collect();
        let accessors = fields
            .iter()
            .enumerate()
            .map(|(slot, field)| {
                (
                    field.name().to_string(),
                    FieldAccessor::new(Arc::clone(field), slot),
                )
            })
            .collect();

        let mut exposed: Vec<TypeTag> = Vec::new();
        for tag in self.exposed {
            let nested: Vec<TypeTag> = tag
                .as_schema()
                .map(|s| s.exposed_types().to_vec())
                .unwrap_or_default();
            for t in std::iter::once(tag).chain(nested) {
                if !exposed.contains(&t) {
                    exposed.push(t);
                }
            }
        }

        tracing::debug!(
            schema = %self.name,
            required = required_len,
            optional = fields.len() - required_len,
            "schema built"
        );

        Arc::new(Schema {
            name: self.name,
            fields,
            required_len,
            accessors,
            exposed,
            observers: self.observers,
        })
    }
}

/// A sealed schema.
pub struct Schema {
    name: String,
    fields: Vec<Arc<FieldSpec>>,
    required_len: usize,
    accessors: BTreeMap<String, FieldAccessor>,
    exposed: Vec<TypeTag>,
    observers: Vec<Arc<dyn RecordObserver>>,
}

impl Schema {
    /// The schema name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every field, required ones first, each group in declaration order.
    pub fn fields(&self) -> &[Arc<FieldSpec>] {
        &self.fields
    }

    /// The required fields in declaration order.
    pub fn required_fields(&self) -> &[Arc<FieldSpec>] {
        &self.fields[..self.required_len]
    }

    /// The optional fields in declaration order.
    pub fn optional_fields(&self) -> &[Arc<FieldSpec>] {
        &self.fields[self.required_len..]
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.accessors.get(name).map(FieldAccessor::field)
    }

    /// The accessor binding for a field.
    pub fn accessor(&self, name: &str) -> Option<&FieldAccessor> {
        self.accessors.get(name)
    }

    /// Additional types this schema exposes, transitively folded.
    pub fn exposed_types(&self) -> &[TypeTag] {
        &self.exposed
    }

    pub(crate) fn observers(&self) -> &[Arc<dyn RecordObserver>] {
        &self.observers
    }

    /// Strict construction.
    pub fn construct(self: &Arc<Self>, raw: &Value) -> Result<Record, SchemaError> {
        self.construct_with(raw, ValidationMode::Strict)
    }

    /// Lenient construction.
    pub fn construct_lenient(self: &Arc<Self>, raw: &Value) -> Result<Record, SchemaError> {
        self.construct_with(raw, ValidationMode::Lenient)
    }

    /// Construct a record from raw input.
    pub fn construct_with(
        self: &Arc<Self>,
        raw: &Value,
        mode: ValidationMode,
    ) -> Result<Record, SchemaError> {
        let record = self.assemble(raw, mode, Lookup::Path)?;
        Ok(self.announce(record))
    }

    /// Construct a record that carries `key` as its custom cache key.
    pub fn construct_keyed(
        self: &Arc<Self>,
        raw: &Value,
        mode: ValidationMode,
        key: impl Into<String>,
    ) -> Result<Record, SchemaError> {
        let record = self
            .assemble(raw, mode, Lookup::Path)?
            .with_custom_key(Some(key.into()));
        Ok(self.announce(record))
    }

    fn announce(&self, record: Record) -> Record {
        for observer in &self.observers {
            observer.after_construct(&record);
        }
        record
    }

    /// Rebuild a record from its serialized form, reading fields by name.
    ///
    /// Lenient, so a record that was itself built leniently comes back with
    /// the same values and failed checks. Observers are not notified.
    pub fn restore(self: &Arc<Self>, serialized: &Value) -> Result<Record, SchemaError> {
        self.assemble(serialized, ValidationMode::Lenient, Lookup::Name)
    }

    fn assemble(
        self: &Arc<Self>,
        raw: &Value,
        mode: ValidationMode,
        lookup: Lookup,
    ) -> Result<Record, SchemaError> {
        let mut values = Vec::with_capacity(self.fields.len());
        let mut failed = Vec::new();

        for field in &self.fields {
            let tolerant = mode == ValidationMode::Lenient && !field.is_required();
            let found = match lookup {
                Lookup::Path => extract(field, raw),
                Lookup::Name => by_name(raw, field.name()),
            };
            let raw_value = found.cloned().unwrap_or(Value::Null);

            let coerced = match coerce(field, found, lookup) {
                Ok(coerced) => coerced,
                Err(err) if tolerant => {
                    tracing::warn!(schema = %self.name, field = %field.name(), error = %err, "keeping raw value");
                    failed.push(field.name().to_string());
                    values.push(raw_value);
                    continue;
                }
                Err(err) => return Err(err),
            };
            let value = coerced.value;
            if coerced.substituted {
                values.push(value);
                continue;
            }

            if let Err(err) = check_value(field, &value, &raw_value) {
                if !tolerant {
                    return Err(err);
                }
                tracing::warn!(schema = %self.name, field = %field.name(), error = %err, "keeping invalid optional value");
                failed.push(field.name().to_string());
            }
            values.push(value);
        }

        Ok(Record::assembled(Arc::clone(self), values, raw.clone(), failed))
    }
}

impl fmt::Debug for SchemaBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaBuilder")
            .field("name", &self.name)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("defaults", &self.defaults)
            .field("exposed", &self.exposed)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field(
                "fields",
                &self.fields.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("required", &self.required_len)
            .field("exposed", &self.exposed)
            .field("observers", &self.observers.len())
            .finish()
    }
}
