//! # Schema Descriptors
//!
//! A descriptor file declares schemas as data, in YAML or JSON:
//!
//! ```yaml
//! schemas:
//!   - name: Child
//!     fields:
//!       - { name: id, type: Integer, min: 1 }
//!   - name: Parent
//!     fields:
//!       - { name: status, type: Symbol, path: [l1, status] }
//!       - { name: children, type: Child, list: true, required: false }
//! ```
//!
//! Field options mirror [`FieldDecl`]. Types are built-in spellings or the
//! name of a schema declared earlier in the same file. Path entries are
//! text keys, `:name` symbol keys, or integer indices. `min`, `max` and
//! `one_of` compile into the field's validator. A field with several types
//! dispatches to each type's built-in conversion.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use schematize_schema::{
    Converter, FieldDecl, PathSegment, Schema, SchemaBuilder, Symbol, TypeSpec, TypeTag,
    Validator, Value,
};
use serde::Deserialize;

/// A descriptor document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Descriptor {
    /// Schemas in dependency order.
    pub schemas: Vec<SchemaDescriptor>,
}

/// One schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDescriptor {
    /// Schema name.
    pub name: String,
    /// Additional types the schema exposes.
    #[serde(default)]
    pub accepts: Vec<String>,
    /// Field declarations in order.
    pub fields: Vec<FieldDescriptor>,
}

/// One field.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Single accepted type.
    #[serde(rename = "type")]
    pub ty: Option<String>,
    /// Alternative accepted types.
    #[serde(default)]
    pub types: Vec<String>,
    /// Extraction path.
    pub path: Option<Vec<PathEntry>>,
    /// Path mode spelling.
    pub path_mode: Option<String>,
    /// Whether the field is required.
    #[serde(default = "default_required")]
    pub required: bool,
    /// Whether the field holds a list.
    #[serde(default)]
    pub list: bool,
    /// Inclusive numeric lower bound.
    pub min: Option<f64>,
    /// Inclusive numeric upper bound.
    pub max: Option<f64>,
    /// Permitted values.
    #[serde(default)]
    pub one_of: Vec<serde_json::Value>,
}

fn default_required() -> bool {
    true
}

/// A path entry as written in a descriptor.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PathEntry {
    /// A sequence index.
    Index(usize),
    /// A key; a leading `:` marks a symbol key.
    Key(String),
}

impl From<&PathEntry> for PathSegment {
    fn from(entry: &PathEntry) -> Self {
        match entry {
            PathEntry::Index(i) => PathSegment::Index(*i),
            PathEntry::Key(key) => match key.strip_prefix(':') {
                Some(symbol) => PathSegment::Symbol(Symbol::new(symbol)),
                None => PathSegment::Text(key.clone()),
            },
        }
    }
}

/// Parse a descriptor from YAML or JSON text.
pub fn parse(text: &str) -> Result<Descriptor> {
    serde_yaml::from_str(text).context("failed to parse schema descriptor")
}

/// Compiled schemas, in declaration order.
#[derive(Debug, Default)]
pub struct Registry {
    order: Vec<Arc<Schema>>,
    by_name: BTreeMap<String, Arc<Schema>>,
}

impl Registry {
    /// Compile every schema of `descriptor`.
    pub fn compile(descriptor: &Descriptor) -> Result<Self> {
        let mut registry = Self::default();
        for schema in &descriptor.schemas {
            if registry.by_name.contains_key(&schema.name) {
                bail!("schema '{}' is declared twice", schema.name);
            }
            let built = registry
                .compile_schema(schema)
                .with_context(|| format!("in schema '{}'", schema.name))?;
            registry.by_name.insert(schema.name.clone(), Arc::clone(&built));
            registry.order.push(built);
        }
        Ok(registry)
    }

    /// Look up a schema by name.
    pub fn get(&self, name: &str) -> Option<&Arc<Schema>> {
        self.by_name.get(name)
    }

    /// `name`'s schema, or the last declared one when `name` is `None`.
    pub fn root(&self, name: Option<&str>) -> Result<&Arc<Schema>> {
        match name {
            Some(name) => self
                .get(name)
                .with_context(|| format!("no schema named '{name}'")),
            None => self.order.last().context("descriptor declares no schemas"),
        }
    }

    /// Schema names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.name())
    }

    fn tag(&self, spelling: &str) -> TypeSpec {
        match self.by_name.get(spelling) {
            Some(schema) => TypeSpec::Tag(TypeTag::schema(schema)),
            None => TypeSpec::Named(spelling.to_string()),
        }
    }

    fn resolved_tag(&self, spelling: &str) -> Result<TypeTag> {
        match self.tag(spelling) {
            TypeSpec::Tag(tag) => Ok(tag),
            TypeSpec::Named(name) => name
                .parse::<TypeTag>()
                .map_err(|given| anyhow::anyhow!("unknown type '{given}'")),
        }
    }

    fn compile_schema(&self, desc: &SchemaDescriptor) -> Result<Arc<Schema>> {
        let mut builder = SchemaBuilder::new(&desc.name);
        for spelling in &desc.accepts {
            builder.also_accepts(self.resolved_tag(spelling)?);
        }
        for field in &desc.fields {
            builder.declare_field(self.field_decl(field)?)?;
        }
        Ok(builder.build())
    }

    fn field_decl(&self, field: &FieldDescriptor) -> Result<FieldDecl> {
        let mut decl = FieldDecl::new(&field.name).required(field.required);
        if let Some(ty) = &field.ty {
            decl = decl.of(self.tag(ty));
        }
        if !field.types.is_empty() {
            decl = decl.one_of(field.types.iter().map(|t| self.tag(t)));
        }

        let spellings: Vec<&String> = field.ty.iter().chain(&field.types).collect();
        if spellings.len() > 1 {
            let tags = spellings
                .iter()
                .map(|s| self.resolved_tag(s))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("field '{}'", field.name))?;
            let mut unique: Vec<TypeTag> = Vec::new();
            for tag in tags {
                if !unique.contains(&tag) {
                    unique.push(tag);
                }
            }
            decl = decl.converter(Converter::builtin_table(&unique));
        }

        if let Some(path) = &field.path {
            decl = decl.path(path.iter().map(PathSegment::from));
        }
        if let Some(mode) = &field.path_mode {
            decl = decl.path_mode(mode.as_str());
        }
        if field.list {
            decl = decl.list();
        }
        if let Some(validator) = validator(field) {
            decl = decl.validator(validator);
        }
        Ok(decl)
    }
}

/// Compile `min`, `max` and `one_of` into one validator.
fn validator(field: &FieldDescriptor) -> Option<Validator> {
    let mut names = Vec::new();
    if let Some(min) = field.min {
        names.push(format!("min {min}"));
    }
    if let Some(max) = field.max {
        names.push(format!("max {max}"));
    }
    if !field.one_of.is_empty() {
        let options: Vec<String> = field.one_of.iter().map(ToString::to_string).collect();
        names.push(format!("one of [{}]", options.join(", ")));
    }
    if names.is_empty() {
        return None;
    }

    let (min, max) = (field.min, field.max);
    let allowed: Vec<Value> = field.one_of.iter().cloned().map(Value::from).collect();
    Some(Validator::named(names.join(" and "), move |typed, _raw| {
        let number = typed.as_f64();
        let above = min.map_or(true, |m| number.is_some_and(|n| n >= m));
        let below = max.map_or(true, |m| number.is_some_and(|n| n <= m));
        let listed = allowed.is_empty() || allowed.iter().any(|a| a.to_json() == typed.to_json());
        above && below && listed
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTOR: &str = r#"
schemas:
  - name: Child
    fields:
      - { name: id, type: Integer, min: 1 }
  - name: Parent
    fields:
      - { name: status, type: Symbol, path: [l1, status], one_of: [active, closed] }
      - { name: child, type: Child, required: false }
      - { name: children, type: Child, list: true, required: false }
      - { name: code, types: [Integer, Text], required: false }
"#;

    fn registry() -> Registry {
        Registry::compile(&parse(DESCRIPTOR).unwrap()).unwrap()
    }

    #[test]
    fn compiles_in_order() {
        let registry = registry();
        assert_eq!(registry.names().collect::<Vec<_>>(), ["Child", "Parent"]);
        assert_eq!(registry.root(None).unwrap().name(), "Parent");
        assert_eq!(registry.root(Some("Child")).unwrap().name(), "Child");
        assert!(registry.root(Some("Nope")).is_err());
    }

    #[test]
    fn earlier_schemas_are_types() {
        let registry = registry();
        let parent = registry.get("Parent").unwrap();
        assert!(parent.field("child").unwrap().nested_schema().is_some());
    }

    #[test]
    fn validators_enforce_bounds_and_options() {
        let registry = registry();
        let parent = registry.get("Parent").unwrap();
        let ok = serde_json::json!({"l1": {"status": "active"}, "children": [{"id": 2}], "code": 7});
        assert!(parent.construct(&Value::from(ok)).is_ok());

        let bad_status = serde_json::json!({"l1": {"status": "pending"}});
        assert!(parent.construct(&Value::from(bad_status)).is_err());

        let bad_child = serde_json::json!({"l1": {"status": "active"}, "children": [{"id": 0}]});
        assert!(parent.construct(&Value::from(bad_child)).is_err());
    }

    #[test]
    fn symbol_path_entries() {
        let entry = PathEntry::Key(":status".into());
        assert_eq!(
            PathSegment::from(&entry),
            PathSegment::Symbol(Symbol::new("status"))
        );
        assert_eq!(PathSegment::from(&PathEntry::Index(2)), PathSegment::Index(2));
    }

    #[test]
    fn unknown_types_are_declaration_errors() {
        let text = "schemas:\n  - name: A\n    fields:\n      - { name: when, type: Time }\n";
        let err = Registry::compile(&parse(text).unwrap()).unwrap_err();
        assert!(format!("{err:#}").contains("Time"));
    }

    #[test]
    fn duplicate_schema_names_are_rejected() {
        let text = "schemas:\n  - { name: A, fields: [] }\n  - { name: A, fields: [] }\n";
        assert!(Registry::compile(&parse(text).unwrap()).is_err());
    }
}
