//! # Construction Scenarios
//!
//! End-to-end declaration, construction, reassignment and introspection
//! through the public `schematize-schema` surface.

use std::sync::Arc;

use schematize_schema::{
    Converter, DeclarationError, FieldDecl, PathSegment, Schema, SchemaBuilder, SchemaError,
    Symbol, TypeTag, ValidationMode, Validator, Value,
};
use serde_json::json;

fn raw(json: serde_json::Value) -> Value {
    Value::from(json)
}

fn counter() -> Arc<Schema> {
    let mut builder = SchemaBuilder::new("Counter");
    builder
        .declare_field(
            FieldDecl::new("count")
                .of(TypeTag::Integer)
                .validator(Validator::named("at least five", |v, _| {
                    v.as_i64().is_some_and(|n| n >= 5)
                })),
        )
        .unwrap();
    builder.build()
}

// =========================================================================
// Required fields with validators
// =========================================================================

#[test]
fn required_field_passing_validator() {
    let record = counter().construct(&raw(json!({"count": 5}))).unwrap();
    assert_eq!(record.get("count"), Some(&Value::Integer(5)));
    assert!(record.is_fully_assigned());
}

#[test]
fn required_field_failing_validator_names_the_field() {
    let err = counter().construct(&raw(json!({"count": 3}))).unwrap_err();
    assert!(matches!(err, SchemaError::ValidatorMismatch { ref field, .. } if field == "count"));
    assert!(err.to_string().contains("count"));
}

#[test]
fn required_field_failures_ignore_lenient_mode() {
    let err = counter()
        .construct_with(&raw(json!({"count": 3})), ValidationMode::Lenient)
        .unwrap_err();
    assert_eq!(err.field(), Some("count"));

    let missing = counter().construct_lenient(&raw(json!({}))).unwrap_err();
    assert_eq!(missing.field(), Some("count"));
}

// =========================================================================
// Path extraction
// =========================================================================

#[test]
fn nested_path_yields_symbol() {
    let schema = SchemaBuilder::new("Account")
        .field(
            FieldDecl::new("status")
                .of(TypeTag::Symbol)
                .path(["l1", "status"]),
        )
        .unwrap()
        .build();
    let record = schema
        .construct(&raw(json!({"l1": {"status": "active"}})))
        .unwrap();
    assert_eq!(record.get("status"), Some(&Value::symbol("active")));
}

#[test]
fn symbol_mode_reads_symbol_keyed_input() {
    let schema = SchemaBuilder::new("Account")
        .field(
            FieldDecl::new("status")
                .of(TypeTag::Text)
                .path(["l1", "status"])
                .path_mode("symbol"),
        )
        .unwrap()
        .build();
    let input = Value::map([(
        Symbol::new("l1"),
        Value::map([(Symbol::new("status"), "open")]),
    )]);
    let record = schema.construct(&input).unwrap();
    assert_eq!(record.get("status"), Some(&Value::text("open")));
}

#[test]
fn index_segments_reach_into_sequences() {
    let schema = SchemaBuilder::new("Second")
        .field(
            FieldDecl::new("value")
                .of(TypeTag::Integer)
                .path([PathSegment::from("items"), PathSegment::Index(1)]),
        )
        .unwrap()
        .build();
    let record = schema.construct(&raw(json!({"items": [10, "20"]}))).unwrap();
    assert_eq!(record.get("value"), Some(&Value::Integer(20)));
}

#[test]
fn structural_mismatch_resolves_absent() {
    let schema = SchemaBuilder::new("Account")
        .field(
            FieldDecl::new("status")
                .of(TypeTag::Symbol)
                .path(["l1", "status"])
                .optional(),
        )
        .unwrap()
        .build();
    let record = schema.construct(&raw(json!({"l1": 4}))).unwrap();
    assert_eq!(record.get("status"), Some(&Value::Null));
}

// =========================================================================
// List fields
// =========================================================================

fn tagged() -> Arc<Schema> {
    SchemaBuilder::new("Tagged")
        .field(FieldDecl::new("tags").of(TypeTag::Text).list().optional())
        .unwrap()
        .build()
}

#[test]
fn omitted_optional_list_is_empty() {
    let record = tagged().construct(&raw(json!({}))).unwrap();
    assert_eq!(record.get("tags"), Some(&Value::List(Vec::new())));
}

#[test]
fn list_field_rejects_scalars() {
    let err = tagged()
        .construct(&raw(json!({"tags": "oops"})))
        .unwrap_err();
    assert!(matches!(err, SchemaError::ArrayTypeMismatch { ref field, .. } if field == "tags"));
}

#[test]
fn list_elements_are_converted_individually() {
    let record = tagged().construct(&raw(json!({"tags": ["a", 1]}))).unwrap();
    assert_eq!(
        record.get("tags"),
        Some(&Value::list([Value::text("a"), Value::text("1")]))
    );
}

#[test]
fn lenient_construction_records_failed_optional_fields() {
    let record = tagged()
        .construct_lenient(&raw(json!({"tags": "oops"})))
        .unwrap();
    assert_eq!(record.failed_checks(), ["tags"]);
    assert_eq!(record.get("tags"), Some(&Value::text("oops")));
}

// =========================================================================
// Default conversions and multi-type fields
// =========================================================================

#[test]
fn default_conversions() {
    let schema = SchemaBuilder::new("Scalars")
        .field(FieldDecl::new("int").of(TypeTag::Integer))
        .unwrap()
        .field(FieldDecl::new("float").of(TypeTag::Float))
        .unwrap()
        .field(FieldDecl::new("sym").of(TypeTag::Symbol))
        .unwrap()
        .field(FieldDecl::new("text").of(TypeTag::Text))
        .unwrap()
        .build();
    let record = schema
        .construct(&raw(json!({"int": "5", "float": "5.5", "sym": "x", "text": "as is"})))
        .unwrap();
    assert_eq!(record.get("int"), Some(&Value::Integer(5)));
    assert_eq!(record.get("float"), Some(&Value::Float(5.5)));
    assert_eq!(record.get("sym"), Some(&Value::symbol("x")));
    assert_eq!(record.get("text"), Some(&Value::text("as is")));
}

#[test]
fn multi_type_field_without_converter_is_rejected() {
    let err = SchemaBuilder::new("Code")
        .field(FieldDecl::new("code").one_of([TypeTag::Integer, TypeTag::Text]))
        .unwrap_err();
    assert!(matches!(err, DeclarationError::MissingConverter { .. }));
}

#[test]
fn converter_table_keys_must_match_types() {
    let table = Converter::table().entry(TypeTag::Integer, |v| Ok(v.clone()));
    let err = SchemaBuilder::new("Code")
        .field(
            FieldDecl::new("code")
                .one_of([TypeTag::Integer, TypeTag::Text])
                .converter(table),
        )
        .unwrap_err();
    assert!(matches!(err, DeclarationError::ConverterKeysMismatch { .. }));
}

#[test]
fn converter_table_in_any_order_is_accepted() {
    let table = Converter::table()
        .entry(TypeTag::Text, |v| Ok(Value::text(v.to_json().to_string())))
        .entry(TypeTag::Integer, |v| Ok(v.clone()));
    let schema = SchemaBuilder::new("Code")
        .field(
            FieldDecl::new("code")
                .one_of([TypeTag::Integer, TypeTag::Text])
                .converter(table),
        )
        .unwrap()
        .build();
    let record = schema.construct(&raw(json!({"code": 12}))).unwrap();
    assert_eq!(record.get("code"), Some(&Value::Integer(12)));
}

#[test]
fn duplicate_fields_are_rejected() {
    let err = SchemaBuilder::new("Twice")
        .field(FieldDecl::new("a").of(TypeTag::Integer))
        .unwrap()
        .field(FieldDecl::new("a").of(TypeTag::Text))
        .unwrap_err();
    assert!(matches!(err, DeclarationError::DuplicateField { .. }));
}

// =========================================================================
// Reassignment
// =========================================================================

#[test]
fn setter_reports_success() {
    let mut record = counter().construct(&raw(json!({"count": 9}))).unwrap();
    assert!(!record.set("count", Value::Integer(2)));
    assert_eq!(record.get("count"), Some(&Value::Integer(9)));
    assert!(!record.set("count", Value::text("10")));
    assert!(record.set("count", Value::Integer(10)));
    assert_eq!(record.get("count"), Some(&Value::Integer(10)));
}

// =========================================================================
// Nested schemas: serialize and introspect
// =========================================================================

fn family() -> (Arc<Schema>, Arc<Schema>) {
    let child = SchemaBuilder::new("Child")
        .field(FieldDecl::new("id").of(TypeTag::Integer))
        .unwrap()
        .field(FieldDecl::new("nick").of(TypeTag::Text).optional())
        .unwrap()
        .build();
    let parent = SchemaBuilder::new("Parent")
        .field(FieldDecl::new("first").of(TypeTag::schema(&child)))
        .unwrap()
        .field(
            FieldDecl::new("others")
                .of(TypeTag::schema(&child))
                .list()
                .optional(),
        )
        .unwrap()
        .build();
    (child, parent)
}

#[test]
fn serialize_flattens_nested_records() {
    let (_, parent) = family();
    let record = parent
        .construct(&raw(json!({"first": {"id": "1"}, "others": [{"id": 2, "nick": "b"}]})))
        .unwrap();
    assert!(matches!(record.get("first"), Some(Value::Record(_))));
    assert_eq!(
        record.to_json(),
        json!({
            "first": {"id": 1, "nick": null},
            "others": [{"id": 2, "nick": "b"}],
        })
    );
}

#[test]
fn restore_rebuilds_serialized_records() {
    let (_, parent) = family();
    let record = parent
        .construct(&raw(json!({"first": {"id": 1}, "others": [{"id": 2}]})))
        .unwrap();
    let restored = parent.restore(&record.serialize()).unwrap();
    assert_eq!(restored, record);
}

#[test]
fn deep_introspection_uses_dotted_keys() {
    let (_, parent) = family();
    let shallow = parent.introspect(false);
    assert_eq!(shallow["first"].allowed, "Child");
    assert_eq!(shallow["others"].allowed, "Array of Child");

    let deep = parent.introspect(true);
    let keys: Vec<&str> = deep.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        [
            "first",
            "first.id",
            "first.nick",
            "others",
            "others[x].id",
            "others[x].nick"
        ]
    );
    assert!(deep["first.id"].required);
    assert!(!deep["others[x].nick"].required);
}

#[test]
fn nested_schema_exposes_its_types() {
    let mut inner = SchemaBuilder::new("Inner");
    inner
        .declare_field(FieldDecl::new("id").of(TypeTag::Integer))
        .unwrap();
    inner.also_accepts(TypeTag::Integer);
    let inner = inner.build();

    let outer = SchemaBuilder::new("Outer")
        .field(FieldDecl::new("inner").of(TypeTag::schema(&inner)))
        .unwrap()
        .build();
    let field = outer.field("inner").unwrap();
    assert!(field.extended_types().contains(&TypeTag::Integer));
}

#[test]
fn display_lists_required_fields_and_values() {
    let record = counter().construct(&raw(json!({"count": 6}))).unwrap();
    assert_eq!(
        record.to_string(),
        "#<Counter - required fields: [count]; count:6>"
    );
}
