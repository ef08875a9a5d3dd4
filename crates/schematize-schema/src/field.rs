//! # Field Declarations
//!
//! A [`FieldDecl`] is what a caller writes; a [`FieldSpec`] is what a schema
//! stores. [`FieldSpec::finalize`] turns one into the other exactly once,
//! filling omitted options from the schema's [`DeclarationDefaults`] and
//! running the declaration checks in a fixed order:
//!
//! 1. the declared type names a known type tag;
//! 2. every alternative type names a known type tag, and at least one type
//!    is declared overall;
//! 3. the name is an identifier;
//! 4. the path mode is one of the known modes;
//! 5. the path is non-empty;
//! 6. the converter resolves against the accepted types.
//!
//! The first failure is returned. Validator arity and the boolean
//! `required` flag are guaranteed by the Rust types and need no runtime
//! check.

use std::fmt;
use std::sync::Arc;

use schematize_core::{is_identifier, PathMode, PathSegment};

use crate::convert::{self, Converter, Resolved};
use crate::error::DeclarationError;
use crate::types::TypeTag;
use crate::value::Value;

// ── Validators ───────────────────────────────────────────────────────

type Predicate = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// A named predicate over `(typed, raw)`.
#[derive(Clone)]
pub struct Validator {
    name: String,
    predicate: Predicate,
}

impl Validator {
    /// A validator reported under `name` in mismatch errors.
    pub fn named<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// An anonymous validator.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        Self::named("custom", predicate)
    }

    /// The validator that accepts everything.
    pub fn always() -> Self {
        Self::named("always", |_, _| true)
    }

    /// The name used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the predicate.
    pub fn call(&self, typed: &Value, raw: &Value) -> bool {
        (self.predicate)(typed, raw)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::always()
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validator({})", self.name)
    }
}

// ── Empty values ─────────────────────────────────────────────────────

/// Substitute used when an optional field is absent from the input.
#[derive(Clone)]
pub enum EmptyValue {
    /// A fixed value.
    Value(Value),
    /// A producer called on every substitution.
    Producer(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl EmptyValue {
    /// A producer-backed empty value.
    pub fn producer<F>(f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self::Producer(Arc::new(f))
    }

    /// The substitute value.
    pub fn produce(&self) -> Value {
        match self {
            Self::Value(v) => v.clone(),
            Self::Producer(f) => f(),
        }
    }

    fn for_multiplicity(multiplicity: Multiplicity) -> Self {
        match multiplicity {
            Multiplicity::Scalar => Self::Value(Value::Null),
            Multiplicity::List => Self::Value(Value::List(Vec::new())),
        }
    }
}

impl fmt::Debug for EmptyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "EmptyValue({v})"),
            Self::Producer(_) => f.write_str("EmptyValue(<producer>)"),
        }
    }
}

/// Whether a field holds one value or a homogeneous list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Multiplicity {
    /// One value.
    #[default]
    Scalar,
    /// A sequence of values, each converted and checked independently.
    List,
}

// ── Declaration input ────────────────────────────────────────────────

/// A declared type: a tag, or a spelling still to be parsed.
#[derive(Debug, Clone)]
pub enum TypeSpec {
    /// An already-resolved tag.
    Tag(TypeTag),
    /// A spelling such as `"Integer"` from a descriptor file.
    Named(String),
}

impl From<TypeTag> for TypeSpec {
    fn from(tag: TypeTag) -> Self {
        Self::Tag(tag)
    }
}

impl From<&str> for TypeSpec {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for TypeSpec {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

/// A declared path mode: a mode, or a spelling still to be parsed.
#[derive(Debug, Clone)]
pub enum ModeSpec {
    /// An already-resolved mode.
    Mode(PathMode),
    /// A spelling such as `"symbol"`.
    Named(String),
}

impl From<PathMode> for ModeSpec {
    fn from(mode: PathMode) -> Self {
        Self::Mode(mode)
    }
}

impl From<&str> for ModeSpec {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

/// A field declaration. Omitted options fall back to the schema's
/// declaration defaults and then to the built-in defaults.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    name: String,
    type_spec: Option<TypeSpec>,
    alternatives: Vec<TypeSpec>,
    path: Option<Vec<PathSegment>>,
    path_mode: Option<ModeSpec>,
    required: Option<bool>,
    validator: Option<Validator>,
    converter: Option<Converter>,
    multiplicity: Option<Multiplicity>,
    empty_value: Option<EmptyValue>,
}

impl FieldDecl {
    /// Start a declaration for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_spec: None,
            alternatives: Vec::new(),
            path: None,
            path_mode: None,
            required: None,
            validator: None,
            converter: None,
            multiplicity: None,
            empty_value: None,
        }
    }

    /// The single accepted type.
    pub fn of(mut self, ty: impl Into<TypeSpec>) -> Self {
        self.type_spec = Some(ty.into());
        self
    }

    /// Alternative accepted types, appended after [`FieldDecl::of`].
    pub fn one_of<I, T>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeSpec>,
    {
        self.alternatives.extend(types.into_iter().map(Into::into));
        self
    }

    /// The extraction path.
    pub fn path<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        self.path = Some(path.into_iter().map(Into::into).collect());
        self
    }

    /// The path segment representation.
    pub fn path_mode(mut self, mode: impl Into<ModeSpec>) -> Self {
        self.path_mode = Some(mode.into());
        self
    }

    /// Whether the field is required.
    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    /// Shorthand for `required(false)`.
    pub fn optional(self) -> Self {
        self.required(false)
    }

    /// The custom predicate.
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// An explicit converter or dispatch table.
    pub fn converter(mut self, converter: Converter) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Scalar or list.
    pub fn multiplicity(mut self, multiplicity: Multiplicity) -> Self {
        self.multiplicity = Some(multiplicity);
        self
    }

    /// Shorthand for `multiplicity(Multiplicity::List)`.
    pub fn list(self) -> Self {
        self.multiplicity(Multiplicity::List)
    }

    /// The substitute for an absent optional value.
    pub fn empty_value(mut self, value: impl Into<Value>) -> Self {
        self.empty_value = Some(EmptyValue::Value(value.into()));
        self
    }

    /// A producer for the substitute of an absent optional value.
    pub fn empty_value_with<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.empty_value = Some(EmptyValue::producer(f));
        self
    }

    /// The declared name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

// ── Declaration defaults ─────────────────────────────────────────────

/// One schema-wide fallback for later declarations.
#[derive(Debug, Clone)]
pub enum DeclarationDefault {
    /// Default for `required`.
    Required(bool),
    /// Default path mode.
    PathMode(PathMode),
    /// Default validator.
    Validator(Validator),
    /// Default multiplicity.
    Multiplicity(Multiplicity),
    /// Default empty value.
    EmptyValue(EmptyValue),
}

impl DeclarationDefault {
    /// The option's name, for diagnostics.
    pub fn option(&self) -> &'static str {
        match self {
            Self::Required(_) => "required",
            Self::PathMode(_) => "path_mode",
            Self::Validator(_) => "validator",
            Self::Multiplicity(_) => "multiplicity",
            Self::EmptyValue(_) => "empty_value",
        }
    }
}

/// The fallbacks consulted by [`FieldSpec::finalize`].
#[derive(Debug, Clone, Default)]
pub struct DeclarationDefaults {
    required: Option<bool>,
    path_mode: Option<PathMode>,
    validator: Option<Validator>,
    multiplicity: Option<Multiplicity>,
    empty_value: Option<EmptyValue>,
}

impl DeclarationDefaults {
    /// Record a fallback, replacing any earlier one for the same option.
    pub fn set(&mut self, default: DeclarationDefault) {
        match default {
            DeclarationDefault::Required(v) => self.required = Some(v),
            DeclarationDefault::PathMode(v) => self.path_mode = Some(v),
            DeclarationDefault::Validator(v) => self.validator = Some(v),
            DeclarationDefault::Multiplicity(v) => self.multiplicity = Some(v),
            DeclarationDefault::EmptyValue(v) => self.empty_value = Some(v),
        }
    }
}

// ── Finalized field ──────────────────────────────────────────────────

/// A finalized, immutable field declaration.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    accepted: Vec<TypeTag>,
    extended: Vec<TypeTag>,
    path: Vec<PathSegment>,
    path_mode: PathMode,
    converter: Resolved,
    validator: Validator,
    required: bool,
    multiplicity: Multiplicity,
    empty_value: EmptyValue,
}

impl FieldSpec {
    /// Run the declaration checks and settle every option.
    pub fn finalize(
        decl: FieldDecl,
        defaults: &DeclarationDefaults,
    ) -> Result<Self, DeclarationError> {
        let FieldDecl {
            name,
            type_spec,
            alternatives,
            path,
            path_mode,
            required,
            validator,
            converter,
            multiplicity,
            empty_value,
        } = decl;

        let mut accepted: Vec<TypeTag> = Vec::new();
        if let Some(spec) = type_spec {
            let tag = parse_type(spec).map_err(|given| DeclarationError::InvalidType {
                field: name.clone(),
                given,
            })?;
            push_unique(&mut accepted, tag);
        }
        for spec in alternatives {
            let tag = parse_type(spec).map_err(|given| DeclarationError::InvalidTypes {
                field: name.clone(),
                given,
            })?;
            push_unique(&mut accepted, tag);
        }
        if accepted.is_empty() {
            return Err(DeclarationError::NoTypes { field: name });
        }

        if !is_identifier(&name) {
            return Err(DeclarationError::InvalidName(name));
        }

        let path_mode = match path_mode {
            Some(ModeSpec::Mode(mode)) => mode,
            Some(ModeSpec::Named(spelling)) => {
                spelling
                    .parse::<PathMode>()
                    .map_err(|source| DeclarationError::InvalidPathMode {
                        field: name.clone(),
                        source,
                    })?
            }
            None => defaults.path_mode.unwrap_or_default(),
        };

        let path = path.unwrap_or_else(|| vec![PathSegment::Text(name.clone())]);
        if path.is_empty() {
            return Err(DeclarationError::EmptyPath { field: name });
        }
        let path = path_mode.apply(&path);

        let converter = convert::resolve(&name, &accepted, converter)?;

        let multiplicity = multiplicity
            .or(defaults.multiplicity)
            .unwrap_or_default();
        let empty_value = empty_value
            .or_else(|| defaults.empty_value.clone())
            .unwrap_or_else(|| EmptyValue::for_multiplicity(multiplicity));
        let extended = extend(&accepted);

        Ok(Self {
            name,
            accepted,
            extended,
            path,
            path_mode,
            converter,
            validator: validator
                .or_else(|| defaults.validator.clone())
                .unwrap_or_default(),
            required: required.or(defaults.required).unwrap_or(true),
            multiplicity,
            empty_value,
        })
    }

    /// The field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared accepted types, de-duplicated, in declaration order.
    pub fn accepted_types(&self) -> &[TypeTag] {
        &self.accepted
    }

    /// The accepted types with every nested schema's exposed types folded
    /// in.
    pub fn extended_types(&self) -> &[TypeTag] {
        &self.extended
    }

    /// The normalized extraction path.
    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// The path mode applied at finalization.
    pub fn path_mode(&self) -> PathMode {
        self.path_mode
    }

    /// The field's validator.
    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Whether the field is required.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Scalar or list.
    pub fn multiplicity(&self) -> Multiplicity {
        self.multiplicity
    }

    /// Shorthand for a list multiplicity check.
    pub fn is_list(&self) -> bool {
        self.multiplicity == Multiplicity::List
    }

    /// A fresh substitute for an absent optional value.
    pub fn empty_value(&self) -> Value {
        self.empty_value.produce()
    }

    /// The nested schema, when the field accepts exactly one schema type.
    pub fn nested_schema(&self) -> Option<&Arc<crate::schema::Schema>> {
        match self.accepted.as_slice() {
            [single] => single.as_schema(),
            _ => None,
        }
    }

    pub(crate) fn converter(&self) -> &Resolved {
        &self.converter
    }

    /// Whether assigning `value` clears an optional field: it is the
    /// declared empty value and the accepted types could not hold it
    /// otherwise, as `Null` on a scalar field.
    pub(crate) fn is_clearing(&self, value: &Value) -> bool {
        !self.required
            && *value == self.empty_value.produce()
            && !crate::validate::acceptable_type(self, value)
    }
}

fn parse_type(spec: TypeSpec) -> Result<TypeTag, String> {
    match spec {
        TypeSpec::Tag(tag) => Ok(tag),
        TypeSpec::Named(spelling) => spelling.parse(),
    }
}

fn push_unique(tags: &mut Vec<TypeTag>, tag: TypeTag) {
    if !tags.contains(&tag) {
        tags.push(tag);
    }
}

fn extend(accepted: &[TypeTag]) -> Vec<TypeTag> {
    let mut extended = accepted.to_vec();
    for tag in accepted {
        if let Some(schema) = tag.as_schema() {
            for exposed in schema.exposed_types() {
                push_unique(&mut extended, exposed.clone());
            }
        }
    }
    extended
}

#[cfg(test)]
mod tests {
    use super::*;
    use schematize_core::Symbol;

    fn finalize(decl: FieldDecl) -> Result<FieldSpec, DeclarationError> {
        FieldSpec::finalize(decl, &DeclarationDefaults::default())
    }

    #[test]
    fn defaults_for_a_bare_declaration() {
        let field = finalize(FieldDecl::new("count").of(TypeTag::Integer)).unwrap();
        assert!(field.is_required());
        assert_eq!(field.path(), &[PathSegment::from("count")]);
        assert_eq!(field.path_mode(), PathMode::AsDeclared);
        assert_eq!(field.multiplicity(), Multiplicity::Scalar);
        assert_eq!(field.empty_value(), Value::Null);
        assert_eq!(field.validator().name(), "always");
    }

    #[test]
    fn list_fields_default_to_an_empty_sequence() {
        let field = finalize(FieldDecl::new("tags").of(TypeTag::Text).list().optional()).unwrap();
        assert_eq!(field.empty_value(), Value::List(Vec::new()));
    }

    #[test]
    fn unknown_type_spelling_is_rejected() {
        let err = finalize(FieldDecl::new("when").of("Time")).unwrap_err();
        assert_eq!(
            err,
            DeclarationError::InvalidType {
                field: "when".into(),
                given: "Time".into()
            }
        );
    }

    #[test]
    fn unknown_alternative_spelling_is_rejected() {
        let err = finalize(FieldDecl::new("id").one_of(["Integer", "Uuid"])).unwrap_err();
        assert!(matches!(err, DeclarationError::InvalidTypes { given, .. } if given == "Uuid"));
    }

    #[test]
    fn at_least_one_type_is_required() {
        let err = finalize(FieldDecl::new("id")).unwrap_err();
        assert!(matches!(err, DeclarationError::NoTypes { .. }));
    }

    #[test]
    fn type_checks_run_before_the_name_check() {
        let err = finalize(FieldDecl::new("bad name").of("Nope")).unwrap_err();
        assert!(matches!(err, DeclarationError::InvalidType { .. }));
    }

    #[test]
    fn name_must_be_an_identifier() {
        let err = finalize(FieldDecl::new("bad name").of(TypeTag::Text)).unwrap_err();
        assert_eq!(err, DeclarationError::InvalidName("bad name".into()));
    }

    #[test]
    fn unknown_path_mode_is_rejected() {
        let err = finalize(
            FieldDecl::new("id")
                .of(TypeTag::Integer)
                .path_mode("not_expected_sym"),
        )
        .unwrap_err();
        assert!(matches!(err, DeclarationError::InvalidPathMode { .. }));
    }

    #[test]
    fn empty_path_is_rejected() {
        let err = finalize(
            FieldDecl::new("id")
                .of(TypeTag::Integer)
                .path(Vec::<PathSegment>::new()),
        )
        .unwrap_err();
        assert_eq!(err, DeclarationError::EmptyPath { field: "id".into() });
    }

    #[test]
    fn path_mode_is_applied_at_finalization() {
        let field = finalize(
            FieldDecl::new("status")
                .of(TypeTag::Symbol)
                .path(["l1", "status"])
                .path_mode(PathMode::AsSymbol),
        )
        .unwrap();
        assert_eq!(
            field.path(),
            &[
                PathSegment::Symbol(Symbol::new("l1")),
                PathSegment::Symbol(Symbol::new("status")),
            ]
        );
    }

    #[test]
    fn repeated_types_collapse() {
        let field = finalize(
            FieldDecl::new("n")
                .of(TypeTag::Integer)
                .one_of([TypeTag::Integer]),
        )
        .unwrap();
        assert_eq!(field.accepted_types(), &[TypeTag::Integer]);
    }

    #[test]
    fn multi_type_without_converter_fails_last() {
        let err = finalize(FieldDecl::new("n").one_of([TypeTag::Integer, TypeTag::Text])).unwrap_err();
        assert!(matches!(err, DeclarationError::MissingConverter { .. }));
    }

    #[test]
    fn declaration_defaults_fill_omitted_options() {
        let mut defaults = DeclarationDefaults::default();
        defaults.set(DeclarationDefault::Required(false));
        defaults.set(DeclarationDefault::PathMode(PathMode::AsString));
        defaults.set(DeclarationDefault::Validator(Validator::named("never", |_, _| false)));
        let field = FieldSpec::finalize(FieldDecl::new("n").of(TypeTag::Integer), &defaults).unwrap();
        assert!(!field.is_required());
        assert_eq!(field.path_mode(), PathMode::AsString);
        assert_eq!(field.validator().name(), "never");

        let explicit = FieldSpec::finalize(
            FieldDecl::new("m").of(TypeTag::Integer).required(true),
            &defaults,
        )
        .unwrap();
        assert!(explicit.is_required());
    }

    #[test]
    fn producer_empty_values_are_fresh() {
        let field = finalize(
            FieldDecl::new("n")
                .of(TypeTag::Integer)
                .optional()
                .empty_value_with(|| Value::Integer(0)),
        )
        .unwrap();
        assert_eq!(field.empty_value(), Value::Integer(0));
        // An integer empty value is an ordinary integer, not a clearing one.
        assert!(!field.is_clearing(&Value::Integer(0)));
    }

    #[test]
    fn null_clears_optional_scalars_only() {
        let optional = finalize(FieldDecl::new("n").of(TypeTag::Integer).optional()).unwrap();
        assert!(optional.is_clearing(&Value::Null));
        assert!(!optional.is_clearing(&Value::Integer(1)));

        let required = finalize(FieldDecl::new("n").of(TypeTag::Integer)).unwrap();
        assert!(!required.is_clearing(&Value::Null));
    }
}
