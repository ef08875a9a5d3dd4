//! # Path Extraction
//!
//! [`dig`] walks a field's path through the raw input. Missing keys,
//! out-of-range indices and intermediate nulls resolve to absent silently.
//! A structural mismatch (indexing a scalar, or keying into a sequence)
//! also resolves to absent, but [`extract`] logs it, naming the field and
//! the path.

use schematize_core::PathSegment;

use crate::field::FieldSpec;
use crate::value::Value;

/// Outcome of walking a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dig<'a> {
    /// The path led to a value.
    Found(&'a Value),
    /// A key or index was missing.
    Absent,
    /// An intermediate value could not be indexed by the next segment.
    Mismatch {
        /// Position of the segment that could not be applied.
        depth: usize,
        /// Kind of the value it was applied to.
        kind: &'static str,
    },
}

impl<'a> Dig<'a> {
    /// The found value, treating mismatches as absent.
    pub fn found(self) -> Option<&'a Value> {
        match self {
            Self::Found(value) => Some(value),
            Self::Absent | Self::Mismatch { .. } => None,
        }
    }
}

/// Walk `path` through `raw`.
pub fn dig<'a>(path: &[PathSegment], raw: &'a Value) -> Dig<'a> {
    let mut current = raw;
    for (depth, segment) in path.iter().enumerate() {
        let next = match (current, segment) {
            (Value::Null, _) => return Dig::Absent,
            (Value::Map(map), PathSegment::Text(_) | PathSegment::Symbol(_)) => map
                .iter()
                .find_map(|(key, value)| key.matches(segment).then_some(value)),
            (Value::Map(_), PathSegment::Index(_)) => None,
            (Value::List(items), PathSegment::Index(i)) => items.get(*i),
            (Value::Record(record), PathSegment::Text(_) | PathSegment::Symbol(_)) => {
                record.get(&segment.label())
            }
            (other, _) => {
                return Dig::Mismatch {
                    depth,
                    kind: other.kind(),
                }
            }
        };
        match next {
            Some(value) => current = value,
            None => return Dig::Absent,
        }
    }
    Dig::Found(current)
}

/// Extract `field`'s raw value, logging structural mismatches.
pub(crate) fn extract<'a>(field: &FieldSpec, raw: &'a Value) -> Option<&'a Value> {
    let outcome = dig(field.path(), raw);
    if let Dig::Mismatch { depth, kind } = outcome {
        let path = field
            .path()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        tracing::warn!(
            field = %field.name(),
            path = %path,
            depth,
            kind,
            "unable to dig path for field; treating it as absent"
        );
    }
    outcome.found()
}

/// Read a top-level entry by field name, accepting text or symbol keys.
pub(crate) fn by_name<'a>(raw: &'a Value, name: &str) -> Option<&'a Value> {
    raw.as_map()?
        .iter()
        .find_map(|(key, value)| (key.as_str() == name).then_some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use schematize_core::Symbol;

    fn sym(name: &str) -> PathSegment {
        PathSegment::Symbol(Symbol::new(name))
    }

    #[test]
    fn nested_text_keys() {
        let raw = Value::map([("l1", Value::map([("status", "active")]))]);
        let path = [PathSegment::from("l1"), PathSegment::from("status")];
        assert_eq!(dig(&path, &raw), Dig::Found(&Value::text("active")));
    }

    #[test]
    fn symbol_segments_do_not_match_text_keys() {
        let raw = Value::map([("l1", 1)]);
        assert_eq!(dig(&[sym("l1")], &raw), Dig::Absent);
    }

    #[test]
    fn mixed_segments_follow_their_own_kind() {
        let raw = Value::map([(
            Symbol::new("symbol"),
            Value::map([("string", Value::map([(Symbol::new("symbol"), 7)]))]),
        )]);
        let path = [sym("symbol"), PathSegment::from("string"), sym("symbol")];
        assert_eq!(dig(&path, &raw), Dig::Found(&Value::Integer(7)));
    }

    #[test]
    fn index_segments_select_list_elements() {
        let raw = Value::map([("items", Value::list([10, 20]))]);
        let path = [PathSegment::from("items"), PathSegment::Index(1)];
        assert_eq!(dig(&path, &raw), Dig::Found(&Value::Integer(20)));
        let out_of_range = [PathSegment::from("items"), PathSegment::Index(5)];
        assert_eq!(dig(&out_of_range, &raw), Dig::Absent);
    }

    #[test]
    fn digging_through_a_scalar_is_a_mismatch() {
        let raw = Value::map([("l1", "flat")]);
        let path = [PathSegment::from("l1"), PathSegment::from("status")];
        assert_eq!(dig(&path, &raw), Dig::Mismatch { depth: 1, kind: "text" });
        assert_eq!(dig(&path, &raw).found(), None);
    }

    #[test]
    fn keying_into_a_list_is_a_mismatch() {
        let raw = Value::list([1]);
        assert!(matches!(dig(&[PathSegment::from("a")], &raw), Dig::Mismatch { .. }));
    }

    #[test]
    fn intermediate_null_is_absent() {
        let raw = Value::map([("l1", Value::Null)]);
        let path = [PathSegment::from("l1"), PathSegment::from("status")];
        assert_eq!(dig(&path, &raw), Dig::Absent);
    }

    #[test]
    fn by_name_accepts_both_key_kinds() {
        let raw = Value::map([(Symbol::new("id"), 1)]);
        assert_eq!(by_name(&raw, "id"), Some(&Value::Integer(1)));
        assert_eq!(by_name(&Value::Integer(1), "id"), None);
    }
}
