//! # Symbolic Atoms
//!
//! A [`Symbol`] is an interned-by-value name such as `:active`. It is the
//! typed result of the built-in symbol converter and one of the two key kinds
//! a generic input map may carry.

use std::fmt;

use serde::{Serialize, Serializer};

/// A symbolic atom.
///
/// Symbols compare by their name. They serialize as plain strings, which is
/// how they leave the engine in the canonical external representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(String);

impl Symbol {
    /// Create a symbol from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The symbol's name, without any sigil.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the symbol and return its name.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Symbol {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Returns true when `name` is a valid field identifier:
/// an ASCII letter or underscore followed by ASCII letters, digits or
/// underscores.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_display_has_sigil() {
        assert_eq!(Symbol::new("active").to_string(), ":active");
    }

    #[test]
    fn symbol_serializes_as_plain_string() {
        let json = serde_json::to_string(&Symbol::new("active")).unwrap();
        assert_eq!(json, r#""active""#);
    }

    #[test]
    fn symbols_compare_by_name() {
        assert_eq!(Symbol::from("x"), Symbol::from(String::from("x")));
        assert_ne!(Symbol::from("x"), Symbol::from("y"));
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("count"));
        assert!(is_identifier("_private"));
        assert!(is_identifier("field_2"));
        assert!(is_identifier("CamelCase"));
    }

    #[test]
    fn non_identifiers() {
        assert!(!is_identifier(""));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("not an accepted value"));
        assert!(!is_identifier("dash-ed"));
        assert!(!is_identifier("caf\u{00e9}"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn generated_identifiers_are_accepted(name in "[A-Za-z_][A-Za-z0-9_]{0,20}") {
            prop_assert!(is_identifier(&name));
        }

        #[test]
        fn names_with_spaces_are_rejected(a in "[a-z]{1,8}", b in "[a-z]{1,8}") {
            let joined = format!("{a} {b}");
            prop_assert!(!is_identifier(&joined));
        }
    }
}
