//! # Extraction Paths
//!
//! A field locates its raw value through an ordered list of
//! [`PathSegment`]s. Each segment is matched against the keys of a generic
//! input map ([`MapKey`]) or, for index segments, against sequence positions.
//!
//! ## Path Modes
//!
//! A field's [`PathMode`] is applied once, when the field is finalized:
//!
//! - `AsSymbol`: every segment becomes a symbol segment.
//! - `AsString`: every segment becomes a text segment.
//! - `AsDeclared`: segments are kept exactly as authored, mixed kinds
//!   included.
//!
//! Index segments are spelled in decimal when coerced to a symbol or text.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::CoreError;
use crate::symbol::Symbol;

/// A key in a generic input map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MapKey {
    /// A text key, as produced by JSON parsing.
    Text(String),
    /// A symbolic key, as produced by programmatic construction.
    Symbol(Symbol),
}

impl MapKey {
    /// The key's name regardless of its kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(s) => s,
            Self::Symbol(s) => s.as_str(),
        }
    }

    /// Returns true when this key is selected by `segment`.
    ///
    /// Text segments select text keys, symbol segments select symbol keys.
    /// Index segments never select a map key.
    pub fn matches(&self, segment: &PathSegment) -> bool {
        match (self, segment) {
            (Self::Text(key), PathSegment::Text(seg)) => key == seg,
            (Self::Symbol(key), PathSegment::Symbol(seg)) => key == seg,
            _ => false,
        }
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Symbol(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for MapKey {
    fn from(key: &str) -> Self {
        Self::Text(key.to_string())
    }
}

impl From<String> for MapKey {
    fn from(key: String) -> Self {
        Self::Text(key)
    }
}

impl From<Symbol> for MapKey {
    fn from(key: Symbol) -> Self {
        Self::Symbol(key)
    }
}

impl Serialize for MapKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One step of an extraction path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Selects a text map key.
    Text(String),
    /// Selects a symbol map key.
    Symbol(Symbol),
    /// Selects a sequence element by position.
    Index(usize),
}

impl PathSegment {
    /// The segment as a symbol segment.
    pub fn to_symbol(&self) -> Self {
        match self {
            Self::Text(s) => Self::Symbol(Symbol::new(s.as_str())),
            Self::Symbol(_) => self.clone(),
            Self::Index(i) => Self::Symbol(Symbol::new(i.to_string())),
        }
    }

    /// The segment as a text segment.
    pub fn to_text(&self) -> Self {
        match self {
            Self::Text(_) => self.clone(),
            Self::Symbol(s) => Self::Text(s.as_str().to_string()),
            Self::Index(i) => Self::Text(i.to_string()),
        }
    }

    /// Apply a path mode to this segment.
    pub fn normalize(&self, mode: PathMode) -> Self {
        match mode {
            PathMode::AsSymbol => self.to_symbol(),
            PathMode::AsString => self.to_text(),
            PathMode::AsDeclared => self.clone(),
        }
    }

    /// The segment's bare name, used when building dotted introspection keys.
    pub fn label(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Symbol(s) => s.as_str().to_string(),
            Self::Index(i) => i.to_string(),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Symbol(s) => write!(f, "{s}"),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(segment: &str) -> Self {
        Self::Text(segment.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(segment: String) -> Self {
        Self::Text(segment)
    }
}

impl From<Symbol> for PathSegment {
    fn from(segment: Symbol) -> Self {
        Self::Symbol(segment)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// How a field's path segments are represented after finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PathMode {
    /// Coerce every segment to a symbol.
    AsSymbol,
    /// Coerce every segment to text.
    AsString,
    /// Keep segments exactly as authored.
    #[default]
    AsDeclared,
}

impl PathMode {
    /// The canonical spelling of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AsSymbol => "symbol",
            Self::AsString => "string",
            Self::AsDeclared => "declared",
        }
    }

    /// Normalize a whole path.
    pub fn apply(&self, path: &[PathSegment]) -> Vec<PathSegment> {
        path.iter().map(|segment| segment.normalize(*self)).collect()
    }
}

impl fmt::Display for PathMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PathMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "symbol" | "as_symbol" => Ok(Self::AsSymbol),
            "string" | "as_string" => Ok(Self::AsString),
            "declared" | "as_declared" | "none" => Ok(Self::AsDeclared),
            other => Err(CoreError::UnknownPathMode(other.to_string())),
        }
    }
}
