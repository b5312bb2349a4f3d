use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

/// Ordered mapping from attribute name to value.
///
/// Keys iterate in lexicographic order, which keeps encoded snapshots stable.
pub type AttributeMap = BTreeMap<String, AttributeValue>;

/// A value stored under an attribute name.
///
/// The set of kinds is closed. Mappings nest the same type recursively, so
/// every value reachable from the store is one of these six variants.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    Integer(i64),
    Real(f64),
    Mapping(AttributeMap),
    /// Unique strings; cleared after every snapshot.
    Set(BTreeSet<String>),
    /// Appended strings with adjacent duplicates suppressed; cleared after
    /// every snapshot.
    Sequence(Vec<String>),
}

/// Discriminant of an [`AttributeValue`], used for logging and errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Text,
    Integer,
    Real,
    Mapping,
    Set,
    Sequence,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Integer => write!(f, "integer"),
            Self::Real => write!(f, "real"),
            Self::Mapping => write!(f, "mapping"),
            Self::Set => write!(f, "set"),
            Self::Sequence => write!(f, "sequence"),
        }
    }
}

impl AttributeValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn integer(value: i64) -> Self {
        Self::Integer(value)
    }

    pub fn real(value: f64) -> Self {
        Self::Real(value)
    }

    /// Build a mapping from `(key, value)` pairs.
    pub fn mapping<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<AttributeValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Text(_) => ValueKind::Text,
            Self::Integer(_) => ValueKind::Integer,
            Self::Real(_) => ValueKind::Real,
            Self::Mapping(_) => ValueKind::Mapping,
            Self::Set(_) => ValueKind::Set,
            Self::Sequence(_) => ValueKind::Sequence,
        }
    }

    /// Returns `true` for the per-snapshot collection kinds (set, sequence).
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Set(_) | Self::Sequence(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&AttributeMap> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&BTreeSet<String>> {
        match self {
            Self::Set(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[String]> {
        match self {
            Self::Sequence(v) => Some(v),
            _ => None,
        }
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for AttributeValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<f32> for AttributeValue {
    fn from(value: f32) -> Self {
        Self::Real(f64::from(value))
    }
}

impl From<AttributeMap> for AttributeValue {
    fn from(value: AttributeMap) -> Self {
        Self::Mapping(value)
    }
}
