//! Assignment and result documents.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Named values, as read from an assignment file or written as a result.
pub type Assignment = BTreeMap<String, Value>;

/// One externally visible value.
///
/// In JSON: `null` is an absent optional value, `"unset"` leaves a slot of a
/// dense array unconstrained and an object keyed by decimal indices is a
/// sparse array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Nil,
    Boolean(bool),
    Integer(i64),
    Unset(UnsetMarker),
    Array(Vec<Value>),
    Sparse(BTreeMap<String, Value>),
}

/// Serializes as the string `"unset"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnsetMarker {
    #[serde(rename = "unset")]
    Unset,
}

impl Value {
    /// A hole in a dense array.
    pub const UNSET: Self = Self::Unset(UnsetMarker::Unset);

    /// Type name used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Nil => "null",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Unset(_) => "unset",
            Self::Array(_) | Self::Sparse(_) => "array",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{self:?}"),
        }
    }
}
