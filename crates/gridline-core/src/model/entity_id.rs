// ── Row identity ──
//
// Backends hand out UUIDs, auto-increment integers, or opaque string keys.
// EntityId unifies them behind one hashable, displayable type.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Canonical identifier for any row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Uuid(Uuid),
    Number(i64),
    Key(String),
}

impl EntityId {
    /// Read an identifier out of a JSON value. Floats, booleans, objects and
    /// blank strings are not identifiers.
    ///
    /// Strings are never read as numbers: `"007"` stays a key, so it
    /// round-trips into request paths unchanged.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Number),
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(canonical_uuid(s).map_or_else(|| Self::Key(s.clone()), Self::Uuid)),
            _ => None,
        }
    }

    /// The identifier as a URL path segment.
    pub fn as_path_segment(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Key(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<Uuid> for EntityId {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

/// Only the hyphenated lowercase form, so `Display` gives back the input.
fn canonical_uuid(s: &str) -> Option<Uuid> {
    Uuid::parse_str(s).ok().filter(|u| u.to_string() == s)
}

/// Typed input (command line, form field). Integers are only recognised in
/// their plain decimal form; `"007"` or `"+5"` stay keys.
impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        if let Some(u) = canonical_uuid(s) {
            return Self::Uuid(u);
        }
        match s.parse::<i64>() {
            Ok(n) if n.to_string() == s => Self::Number(n),
            _ => Self::Key(s.to_owned()),
        }
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}
