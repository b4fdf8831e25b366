//! Typed configuration values.
//!
//! Node configuration is a map from field name to [`ConfigValue`]. Values keep
//! their JSON shape so that descriptors round-trip byte for byte: integers stay
//! integers, lists stay lists of strings.

use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::collections::BTreeMap;
use std::fmt;

/// Configuration of one node, keyed by field name in sorted order.
pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// A single configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer or floating-point number.
    Number(Number),
    /// Free text or an enum option.
    String(String),
    /// Ordered list of strings (column lists, aggregate expressions).
    List(Vec<String>),
}

impl ConfigValue {
    /// Create a string value.
    pub fn string(v: impl Into<String>) -> Self {
        Self::String(v.into())
    }

    /// Create a list value.
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Create an integer value.
    pub fn int(v: i64) -> Self {
        Self::Number(v.into())
    }

    /// Create a floating-point value, or `None` for NaN and infinities.
    pub fn float(v: f64) -> Option<Self> {
        Number::from_f64(v).map(Self::Number)
    }

    /// Get the value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as a list of strings.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get the value as a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Get the value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Check whether the value counts as "not provided".
    ///
    /// Blank strings and lists that hold only blank entries are empty.
    /// Numbers and booleans are never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::String(s) => s.trim().is_empty(),
            Self::List(items) => items.iter().all(|s| s.trim().is_empty()),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }

    /// Short name of the value's shape, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::List(_) => "list",
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => f.write_str(s),
            Self::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(v: i64) -> Self {
        Self::int(v)
    }
}

impl From<Vec<String>> for ConfigValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl From<Vec<&str>> for ConfigValue {
    fn from(items: Vec<&str>) -> Self {
        Self::list(items)
    }
}
