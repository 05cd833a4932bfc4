use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Identifier of a bug, comment or attachment.
///
/// Bugzilla accepts either the numeric id or, for bugs, an alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Id {
    Number(i64),
    Alias(String),
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Number(n) => write!(f, "{n}"),
            Id::Alias(alias) => f.write_str(alias),
        }
    }
}

impl From<i32> for Id {
    fn from(value: i32) -> Self {
        Id::Number(value.into())
    }
}

impl From<u32> for Id {
    fn from(value: u32) -> Self {
        Id::Number(value.into())
    }
}

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Id::Number(value)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id::from(value.to_string())
    }
}

/// Strings that are the canonical form of an integer become `Number`;
/// anything else, including `"042"` or `"+5"`, is kept verbatim.
impl From<String> for Id {
    fn from(value: String) -> Self {
        match value.parse::<i64>() {
            Ok(n) if n.to_string() == value => Id::Number(n),
            _ => Id::Alias(value),
        }
    }
}

impl From<&Id> for Value {
    fn from(id: &Id) -> Self {
        match id {
            Id::Number(n) => Value::from(*n),
            Id::Alias(alias) => Value::from(alias.as_str()),
        }
    }
}

/// One `field = value` search criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm {
    pub field: String,
    pub value: String,
}

impl SearchTerm {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> From<(K, V)> for SearchTerm {
    fn from((field, value): (K, V)) -> Self {
        Self::new(field, value)
    }
}

/// Consumes `terms` in order and renders them as `&field=value` segments.
pub fn encode_search_terms<I>(terms: I) -> String
where
    I: IntoIterator<Item = SearchTerm>,
{
    terms
        .into_iter()
        .map(|term| format!("&{}={}", quote(&term.field), quote(&term.value)))
        .collect()
}

/// Percent-encodes a query component, leaving `/` readable.
pub(crate) fn quote(raw: &str) -> String {
    urlencoding::encode(raw).replace("%2F", "/")
}
