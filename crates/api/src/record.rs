use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ApiError, Result};

/// A JSON object with key-based access.
///
/// Every object received from or sent to Bugzilla goes through this type.
/// Keys keep their insertion order so request bodies serialize the way they
/// were built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

/// Builds a [`Record`] from `key => value` pairs.
///
/// ```
/// use bugzilla_api::record;
///
/// let bug = record! {
///     "product" => "Firefox",
///     "component" => "General",
///     "summary" => "Crash on startup",
/// };
/// assert_eq!(bug.len(), 3);
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::Record::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::Record::new();
        $(
            record.set($key, $crate::serde_json::json!($value));
        )+
        record
    }};
}

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, key: &str) -> Result<&Value> {
        self.0
            .get(key)
            .ok_or_else(|| ApiError::KeyNotFound(key.to_string()))
    }

    pub fn get_mut(&mut self, key: &str) -> Result<&mut Value> {
        self.0
            .get_mut(key)
            .ok_or_else(|| ApiError::KeyNotFound(key.to_string()))
    }

    /// Reads a field and deserializes it into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self.get(key)?;
        Ok(T::deserialize(value)?)
    }

    /// Inserts or overwrites `key`, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Inserts `value` only when `key` is absent. Returns true if it inserted.
    pub fn set_default(&mut self, key: &str, value: impl Into<Value>) -> bool {
        if self.0.contains_key(key) {
            return false;
        }
        self.0.insert(key.to_string(), value.into());
        true
    }

    pub fn delete(&mut self, key: &str) -> Result<Value> {
        self.0
            .remove(key)
            .ok_or_else(|| ApiError::KeyNotFound(key.to_string()))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.0)
    }
}

impl TryFrom<Value> for Record {
    type Error = ApiError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ApiError::InvalidResponse(format!(
                "expected a JSON object, got {}",
                kind_of(&other)
            ))),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_then_get() {
        let mut record = Record::new();
        assert!(record.set("summary", "hi").is_none());
        assert_eq!(record.get("summary").unwrap(), &json!("hi"));

        let previous = record.set("summary", "there");
        assert_eq!(previous, Some(json!("hi")));
        assert_eq!(record.get("summary").unwrap(), &json!("there"));
    }

    #[test]
    fn test_get_missing_key() {
        let record = Record::new();
        match record.get("nope") {
            Err(ApiError::KeyNotFound(key)) => assert_eq!(key, "nope"),
            other => panic!("expected KeyNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_delete_then_get_fails() {
        let mut record = record! { "id" => 42 };
        assert_eq!(record.delete("id").unwrap(), json!(42));
        assert!(matches!(record.get("id"), Err(ApiError::KeyNotFound(_))));
        assert!(matches!(record.delete("id"), Err(ApiError::KeyNotFound(_))));
    }

    #[test]
    fn test_get_as_typed() {
        let record = record! {
            "id" => 42,
            "summary" => "hi",
            "cc" => ["a@example.com", "b@example.com"],
        };

        assert_eq!(record.get_as::<u64>("id").unwrap(), 42);
        assert_eq!(record.get_as::<String>("summary").unwrap(), "hi");
        assert_eq!(record.get_as::<Vec<String>>("cc").unwrap().len(), 2);
        assert!(matches!(
            record.get_as::<u64>("summary"),
            Err(ApiError::JsonError(_))
        ));
    }

    #[test]
    fn test_set_default_keeps_existing() {
        let mut record = record! { "version" => "1.0" };
        assert!(!record.set_default("version", "other"));
        assert!(record.set_default("op_sys", "All"));
        assert_eq!(record.get("version").unwrap(), "1.0");
        assert_eq!(record.get("op_sys").unwrap(), "All");
    }

    #[test]
    fn test_try_from_value() {
        let record = Record::try_from(json!({"bugs": []})).unwrap();
        assert!(record.contains_key("bugs"));

        let err = Record::try_from(json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_preserves_insertion_order() {
        let record = record! { "z" => 1, "a" => 2, "m" => 3 };
        let keys: Vec<&String> = record.keys().collect();
        assert_eq!(keys, ["z", "a", "m"]);
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"z":1,"a":2,"m":3}"#
        );
    }

    #[test]
    fn test_from_iterator() {
        let record: Record = vec![("a", json!(1)), ("b", json!(null))]
            .into_iter()
            .collect();
        assert_eq!(record.len(), 2);
        assert!(record.get("b").unwrap().is_null());
    }
}
