//! Dynamically typed configuration values.
//!
//! A configuration document is a tree of [`Value`]s whose mapping keys are
//! always text. Every coercion site matches on the variant explicitly, so a
//! value is never converted into a type it does not already have.

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A mapping node with text keys.
pub type Mapping = BTreeMap<String, Value>;

/// A single node of a configuration document.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Map(Mapping),
}

/// The semantic type of a value, used to name the expected type in errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    Text,
    List,
    Map,
    /// A list whose elements are all text.
    TextList,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "boolean",
            ValueKind::Int => "integer",
            ValueKind::Float => "number",
            ValueKind::Text => "string",
            ValueKind::List => "array",
            ValueKind::Map => "object",
            ValueKind::TextList => "[]string",
        };
        f.write_str(name)
    }
}

impl Value {
    /// The kind of this value. Never returns [`ValueKind::TextList`].
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Text(_) => ValueKind::Text,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Mapping> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Whether this is the zero value of its type (`omitempty` semantics).
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !*b,
            Value::Int(i) => *i == 0,
            Value::Float(f) => *f == 0.0,
            Value::Text(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
            Value::Map(map) => map.is_empty(),
        }
    }

    /// Convert a canonical JSON tree into a value tree.
    ///
    /// Numbers that fit in an `i64` become [`Value::Int`]. Every other number
    /// becomes [`Value::Float`], including integers above `i64::MAX`, so integer
    /// fields reject them as a type mismatch.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert back into a JSON tree. Non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Map(map)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::List(items) => serializer.collect_seq(items),
            Value::Map(map) => serializer.collect_map(map),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_splits_integers_and_floats() {
        let value = Value::from_json(json!({"a": 30, "b": 1.5, "c": "30"}));
        let map = value.as_map().unwrap();
        assert_eq!(map["a"], Value::Int(30));
        assert_eq!(map["b"], Value::Float(1.5));
        assert_eq!(map["c"], Value::Text("30".to_string()));
    }

    #[test]
    fn test_integer_beyond_i64_becomes_float() {
        assert_eq!(Value::from_json(json!(u64::MAX)), Value::Float(u64::MAX as f64));
        assert_eq!(Value::from_json(json!(i64::MAX)), Value::Int(i64::MAX));
    }

    #[test]
    fn test_json_conversion_preserves_structure() {
        let json = json!({
            "SERVER_HOSTNAME": "registry.example.com",
            "TAGS": ["2w", "4w"],
            "NESTED": {"is_secure": true, "port": 443, "none": null}
        });
        assert_eq!(Value::from_json(json.clone()).to_json(), json);
    }

    #[test]
    fn test_zero_values() {
        assert!(Value::Text(String::new()).is_zero());
        assert!(Value::Bool(false).is_zero());
        assert!(Value::List(vec![]).is_zero());
        assert!(!Value::Int(30).is_zero());
        assert!(!Value::Bool(true).is_zero());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ValueKind::Int.to_string(), "integer");
        assert_eq!(ValueKind::Bool.to_string(), "boolean");
        assert_eq!(ValueKind::TextList.to_string(), "[]string");
        assert_eq!(Value::Text("x".into()).kind(), ValueKind::Text);
    }

    #[test]
    fn test_serializes_as_plain_json() {
        let value = Value::from_json(json!({"a": [1, "b", false]}));
        let text = serde_json::to_string(&value).unwrap();
        assert_eq!(text, r#"{"a":[1,"b",false]}"#);
    }
}
