//! Canonicalization of YAML-decoded trees into JSON-compatible trees.
//!
//! YAML allows mapping keys of any scalar type (and even collections). JSON
//! and the schema engine only understand text keys, so every key is rebuilt
//! as its text form. Sequences keep their order, scalars pass through, and
//! YAML tags are dropped in favour of the tagged value.

use serde_json::{Map, Number};
use serde_yaml::Value as YamlValue;

use crate::error::KeyCoercionError;

/// Canonicalize a YAML tree into a JSON tree with text-only mapping keys.
///
/// Fails on the first key that has no text form (null, sequence, mapping or
/// tagged keys). Non-finite floats have no JSON form and become `null`.
/// Applying the function to its own output (re-read as YAML) is a no-op.
pub fn canonicalize(value: &YamlValue) -> Result<serde_json::Value, KeyCoercionError> {
    canonicalize_at(value, "$")
}

fn canonicalize_at(value: &YamlValue, path: &str) -> Result<serde_json::Value, KeyCoercionError> {
    match value {
        YamlValue::Null => Ok(serde_json::Value::Null),
        YamlValue::Bool(b) => Ok(serde_json::Value::Bool(*b)),
        YamlValue::Number(n) => Ok(number_to_json(n)),
        YamlValue::String(s) => Ok(serde_json::Value::String(s.clone())),
        YamlValue::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| canonicalize_at(item, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(serde_json::Value::Array),
        YamlValue::Mapping(mapping) => {
            let mut object = Map::new();
            for (key, item) in mapping {
                let key = key_to_text(key, path)?;
                let child = canonicalize_at(item, &format!("{path}.{key}"))?;
                object.insert(key, child);
            }
            Ok(serde_json::Value::Object(object))
        }
        YamlValue::Tagged(tagged) => canonicalize_at(&tagged.value, path),
    }
}

/// Text form of a mapping key.
pub fn key_to_text(key: &YamlValue, path: &str) -> Result<String, KeyCoercionError> {
    match key {
        YamlValue::String(s) => Ok(s.clone()),
        YamlValue::Bool(b) => Ok(b.to_string()),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Null
        | YamlValue::Sequence(_)
        | YamlValue::Mapping(_)
        | YamlValue::Tagged(_) => Err(KeyCoercionError {
            key: format!("{key:?}"),
            path: path.to_string(),
        }),
    }
}

fn number_to_json(n: &serde_yaml::Number) -> serde_json::Value {
    if let Some(i) = n.as_i64() {
        serde_json::Value::from(i)
    } else if let Some(u) = n.as_u64() {
        serde_json::Value::from(u)
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn yaml(text: &str) -> YamlValue {
        serde_yaml::from_str(text).unwrap()
    }

    fn recanonicalize(json: &serde_json::Value) -> serde_json::Value {
        let reread: YamlValue = serde_yaml::to_value(json).unwrap();
        canonicalize(&reread).unwrap()
    }

    #[test]
    fn test_scalar_keys_become_text() {
        let value = yaml("1: one\ntrue: yes\n2.5: half\nname: plain\n");
        let json = canonicalize(&value).unwrap();
        assert_eq!(json, json!({"1": "one", "true": "yes", "2.5": "half", "name": "plain"}));
    }

    #[test]
    fn test_nested_mappings_inside_sequences() {
        let value = yaml(
            r#"
BUILD_MANAGER:
  - ephemeral
  - EXECUTORS:
      - EXECUTOR: popen
        8080: port
"#,
        );
        let json = canonicalize(&value).unwrap();
        assert_eq!(
            json,
            json!({
                "BUILD_MANAGER": [
                    "ephemeral",
                    {"EXECUTORS": [{"EXECUTOR": "popen", "8080": "port"}]}
                ]
            })
        );
    }

    #[test]
    fn test_sequence_order_preserved() {
        let json = canonicalize(&yaml("[c, a, b]")).unwrap();
        assert_eq!(json, json!(["c", "a", "b"]));
    }

    #[test]
    fn test_collection_key_is_rejected() {
        let value = yaml("DB_CONNECTION_ARGS:\n  ? [a, b]\n  : value\n");
        let err = canonicalize(&value).unwrap_err();
        assert_eq!(err.path, "$.DB_CONNECTION_ARGS");
    }

    #[test]
    fn test_null_key_is_rejected() {
        let err = canonicalize(&yaml("~: value\n")).unwrap_err();
        assert_eq!(err.path, "$");
    }

    #[test]
    fn test_tags_are_dropped() {
        let json = canonicalize(&yaml("VALUE: !custom 30\n")).unwrap();
        assert_eq!(json, json!({"VALUE": 30}));
    }

    #[test]
    fn test_idempotent_on_document() {
        let value = yaml("1: {2: [x, {3: y}]}\nSERVER_HOSTNAME: quay.example.com\n");
        let once = canonicalize(&value).unwrap();
        assert_eq!(recanonicalize(&once), once);
    }

    fn arb_key() -> impl Strategy<Value = YamlValue> {
        prop_oneof![
            "[A-Z_]{1,12}".prop_map(YamlValue::String),
            any::<i32>().prop_map(|i| YamlValue::Number(i.into())),
            any::<bool>().prop_map(YamlValue::Bool),
        ]
    }

    fn arb_yaml() -> impl Strategy<Value = YamlValue> {
        let leaf = prop_oneof![
            Just(YamlValue::Null),
            any::<bool>().prop_map(YamlValue::Bool),
            any::<i64>().prop_map(|i| YamlValue::Number(i.into())),
            "[a-z0-9 ]{0,8}".prop_map(YamlValue::String),
        ];
        leaf.prop_recursive(4, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(YamlValue::Sequence),
                prop::collection::vec((arb_key(), inner), 0..4)
                    .prop_map(|entries| YamlValue::Mapping(entries.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn test_canonicalize_is_idempotent(value in arb_yaml()) {
            let once = canonicalize(&value).unwrap();
            prop_assert_eq!(recanonicalize(&once), once);
        }
    }
}
