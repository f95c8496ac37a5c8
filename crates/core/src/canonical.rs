//! Canonical JSON encoding
//!
//! Every document stored in a package, and every buffer fed to the checksum,
//! goes through [`canonicalize`]. Object keys are sorted recursively, arrays
//! keep their order, and the text is compact (no whitespace), so two values
//! that differ only in key order encode to identical bytes.

use serde::Serialize;
use serde_json::Value;

use crate::error::{CanonicalError, CanonicalResult};

/// Encode any serializable value as canonical JSON bytes (UTF-8)
pub fn canonicalize<T: Serialize + ?Sized>(value: &T) -> CanonicalResult<Vec<u8>> {
    let tree = serde_json::to_value(value).map_err(CanonicalError::Encode)?;
    canonicalize_value(tree)
}

/// Encode an already-built JSON tree as canonical bytes
pub fn canonicalize_value(value: Value) -> CanonicalResult<Vec<u8>> {
    let sorted = sort_keys(value);
    let text = serde_json::to_string(&sorted).map_err(CanonicalError::Encode)?;

    // The output must always parse back; anything else is an encoder bug.
    serde_json::from_str::<Value>(&text)
        .map_err(|e| CanonicalError::NotReparseable(e.to_string()))?;

    Ok(text.into_bytes())
}

/// Rebuild `value` with every object's keys in lexicographic order
pub fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, inner)| (key, sort_keys(inner)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_keys_sorted_recursively() {
        let value = json!({"b": 1, "a": {"z": true, "m": [ {"y": 1, "x": 2} ]}});
        let bytes = canonicalize(&value).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"a":{"m":[{"x":2,"y":1}],"z":true},"b":1}"#
        );
    }

    #[test]
    fn test_arrays_keep_order() {
        let bytes = canonicalize(&json!([3, 1, 2])).unwrap();
        assert_eq!(bytes, b"[3,1,2]");
    }

    #[test]
    fn test_primitives_pass_through() {
        assert_eq!(canonicalize(&json!("text")).unwrap(), b"\"text\"");
        assert_eq!(canonicalize(&json!(null)).unwrap(), b"null");
        assert_eq!(canonicalize(&42u32).unwrap(), b"42");
    }

    #[test]
    fn test_output_is_valid_json() {
        let value = json!({"unicode": "caf\u{e9} \u{1F600}", "quote": "a\"b"});
        let bytes = canonicalize(&value).unwrap();
        let parsed: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn test_struct_and_value_agree() {
        #[derive(Serialize)]
        struct Pair {
            zeta: u8,
            alpha: u8,
        }
        let from_struct = canonicalize(&Pair { zeta: 1, alpha: 2 }).unwrap();
        let from_value = canonicalize(&json!({"alpha": 2, "zeta": 1})).unwrap();
        assert_eq!(from_struct, from_value);
    }

    #[test]
    fn test_non_string_map_keys_rejected() {
        let mut map = std::collections::HashMap::new();
        map.insert(vec![1u8], 1u8);
        assert!(matches!(canonicalize(&map), Err(CanonicalError::Encode(_))));
    }

    fn build_object(pairs: &[(String, i64)], reverse: bool) -> Value {
        let mut ordered: Vec<&(String, i64)> = pairs.iter().collect();
        if reverse {
            ordered.reverse();
        }
        let mut map = serde_json::Map::new();
        for (key, value) in ordered {
            map.insert(key.clone(), json!({ "v": value, "nested": { "k2": key, "k1": value } }));
        }
        Value::Object(map)
    }

    proptest! {
        #[test]
        fn prop_key_order_does_not_change_bytes(
            pairs in proptest::collection::btree_map("[a-z]{1,6}", any::<i64>(), 0..12)
        ) {
            let pairs: Vec<(String, i64)> = pairs.into_iter().collect();
            let forward = canonicalize(&build_object(&pairs, false)).unwrap();
            let backward = canonicalize(&build_object(&pairs, true)).unwrap();
            prop_assert_eq!(forward, backward);
        }
    }
}
