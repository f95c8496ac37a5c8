//! Alias-fallback attribute lookup
//!
//! Repositories written by different tool generations spell the same
//! attribute differently (`updatedAt`, `lastModifiedAt`, `updated_on`).
//! An [`AttributeChain`] is an ordered list of accessors; the first one
//! that yields a non-empty value wins.

use std::fmt;

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::records::AttributeMap;

/// One lookup step in a chain
pub type Accessor = Box<dyn Fn(&AttributeMap) -> Option<String> + Send + Sync>;

/// Ordered accessors evaluated until one returns a value
#[derive(Default)]
pub struct AttributeChain {
    accessors: Vec<Accessor>,
}

impl AttributeChain {
    /// Create an empty chain (resolves to `None`)
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain that reads each key in order
    pub fn keys(keys: &[&'static str]) -> Self {
        keys.iter().fold(Self::new(), |chain, key| chain.key(*key))
    }

    /// Append a plain key lookup
    pub fn key(self, key: &'static str) -> Self {
        self.with(move |attrs| attrs.get(key).and_then(text_of))
    }

    /// Append an arbitrary accessor
    pub fn with<F>(mut self, accessor: F) -> Self
    where
        F: Fn(&AttributeMap) -> Option<String> + Send + Sync + 'static,
    {
        self.accessors.push(Box::new(accessor));
        self
    }

    /// First non-empty value produced by the chain
    pub fn resolve(&self, attrs: &AttributeMap) -> Option<String> {
        self.accessors.iter().find_map(|accessor| accessor(attrs))
    }

    /// Number of accessors in the chain
    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    /// True if the chain has no accessors
    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }
}

impl fmt::Debug for AttributeChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeChain")
            .field("accessors", &self.accessors.len())
            .finish()
    }
}

/// Text form of a scalar attribute
///
/// Non-blank strings are returned as-is, numbers in their JSON form.
/// Everything else (blank strings, null, bools, arrays, objects) counts
/// as absent.
pub fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// String items of an id list, skipping anything that is not text
pub fn id_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(text_of).collect(),
        _ => Vec::new(),
    }
}

/// Element display name
pub static ELEMENT_NAME: Lazy<AttributeChain> =
    Lazy::new(|| AttributeChain::keys(&["name", "label", "title"]));

/// Creation timestamp
pub static CREATED_AT: Lazy<AttributeChain> =
    Lazy::new(|| AttributeChain::keys(&["createdAt", "created_at", "createdOn", "created_on"]));

/// Last modification timestamp
pub static UPDATED_AT: Lazy<AttributeChain> = Lazy::new(|| {
    AttributeChain::keys(&["updatedAt", "lastModifiedAt", "updated_on", "updated_at"])
});

/// Author
pub static CREATED_BY: Lazy<AttributeChain> =
    Lazy::new(|| AttributeChain::keys(&["createdBy", "created_by", "author"]));

/// Diagram title
pub static DIAGRAM_TITLE: Lazy<AttributeChain> =
    Lazy::new(|| AttributeChain::keys(&["title", "name"]));

/// Diagram viewpoint
pub static VIEWPOINT_ID: Lazy<AttributeChain> =
    Lazy::new(|| AttributeChain::keys(&["viewpointId", "viewpoint", "viewpoint_id"]));

/// Free-text description
pub static DESCRIPTION: Lazy<AttributeChain> =
    Lazy::new(|| AttributeChain::keys(&["description", "documentation"]));

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> AttributeMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_first_key_wins() {
        let bag = attrs(json!({"updatedAt": "2025-01-02", "updated_on": "2024-01-01"}));
        assert_eq!(UPDATED_AT.resolve(&bag).as_deref(), Some("2025-01-02"));
    }

    #[test]
    fn test_falls_through_blank_values() {
        let bag = attrs(json!({
            "updatedAt": "  ",
            "lastModifiedAt": null,
            "updated_on": "2024-01-01"
        }));
        assert_eq!(UPDATED_AT.resolve(&bag).as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_nothing_found() {
        let bag = attrs(json!({"unrelated": "x"}));
        assert_eq!(ELEMENT_NAME.resolve(&bag), None);
    }

    #[test]
    fn test_numbers_count_as_text() {
        let bag = attrs(json!({"label": 42}));
        assert_eq!(ELEMENT_NAME.resolve(&bag).as_deref(), Some("42"));
    }

    #[test]
    fn test_custom_accessor() {
        let chain = AttributeChain::new()
            .key("title")
            .with(|attrs| {
                attrs
                    .get("meta")
                    .and_then(|meta| meta.get("title"))
                    .and_then(text_of)
            });
        assert_eq!(chain.len(), 2);

        let bag = attrs(json!({"meta": {"title": "nested"}}));
        assert_eq!(chain.resolve(&bag).as_deref(), Some("nested"));
    }

    #[test]
    fn test_empty_chain() {
        let chain = AttributeChain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.resolve(&attrs(json!({"name": "x"}))), None);
    }

    #[test]
    fn test_id_list() {
        let value = json!(["a", "", 7, null, "b"]);
        assert_eq!(id_list(Some(&value)), vec!["a", "7", "b"]);
        assert!(id_list(Some(&json!("a"))).is_empty());
        assert!(id_list(None).is_empty());
    }
}
