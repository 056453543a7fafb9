use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Flat key/value record bound into a report template.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct PlaceholderMap(BTreeMap<String, Value>);

impl PlaceholderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Value rendered the way a template would print it.
    pub fn get_text(&self, key: &str) -> Option<String> {
        self.0.get(key).map(|v| match v {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        })
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

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_text_formats_values() {
        let mut map = PlaceholderMap::new();
        map.insert("note1", "12.50");
        map.insert("ECTS1", 3);
        map.insert("moyUE1", 10.5);
        map.insert("empty", Value::Null);

        assert_eq!(map.get_text("note1").as_deref(), Some("12.50"));
        assert_eq!(map.get_text("ECTS1").as_deref(), Some("3"));
        assert_eq!(map.get_text("moyUE1").as_deref(), Some("10.5"));
        assert_eq!(map.get_text("empty").as_deref(), Some(""));
        assert!(map.get_text("missing").is_none());
    }

    #[test]
    fn test_serializes_flat() {
        let mut map = PlaceholderMap::new();
        map.insert("campus", "Paris");
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json, serde_json::json!({"campus": "Paris"}));
    }
}
