use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{BulletinError, BulletinResult};

/// Credit value per subject position, read from a `{"ECTS1": 3, ...}` object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreditTable {
    values: HashMap<String, u32>,
}

impl CreditTable {
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, u32)>,
        K: Into<String>,
    {
        Self {
            values: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn from_json_str(raw: &str) -> BulletinResult<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| BulletinError::configuration(format!("Invalid credit table: {}", e)))?;
        let object = value
            .as_object()
            .ok_or_else(|| BulletinError::configuration("Credit table must be a JSON object"))?;

        let mut values = HashMap::with_capacity(object.len());
        for (key, raw_value) in object {
            let credit = match raw_value {
                Value::Number(n) => n.as_f64().map(|f| f as u32),
                Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as u32),
                _ => None,
            }
            .ok_or_else(|| {
                BulletinError::configuration(format!("Credit value for '{}' is not a number", key))
            })?;
            values.insert(key.clone(), credit);
        }

        Ok(Self { values })
    }

    pub fn load(path: &Path) -> BulletinResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            BulletinError::configuration(format!(
                "Cannot read credit table {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&raw)
    }

    /// Configured credit of a 1-based subject position, 0 when absent.
    pub fn credit_for(&self, position: usize) -> u32 {
        self.values
            .get(&format!("ECTS{}", position))
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_credit_table() {
        let table = CreditTable::from_json_str(r#"{"ECTS1": 3, "ECTS2": "2", "ECTS3": 1.0}"#).unwrap();
        assert_eq!(table.credit_for(1), 3);
        assert_eq!(table.credit_for(2), 2);
        assert_eq!(table.credit_for(3), 1);
        assert_eq!(table.credit_for(4), 0);
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(CreditTable::from_json_str("[1, 2]").is_err());
        assert!(CreditTable::from_json_str(r#"{"ECTS1": true}"#).is_err());
    }
}
