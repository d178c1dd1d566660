//! Provisional records emitted by source adapters.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Adapter output before normalization: an open key/value mapping.
///
/// Adapters may use any key names; the normalizer knows the common aliases.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ProvisionalRecord(Map<String, Value>);

impl ProvisionalRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, builder style.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// First non-empty scalar among `keys`, as trimmed text.
    pub fn first_str(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|key| self.0.get(*key))
            .find_map(scalar_text)
    }

    /// First list-like value among `keys`.
    ///
    /// Accepts a JSON array of scalars or a comma separated string.
    pub fn first_list(&self, keys: &[&str]) -> Option<Vec<String>> {
        keys.iter().filter_map(|key| self.0.get(*key)).find_map(|value| {
            let items: Vec<String> = match value {
                Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
                Value::String(s) => s
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
                _ => Vec::new(),
            };
            (!items.is_empty()).then_some(items)
        })
    }

    /// First non-empty object among `keys`.
    pub fn first_object(&self, keys: &[&str]) -> Option<&Map<String, Value>> {
        keys.iter()
            .filter_map(|key| self.0.get(*key))
            .find_map(|value| value.as_object().filter(|m| !m.is_empty()))
    }
}

impl From<Map<String, Value>> for ProvisionalRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_str_skips_blank_values() {
        let record = ProvisionalRecord::new()
            .with("title", "   ")
            .with("description", " Land Acquisition ")
            .with("number", 12);

        assert_eq!(
            record.first_str(&["title", "description"]),
            Some("Land Acquisition".to_string())
        );
        assert_eq!(record.first_str(&["number"]), Some("12".to_string()));
        assert_eq!(record.first_str(&["missing"]), None);
    }

    #[test]
    fn test_first_list_accepts_arrays_and_csv() {
        let record = ProvisionalRecord::new()
            .with("languages", json!([]))
            .with("language", "en, si");
        assert_eq!(
            record.first_list(&["languages", "language"]),
            Some(vec!["en".to_string(), "si".to_string()])
        );
    }

    #[test]
    fn test_first_object_preserves_key_order() {
        let record: ProvisionalRecord = serde_json::from_value(json!({
            "lang_to_source_url": {"ta": "t.pdf", "si": "s.pdf"}
        }))
        .unwrap();
        let map = record.first_object(&["lang_to_source_url"]).unwrap();
        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, vec!["ta", "si"]);
    }
}
