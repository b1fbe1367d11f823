// src/models/record.rs

//! Raw records as produced by a source adapter.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};

/// A single untyped value read from an origin.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    DateTime(DateTime<FixedOffset>),
    List(Vec<String>),
    Null,
}

impl FieldValue {
    /// Text view of the value. Lists are joined with `", "`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Integer(n) => Some(n.to_string()),
            FieldValue::Float(f) => Some(f.to_string()),
            FieldValue::Bool(b) => Some(b.to_string()),
            FieldValue::DateTime(dt) => Some(dt.to_rfc3339()),
            FieldValue::List(items) => Some(items.join(", ")),
            FieldValue::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// Mapping from source-specific field name to value.
///
/// Records only live for one pass through the pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Append a text value, turning the field into a list on repeat.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        match self.fields.entry(key.into()) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(FieldValue::Text(value));
            }
            std::collections::btree_map::Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                match existing {
                    FieldValue::List(items) => items.push(value),
                    other => {
                        let first = other.as_text().unwrap_or_default();
                        *other = FieldValue::List(vec![first, value]);
                    }
                }
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Non-null text for a key, trimmed; `None` when absent or blank.
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key)
            .and_then(FieldValue::as_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// All values for a key as a list of strings.
    pub fn list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(FieldValue::List(items)) => items.clone(),
            Some(FieldValue::Null) | None => Vec::new(),
            Some(other) => other.as_text().into_iter().collect(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_promotes_to_list() {
        let mut record = RawRecord::new();
        record.push("category", "rust");
        assert_eq!(record.text("category"), Some("rust".to_string()));

        record.push("category", "blog");
        assert_eq!(
            record.list("category"),
            vec!["rust".to_string(), "blog".to_string()]
        );
    }

    #[test]
    fn test_blank_text_is_none() {
        let record = RawRecord::new()
            .with("title", "   ")
            .with("excerpt", FieldValue::Null);
        assert!(record.contains("title"));
        assert_eq!(record.text("title"), None);
        assert_eq!(record.text("excerpt"), None);
        assert!(record.list("excerpt").is_empty());
    }
}
