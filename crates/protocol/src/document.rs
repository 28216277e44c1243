//! Loose, order-preserving JSON documents for remote app/version records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A string-keyed JSON document with server-defined schema.
///
/// Key order is preserved (`serde_json` with `preserve_order`) so the
/// record can be posted back the way the server sent it. Accessors never
/// assume a field is present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn new() -> Document {
        Document(Map::new())
    }

    /// Raw field access.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Sets a field, replacing any existing value.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// String field, `None` when absent or not a string.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Integer field, `None` when absent or not an integer.
    pub fn i64_field(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    /// Nested document field.
    pub fn document(&self, key: &str) -> Option<Document> {
        match self.0.get(key) {
            Some(Value::Object(map)) => Some(Document(map.clone())),
            _ => None,
        }
    }

    /// Array field decoded as documents; non-object elements are skipped.
    pub fn documents(&self, key: &str) -> Vec<Document> {
        match self.0.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| match v {
                    Value::Object(map) => Some(Document(map.clone())),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The record identifier assigned by the server.
    pub fn uuid(&self) -> Option<&str> {
        self.str_field("uuid")
    }

    /// A record is persisted iff it carries a non-null identifier.
    pub fn is_persisted(&self) -> bool {
        self.uuid().is_some()
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Document {
        Document(map)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Value {
        Value::Object(doc.0)
    }
}
