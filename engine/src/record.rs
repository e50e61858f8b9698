//! Record types for storing data.

use crate::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Audit fields shared by every record in every collection.
///
/// `entered_by` is set once at creation and never overwritten; `updated_by`
/// and `timestamp` change on every write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
    /// ISO-8601 stamp of the last write
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub timestamp: String,
    /// Actor that created the record
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub entered_by: String,
    /// Actor of the last write (create or update)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub updated_by: String,
}

/// A record in one of the document's collections.
///
/// Serializes to a single flat JSON object: `id`, the audit fields, and the
/// domain payload side by side. The payload is opaque to the persistence
/// core and carried as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique within the collection, immutable once assigned
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: RecordId,
    /// Shared audit envelope
    #[serde(flatten)]
    pub audit: Audit,
    /// Domain-specific fields, passed through untouched
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Keys lifted out of a payload into the record envelope.
const RESERVED_KEYS: [&str; 4] = ["id", "timestamp", "entered_by", "updated_by"];

fn text_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

impl Record {
    /// Build a record from a raw payload object.
    ///
    /// The `id` and audit keys are lifted into the envelope; everything else
    /// lands in `fields`.
    pub fn from_payload(mut payload: Map<String, Value>) -> Self {
        let take = |payload: &mut Map<String, Value>, key: &str| {
            payload.remove(key).map(|v| text_value(&v)).unwrap_or_default()
        };

        let id = take(&mut payload, "id");
        let audit = Audit {
            timestamp: take(&mut payload, "timestamp"),
            entered_by: take(&mut payload, "entered_by"),
            updated_by: take(&mut payload, "updated_by"),
        };

        Self {
            id,
            audit,
            fields: payload,
        }
    }

    /// Merge payload fields into this record.
    ///
    /// The id and audit keys are never taken from the payload: the id is
    /// immutable, `entered_by` is write-once, and the stamper owns
    /// `timestamp`/`updated_by`.
    pub fn merge_fields(&mut self, payload: &Map<String, Value>) {
        for (key, value) in payload {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            self.fields.insert(key.clone(), value.clone());
        }
    }

    /// Get a domain field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Get a domain field as a string slice, defaulting to empty.
    pub fn field_str(&self, name: &str) -> &str {
        self.fields.get(name).and_then(Value::as_str).unwrap_or("")
    }

    /// Get a domain field as a boolean.
    ///
    /// Accepts real booleans and the string `"true"` (bulk uploads carry
    /// booleans as text).
    pub fn field_bool(&self, name: &str) -> bool {
        match self.fields.get(name) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// Set a domain field.
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }
}
