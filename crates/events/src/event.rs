//! The notification envelope posted to the external endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// DeliveryEvent
// ---------------------------------------------------------------------------

/// An event describing something the relay observed, ready to be posted.
///
/// Serializes as `{"event_type": "...", "data": {...}}`. Constructed via
/// [`DeliveryEvent::new`] and filled in with
/// [`with_field`](DeliveryEvent::with_field).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryEvent {
    /// Event name, e.g. `"workflow_completed"`.
    pub event_type: String,

    /// Event-specific fields, serialized in insertion order.
    pub data: Map<String, Value>,
}

impl DeliveryEvent {
    /// Create an event with an empty `data` object.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            data: Map::new(),
        }
    }

    /// Set a single `data` field, replacing any previous value.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Look up a `data` field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Look up a `data` field that holds a string.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(Value::as_str)
    }

    /// Pretty-printed JSON for debug logging.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("<unserializable: {e}>"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
