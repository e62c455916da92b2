//! # Event Envelope
//!
//! Host events arrive as JSON objects with a required, non-empty `type`
//! field. Everything else is type-specific and carried through untouched.
//!
//! ```json
//! {"type": "lifecycle", "timestamp": "...", "metadata": {"action": "instance-started"}}
//! ```

use crate::HubError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A decoded host event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event type, used for target filtering.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Type-specific fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Event {
    /// Create an event with no fields beyond its type.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            fields: Map::new(),
        }
    }

    /// Builder-style field setter.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Decode one transport frame.
    ///
    /// Fails for malformed JSON, a missing `type`, or an empty `type`.
    pub fn decode(frame: &[u8]) -> Result<Self, HubError> {
        let event: Event =
            serde_json::from_slice(frame).map_err(|e| HubError::Decode(e.to_string()))?;
        if event.event_type.is_empty() {
            return Err(HubError::Decode("event type is empty".into()));
        }
        Ok(event)
    }

    /// Encode as a JSON string for forwarding.
    pub fn to_json(&self) -> Result<String, HubError> {
        serde_json::to_string(self).map_err(|e| HubError::Decode(e.to_string()))
    }

    /// The `metadata` field, if present.
    pub fn metadata(&self) -> Option<&Value> {
        self.fields.get("metadata")
    }
}
