//! Request body construction
//!
//! Scanned text that parses as a JSON object is sent unchanged. Anything
//! else, including JSON scalars and arrays, is wrapped as
//! `{"ticket_id": "<text>"}`. Building a payload never fails.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// Key used when the scanned text is not a JSON object
pub const FALLBACK_KEY: &str = "ticket_id";

#[derive(Debug, Clone, PartialEq)]
pub enum VerificationPayload {
    /// The scanned JSON object, passed through
    Structured(Map<String, Value>),
    /// Plain ticket code
    Fallback(String),
}

impl VerificationPayload {
    pub fn from_scanned(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(object)) => VerificationPayload::Structured(object),
            _ => VerificationPayload::Fallback(text.to_string()),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, VerificationPayload::Structured(_))
    }

    /// The body as a JSON value
    pub fn to_value(&self) -> Value {
        match self {
            VerificationPayload::Structured(object) => Value::Object(object.clone()),
            VerificationPayload::Fallback(text) => {
                let mut object = Map::new();
                object.insert(FALLBACK_KEY.to_string(), Value::String(text.clone()));
                Value::Object(object)
            }
        }
    }
}

impl Serialize for VerificationPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            VerificationPayload::Structured(object) => object.serialize(serializer),
            VerificationPayload::Fallback(text) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(FALLBACK_KEY, text)?;
                map.end()
            }
        }
    }
}
