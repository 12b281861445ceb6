//! Turning a [`QueryDocument`] into a transmittable payload.

use crate::error::SerializationError;
use crate::model::QueryDocument;

/// Encodes result envelopes.
///
/// Must be deterministic: identical documents produce identical bytes, so a
/// retried delivery carries the same payload.
pub trait ResultSerializer: Send + Sync {
    fn serialize(&self, doc: &QueryDocument) -> Result<Vec<u8>, SerializationError>;
}

/// JSON encoding via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResultSerializer {
    pretty: bool,
}

impl JsonResultSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indented output.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl ResultSerializer for JsonResultSerializer {
    fn serialize(&self, doc: &QueryDocument) -> Result<Vec<u8>, SerializationError> {
        let mut bytes = if self.pretty {
            serde_json::to_vec_pretty(doc)?
        } else {
            serde_json::to_vec(doc)?
        };
        bytes.push(b'\n');
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Event, QueryResult};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn document() -> QueryDocument {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let mut body = QueryResult::new("SimpleEventQuery").with_object_events(vec![
            Event(json!({"action": "ADD", "bizStep": "shipping"})),
            Event(json!({"action": "OBSERVE", "bizStep": "shipping"})),
        ]);
        body.subscription_id = Some("sub-1".to_string());
        QueryDocument::new(body, created)
    }

    #[test]
    fn test_json_layout() {
        let bytes = JsonResultSerializer::new().serialize(&document()).unwrap();
        assert_eq!(bytes.last(), Some(&b'\n'));

        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["schemaVersion"], "1.0");
        assert_eq!(value["creationDate"], "2024-03-01T12:30:00Z");
        assert_eq!(value["body"]["subscriptionID"], "sub-1");
        assert_eq!(value["body"]["objectEvents"].as_array().unwrap().len(), 2);
        assert!(value["body"].get("aggregationEvents").is_none());
    }

    #[test]
    fn test_deterministic_output() {
        let serializer = JsonResultSerializer::pretty();
        let first = serializer.serialize(&document()).unwrap();
        let second = serializer.serialize(&document()).unwrap();
        assert_eq!(first, second);
    }
}
