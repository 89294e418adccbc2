//! Wire codec for events crossing the broker.
//!
//! Events travel as JSON [`Envelope`]s. Encode runs on the publish path;
//! decode runs inside the listener loop, where a [`BusError::Decode`] is
//! logged and the message dropped rather than killing the loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::event::{Event, EventData};
use crate::error::BusError;

/// Transport envelope wrapping one event on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Server-generated message ID for log correlation.
    pub id: String,
    /// Declared event type name; normally matches the channel it travels on.
    pub event_type: String,
    /// Publish timestamp.
    pub timestamp: DateTime<Utc>,
    /// Named event fields.
    pub fields: Map<String, Value>,
}

impl Envelope {
    /// Consumes the envelope, yielding the field mapping handlers receive.
    #[must_use]
    pub fn into_data(self) -> EventData {
        EventData::new(self.fields)
    }
}

/// Serializes `event` into a JSON envelope string.
///
/// # Errors
///
/// Returns [`BusError::Encode`] when the event does not serialize to a
/// mapping of named fields (e.g. a bare sequence or scalar).
pub fn encode<E: Event>(event: &E) -> Result<String, BusError> {
    let encode_err = |reason: String| BusError::Encode {
        event_type: E::event_type().to_string(),
        reason,
    };

    let value = serde_json::to_value(event).map_err(|e| encode_err(e.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(encode_err(
            "event must serialize to a mapping of named fields".to_string(),
        ));
    };

    let envelope = Envelope {
        id: uuid::Uuid::new_v4().to_string(),
        event_type: E::event_type().to_string(),
        timestamp: Utc::now(),
        fields,
    };
    serde_json::to_string(&envelope).map_err(|e| encode_err(e.to_string()))
}

/// Parses a raw broker payload back into an [`Envelope`].
///
/// # Errors
///
/// Returns [`BusError::Decode`] when the payload is not a well-formed
/// envelope. Callers on the receive path log this and drop the message.
pub fn decode(channel: &str, payload: &str) -> Result<Envelope, BusError> {
    serde_json::from_str(payload).map_err(|e| BusError::Decode {
        channel: channel.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct OrderPlaced {
        order_id: String,
        total: f64,
        quantity: i64,
        express: bool,
        items: Vec<String>,
        shipping: Shipping,
    }

    #[derive(Serialize)]
    struct Shipping {
        city: String,
        zip: String,
    }

    impl Event for OrderPlaced {
        fn event_type() -> &'static str {
            "OrderPlaced"
        }
    }

    fn sample_order() -> OrderPlaced {
        OrderPlaced {
            order_id: "ORD-1".to_string(),
            total: 69.97,
            quantity: 2,
            express: false,
            items: vec!["P001".to_string(), "P002".to_string()],
            shipping: Shipping {
                city: "Lisbon".to_string(),
                zip: "1000-001".to_string(),
            },
        }
    }

    #[test]
    fn round_trips_all_field_kinds() {
        let Ok(payload) = encode(&sample_order()) else {
            panic!("encode failed");
        };
        let Ok(envelope) = decode("OrderPlaced", &payload) else {
            panic!("decode failed");
        };
        assert_eq!(envelope.event_type, "OrderPlaced");
        assert!(!envelope.id.is_empty());

        let data = envelope.into_data();
        assert_eq!(data.get_str("order_id"), Some("ORD-1"));
        assert_eq!(data.get_f64("total"), Some(69.97));
        assert_eq!(data.get_i64("quantity"), Some(2));
        assert_eq!(data.get_bool("express"), Some(false));
        let Some(items) = data.get("items").and_then(serde_json::Value::as_array) else {
            panic!("items missing");
        };
        assert_eq!(items.len(), 2);
        let Some(shipping) = data.get("shipping").and_then(serde_json::Value::as_object) else {
            panic!("shipping missing");
        };
        assert_eq!(
            shipping.get("city").and_then(serde_json::Value::as_str),
            Some("Lisbon")
        );
    }

    #[test]
    fn decode_rejects_malformed_payload() {
        let result = decode("OrderPlaced", "{not json");
        assert!(matches!(result, Err(BusError::Decode { .. })));
    }

    #[test]
    fn decode_rejects_non_envelope_json() {
        let result = decode("OrderPlaced", r#"{"order_id": "ORD-1"}"#);
        assert!(matches!(result, Err(BusError::Decode { .. })));
    }

    #[test]
    fn decode_rejects_non_object_fields() {
        let payload = r#"{
            "id": "x",
            "event_type": "OrderPlaced",
            "timestamp": "2026-01-01T00:00:00Z",
            "fields": [1, 2, 3]
        }"#;
        let result = decode("OrderPlaced", payload);
        assert!(matches!(result, Err(BusError::Decode { .. })));
    }

    #[test]
    fn encode_rejects_non_mapping_events() {
        #[derive(Serialize)]
        struct Bare(u64);
        impl Event for Bare {
            fn event_type() -> &'static str {
                "Bare"
            }
        }
        let result = encode(&Bare(7));
        assert!(matches!(result, Err(BusError::Encode { .. })));
    }
}
