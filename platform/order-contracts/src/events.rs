//! Typed order event payloads and the JSON codec.

use crate::status::OrderStatus;
use chrono::NaiveDate;
use event_bus::EventEnvelope;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payload of an `order_created` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreatedV1 {
    pub order_id: String,
    pub customer_id: String,
    pub product_id: String,
    pub quantity: i32,
    pub order_date: NaiveDate,
    pub order_amount: Decimal,
    pub order_status: OrderStatus,
}

/// Payload of an `order_updated` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderUpdatedV1 {
    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub quantity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub shipping_date: Option<NaiveDate>,
}

/// Payload of a `status_changed` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChangedV1 {
    pub order_id: String,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub shipping_date: Option<NaiveDate>,
}

/// One variant per event type.
///
/// The tag pair (`event_type`, `payload`) lands at the top level of the
/// envelope document, so a consumer can route on `event_type` while the
/// codec enforces the matching payload shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "payload", rename_all = "snake_case")]
pub enum OrderEventBody {
    OrderCreated(OrderCreatedV1),
    OrderUpdated(OrderUpdatedV1),
    StatusChanged(StatusChangedV1),
}

impl OrderEventBody {
    /// Wire name of this event type.
    pub const fn event_type(&self) -> &'static str {
        match self {
            OrderEventBody::OrderCreated(_) => "order_created",
            OrderEventBody::OrderUpdated(_) => "order_updated",
            OrderEventBody::StatusChanged(_) => "status_changed",
        }
    }

    /// The order this event is about.
    pub fn order_id(&self) -> &str {
        match self {
            OrderEventBody::OrderCreated(p) => &p.order_id,
            OrderEventBody::OrderUpdated(p) => &p.order_id,
            OrderEventBody::StatusChanged(p) => &p.order_id,
        }
    }

    /// Fanout subject this event is published to.
    pub const fn subject(&self) -> &'static str {
        match self {
            OrderEventBody::OrderCreated(_) => crate::subjects::ORDER_CREATED,
            OrderEventBody::OrderUpdated(_) => crate::subjects::ORDER_UPDATED,
            OrderEventBody::StatusChanged(_) => crate::subjects::ORDER_STATUS_CHANGED,
        }
    }
}

/// The envelope every service publishes and consumes.
pub type OrderEnvelope = EventEnvelope<OrderEventBody>;

/// Decoding failure: malformed JSON, a missing required field, or a payload
/// that does not match the declared `event_type`.
#[derive(Debug, thiserror::Error)]
#[error("malformed order event: {0}")]
pub struct DecodeError(String);

/// Serialize an envelope to its wire form.
pub fn encode_event(envelope: &OrderEnvelope) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(envelope)
}

/// Parse an envelope from its wire form.
///
/// Unknown extra fields are ignored; required fields and payload shape are
/// enforced. A failure here means the message is poison and must be dropped,
/// never retried.
pub fn decode_event(bytes: &[u8]) -> Result<OrderEnvelope, DecodeError> {
    serde_json::from_slice(bytes).map_err(|e| DecodeError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn created_body() -> OrderEventBody {
        OrderEventBody::OrderCreated(OrderCreatedV1 {
            order_id: "abc123".to_string(),
            customer_id: "cust1".to_string(),
            product_id: "PROD001".to_string(),
            quantity: 5,
            order_date: NaiveDate::from_ymd_opt(2025, 11, 3).unwrap(),
            order_amount: Decimal::from_str("5999.95").unwrap(),
            order_status: OrderStatus::Processing,
        })
    }

    #[test]
    fn encode_decode_round_trips() {
        let envelope = OrderEnvelope::new("storefront", 1, created_body());
        let bytes = encode_event(&envelope).unwrap();
        let decoded = decode_event(&bytes).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn decode_is_field_order_independent() {
        let doc = r#"{
            "version": 2,
            "event_type": "status_changed",
            "payload": {"status": "Shipped", "order_id": "abc123"},
            "occurred_at": "2025-11-03T10:15:00Z",
            "source_system": "fulfillment",
            "event_id": "550e8400-e29b-41d4-a716-446655440000"
        }"#;

        let envelope = decode_event(doc.as_bytes()).unwrap();
        assert_eq!(envelope.version, 2);
        match &envelope.payload {
            OrderEventBody::StatusChanged(p) => {
                assert_eq!(p.order_id, "abc123");
                assert_eq!(p.status, OrderStatus::Shipped);
                assert_eq!(p.shipping_date, None);
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn decode_tolerates_unknown_payload_fields() {
        let doc = r#"{
            "event_id": "550e8400-e29b-41d4-a716-446655440000",
            "occurred_at": "2025-11-03T10:15:00Z",
            "source_system": "fulfillment",
            "version": 3,
            "event_type": "status_changed",
            "payload": {"order_id": "abc123", "status": 2, "carrier": "DHL", "tracking_ref": "X9"}
        }"#;

        let envelope = decode_event(doc.as_bytes()).unwrap();
        match &envelope.payload {
            OrderEventBody::StatusChanged(p) => assert_eq!(p.status, OrderStatus::Shipped),
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn decode_rejects_missing_required_field() {
        // status_changed without an order_id
        let doc = r#"{
            "event_id": "550e8400-e29b-41d4-a716-446655440000",
            "occurred_at": "2025-11-03T10:15:00Z",
            "source_system": "fulfillment",
            "version": 1,
            "event_type": "status_changed",
            "payload": {"status": "Shipped"}
        }"#;

        assert!(decode_event(doc.as_bytes()).is_err());
    }

    #[test]
    fn decode_rejects_payload_shape_mismatch() {
        // order_created carrying a status_changed payload
        let doc = r#"{
            "event_id": "550e8400-e29b-41d4-a716-446655440000",
            "occurred_at": "2025-11-03T10:15:00Z",
            "source_system": "storefront",
            "version": 1,
            "event_type": "order_created",
            "payload": {"order_id": "abc123", "status": "Shipped"}
        }"#;

        assert!(decode_event(doc.as_bytes()).is_err());
    }

    #[test]
    fn decode_rejects_unknown_event_type() {
        let doc = r#"{
            "event_id": "550e8400-e29b-41d4-a716-446655440000",
            "occurred_at": "2025-11-03T10:15:00Z",
            "source_system": "storefront",
            "version": 1,
            "event_type": "order_archived",
            "payload": {"order_id": "abc123"}
        }"#;

        assert!(decode_event(doc.as_bytes()).is_err());
    }

    #[test]
    fn order_amount_accepts_string_form() {
        let doc = r#"{
            "event_id": "550e8400-e29b-41d4-a716-446655440000",
            "occurred_at": "2025-11-03T10:15:00Z",
            "source_system": "storefront",
            "version": 1,
            "event_type": "order_created",
            "payload": {
                "order_id": "abc123",
                "customer_id": "cust1",
                "product_id": "PROD001",
                "quantity": 5,
                "order_date": "2025-11-03",
                "order_amount": "5999.95",
                "order_status": 0
            }
        }"#;

        let envelope = decode_event(doc.as_bytes()).unwrap();
        match &envelope.payload {
            OrderEventBody::OrderCreated(p) => {
                assert_eq!(p.order_amount, Decimal::from_str("5999.95").unwrap());
                assert_eq!(p.order_status, OrderStatus::Processing);
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn body_accessors_match_variants() {
        let body = created_body();
        assert_eq!(body.event_type(), "order_created");
        assert_eq!(body.order_id(), "abc123");
        assert_eq!(body.subject(), crate::subjects::ORDER_CREATED);
    }
}
