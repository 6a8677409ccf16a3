//! # Event Envelope
//!
//! Envelope wrapping every event published across service boundaries.
//!
//! ## Fields
//!
//! - `event_id`: unique identifier, the idempotency key for consumers
//! - `occurred_at`: producer-clock timestamp
//! - `source_system`: logical name of the producing service
//! - `target_system`: optional logical addressee (fanout events leave it unset)
//! - `version`: per-aggregate monotonic version assigned by the producer;
//!   appliers reject anything not newer than what they already hold, which
//!   makes delivery order irrelevant to final state
//! - `payload`: event-specific body (generic type parameter)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Standard envelope for all inter-service events.
///
/// The payload type is flattened into the envelope on the wire, so a tagged
/// enum payload contributes its own `event_type`/`payload` keys at the top
/// level of the JSON document.
///
/// # Examples
///
/// ```rust
/// use event_bus::EventEnvelope;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct StatusChanged {
///     order_id: String,
///     status: String,
/// }
///
/// let envelope = EventEnvelope::new(
///     "fulfillment",
///     2,
///     StatusChanged {
///         order_id: "ord_123".to_string(),
///         status: "Shipped".to_string(),
///     },
/// );
/// assert_eq!(envelope.version, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<T> {
    /// Unique event identifier (idempotency key)
    pub event_id: Uuid,

    /// Timestamp when the event was generated, producer clock
    pub occurred_at: DateTime<Utc>,

    /// Service that generated the event (e.g. "storefront", "fulfillment")
    pub source_system: String,

    /// Optional addressee; unset for fanout events
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target_system: Option<String>,

    /// Producer-assigned monotonic version of the affected aggregate
    pub version: i64,

    /// Event-specific body, flattened into the envelope document
    #[serde(flatten)]
    pub payload: T,
}

impl<T> EventEnvelope<T> {
    /// Create a new envelope with a fresh `event_id` and `occurred_at = now`.
    pub fn new(source_system: &str, version: i64, payload: T) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            source_system: source_system.to_string(),
            target_system: None,
            version,
            payload,
        }
    }

    /// Create an envelope with an explicit `event_id` (useful for tests and
    /// for replaying a previously built event).
    pub fn with_event_id(event_id: Uuid, source_system: &str, version: i64, payload: T) -> Self {
        Self {
            event_id,
            occurred_at: Utc::now(),
            source_system: source_system.to_string(),
            target_system: None,
            version,
            payload,
        }
    }

    /// Set the target system.
    pub fn with_target_system(mut self, target_system: &str) -> Self {
        self.target_system = Some(target_system.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Body {
        order_id: String,
    }

    #[test]
    fn envelope_creation_defaults() {
        let envelope = EventEnvelope::new(
            "storefront",
            1,
            Body {
                order_id: "ord_1".to_string(),
            },
        );

        assert_eq!(envelope.source_system, "storefront");
        assert_eq!(envelope.version, 1);
        assert!(envelope.target_system.is_none());
    }

    #[test]
    fn payload_is_flattened_on_the_wire() {
        let envelope = EventEnvelope::new(
            "storefront",
            1,
            Body {
                order_id: "ord_1".to_string(),
            },
        );

        let value = serde_json::to_value(&envelope).unwrap();
        // order_id sits at the top level, not under a "payload" key of its own
        assert_eq!(value["order_id"], "ord_1");
        assert_eq!(value["source_system"], "storefront");
    }

    #[test]
    fn target_system_omitted_when_unset() {
        let envelope = EventEnvelope::new(
            "crm",
            1,
            Body {
                order_id: "ord_2".to_string(),
            },
        );
        let value = serde_json::to_value(&envelope).unwrap();
        assert!(value.get("target_system").is_none());

        let addressed = EventEnvelope::new(
            "crm",
            1,
            Body {
                order_id: "ord_2".to_string(),
            },
        )
        .with_target_system("fulfillment");
        let value = serde_json::to_value(&addressed).unwrap();
        assert_eq!(value["target_system"], "fulfillment");
    }
}
