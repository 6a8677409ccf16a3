//! Republishes status transitions to the fanout subject.
//!
//! Most call sites are fire-and-forget; the one exception is the
//! `UpdateOrderStatus` RPC, whose contract surfaces a publish failure to
//! the caller, so the fallible variant is public too.

use chrono::NaiveDate;
use event_bus::{BusError, EventBus, EventEnvelope};
use interaction_log::{InteractionLogger, InteractionStatus};
use order_contracts::{encode_event, OrderEventBody, OrderStatus, StatusChangedV1};
use std::sync::Arc;

use crate::SERVICE_NAME;

pub struct StatusPublisher {
    bus: Arc<dyn EventBus>,
    logger: Arc<InteractionLogger>,
}

impl StatusPublisher {
    pub fn new(bus: Arc<dyn EventBus>, logger: Arc<InteractionLogger>) -> Self {
        Self { bus, logger }
    }

    /// Publish a `status_changed` event, reporting the outcome.
    pub async fn publish_status_changed(
        &self,
        order_id: &str,
        status: OrderStatus,
        shipping_date: Option<NaiveDate>,
        version: i64,
    ) -> Result<(), BusError> {
        let body = OrderEventBody::StatusChanged(StatusChangedV1 {
            order_id: order_id.to_string(),
            status,
            shipping_date,
        });
        let envelope = EventEnvelope::new(SERVICE_NAME, version, body);
        let subject = envelope.payload.subject();

        let payload = encode_event(&envelope)
            .map_err(|e| BusError::SerializationError(e.to_string()))?;

        let result = self.bus.publish(subject, payload).await;

        let (interaction_status, error_message) = match &result {
            Ok(()) => {
                tracing::info!(
                    event_id = %envelope.event_id,
                    order_id = %order_id,
                    status = %status,
                    version,
                    "Published status_changed event"
                );
                (InteractionStatus::Success, None)
            }
            Err(e) => {
                tracing::error!(
                    event_id = %envelope.event_id,
                    order_id = %order_id,
                    error = %e,
                    "Failed to publish status_changed event"
                );
                (InteractionStatus::Error, Some(e.to_string()))
            }
        };

        self.logger
            .log_interaction(
                "storefront",
                "publish",
                serde_json::json!({
                    "event_id": envelope.event_id,
                    "event_type": "status_changed",
                    "order_id": order_id,
                    "status": status.as_str(),
                    "version": version,
                }),
                interaction_status,
                error_message,
            )
            .await;

        result
    }

    /// Fire-and-forget variant for call sites where the triggering operation
    /// must not observe a publish failure.
    pub async fn publish_status_changed_best_effort(
        &self,
        order_id: &str,
        status: OrderStatus,
        shipping_date: Option<NaiveDate>,
        version: i64,
    ) {
        // Failure is already traced and interaction-logged.
        let _ = self
            .publish_status_changed(order_id, status, shipping_date, version)
            .await;
    }
}
