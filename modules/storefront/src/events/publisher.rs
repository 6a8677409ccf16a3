//! Fire-and-forget publication of order lifecycle events.
//!
//! A publish failure never rolls back or fails the local operation that
//! triggered it; it is traced and mirrored to the interaction log, and the
//! missing propagation becomes visible there.

use event_bus::{EventBus, EventEnvelope};
use interaction_log::{InteractionLogger, InteractionStatus};
use order_contracts::{encode_event, OrderCreatedV1, OrderEventBody, OrderStatus};
use std::sync::Arc;

use crate::repos::order_repo::OrderRow;
use crate::SERVICE_NAME;

pub struct OrderEventPublisher {
    bus: Arc<dyn EventBus>,
    logger: Arc<InteractionLogger>,
}

impl OrderEventPublisher {
    pub fn new(bus: Arc<dyn EventBus>, logger: Arc<InteractionLogger>) -> Self {
        Self { bus, logger }
    }

    /// Announce a freshly created order to the fanout subject.
    pub async fn publish_order_created(&self, order: &OrderRow) {
        let status = order
            .status
            .parse::<OrderStatus>()
            .unwrap_or(OrderStatus::Processing);

        let body = OrderEventBody::OrderCreated(OrderCreatedV1 {
            order_id: order.order_id.clone(),
            customer_id: order.customer_id.clone(),
            product_id: order.product_id.clone(),
            quantity: order.quantity,
            order_date: order.order_date,
            order_amount: order.order_amount,
            order_status: status,
        });
        let envelope = EventEnvelope::new(SERVICE_NAME, order.status_version, body);

        let subject = envelope.payload.subject();
        let payload = match encode_event(&envelope) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(
                    order_id = %order.order_id,
                    error = %e,
                    "Failed to encode order_created event"
                );
                return;
            }
        };

        match self.bus.publish(subject, payload).await {
            Ok(()) => {
                tracing::info!(
                    event_id = %envelope.event_id,
                    order_id = %order.order_id,
                    subject = %subject,
                    "Published order_created event"
                );
                self.logger
                    .log_interaction(
                        "fulfillment",
                        "publish",
                        serde_json::json!({
                            "event_id": envelope.event_id,
                            "event_type": "order_created",
                            "order_id": &order.order_id,
                            "subject": subject,
                        }),
                        InteractionStatus::Success,
                        None,
                    )
                    .await;
            }
            Err(e) => {
                tracing::error!(
                    event_id = %envelope.event_id,
                    order_id = %order.order_id,
                    subject = %subject,
                    error = %e,
                    "Failed to publish order_created event"
                );
                self.logger
                    .log_interaction(
                        "fulfillment",
                        "publish",
                        serde_json::json!({
                            "event_id": envelope.event_id,
                            "event_type": "order_created",
                            "order_id": &order.order_id,
                            "subject": subject,
                        }),
                        InteractionStatus::Error,
                        Some(e.to_string()),
                    )
                    .await;
            }
        }
    }
}
