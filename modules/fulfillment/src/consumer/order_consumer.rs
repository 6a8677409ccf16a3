//! Order event consumer for fulfillment.
//!
//! Applies `order_created` events through the same stock-checked path as
//! the RPC surface, then republishes the resulting status so the other
//! services converge. Fulfillment is the status authority; status events
//! from elsewhere have no local handler here.

use event_bus::consumer_retry::{retry_with_backoff_if, RetryConfig};
use event_bus::EventBus;
use futures::StreamExt;
use interaction_log::{InteractionLogger, InteractionStatus};
use order_contracts::{decode_event, subjects, OrderEventBody};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::Instrument;

use crate::events::status_publisher::StatusPublisher;
use crate::services::order_service::{self, FulfillmentError, IncomingOrder, ProcessedOrder};
use crate::SERVICE_NAME;

/// Start the background consumer task.
pub async fn start_order_consumer(
    bus: Arc<dyn EventBus>,
    pool: PgPool,
    publisher: Arc<StatusPublisher>,
    logger: Arc<InteractionLogger>,
) {
    tokio::spawn(async move {
        tracing::info!("Starting fulfillment order event consumer");

        let subject = subjects::ORDER_EVENTS_ALL;
        let mut stream = match bus.subscribe(subject).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Failed to subscribe to {}: {}", subject, e);
                return;
            }
        };

        tracing::info!("Subscribed to {}", subject);

        let retry_config = RetryConfig::default();

        while let Some(msg) = stream.next().await {
            let envelope = match decode_event(&msg.payload) {
                Ok(envelope) => envelope,
                Err(e) => {
                    tracing::error!(
                        subject = %msg.subject,
                        error = %e,
                        "Dropping undecodable event"
                    );
                    logger
                        .log_interaction(
                            "unknown",
                            "consume",
                            serde_json::json!({ "subject": &msg.subject }),
                            InteractionStatus::Error,
                            Some(e.to_string()),
                        )
                        .await;
                    continue;
                }
            };

            if envelope.source_system == SERVICE_NAME {
                tracing::debug!(
                    event_id = %envelope.event_id,
                    "Skipping self-originated event"
                );
                continue;
            }

            let incoming = match &envelope.payload {
                OrderEventBody::OrderCreated(p) => IncomingOrder {
                    order_id: p.order_id.clone(),
                    customer_id: p.customer_id.clone(),
                    product_id: p.product_id.clone(),
                    quantity: p.quantity,
                },
                other => {
                    tracing::debug!(
                        event_type = %other.event_type(),
                        "No local handler for event type"
                    );
                    continue;
                }
            };

            let span = tracing::info_span!(
                "apply_order_created",
                event_id = %envelope.event_id,
                subject = %msg.subject,
                order_id = %incoming.order_id,
                source_system = %envelope.source_system,
                version = envelope.version
            );

            async {
                let pool_clone = pool.clone();
                let incoming_clone = incoming.clone();
                let event_id = envelope.event_id;

                let result = retry_with_backoff_if(
                    || {
                        let pool = pool_clone.clone();
                        let incoming = incoming_clone.clone();
                        async move {
                            match order_service::apply_order_created(&pool, event_id, incoming)
                                .await
                            {
                                Ok(processed) => Ok(Some(processed)),
                                Err(FulfillmentError::DuplicateEvent(event_id)) => {
                                    tracing::info!(
                                        event_id = %event_id,
                                        "Duplicate event ignored (already processed)"
                                    );
                                    Ok(None)
                                }
                                Err(e) => Err(e),
                            }
                        }
                    },
                    &retry_config,
                    "fulfillment_order_consumer",
                    |e| matches!(e, FulfillmentError::Database(_)),
                )
                .await;

                match result {
                    Ok(processed) => {
                        logger
                            .log_interaction(
                                &envelope.source_system,
                                "consume",
                                serde_json::json!({
                                    "event_id": envelope.event_id,
                                    "event_type": "order_created",
                                    "order_id": &incoming.order_id,
                                }),
                                InteractionStatus::Success,
                                None,
                            )
                            .await;

                        // Derived event: announce the acceptance outcome.
                        if let Some(ProcessedOrder {
                            order_id,
                            status,
                            shipping_date,
                            status_version,
                            newly_created: true,
                        }) = processed
                        {
                            publisher
                                .publish_status_changed_best_effort(
                                    &order_id,
                                    status,
                                    shipping_date,
                                    status_version,
                                )
                                .await;
                        }
                    }
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            retry_count = retry_config.max_attempts,
                            "Event processing failed, sending to dead letter table"
                        );
                        crate::dlq::record_failure(
                            &pool,
                            &msg,
                            &e.to_string(),
                            retry_config.max_attempts,
                        )
                        .await;
                        logger
                            .log_interaction(
                                &envelope.source_system,
                                "consume",
                                serde_json::json!({
                                    "event_id": envelope.event_id,
                                    "event_type": "order_created",
                                    "order_id": &incoming.order_id,
                                }),
                                InteractionStatus::Error,
                                Some(e.to_string()),
                            )
                            .await;
                    }
                }
            }
            .instrument(span)
            .await;
        }

        tracing::warn!("Fulfillment order event consumer stopped");
    });
}
