//! Order event consumer for the storefront.
//!
//! Binds one subscription to the shared order fanout and routes by event
//! type: status and detail updates are applied to the local order record,
//! self-originated events are skipped. A message is considered handled only
//! when its handler succeeds; transient failures get bounded retries and
//! everything else lands in the dead letter table.

use event_bus::consumer_retry::{retry_with_backoff_if, RetryConfig};
use event_bus::{BusMessage, EventBus};
use futures::StreamExt;
use interaction_log::{InteractionLogger, InteractionStatus};
use order_contracts::{decode_event, subjects, OrderEventBody};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::Instrument;

use crate::services::order_service::{self, OrderError};
use crate::SERVICE_NAME;

/// Start the background consumer task.
pub async fn start_status_consumer(
    bus: Arc<dyn EventBus>,
    pool: PgPool,
    logger: Arc<InteractionLogger>,
) {
    tokio::spawn(async move {
        tracing::info!("Starting storefront order event consumer");

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
                    // Poison message: drop, never retry.
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

            let span = tracing::info_span!(
                "apply_order_event",
                event_id = %envelope.event_id,
                subject = %msg.subject,
                event_type = %envelope.payload.event_type(),
                source_system = %envelope.source_system,
                version = envelope.version
            );

            async {
                let pool_clone = pool.clone();
                let envelope_clone = envelope.clone();

                let result = retry_with_backoff_if(
                    || {
                        let pool = pool_clone.clone();
                        let envelope = envelope_clone.clone();
                        async move { handle_event(&pool, &envelope).await }
                    },
                    &retry_config,
                    "storefront_order_consumer",
                    |e| e.is_retriable(),
                )
                .await;

                match result {
                    Ok(()) => {
                        logger
                            .log_interaction(
                                &envelope.source_system,
                                "consume",
                                serde_json::json!({
                                    "event_id": envelope.event_id,
                                    "event_type": envelope.payload.event_type(),
                                    "order_id": envelope.payload.order_id(),
                                }),
                                InteractionStatus::Success,
                                None,
                            )
                            .await;
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
                                    "event_type": envelope.payload.event_type(),
                                    "order_id": envelope.payload.order_id(),
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

        tracing::warn!("Storefront order event consumer stopped");
    });
}

#[derive(Debug, thiserror::Error)]
enum ProcessingError {
    #[error("{0}")]
    Fatal(String),

    #[error("{0}")]
    Retriable(String),
}

impl ProcessingError {
    fn is_retriable(&self) -> bool {
        matches!(self, ProcessingError::Retriable(_))
    }
}

async fn handle_event(
    pool: &PgPool,
    envelope: &order_contracts::OrderEnvelope,
) -> Result<(), ProcessingError> {
    let result = match &envelope.payload {
        // The storefront originates order_created itself; one arriving from
        // elsewhere has no local handler and is ignored.
        OrderEventBody::OrderCreated(p) => {
            tracing::debug!(order_id = %p.order_id, "No local handler for order_created");
            return Ok(());
        }
        OrderEventBody::StatusChanged(p) => {
            order_service::apply_status_change(
                pool,
                envelope.event_id,
                &p.order_id,
                p.status,
                p.shipping_date,
                envelope.version,
            )
            .await
        }
        OrderEventBody::OrderUpdated(p) => {
            order_service::apply_order_update(
                pool,
                envelope.event_id,
                &p.order_id,
                p.quantity,
                p.shipping_date,
                envelope.version,
            )
            .await
        }
    };

    match result {
        Ok(outcome) => {
            tracing::debug!(?outcome, "Event applied");
            Ok(())
        }
        Err(OrderError::DuplicateEvent(event_id)) => {
            tracing::info!(
                event_id = %event_id,
                "Duplicate event ignored (already processed)"
            );
            Ok(())
        }
        Err(e @ OrderError::NotFound(_)) => Err(ProcessingError::Fatal(e.to_string())),
        Err(e @ OrderError::UnknownProduct(_)) => Err(ProcessingError::Fatal(e.to_string())),
        Err(OrderError::Database(e)) => Err(ProcessingError::Retriable(e.to_string())),
    }
}
