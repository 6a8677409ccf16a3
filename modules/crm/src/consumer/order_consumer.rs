//! Order event consumer for the CRM projection.
//!
//! One subscription to the order fanout, dispatched by event type: creation
//! events project a customer order, status and detail events mutate it
//! under the version guard.

use event_bus::consumer_retry::{retry_with_backoff_if, RetryConfig};
use event_bus::EventBus;
use futures::StreamExt;
use interaction_log::{InteractionLogger, InteractionStatus};
use order_contracts::{decode_event, subjects, OrderEnvelope, OrderEventBody};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::Instrument;

use crate::services::crm_service::{self, CrmError};
use crate::SERVICE_NAME;

/// Start the background consumer task.
pub async fn start_order_consumer(
    bus: Arc<dyn EventBus>,
    pool: PgPool,
    logger: Arc<InteractionLogger>,
) {
    tokio::spawn(async move {
        tracing::info!("Starting CRM order event consumer");

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
                continue;
            }

            let span = tracing::info_span!(
                "project_order_event",
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
                    "crm_order_consumer",
                    |e| matches!(e, CrmError::Database(_)),
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

        tracing::warn!("CRM order event consumer stopped");
    });
}

async fn handle_event(pool: &PgPool, envelope: &OrderEnvelope) -> Result<(), CrmError> {
    let result = match &envelope.payload {
        OrderEventBody::OrderCreated(p) => {
            crm_service::apply_order_created(pool, envelope.event_id, p, envelope.version).await
        }
        OrderEventBody::StatusChanged(p) => {
            crm_service::apply_status_change(
                pool,
                envelope.event_id,
                &p.order_id,
                p.status,
                envelope.version,
            )
            .await
        }
        OrderEventBody::OrderUpdated(p) => {
            crm_service::apply_order_update(
                pool,
                envelope.event_id,
                &p.order_id,
                p.quantity,
                envelope.version,
            )
            .await
        }
    };

    match result {
        Ok(outcome) => {
            tracing::debug!(?outcome, "Event projected");
            Ok(())
        }
        Err(CrmError::DuplicateEvent(event_id)) => {
            tracing::info!(
                event_id = %event_id,
                "Duplicate event ignored (already processed)"
            );
            Ok(())
        }
        Err(e) => Err(e),
    }
}
