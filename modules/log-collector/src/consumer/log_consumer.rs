//! Bus tier of the interaction log: consumes entries published by the
//! service-side loggers and persists them.
//!
//! This consumer has no dead letter table — its storage IS the log. An
//! entry that cannot be persisted after retries is traced and dropped;
//! the logging side-channel is best-effort by contract.

use event_bus::consumer_retry::{retry_with_backoff, RetryConfig};
use event_bus::EventBus;
use futures::StreamExt;
use interaction_log::LogEntry;
use order_contracts::subjects;
use sqlx::PgPool;
use std::sync::Arc;

use crate::repos::log_repo;

/// Start the background consumer task.
pub async fn start_log_consumer(bus: Arc<dyn EventBus>, pool: PgPool) {
    tokio::spawn(async move {
        tracing::info!("Starting interaction log consumer");

        let subject = subjects::INTERACTION_LOGS;
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
            let entry: LogEntry = match serde_json::from_slice(&msg.payload) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::error!(
                        subject = %msg.subject,
                        error = %e,
                        "Dropping undecodable log entry"
                    );
                    continue;
                }
            };

            let result = retry_with_backoff(
                || {
                    let pool = pool.clone();
                    let entry = entry.clone();
                    async move { log_repo::insert(&pool, &entry).await }
                },
                &retry_config,
                "log_collector_consumer",
            )
            .await;

            match result {
                Ok(()) => {
                    tracing::debug!(
                        source_system = %entry.source_system,
                        target_system = %entry.target_system,
                        interaction_type = %entry.interaction_type,
                        "Interaction log entry stored"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        source_system = %entry.source_system,
                        error = %e,
                        "Failed to store interaction log entry, dropped"
                    );
                }
            }
        }

        tracing::warn!("Interaction log consumer stopped");
    });
}
