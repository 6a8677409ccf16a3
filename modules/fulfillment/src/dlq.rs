//! Dead letter handling for the order consumer.

use event_bus::BusMessage;
use sqlx::PgPool;
use uuid::Uuid;

use crate::repos::failed_repo;

/// Record a permanently failed event in the dead letter table.
///
/// Extraction is lenient: even a structurally broken envelope is stored
/// (without an event_id) so nothing disappears without a trace.
pub async fn record_failure(pool: &PgPool, msg: &BusMessage, error: &str, retry_count: u32) {
    let envelope: Option<serde_json::Value> = serde_json::from_slice(&msg.payload).ok();
    let event_id = envelope
        .as_ref()
        .and_then(|v| v.get("event_id"))
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok());

    match failed_repo::insert(pool, event_id, &msg.subject, envelope, error, retry_count as i32)
        .await
    {
        Ok(()) => {
            tracing::error!(
                event_id = ?event_id,
                subject = %msg.subject,
                retry_count,
                error = %error,
                "Event moved to dead letter table"
            );
        }
        Err(db_err) => {
            tracing::error!(
                event_id = ?event_id,
                subject = %msg.subject,
                error = %error,
                dlq_error = %db_err,
                "Failed to record dead letter, event may be lost!"
            );
        }
    }
}
