use sqlx::PgPool;
use uuid::Uuid;

/// Write a dead-lettered event with enough context to diagnose and replay.
pub async fn insert(
    pool: &PgPool,
    event_id: Option<Uuid>,
    subject: &str,
    envelope: Option<serde_json::Value>,
    error: &str,
    retry_count: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO failed_events (event_id, subject, envelope, error, retry_count)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(event_id)
    .bind(subject)
    .bind(envelope)
    .bind(error)
    .bind(retry_count)
    .execute(pool)
    .await?;

    Ok(())
}
