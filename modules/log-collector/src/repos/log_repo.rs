use chrono::{DateTime, Utc};
use interaction_log::{InteractionStatus, LogEntry};
use sqlx::PgPool;
use std::collections::BTreeMap;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LogRow {
    pub logged_at: DateTime<Utc>,
    pub source_system: String,
    pub target_system: String,
    pub interaction_type: String,
    pub message: serde_json::Value,
    pub status: String,
    pub error_message: Option<String>,
}

impl From<LogRow> for LogEntry {
    fn from(row: LogRow) -> Self {
        let status = match row.status.as_str() {
            "error" => InteractionStatus::Error,
            _ => InteractionStatus::Success,
        };
        LogEntry {
            timestamp: row.logged_at,
            source_system: row.source_system,
            target_system: row.target_system,
            interaction_type: row.interaction_type,
            message: row.message,
            status,
            error_message: row.error_message,
        }
    }
}

pub async fn insert(pool: &PgPool, entry: &LogEntry) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO interaction_logs
            (logged_at, source_system, target_system, interaction_type,
             message, status, error_message)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(entry.timestamp)
    .bind(&entry.source_system)
    .bind(&entry.target_system)
    .bind(&entry.interaction_type)
    .bind(&entry.message)
    .bind(entry.status.as_str())
    .bind(&entry.error_message)
    .execute(pool)
    .await?;

    Ok(())
}

/// Filtered query, most recent first.
pub async fn query(
    pool: &PgPool,
    limit: i64,
    source_system: Option<&str>,
    target_system: Option<&str>,
    interaction_type: Option<&str>,
) -> Result<Vec<LogRow>, sqlx::Error> {
    sqlx::query_as::<_, LogRow>(
        r#"
        SELECT logged_at, source_system, target_system, interaction_type,
               message, status, error_message
        FROM interaction_logs
        WHERE ($2::text IS NULL OR source_system = $2)
          AND ($3::text IS NULL OR target_system = $3)
          AND ($4::text IS NULL OR interaction_type = $4)
        ORDER BY logged_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .bind(source_system)
    .bind(target_system)
    .bind(interaction_type)
    .fetch_all(pool)
    .await
}

/// Aggregate counts over the whole log.
#[derive(Debug, serde::Serialize)]
pub struct LogStats {
    pub total_interactions: i64,
    pub by_source: BTreeMap<String, i64>,
    pub by_target: BTreeMap<String, i64>,
    pub by_type: BTreeMap<String, i64>,
    pub by_status: BTreeMap<String, i64>,
    pub latest_timestamp: Option<DateTime<Utc>>,
}

async fn counts_by(pool: &PgPool, column: &str) -> Result<BTreeMap<String, i64>, sqlx::Error> {
    // `column` is one of our own identifiers, never user input.
    let rows: Vec<(String, i64)> = sqlx::query_as(&format!(
        "SELECT {column}, COUNT(*) FROM interaction_logs GROUP BY {column}"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().collect())
}

pub async fn stats(pool: &PgPool) -> Result<LogStats, sqlx::Error> {
    let total_interactions: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM interaction_logs")
            .fetch_one(pool)
            .await?;

    let latest_timestamp: Option<DateTime<Utc>> =
        sqlx::query_scalar("SELECT MAX(logged_at) FROM interaction_logs")
            .fetch_one(pool)
            .await?;

    Ok(LogStats {
        total_interactions,
        by_source: counts_by(pool, "source_system").await?,
        by_target: counts_by(pool, "target_system").await?,
        by_type: counts_by(pool, "interaction_type").await?,
        by_status: counts_by(pool, "status").await?,
        latest_timestamp,
    })
}
