//! REST ingestion and query endpoints for the interaction log.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use interaction_log::LogEntry;
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;

use crate::repos::log_repo::{self, LogStats};

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 10_000;

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    pub limit: Option<i64>,
    pub source_system: Option<String>,
    pub target_system: Option<String>,
    pub interaction_type: Option<String>,
}

/// Handler for POST /logs — the REST tier of the interaction logger.
pub async fn create_log_entry(
    State(pool): State<Arc<PgPool>>,
    Json(entry): Json<LogEntry>,
) -> Result<(StatusCode, Json<serde_json::Value>), StatusCode> {
    log_repo::insert(&pool, &entry).await.map_err(|e| {
        tracing::error!(error = %e, "Log entry insert failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "status": "success" })),
    ))
}

/// Handler for GET /logs — most recent first, with optional filters.
pub async fn get_logs(
    State(pool): State<Arc<PgPool>>,
    Query(params): Query<LogQuery>,
) -> Result<Json<Vec<LogEntry>>, StatusCode> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let rows = log_repo::query(
        &pool,
        limit,
        params.source_system.as_deref(),
        params.target_system.as_deref(),
        params.interaction_type.as_deref(),
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Log query failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(rows.into_iter().map(LogEntry::from).collect()))
}

/// Handler for GET /logs/stats
pub async fn get_log_stats(
    State(pool): State<Arc<PgPool>>,
) -> Result<Json<LogStats>, StatusCode> {
    let stats = log_repo::stats(&pool).await.map_err(|e| {
        tracing::error!(error = %e, "Log stats query failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(stats))
}
