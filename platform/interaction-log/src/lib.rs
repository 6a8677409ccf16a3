//! # Interaction Log Client
//!
//! Mirrors every cross-service interaction (publish, consume, RPC) to the
//! central collector without ever affecting the interaction itself.
//!
//! Three delivery tiers are tried in order, first success wins:
//!
//! 1. publish a log envelope to [`order_contracts::subjects::INTERACTION_LOGS`]
//! 2. `POST` to the collector's REST endpoint (success == HTTP 201)
//! 3. append a JSON line to a configured local file
//!
//! `log_interaction` reports whether any tier succeeded but never returns an
//! error: business operations must not branch on, or be failed by, logging.
//! For call sites that cannot afford the await, [`InteractionLogger::log_detached`]
//! runs the same pipeline on a spawned task.

use chrono::{DateTime, Utc};
use event_bus::EventBus;
use order_contracts::subjects;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

/// Outcome marker of the logged interaction (not an order status).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionStatus {
    Success,
    Error,
}

impl InteractionStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            InteractionStatus::Success => "success",
            InteractionStatus::Error => "error",
        }
    }
}

/// One interaction log record, the collector's wire and storage shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub source_system: String,
    pub target_system: String,
    pub interaction_type: String,
    pub message: serde_json::Value,
    pub status: InteractionStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_message: Option<String>,
}

/// Best-effort client held by each service.
///
/// All tiers are optional; an unconfigured tier is skipped. With no tier
/// configured every call returns `false`.
pub struct InteractionLogger {
    service_name: String,
    bus: Option<Arc<dyn EventBus>>,
    collector_url: Option<String>,
    http: reqwest::Client,
    fallback_path: Option<PathBuf>,
}

impl InteractionLogger {
    pub fn new(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
            bus: None,
            collector_url: None,
            http: reqwest::Client::new(),
            fallback_path: None,
        }
    }

    /// Enable the bus tier.
    pub fn with_bus(mut self, bus: Arc<dyn EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Enable the REST tier (full URL of the collector's `/logs` endpoint).
    pub fn with_collector_url(mut self, url: &str) -> Self {
        self.collector_url = Some(url.to_string());
        self
    }

    /// Enable the local-file tier.
    pub fn with_fallback_path(mut self, path: PathBuf) -> Self {
        self.fallback_path = Some(path);
        self
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Record one interaction. Returns whether any tier accepted it.
    pub async fn log_interaction(
        &self,
        target_system: &str,
        interaction_type: &str,
        message: serde_json::Value,
        status: InteractionStatus,
        error_message: Option<String>,
    ) -> bool {
        let entry = LogEntry {
            timestamp: Utc::now(),
            source_system: self.service_name.clone(),
            target_system: target_system.to_string(),
            interaction_type: interaction_type.to_string(),
            message,
            status,
            error_message,
        };

        if self.try_bus(&entry).await {
            return true;
        }
        if self.try_rest(&entry).await {
            return true;
        }
        if self.try_file(&entry).await {
            return true;
        }

        tracing::warn!(
            target_system = %entry.target_system,
            interaction_type = %entry.interaction_type,
            "All interaction log tiers unavailable, entry dropped"
        );
        false
    }

    /// Fire-and-forget variant: same pipeline on a spawned task, outcome
    /// only visible in the trace log.
    pub fn log_detached(
        self: &Arc<Self>,
        target_system: &str,
        interaction_type: &str,
        message: serde_json::Value,
        status: InteractionStatus,
        error_message: Option<String>,
    ) {
        let logger = Arc::clone(self);
        let target_system = target_system.to_string();
        let interaction_type = interaction_type.to_string();
        tokio::spawn(async move {
            let delivered = logger
                .log_interaction(
                    &target_system,
                    &interaction_type,
                    message,
                    status,
                    error_message,
                )
                .await;
            tracing::debug!(
                target_system = %target_system,
                interaction_type = %interaction_type,
                delivered,
                "Detached interaction log attempt finished"
            );
        });
    }

    async fn try_bus(&self, entry: &LogEntry) -> bool {
        let Some(bus) = &self.bus else {
            return false;
        };
        let payload = match serde_json::to_vec(entry) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize log entry");
                return false;
            }
        };
        match bus.publish(subjects::INTERACTION_LOGS, payload).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "Bus tier failed, falling back to REST");
                false
            }
        }
    }

    async fn try_rest(&self, entry: &LogEntry) -> bool {
        let Some(url) = &self.collector_url else {
            return false;
        };
        match self.http.post(url).json(entry).send().await {
            Ok(response) if response.status() == reqwest::StatusCode::CREATED => true,
            Ok(response) => {
                tracing::debug!(
                    status = %response.status(),
                    "REST tier rejected log entry, falling back to file"
                );
                false
            }
            Err(e) => {
                tracing::debug!(error = %e, "REST tier unreachable, falling back to file");
                false
            }
        }
    }

    async fn try_file(&self, entry: &LogEntry) -> bool {
        let Some(path) = &self.fallback_path else {
            return false;
        };
        let line = match serde_json::to_string(entry) {
            Ok(l) => l,
            Err(_) => return false,
        };
        let result = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .await?;
            file.write_all(line.as_bytes()).await?;
            file.write_all(b"\n").await?;
            file.flush().await
        }
        .await;

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "File tier failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_bus::InMemoryBus;
    use futures::StreamExt;
    use serde_json::json;

    fn temp_log_path() -> PathBuf {
        std::env::temp_dir().join(format!("interactions-{}.log", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn bus_tier_wins_when_available() {
        let bus = Arc::new(InMemoryBus::new());
        let mut stream = bus.subscribe(subjects::INTERACTION_LOGS).await.unwrap();

        let logger = InteractionLogger::new("storefront").with_bus(bus.clone());

        let delivered = logger
            .log_interaction(
                "fulfillment",
                "publish",
                json!({"order_id": "ord_1"}),
                InteractionStatus::Success,
                None,
            )
            .await;
        assert!(delivered);

        let msg = tokio::time::timeout(std::time::Duration::from_secs(1), stream.next())
            .await
            .expect("timeout")
            .expect("stream ended");
        let entry: LogEntry = serde_json::from_slice(&msg.payload).unwrap();
        assert_eq!(entry.source_system, "storefront");
        assert_eq!(entry.target_system, "fulfillment");
        assert_eq!(entry.status, InteractionStatus::Success);
    }

    #[tokio::test]
    async fn falls_back_to_file_when_bus_and_rest_are_down() {
        let path = temp_log_path();
        // No bus; REST pointed at a closed port.
        let logger = InteractionLogger::new("crm")
            .with_collector_url("http://127.0.0.1:1/logs")
            .with_fallback_path(path.clone());

        let delivered = logger
            .log_interaction(
                "log-collector",
                "consume",
                json!({"order_id": "ord_2"}),
                InteractionStatus::Error,
                Some("handler failed".to_string()),
            )
            .await;
        assert!(delivered);

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let entry: LogEntry = serde_json::from_str(contents.lines().next().unwrap()).unwrap();
        assert_eq!(entry.source_system, "crm");
        assert_eq!(entry.error_message.as_deref(), Some("handler failed"));

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn returns_false_when_every_tier_is_unavailable() {
        let logger = InteractionLogger::new("fulfillment")
            .with_collector_url("http://127.0.0.1:1/logs");

        let delivered = logger
            .log_interaction(
                "storefront",
                "publish",
                json!({}),
                InteractionStatus::Success,
                None,
            )
            .await;
        assert!(!delivered);
    }

    #[tokio::test]
    async fn file_tier_appends_one_line_per_entry() {
        let path = temp_log_path();
        let logger = InteractionLogger::new("storefront").with_fallback_path(path.clone());

        for i in 0..3 {
            let delivered = logger
                .log_interaction(
                    "crm",
                    "publish",
                    json!({"seq": i}),
                    InteractionStatus::Success,
                    None,
                )
                .await;
            assert!(delivered);
        }

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents.lines().count(), 3);

        let _ = tokio::fs::remove_file(&path).await;
    }
}
