//! # EventBus Abstraction
//!
//! Shared transport layer for order lifecycle events. Every service publishes
//! state transitions to a fanout subject and binds its own independent
//! subscription, so a slow or crashed consumer never blocks the others.
//!
//! ## Implementations
//!
//! - **NatsBus**: production implementation over a NATS connection
//! - **InMemoryBus**: tokio-broadcast implementation for tests and local dev
//!
//! Which one a service uses is config-driven (`BUS_TYPE`), so the same
//! consumer and publisher code runs against either.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use event_bus::{connect_with_retry, EventBus, NatsBus};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Blocks until the broker is reachable (fixed 5s backoff).
//! let client = connect_with_retry("nats://localhost:4222").await;
//! let bus: Arc<dyn EventBus> = Arc::new(NatsBus::new(client));
//!
//! bus.publish("orders.events.created", b"{}".to_vec()).await?;
//!
//! let mut stream = bus.subscribe("orders.events.>").await?;
//! while let Some(msg) = futures::StreamExt::next(&mut stream).await {
//!     println!("{} bytes on {}", msg.payload.len(), msg.subject);
//! }
//! # Ok(())
//! # }
//! ```

pub mod consumer_retry;
mod envelope;
mod inmemory_bus;
mod nats_bus;

pub use envelope::EventEnvelope;
pub use inmemory_bus::InMemoryBus;
pub use nats_bus::NatsBus;

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::fmt;
use std::time::Duration;

/// Fixed delay between connection attempts while the broker is unreachable.
pub const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// A message received from the event bus
#[derive(Debug, Clone)]
pub struct BusMessage {
    /// The subject this message was published to
    pub subject: String,
    /// The message payload (raw bytes)
    pub payload: Vec<u8>,
    /// Optional headers
    pub headers: Option<std::collections::HashMap<String, String>>,
    /// Optional reply-to subject (request-response patterns)
    pub reply_to: Option<String>,
}

impl BusMessage {
    pub fn new(subject: String, payload: Vec<u8>) -> Self {
        Self {
            subject,
            payload,
            headers: None,
            reply_to: None,
        }
    }

    pub fn with_headers(mut self, headers: std::collections::HashMap<String, String>) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_reply_to(mut self, reply_to: String) -> Self {
        self.reply_to = Some(reply_to);
        self
    }
}

/// Errors that can occur when using the event bus
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("failed to publish message: {0}")]
    PublishError(String),

    #[error("failed to subscribe to subject: {0}")]
    SubscribeError(String),

    #[error("connection error: {0}")]
    ConnectionError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("invalid subject pattern: {0}")]
    InvalidSubject(String),
}

/// Result type for event bus operations
pub type BusResult<T> = Result<T, BusError>;

/// Core publish-subscribe abstraction.
///
/// Subjects use NATS conventions: dot-separated tokens, `*` matching one
/// token and `>` matching the rest. Every subscription receives every
/// message published to a matching subject (broadcast semantics); there is
/// no competing-consumer distribution at this layer.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish a payload to a subject.
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> BusResult<()>;

    /// Subscribe to messages matching a subject pattern.
    ///
    /// The returned stream suspends between deliveries; it ends only when
    /// the underlying connection is closed for good.
    async fn subscribe(&self, subject: &str) -> BusResult<BoxStream<'static, BusMessage>>;
}

impl fmt::Debug for dyn EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventBus")
    }
}

/// Connect to NATS, retrying every [`CONNECT_RETRY_DELAY`] until the broker
/// answers.
///
/// The loop is deliberately unbounded: the broker is a required dependency
/// and services must not start serving without it. Reconnection after a
/// drop is handled transparently by the returned client.
pub async fn connect_with_retry(url: &str) -> async_nats::Client {
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match async_nats::connect(url).await {
            Ok(client) => {
                if attempt > 1 {
                    tracing::info!(url = %url, attempt, "Connected to NATS after retry");
                }
                return client;
            }
            Err(e) => {
                tracing::warn!(
                    url = %url,
                    attempt,
                    error = %e,
                    retry_in_secs = CONNECT_RETRY_DELAY.as_secs(),
                    "NATS not reachable, retrying"
                );
                tokio::time::sleep(CONNECT_RETRY_DELAY).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_with_retry_keeps_waiting_while_broker_is_down() {
        // Nothing listens on port 9; the loop must neither panic nor give
        // up, so the future simply never resolves within the window.
        let result = tokio::time::timeout(
            std::time::Duration::from_millis(300),
            connect_with_retry("nats://127.0.0.1:9"),
        )
        .await;

        assert!(result.is_err(), "must still be retrying, not resolved");
    }
}
