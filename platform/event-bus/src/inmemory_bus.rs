//! In-memory implementation of the EventBus trait for tests and local dev

use crate::{BusMessage, BusResult, EventBus};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast;

/// EventBus over a tokio broadcast channel.
///
/// Every subscriber gets a copy of every published message whose subject
/// matches its pattern, mirroring the fanout semantics of the NATS bus.
/// Suitable for unit tests, integration tests, and running a service
/// without a broker (`BUS_TYPE=inmemory`).
#[derive(Clone)]
pub struct InMemoryBus {
    sender: Arc<broadcast::Sender<BusMessage>>,
}

impl InMemoryBus {
    /// Create a bus buffering up to 1000 in-flight messages per subscriber.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1000);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create a bus with a custom buffer size. A subscriber that lags past
    /// the buffer loses the oldest messages (and a warning is printed).
    pub fn with_capacity(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// NATS-style subject matching: `*` matches exactly one token, `>`
    /// matches one or more trailing tokens.
    ///
    /// - `orders.events.>` matches `orders.events.status.changed`
    /// - `orders.*.created` matches `orders.events.created`
    /// - `orders.events.*` does NOT match `orders.events.status.changed`
    fn matches_pattern(subject: &str, pattern: &str) -> bool {
        let subject_tokens: Vec<&str> = subject.split('.').collect();
        let pattern_tokens: Vec<&str> = pattern.split('.').collect();

        let mut s_idx = 0;
        let mut p_idx = 0;

        while s_idx < subject_tokens.len() && p_idx < pattern_tokens.len() {
            let pattern_token = pattern_tokens[p_idx];

            if pattern_token == ">" {
                return true;
            } else if pattern_token == "*" || subject_tokens[s_idx] == pattern_token {
                s_idx += 1;
                p_idx += 1;
            } else {
                return false;
            }
        }

        s_idx == subject_tokens.len() && p_idx == pattern_tokens.len()
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for InMemoryBus {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> BusResult<()> {
        let msg = BusMessage::new(subject.to_string(), payload);

        // A send with no receivers is not an error: fanout tolerates absent
        // consumers, their copy is simply dropped.
        let _ = self.sender.send(msg);

        Ok(())
    }

    async fn subscribe(&self, pattern: &str) -> BusResult<BoxStream<'static, BusMessage>> {
        let mut receiver = self.sender.subscribe();
        let pattern = pattern.to_string();

        let stream = async_stream::stream! {
            loop {
                match receiver.recv().await {
                    Ok(msg) => {
                        if Self::matches_pattern(&msg.subject, &pattern) {
                            yield msg;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, pattern = %pattern, "InMemoryBus subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        };

        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn pattern_matching_rules() {
        // Exact
        assert!(InMemoryBus::matches_pattern(
            "orders.events.status.changed",
            "orders.events.status.changed"
        ));

        // Single-token wildcard
        assert!(InMemoryBus::matches_pattern(
            "orders.events.created",
            "orders.*.created"
        ));
        assert!(!InMemoryBus::matches_pattern(
            "orders.events.status.changed",
            "orders.*.changed"
        ));

        // Multi-token wildcard
        assert!(InMemoryBus::matches_pattern(
            "orders.events.status.changed",
            "orders.events.>"
        ));
        assert!(!InMemoryBus::matches_pattern(
            "orders.events.created",
            "platform.>"
        ));

        // Edge cases
        assert!(InMemoryBus::matches_pattern("single", "*"));
        assert!(InMemoryBus::matches_pattern("single", ">"));
        assert!(!InMemoryBus::matches_pattern("one.two", "one"));
    }

    #[tokio::test]
    async fn publish_reaches_matching_subscriber() {
        let bus = InMemoryBus::new();

        let mut stream = bus.subscribe("orders.events.>").await.unwrap();

        let payload = br#"{"order_id":"ord_1"}"#.to_vec();
        bus.publish("orders.events.created", payload.clone())
            .await
            .unwrap();

        let msg = tokio::time::timeout(std::time::Duration::from_secs(1), stream.next())
            .await
            .expect("timeout")
            .expect("stream ended");

        assert_eq!(msg.subject, "orders.events.created");
        assert_eq!(msg.payload, payload);
    }

    #[tokio::test]
    async fn non_matching_subjects_are_filtered() {
        let bus = InMemoryBus::new();

        let mut stream = bus.subscribe("orders.events.status.*").await.unwrap();

        bus.publish("orders.events.status.changed", b"match".to_vec())
            .await
            .unwrap();
        bus.publish("orders.events.created", b"no match".to_vec())
            .await
            .unwrap();
        bus.publish("platform.logs.interaction", b"no match".to_vec())
            .await
            .unwrap();

        let msg = tokio::time::timeout(std::time::Duration::from_millis(100), stream.next())
            .await
            .expect("timeout")
            .expect("stream ended");
        assert_eq!(msg.subject, "orders.events.status.changed");

        let idle =
            tokio::time::timeout(std::time::Duration::from_millis(100), stream.next()).await;
        assert!(idle.is_err(), "should timeout, no more matching messages");
    }

    #[tokio::test]
    async fn every_subscriber_receives_every_message() {
        let bus = InMemoryBus::new();

        // Two services bound to the same fanout subject
        let mut storefront = bus.subscribe("orders.events.>").await.unwrap();
        let mut crm = bus.subscribe("orders.events.>").await.unwrap();

        let payload = b"broadcast".to_vec();
        bus.publish("orders.events.created", payload.clone())
            .await
            .unwrap();

        let msg1 = tokio::time::timeout(std::time::Duration::from_secs(1), storefront.next())
            .await
            .expect("timeout")
            .expect("stream ended");
        let msg2 = tokio::time::timeout(std::time::Duration::from_secs(1), crm.next())
            .await
            .expect("timeout")
            .expect("stream ended");

        assert_eq!(msg1.payload, payload);
        assert_eq!(msg2.payload, payload);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_not_an_error() {
        let bus = InMemoryBus::new();
        bus.publish("orders.events.created", b"dropped".to_vec())
            .await
            .unwrap();
    }
}
