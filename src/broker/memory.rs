//! In-process broker backed by per-channel broadcast ring buffers.
//!
//! [`MemoryBroker`] mirrors the external-broker contract for tests, demos,
//! and single-process deployments. Each channel is a
//! [`tokio::sync::broadcast`] channel with a configurable capacity; when the
//! ring buffer is full, the oldest messages are dropped for lagging
//! subscribers.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::broadcast;

use super::{Broker, BrokerMessage, Subscription};
use crate::error::BusError;

/// In-memory pub/sub broker.
///
/// Cloning is cheap and shares the underlying channel table, so one broker
/// instance can back several buses in a test.
#[derive(Debug, Clone)]
pub struct MemoryBroker {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<BrokerMessage>>>>,
    capacity: usize,
    closed: Arc<AtomicBool>,
}

impl MemoryBroker {
    /// Creates a broker whose channels buffer up to `capacity` messages.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns the number of active subscribers on `channel`.
    #[must_use]
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .read()
            .get(channel)
            .map_or(0, |tx| tx.receiver_count())
    }

    fn sender(&self, channel: &str) -> broadcast::Sender<BrokerMessage> {
        if let Some(tx) = self.channels.read().get(channel) {
            return tx.clone();
        }
        let mut channels = self.channels.write();
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), BusError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BusError::Publish {
                channel: channel.to_string(),
                reason: "broker is closed".to_string(),
            });
        }
        let message = BrokerMessage {
            channel: channel.to_string(),
            payload: payload.to_string(),
        };
        // A send error only means no subscribers; the message is dropped,
        // matching broker pub/sub semantics.
        let _ = self.sender(channel).send(message);
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<Box<dyn Subscription>, BusError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BusError::Subscription {
                channel: channel.to_string(),
                reason: "broker is closed".to_string(),
            });
        }
        let rx = self.sender(channel).subscribe();
        Ok(Box::new(MemorySubscription {
            channel: channel.to_string(),
            rx,
        }))
    }

    async fn close(&self) -> Result<(), BusError> {
        self.closed.store(true, Ordering::SeqCst);
        // Dropping the senders ends every open subscription stream.
        self.channels.write().clear();
        Ok(())
    }
}

struct MemorySubscription {
    channel: String,
    rx: broadcast::Receiver<BrokerMessage>,
}

#[async_trait]
impl Subscription for MemorySubscription {
    async fn next_message(&mut self) -> Result<Option<BrokerMessage>, BusError> {
        loop {
            match self.rx.recv().await {
                Ok(message) => return Ok(Some(message)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        channel = %self.channel,
                        skipped,
                        "subscriber lagged behind ring buffer; continuing from latest"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(None),
            }
        }
    }

    async fn close(&mut self) -> Result<(), BusError> {
        // The receiver is released when the handle drops; nothing to signal.
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_to_subscriber() {
        let broker = MemoryBroker::new(16);
        let Ok(mut sub) = broker.subscribe("orders").await else {
            panic!("subscribe failed");
        };
        let publish = broker.publish("orders", "payload-1").await;
        assert!(publish.is_ok());

        let received = sub.next_message().await;
        let Ok(Some(message)) = received else {
            panic!("expected a message");
        };
        assert_eq!(message.channel, "orders");
        assert_eq!(message.payload, "payload-1");
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_ok() {
        let broker = MemoryBroker::new(16);
        assert!(broker.publish("nobody", "dropped").await.is_ok());
    }

    #[tokio::test]
    async fn channels_are_isolated() {
        let broker = MemoryBroker::new(16);
        let Ok(mut orders) = broker.subscribe("orders").await else {
            panic!("subscribe failed");
        };
        let _ = broker.publish("users", "other-channel").await;
        let _ = broker.publish("orders", "mine").await;

        let Ok(Some(message)) = orders.next_message().await else {
            panic!("expected a message");
        };
        assert_eq!(message.payload, "mine");
    }

    #[tokio::test]
    async fn close_rejects_publish_and_subscribe() {
        let broker = MemoryBroker::new(16);
        assert!(broker.close().await.is_ok());

        let publish = broker.publish("orders", "late").await;
        assert!(matches!(publish, Err(BusError::Publish { .. })));

        let subscribe = broker.subscribe("orders").await;
        assert!(subscribe.is_err());
    }

    #[tokio::test]
    async fn close_ends_open_subscriptions() {
        let broker = MemoryBroker::new(16);
        let Ok(mut sub) = broker.subscribe("orders").await else {
            panic!("subscribe failed");
        };
        assert!(broker.close().await.is_ok());

        let received = sub.next_message().await;
        assert!(matches!(received, Ok(None)));
    }

    #[tokio::test]
    async fn subscriber_count_tracks_handles() {
        let broker = MemoryBroker::new(16);
        assert_eq!(broker.subscriber_count("orders"), 0);

        let Ok(sub1) = broker.subscribe("orders").await else {
            panic!("subscribe failed");
        };
        let Ok(_sub2) = broker.subscribe("orders").await else {
            panic!("subscribe failed");
        };
        assert_eq!(broker.subscriber_count("orders"), 2);

        drop(sub1);
        assert_eq!(broker.subscriber_count("orders"), 1);
    }
}
