//! Broker port and bundled adapters.
//!
//! The bus depends only on the minimal capability set defined here, not on
//! any specific broker's full API. [`MemoryBroker`] serves tests and
//! single-process deployments; the `redis` feature adds a Redis pub/sub
//! adapter.

use async_trait::async_trait;

use crate::error::BusError;

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use self::memory::MemoryBroker;
#[cfg(feature = "redis")]
pub use self::redis::RedisBroker;

/// Raw message delivered by a broker subscription.
#[derive(Debug, Clone)]
pub struct BrokerMessage {
    /// Channel the message arrived on.
    pub channel: String,
    /// Raw payload exactly as published.
    pub payload: String,
}

/// Minimal pub/sub capability the bus requires from an external broker.
#[async_trait]
pub trait Broker: Send + Sync + 'static {
    /// Publishes a payload to the named channel.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Publish`] when the broker rejects or cannot
    /// deliver the send.
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), BusError>;

    /// Opens a subscription bound to the named channel.
    ///
    /// The returned handle is owned exclusively by its listener.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Subscription`] when the subscription cannot be
    /// opened.
    async fn subscribe(&self, channel: &str) -> Result<Box<dyn Subscription>, BusError>;

    /// Closes the broker connection(s).
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Connect`] when owned resources cannot be released
    /// cleanly.
    async fn close(&self) -> Result<(), BusError>;
}

/// Exclusive handle to one channel subscription.
#[async_trait]
pub trait Subscription: Send {
    /// Waits for the next message.
    ///
    /// Returns `Ok(None)` when the subscription has ended and no further
    /// messages will arrive. The wait must be cancel-safe: dropping the
    /// future loses no delivered message beyond the one in flight.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Subscription`] on a receive failure; the caller
    /// decides whether to reopen.
    async fn next_message(&mut self) -> Result<Option<BrokerMessage>, BusError>;

    /// Closes the subscription, releasing broker resources.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Subscription`] when the broker rejects the
    /// teardown; the handle must still be safe to drop afterwards.
    async fn close(&mut self) -> Result<(), BusError>;
}
