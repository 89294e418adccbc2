//! Event bus façade.
//!
//! [`EventBus`] composes the broker, the handler registry, and the listener
//! table. Publishing encodes and sends to the channel named after the event
//! type; subscribing registers a handler and lazily starts the channel
//! listener; shutdown drains every listener and closes the broker.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use tracing::debug;

use super::handler::HandlerRef;
use super::listener::Listener;
use super::registry::HandlerRegistry;
use crate::broker::Broker;
use crate::config::BusConfig;
use crate::domain::codec;
use crate::domain::event::Event;
use crate::error::BusError;

/// Typed event bus over an external pub/sub broker.
///
/// # Concurrency
///
/// - One background listener task per subscribed event-type name; a slow
///   handler delays only later messages of its own type.
/// - Publishing never waits for handler execution; the two sides are
///   decoupled through the broker.
/// - Listener lifecycle transitions are serialized through an internal
///   mutex, so exactly one listener exists per event-type name at any time.
pub struct EventBus {
    broker: Arc<dyn Broker>,
    registry: Arc<HandlerRegistry>,
    listeners: Mutex<HashMap<String, Listener>>,
    shut_down: AtomicBool,
    config: BusConfig,
}

impl EventBus {
    /// Creates a bus on top of `broker` with the given configuration.
    #[must_use]
    pub fn new(broker: Arc<dyn Broker>, config: BusConfig) -> Self {
        Self {
            broker,
            registry: Arc::new(HandlerRegistry::new()),
            listeners: Mutex::new(HashMap::new()),
            shut_down: AtomicBool::new(false),
            config,
        }
    }

    /// Encodes `event` and publishes it to the channel named after its type.
    ///
    /// Returns as soon as the broker accepts the send; handler execution on
    /// the receiving side is not awaited.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Encode`] when the event does not serialize to a
    /// field mapping, [`BusError::Publish`] when the broker rejects the
    /// send, and [`BusError::ShutDown`] after [`EventBus::shutdown`].
    pub async fn publish<E: Event>(&self, event: E) -> Result<(), BusError> {
        if self.shut_down.load(Ordering::SeqCst) {
            return Err(BusError::ShutDown);
        }
        let payload = codec::encode(&event)?;
        self.broker.publish(E::event_type(), &payload).await
    }

    /// Registers `handler` for `event_type`.
    ///
    /// The first registration for a name opens the broker subscription and
    /// starts the channel listener before returning, so events published
    /// afterwards are observed. Re-registering the same handler (same
    /// allocation) is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::ShutDown`] after [`EventBus::shutdown`].
    pub async fn subscribe(&self, event_type: &str, handler: HandlerRef) -> Result<(), BusError> {
        let mut listeners = self.listeners.lock().await;
        if self.shut_down.load(Ordering::SeqCst) {
            return Err(BusError::ShutDown);
        }
        let created = self.registry.register(event_type, handler);
        if created && !listeners.contains_key(event_type) {
            let listener = Listener::start(
                event_type.to_string(),
                Arc::clone(&self.broker),
                Arc::clone(&self.registry),
                self.config.reconnect,
            )
            .await;
            listeners.insert(event_type.to_string(), listener);
            debug!(channel = %event_type, "listener started");
        }
        Ok(())
    }

    /// Removes `handler` from `event_type`.
    ///
    /// Removing a handler that was never registered is a no-op. When the
    /// last handler for the name leaves, the channel listener is stopped and
    /// fully joined before this returns.
    ///
    /// # Errors
    ///
    /// Currently infallible; the `Result` reserves room for broker-side
    /// teardown failures.
    pub async fn unsubscribe(
        &self,
        event_type: &str,
        handler: &HandlerRef,
    ) -> Result<(), BusError> {
        let mut listeners = self.listeners.lock().await;
        let still_has_handlers = self.registry.unregister(event_type, handler);
        if !still_has_handlers
            && let Some(listener) = listeners.remove(event_type)
        {
            listener.stop().await;
            debug!(channel = %event_type, "listener stopped");
        }
        Ok(())
    }

    /// Stops every active listener and closes the broker connection.
    ///
    /// Each listener is cancelled and joined before this returns; no
    /// background task owned by the bus remains runnable afterwards.
    /// Idempotent: a second call returns `Ok` immediately.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Connect`] when the broker cannot release its
    /// resources cleanly.
    pub async fn shutdown(&self) -> Result<(), BusError> {
        let mut listeners = self.listeners.lock().await;
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        for (channel, listener) in listeners.drain() {
            listener.stop().await;
            debug!(channel = %channel, "listener stopped");
        }
        drop(listeners);
        self.broker.close().await
    }

    /// Returns the number of running channel listeners.
    pub async fn active_listeners(&self) -> usize {
        self.listeners.lock().await.len()
    }

    /// Returns `true` once [`EventBus::shutdown`] has run.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("shut_down", &self.is_shut_down())
            .field("subscribed_types", &self.registry.subscribed_types())
            .finish_non_exhaustive()
    }
}
