//! Process-wide default bus slot.
//!
//! The core API takes an explicit [`EventBus`]; this module is a thin
//! convenience layer for call sites that cannot thread a bus reference
//! through. [`set_default`] installs a process-wide instance and the free
//! functions delegate to whatever bus occupies the slot at call time.
//!
//! Swapping the default never affects listeners owned by a previously
//! installed bus; the owner must still call [`EventBus::shutdown`] on it.

use std::sync::Arc;

use parking_lot::RwLock;

use super::event_bus::EventBus;
use super::handler::HandlerRef;
use crate::domain::event::Event;
use crate::error::BusError;

static DEFAULT_BUS: RwLock<Option<Arc<EventBus>>> = RwLock::new(None);

/// Installs `bus` as the process-wide default, returning the previous one.
pub fn set_default(bus: Arc<EventBus>) -> Option<Arc<EventBus>> {
    DEFAULT_BUS.write().replace(bus)
}

/// Removes and returns the current default bus.
pub fn clear_default() -> Option<Arc<EventBus>> {
    DEFAULT_BUS.write().take()
}

/// Returns the current default bus, if one is installed.
#[must_use]
pub fn default_bus() -> Option<Arc<EventBus>> {
    DEFAULT_BUS.read().clone()
}

/// Publishes `event` via the default bus.
///
/// # Errors
///
/// Returns [`BusError::NoDefaultBus`] when the slot is empty, otherwise
/// whatever [`EventBus::publish`] returns.
pub async fn publish<E: Event>(event: E) -> Result<(), BusError> {
    let bus = default_bus().ok_or(BusError::NoDefaultBus)?;
    bus.publish(event).await
}

/// Registers `handler` for `event_type` via the default bus.
///
/// # Errors
///
/// Returns [`BusError::NoDefaultBus`] when the slot is empty, otherwise
/// whatever [`EventBus::subscribe`] returns.
pub async fn subscribe(event_type: &str, handler: HandlerRef) -> Result<(), BusError> {
    let bus = default_bus().ok_or(BusError::NoDefaultBus)?;
    bus.subscribe(event_type, handler).await
}

/// Removes `handler` from `event_type` via the default bus.
///
/// # Errors
///
/// Returns [`BusError::NoDefaultBus`] when the slot is empty, otherwise
/// whatever [`EventBus::unsubscribe`] returns.
pub async fn unsubscribe(event_type: &str, handler: &HandlerRef) -> Result<(), BusError> {
    let bus = default_bus().ok_or(BusError::NoDefaultBus)?;
    bus.unsubscribe(event_type, handler).await
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::broker::MemoryBroker;
    use crate::bus::handler::HandlerFn;
    use crate::config::BusConfig;
    use crate::domain::EventData;
    use serde::Serialize;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    #[derive(Serialize)]
    struct PingSent {
        seq: i64,
    }

    impl Event for PingSent {
        fn event_type() -> &'static str {
            "PingSent"
        }
    }

    fn fresh_bus() -> Arc<EventBus> {
        Arc::new(EventBus::new(
            Arc::new(MemoryBroker::new(64)),
            BusConfig::default(),
        ))
    }

    // The slot is process-global, so the whole lifecycle lives in one test
    // to keep parallel test runs from interfering with each other.
    #[tokio::test]
    async fn slot_lifecycle() {
        let _ = clear_default();

        // Empty slot: free functions fail fast.
        let unset = publish(PingSent { seq: 0 }).await;
        assert!(matches!(unset, Err(BusError::NoDefaultBus)));
        assert!(default_bus().is_none());

        // Install and use through the free functions.
        let first = fresh_bus();
        assert!(set_default(Arc::clone(&first)).is_none());

        let (tx, mut rx) = mpsc::unbounded_channel::<EventData>();
        let handler = HandlerFn::arc("ping", move |event: EventData| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(event);
                Ok(())
            }
        });
        assert!(subscribe("PingSent", handler.clone()).await.is_ok());
        assert!(publish(PingSent { seq: 1 }).await.is_ok());

        let Ok(Some(event)) = timeout(Duration::from_secs(2), rx.recv()).await else {
            panic!("handler was not invoked in time");
        };
        assert_eq!(event.get_i64("seq"), Some(1));

        // Swapping returns the previous bus and leaves its listeners alone.
        let second = fresh_bus();
        let previous = set_default(Arc::clone(&second));
        assert!(previous.is_some_and(|bus| Arc::ptr_eq(&bus, &first)));
        assert_eq!(first.active_listeners().await, 1);

        // Free functions now resolve to the new bus, which has no handlers.
        assert!(unsubscribe("PingSent", &handler).await.is_ok());
        assert_eq!(first.active_listeners().await, 1);

        // The previous owner still shuts its own listeners down.
        assert!(first.shutdown().await.is_ok());
        assert_eq!(first.active_listeners().await, 0);

        let cleared = clear_default();
        assert!(cleared.is_some_and(|bus| Arc::ptr_eq(&bus, &second)));
        let after_clear = publish(PingSent { seq: 2 }).await;
        assert!(matches!(after_clear, Err(BusError::NoDefaultBus)));
    }
}
