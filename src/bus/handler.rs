//! Handler contract and closure adapter.
//!
//! Handlers are registered per event-type name and invoked with the decoded
//! field mapping. Registration identity is pointer identity of the shared
//! allocation: clones of one [`HandlerRef`] are the same registration, while
//! two separately constructed handlers are distinct even when behaviorally
//! identical.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::domain::EventData;

/// Processes decoded events for one subscribed event type.
#[async_trait]
pub trait Handle: Send + Sync + 'static {
    /// Handles one decoded event.
    ///
    /// Called sequentially from the owning listener task, in registration
    /// order relative to the other handlers of the same event type.
    ///
    /// # Errors
    ///
    /// Errors are logged by the dispatching listener together with the event
    /// type and handler name; they never abort delivery to other handlers or
    /// kill the listener.
    async fn call(&self, event: EventData) -> anyhow::Result<()>;

    /// Name used in logs when this handler fails.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose; override
    /// it when possible.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared, clonable reference to a registered handler.
#[derive(Clone)]
pub struct HandlerRef {
    inner: Arc<dyn Handle>,
}

impl HandlerRef {
    /// Wraps a handler into a shared reference.
    pub fn new(handler: impl Handle) -> Self {
        Self {
            inner: Arc::new(handler),
        }
    }

    /// Wraps an already-shared handler.
    #[must_use]
    pub fn from_arc(handler: Arc<dyn Handle>) -> Self {
        Self { inner: handler }
    }

    /// Returns the handler's log name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Returns `true` when both references point at the same registration.
    #[must_use]
    pub fn same_handler(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) async fn call(&self, event: EventData) -> anyhow::Result<()> {
        self.inner.call(event).await
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HandlerRef").field(&self.name()).finish()
    }
}

/// Function-backed handler.
///
/// Wraps an async closure that produces a fresh future per invocation; state
/// shared across invocations goes through an explicit `Arc` inside the
/// closure.
pub struct HandlerFn {
    name: String,
    f: Box<dyn Fn(EventData) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>,
}

impl HandlerFn {
    /// Creates the handler and returns it as a registrable [`HandlerRef`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use eve_bus::{EventData, HandlerFn, HandlerRef};
    ///
    /// let h: HandlerRef = HandlerFn::arc("audit", |event: EventData| async move {
    ///     println!("seen: {} fields", event.len());
    ///     Ok(())
    /// });
    /// assert_eq!(h.name(), "audit");
    /// ```
    pub fn arc<F, Fut>(name: impl Into<String>, f: F) -> HandlerRef
    where
        F: Fn(EventData) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        HandlerRef::new(Self {
            name: name.into(),
            f: Box::new(move |event| -> BoxFuture<'static, anyhow::Result<()>> {
                Box::pin(f(event))
            }),
        })
    }
}

#[async_trait]
impl Handle for HandlerFn {
    async fn call(&self, event: EventData) -> anyhow::Result<()> {
        (self.f)(event).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for HandlerFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFn")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closure_handler_runs() {
        let handler = HandlerFn::arc("noop", |_event| async move { Ok(()) });
        let result = handler.call(EventData::default()).await;
        assert!(result.is_ok());
        assert_eq!(handler.name(), "noop");
    }

    #[test]
    fn clones_share_identity() {
        let handler = HandlerFn::arc("h", |_event| async move { Ok(()) });
        let clone = handler.clone();
        assert!(handler.same_handler(&clone));
    }

    #[test]
    fn separate_handlers_are_distinct() {
        let a = HandlerFn::arc("same-name", |_event| async move { Ok(()) });
        let b = HandlerFn::arc("same-name", |_event| async move { Ok(()) });
        assert!(!a.same_handler(&b));
    }

    #[test]
    fn trait_handler_default_name() {
        struct Audit;

        #[async_trait]
        impl Handle for Audit {
            async fn call(&self, _event: EventData) -> anyhow::Result<()> {
                Ok(())
            }
        }

        let handler = HandlerRef::new(Audit);
        assert!(handler.name().contains("Audit"));
    }
}
