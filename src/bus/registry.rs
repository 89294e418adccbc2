//! Process-wide handler registry.
//!
//! [`HandlerRegistry`] maps event-type names to ordered sets of registered
//! handlers. All mutation and snapshot reads go through a single
//! registry-wide lock; critical sections are O(set size) and never include
//! handler execution or I/O.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::handler::HandlerRef;

/// Thread-safe table mapping event-type names to registered handlers.
///
/// Entries are created on the first registration for a name and removed when
/// the set empties, so the caller can key listener lifecycles off the return
/// values of [`HandlerRegistry::register`] and [`HandlerRegistry::unregister`].
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    entries: RwLock<HashMap<String, Vec<HandlerRef>>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `handler` to the set for `event_type`.
    ///
    /// Returns `true` when this created the first registration for the name,
    /// signaling the caller to start a listener. Re-registering a handler
    /// already present (same allocation) is a no-op returning `false`.
    pub fn register(&self, event_type: &str, handler: HandlerRef) -> bool {
        let mut entries = self.entries.write();
        let set = entries.entry(event_type.to_string()).or_default();
        if set.iter().any(|existing| existing.same_handler(&handler)) {
            return false;
        }
        let was_empty = set.is_empty();
        set.push(handler);
        was_empty
    }

    /// Removes `handler` from the set for `event_type`.
    ///
    /// Removing an absent handler is a no-op. Returns `true` while handlers
    /// remain for the name, `false` once the set is (or already was) empty,
    /// signaling the caller to stop the listener.
    pub fn unregister(&self, event_type: &str, handler: &HandlerRef) -> bool {
        let mut entries = self.entries.write();
        let Some(set) = entries.get_mut(event_type) else {
            return false;
        };
        set.retain(|existing| !existing.same_handler(handler));
        if set.is_empty() {
            entries.remove(event_type);
            return false;
        }
        true
    }

    /// Returns an immutable snapshot of the handlers for `event_type`, in
    /// registration order.
    ///
    /// Dispatch iterates the snapshot, so concurrent registration changes
    /// never corrupt an in-flight fan-out.
    #[must_use]
    pub fn snapshot(&self, event_type: &str) -> Vec<HandlerRef> {
        self.entries
            .read()
            .get(event_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the event-type names that currently have at least one handler.
    #[must_use]
    pub fn subscribed_types(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::bus::handler::HandlerFn;

    fn noop(name: &str) -> HandlerRef {
        HandlerFn::arc(name, |_event| async move { Ok(()) })
    }

    #[test]
    fn first_registration_creates_subscription() {
        let registry = HandlerRegistry::new();
        assert!(registry.register("OrderPlaced", noop("a")));
        assert!(!registry.register("OrderPlaced", noop("b")));
    }

    #[test]
    fn duplicate_registration_is_idempotent() {
        let registry = HandlerRegistry::new();
        let handler = noop("a");
        assert!(registry.register("OrderPlaced", handler.clone()));
        assert!(!registry.register("OrderPlaced", handler.clone()));
        assert_eq!(registry.snapshot("OrderPlaced").len(), 1);
    }

    #[test]
    fn unregister_last_handler_empties_entry() {
        let registry = HandlerRegistry::new();
        let handler = noop("a");
        registry.register("OrderPlaced", handler.clone());

        assert!(!registry.unregister("OrderPlaced", &handler));
        assert!(registry.subscribed_types().is_empty());
    }

    #[test]
    fn unregister_keeps_remaining_handlers() {
        let registry = HandlerRegistry::new();
        let a = noop("a");
        let b = noop("b");
        registry.register("OrderPlaced", a.clone());
        registry.register("OrderPlaced", b);

        assert!(registry.unregister("OrderPlaced", &a));
        assert_eq!(registry.snapshot("OrderPlaced").len(), 1);
    }

    #[test]
    fn unregister_absent_handler_is_noop() {
        let registry = HandlerRegistry::new();
        registry.register("OrderPlaced", noop("a"));

        assert!(registry.unregister("OrderPlaced", &noop("ghost")));
        assert!(!registry.unregister("NeverSeen", &noop("ghost")));
        assert_eq!(registry.snapshot("OrderPlaced").len(), 1);
    }

    #[test]
    fn snapshot_preserves_registration_order() {
        let registry = HandlerRegistry::new();
        registry.register("OrderPlaced", noop("first"));
        registry.register("OrderPlaced", noop("second"));
        registry.register("OrderPlaced", noop("third"));

        let snapshot = registry.snapshot("OrderPlaced");
        let ordered: Vec<String> = snapshot.iter().map(|h| h.name().to_string()).collect();
        assert_eq!(ordered, vec!["first", "second", "third"]);
    }

    #[test]
    fn snapshot_is_isolated_from_later_mutation() {
        let registry = HandlerRegistry::new();
        let a = noop("a");
        registry.register("OrderPlaced", a.clone());

        let snapshot = registry.snapshot("OrderPlaced");
        registry.unregister("OrderPlaced", &a);

        assert_eq!(snapshot.len(), 1);
        assert!(registry.snapshot("OrderPlaced").is_empty());
    }
}
