//! Event bus core: handler contract, registry, listeners, façade, and the
//! optional process-wide default slot.

pub mod default;
pub mod event_bus;
pub mod handler;
pub(crate) mod listener;
pub mod registry;

pub use event_bus::EventBus;
pub use handler::{Handle, HandlerFn, HandlerRef};
pub use registry::HandlerRegistry;
