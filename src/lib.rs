//! # eve-bus
//!
//! Typed event bus over an external pub/sub broker.
//!
//! Application code publishes serializable events and registers async
//! handlers per event-type name; the bus maps each subscribed type to a
//! broker channel of the same name, owns one background listener per
//! channel, and tears everything down on shutdown. The broker itself is a
//! minimal capability (`publish`, `subscribe`, `close`) behind the
//! [`broker::Broker`] trait; an in-memory adapter ships by default and a
//! Redis adapter is available behind the `redis` feature.
//!
//! ## Architecture
//!
//! ```text
//! publish(event)                      subscribe(type, handler)
//!     │                                   │
//!     ├── Codec (domain/) encodes         ├── HandlerRegistry (bus/)
//!     ▼                                   ▼
//! Broker (broker/): one channel per event-type name
//!     │
//!     └── Listener task per subscribed type (bus/)
//!             decode ── registry snapshot ── handlers, in order
//! ```
//!
//! Publishing never waits for handler execution; the two sides are
//! decoupled through the broker. A slow handler delays only later messages
//! of its own event type.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use eve_bus::{BusConfig, Event, EventBus, HandlerFn, MemoryBroker};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct OrderPlaced {
//!     order_id: String,
//!     total: f64,
//! }
//!
//! impl Event for OrderPlaced {
//!     fn event_type() -> &'static str {
//!         "OrderPlaced"
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), eve_bus::BusError> {
//!     let bus = EventBus::new(Arc::new(MemoryBroker::default()), BusConfig::default());
//!
//!     let handler = HandlerFn::arc("log-order", |event| async move {
//!         println!("order placed: {:?}", event.get_str("order_id"));
//!         Ok(())
//!     });
//!     bus.subscribe("OrderPlaced", handler).await?;
//!
//!     bus.publish(OrderPlaced {
//!         order_id: "ORD-1".to_string(),
//!         total: 10.0,
//!     })
//!     .await?;
//!
//!     bus.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod broker;
pub mod bus;
pub mod config;
pub mod domain;
pub mod error;

#[cfg(feature = "redis")]
pub use broker::RedisBroker;
pub use broker::{Broker, BrokerMessage, MemoryBroker, Subscription};
pub use bus::{EventBus, Handle, HandlerFn, HandlerRef, HandlerRegistry};
pub use config::{BusConfig, ReconnectPolicy};
pub use domain::{Envelope, Event, EventData};
pub use error::BusError;
