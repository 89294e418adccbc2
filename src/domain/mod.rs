//! Domain layer: the event contract and the wire codec.
//!
//! This module contains everything both sides of the broker agree on: how an
//! event declares its type name and fields, and how it is represented on the
//! wire.

pub mod codec;
pub mod event;

pub use codec::Envelope;
pub use event::{Event, EventData};
