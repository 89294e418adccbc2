//! Event bus error types.
//!
//! [`BusError`] is the central error type for the crate. Failures local to a
//! single message or handler are logged by the owning listener and never
//! surface here; everything that reaches a caller of the bus API does.

/// Crate-wide error enum.
///
/// # Propagation policy
///
/// - `Decode` is produced by the codec and consumed by the listener loop,
///   which logs it and drops the message; it reaches callers only through
///   direct codec use.
/// - `Publish` and `Subscription` surface broker failures to the caller of
///   the corresponding bus operation. The core never retries a publish;
///   subscriptions are retried by the listener with backoff.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// Event could not be encoded into a transport envelope.
    #[error("failed to encode event '{event_type}': {reason}")]
    Encode {
        /// Type name of the event that failed to encode.
        event_type: String,
        /// Serialization failure detail.
        reason: String,
    },

    /// Payload on a subscribed channel could not be decoded.
    #[error("malformed payload on channel '{channel}': {reason}")]
    Decode {
        /// Channel the payload arrived on.
        channel: String,
        /// Parse failure detail.
        reason: String,
    },

    /// Broker rejected or failed a publish call.
    #[error("publish to channel '{channel}' failed: {reason}")]
    Publish {
        /// Target channel of the failed publish.
        channel: String,
        /// Broker-reported failure detail.
        reason: String,
    },

    /// Broker subscription could not be opened or maintained.
    #[error("subscription to channel '{channel}' failed: {reason}")]
    Subscription {
        /// Channel the subscription was bound to.
        channel: String,
        /// Broker-reported failure detail.
        reason: String,
    },

    /// Broker client could not be constructed or connected.
    #[error("broker connection failed: {reason}")]
    Connect {
        /// Connection failure detail.
        reason: String,
    },

    /// Operation attempted on a bus that has already been shut down.
    #[error("event bus is shut down")]
    ShutDown,

    /// Free function called while no default bus is installed.
    #[error("no default event bus installed; call bus::default::set_default first")]
    NoDefaultBus,
}
