//! Per-event-type broker listener.
//!
//! Each subscribed event-type name owns exactly one [`Listener`]: a
//! background task holding the broker subscription for the channel named
//! after the type. The task waits for messages, decodes them, and fans out
//! to the registry's current handler snapshot. Teardown cancels the token
//! and joins the task, so no background work survives [`Listener::stop`].

use std::sync::Arc;

use futures_util::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::registry::HandlerRegistry;
use crate::broker::{Broker, Subscription};
use crate::config::ReconnectPolicy;
use crate::domain::codec;

/// Handle to the background receive loop for one event-type channel.
#[derive(Debug)]
pub(crate) struct Listener {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Listener {
    /// Opens the broker subscription and spawns the receive loop.
    ///
    /// The initial subscription is opened before the task starts, so a
    /// publish issued after this returns will be observed. When the initial
    /// open fails, the task starts anyway and retries with backoff; a
    /// subscribed type is never silently abandoned.
    pub(crate) async fn start(
        event_type: String,
        broker: Arc<dyn Broker>,
        registry: Arc<HandlerRegistry>,
        reconnect: ReconnectPolicy,
    ) -> Self {
        let initial = match broker.subscribe(&event_type).await {
            Ok(subscription) => Some(subscription),
            Err(err) => {
                warn!(
                    channel = %event_type,
                    error = %err,
                    "failed to open subscription; listener will retry"
                );
                None
            }
        };

        let token = CancellationToken::new();
        let loop_token = token.clone();
        let handle = tokio::spawn(async move {
            run_loop(&event_type, broker, &registry, reconnect, &loop_token, initial).await;
        });
        Self { token, handle }
    }

    /// Signals the loop to stop and waits for the task to finish.
    pub(crate) async fn stop(self) {
        self.token.cancel();
        if let Err(err) = self.handle.await {
            error!(error = %err, "listener task failed during join");
        }
    }
}

/// Outer loop: owns one subscription at a time, reopening with backoff when
/// the stream ends or errors, until cancelled.
async fn run_loop(
    event_type: &str,
    broker: Arc<dyn Broker>,
    registry: &HandlerRegistry,
    reconnect: ReconnectPolicy,
    token: &CancellationToken,
    mut initial: Option<Box<dyn Subscription>>,
) {
    let mut attempt: u32 = 0;
    loop {
        let mut subscription = if let Some(open) = initial.take() {
            open
        } else {
            let delay = reconnect.delay(attempt);
            attempt = attempt.saturating_add(1);
            tokio::select! {
                () = token.cancelled() => break,
                () = tokio::time::sleep(delay) => {}
            }
            let opened = tokio::select! {
                () = token.cancelled() => break,
                result = broker.subscribe(event_type) => result,
            };
            match opened {
                Ok(open) => {
                    attempt = 0;
                    open
                }
                Err(err) => {
                    warn!(
                        channel = %event_type,
                        error = %err,
                        retry_in = ?reconnect.delay(attempt),
                        "failed to open subscription; retrying"
                    );
                    continue;
                }
            }
        };

        debug!(channel = %event_type, "listener running");
        let reopen = receive_loop(event_type, subscription.as_mut(), registry, token).await;
        if let Err(err) = subscription.close().await {
            warn!(channel = %event_type, error = %err, "subscription close failed");
        }
        if !reopen {
            break;
        }
        warn!(channel = %event_type, "subscription ended; reopening");
    }
    debug!(channel = %event_type, "listener stopped");
}

/// Inner loop: receives until cancelled (returns `false`) or until the
/// subscription ends or fails (returns `true`, asking the caller to reopen).
async fn receive_loop(
    event_type: &str,
    subscription: &mut dyn Subscription,
    registry: &HandlerRegistry,
    token: &CancellationToken,
) -> bool {
    loop {
        let received = tokio::select! {
            () = token.cancelled() => return false,
            result = subscription.next_message() => result,
        };
        match received {
            Ok(Some(message)) => dispatch(event_type, &message.payload, registry).await,
            Ok(None) => return true,
            Err(err) => {
                warn!(channel = %event_type, error = %err, "receive failed");
                return true;
            }
        }
    }
}

/// Decodes one payload and invokes the current handler snapshot
/// sequentially, in registration order.
async fn dispatch(event_type: &str, payload: &str, registry: &HandlerRegistry) {
    let envelope = match codec::decode(event_type, payload) {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(channel = %event_type, error = %err, "dropping undecodable message");
            return;
        }
    };
    if envelope.event_type != event_type {
        // The channel is authoritative; a mislabeled publisher still reaches
        // the channel's handlers.
        warn!(
            channel = %event_type,
            declared = %envelope.event_type,
            "envelope declares a different event type"
        );
    }

    let message_id = envelope.id.clone();
    let data = envelope.into_data();
    for handler in registry.snapshot(event_type) {
        let outcome = std::panic::AssertUnwindSafe(handler.call(data.clone()))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                error!(
                    channel = %event_type,
                    handler = %handler.name(),
                    message_id = %message_id,
                    error = %err,
                    "handler failed"
                );
            }
            Err(_) => {
                error!(
                    channel = %event_type,
                    handler = %handler.name(),
                    message_id = %message_id,
                    "handler panicked"
                );
            }
        }
    }
}
