//! Publish/subscribe transport contract.

use std::future::Future;

use serde_json::Value;
use thiserror::Error;

/// Errors reported by a transport.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("Failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("Failed to subscribe to {topic}: {reason}")]
    Subscribe { topic: String, reason: String },

    #[error("Failed to send: {0}")]
    Send(String),

    #[error("Transport is not connected")]
    NotConnected,
}

/// Lifecycle and data events delivered by a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected,
    Error(String),
    Closed,
    Message { topic: String, payload: Value },
}

/// A publish/subscribe client.
///
/// `connect` and `subscribe` may suspend; callers race them against
/// cancellation, so implementations must tolerate being dropped mid-call.
/// Retry and backoff, if any, belong to the implementation.
pub trait Transport: Send + 'static {
    fn connect(&mut self, url: &str) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn subscribe(
        &mut self,
        topic: &str,
        message_type: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn unsubscribe(&mut self, topic: &str) -> Result<(), TransportError>;

    fn close(&mut self);

    /// Next lifecycle or message event. `None` means the transport is
    /// finished and will produce nothing further.
    fn next_event(&mut self) -> impl Future<Output = Option<TransportEvent>> + Send;
}

/// Builds a fresh transport for each live session.
pub trait TransportFactory: Send + 'static {
    type Transport: Transport;

    fn create(&self) -> Self::Transport;
}

impl<F, T> TransportFactory for F
where
    F: Fn() -> T + Send + 'static,
    T: Transport,
{
    type Transport = T;

    fn create(&self) -> T {
        self()
    }
}
