//! Scripted in-memory transport.
//!
//! Every call is recorded so tests can assert exact subscribe and
//! teardown sequences. Events are pushed through the paired
//! [`MemoryTransportHandle`].

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::mpsc;

use super::transport::{Transport, TransportError, TransportEvent, TransportFactory};

/// A recorded transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Connect(String),
    Subscribe { topic: String, message_type: String },
    Unsubscribe(String),
    Close,
}

#[derive(Default)]
struct Behavior {
    fail_connect: bool,
    stall_connect: bool,
    fail_subscribe: HashSet<String>,
    fail_subscribe_once: HashSet<String>,
    stall_subscribe: HashSet<String>,
}

/// In-memory [`Transport`].
pub struct MemoryTransport {
    calls: Arc<Mutex<Vec<TransportCall>>>,
    events: mpsc::UnboundedReceiver<TransportEvent>,
    behavior: Behavior,
}

/// Test-side handle paired with a [`MemoryTransport`].
#[derive(Clone)]
pub struct MemoryTransportHandle {
    calls: Arc<Mutex<Vec<TransportCall>>>,
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl MemoryTransport {
    pub fn new() -> (Self, MemoryTransportHandle) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                calls: Arc::clone(&calls),
                events: rx,
                behavior: Behavior::default(),
            },
            MemoryTransportHandle { calls, events: tx },
        )
    }

    /// Make `connect` fail.
    pub fn failing_connect(mut self) -> Self {
        self.behavior.fail_connect = true;
        self
    }

    /// Make `connect` never complete.
    pub fn stalled_connect(mut self) -> Self {
        self.behavior.stall_connect = true;
        self
    }

    /// Make subscribing to `topic` fail.
    pub fn failing_subscribe(mut self, topic: &str) -> Self {
        self.behavior.fail_subscribe.insert(topic.to_string());
        self
    }

    /// Make only the first subscribe to `topic` fail.
    pub fn failing_subscribe_once(mut self, topic: &str) -> Self {
        self.behavior.fail_subscribe_once.insert(topic.to_string());
        self
    }

    /// Make subscribing to `topic` never complete.
    pub fn stalled_subscribe(mut self, topic: &str) -> Self {
        self.behavior.stall_subscribe.insert(topic.to_string());
        self
    }

    fn record(&self, call: TransportCall) {
        lock(&self.calls).push(call);
    }
}

impl Transport for MemoryTransport {
    async fn connect(&mut self, url: &str) -> Result<(), TransportError> {
        self.record(TransportCall::Connect(url.to_string()));
        if self.behavior.stall_connect {
            std::future::pending::<()>().await;
        }
        if self.behavior.fail_connect {
            return Err(TransportError::Connect {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(())
    }

    async fn subscribe(&mut self, topic: &str, message_type: &str) -> Result<(), TransportError> {
        self.record(TransportCall::Subscribe {
            topic: topic.to_string(),
            message_type: message_type.to_string(),
        });
        if self.behavior.stall_subscribe.contains(topic) {
            std::future::pending::<()>().await;
        }
        if self.behavior.fail_subscribe.contains(topic)
            || self.behavior.fail_subscribe_once.remove(topic)
        {
            return Err(TransportError::Subscribe {
                topic: topic.to_string(),
                reason: "unknown topic".to_string(),
            });
        }
        Ok(())
    }

    fn unsubscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        self.record(TransportCall::Unsubscribe(topic.to_string()));
        Ok(())
    }

    fn close(&mut self) {
        self.record(TransportCall::Close);
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        self.events.recv().await
    }
}

impl MemoryTransportHandle {
    pub fn push(&self, event: TransportEvent) {
        let _ = self.events.send(event);
    }

    /// Deliver a message on `topic`.
    pub fn publish(&self, topic: &str, payload: Value) {
        self.push(TransportEvent::Message {
            topic: topic.to_string(),
            payload,
        });
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        lock(&self.calls).clone()
    }

    /// Topics currently subscribed (subscribed and not yet unsubscribed).
    pub fn active_subscriptions(&self) -> Vec<String> {
        let mut active: Vec<String> = Vec::new();
        for call in lock(&self.calls).iter() {
            match call {
                TransportCall::Subscribe { topic, .. } => active.push(topic.clone()),
                TransportCall::Unsubscribe(topic) => active.retain(|t| t != topic),
                _ => {}
            }
        }
        active
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.calls).contains(&TransportCall::Close)
    }
}

/// [`TransportFactory`] that hands out fresh [`MemoryTransport`]s and keeps
/// a handle to each, in creation order.
#[derive(Clone, Default)]
pub struct MemoryTransportFactory {
    handles: Arc<Mutex<Vec<MemoryTransportHandle>>>,
}

impl MemoryTransportFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles of every transport created so far.
    pub fn handles(&self) -> Vec<MemoryTransportHandle> {
        self.handles
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Handle of the most recently created transport.
    pub fn latest(&self) -> Option<MemoryTransportHandle> {
        self.handles().pop()
    }
}

impl TransportFactory for MemoryTransportFactory {
    type Transport = MemoryTransport;

    fn create(&self) -> MemoryTransport {
        let (transport, handle) = MemoryTransport::new();
        self.handles
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(handle);
        transport
    }
}

fn lock(calls: &Mutex<Vec<TransportCall>>) -> MutexGuard<'_, Vec<TransportCall>> {
    calls.lock().unwrap_or_else(|e| e.into_inner())
}
