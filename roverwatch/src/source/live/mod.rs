//! Live telemetry source.
//!
//! Opens one transport connection and subscribes three channels: vehicle
//! status, position, and planned path. Position arrives either as
//! local-frame odometry, projected around the origin, or as a geographic
//! fix used unchanged. A fix never moves the origin.
//!
//! # Failure handling
//!
//! Connect and subscribe failures report `Connection(false)` and leave
//! the source idle but alive. Messages that arrive while disconnected are
//! dropped. The feed comes back in one of two ways:
//!
//! - the transport reports `Connected` (its own retry), and every channel
//!   not yet subscribed, including one whose subscribe failed, is
//!   re-issued;
//! - the engine restarts the source with a new transport after a
//!   configuration change or a mode switch.
//!
//! [`RosbridgeTransport`] only fails a subscribe once its socket writer
//! is gone, which is a real disconnect. Per-request rosbridge errors such
//! as an unknown message type are logged by the transport and never
//! change the connection state.
//!
//! # Teardown
//!
//! Cancellation is checked at every suspension point. On cancel, every
//! subscription issued so far is unsubscribed, including one still in
//! flight, and then the transport is closed.

pub mod messages;
mod memory;
mod rosbridge;
mod transport;

use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

pub use memory::{MemoryTransport, MemoryTransportFactory, MemoryTransportHandle, TransportCall};
pub use rosbridge::RosbridgeTransport;
pub use transport::{Transport, TransportError, TransportEvent, TransportFactory};

use super::{PositionSource, SampleSink, SourceEvent};
use crate::geo::GeoPoint;
use crate::telemetry::VehicleStatus;
use messages::{
    FIX_MESSAGE_TYPE, ODOMETRY_MESSAGE_TYPE, PATH_MESSAGE_TYPE, STATUS_MESSAGE_TYPE,
};

pub const DEFAULT_TRANSPORT_URL: &str = "ws://localhost:9090";
pub const DEFAULT_STATUS_TOPIC: &str = "/hunter_status";
pub const DEFAULT_POSE_TOPIC: &str = "/gnss/septentrio/raw/fix";
pub const DEFAULT_PATH_TOPIC: &str = "/gps/waypoints";

/// Live source settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSourceConfig {
    pub url: String,
    pub status_topic: String,
    pub pose_topic: String,
    pub path_topic: String,
    pub position_source: PositionSource,
}

impl Default for LiveSourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_TRANSPORT_URL.to_string(),
            status_topic: DEFAULT_STATUS_TOPIC.to_string(),
            pose_topic: DEFAULT_POSE_TOPIC.to_string(),
            path_topic: DEFAULT_PATH_TOPIC.to_string(),
            position_source: PositionSource::default(),
        }
    }
}

impl LiveSourceConfig {
    /// `(topic, message type)` for each channel, in subscribe order.
    pub fn channels(&self) -> [(String, &'static str); 3] {
        let pose_type = match self.position_source {
            PositionSource::Odometry => ODOMETRY_MESSAGE_TYPE,
            PositionSource::Gps => FIX_MESSAGE_TYPE,
        };
        [
            (self.status_topic.clone(), STATUS_MESSAGE_TYPE),
            (self.pose_topic.clone(), pose_type),
            (self.path_topic.clone(), PATH_MESSAGE_TYPE),
        ]
    }
}

/// Publish/subscribe telemetry source.
pub struct LiveSource<T: Transport> {
    transport: T,
    config: LiveSourceConfig,
    origin: GeoPoint,
    sink: SampleSink,
    cancel: CancellationToken,
    connected: bool,
    reported: Option<bool>,
    /// Topics with a subscribe issued and not yet unsubscribed.
    subscribed: Vec<String>,
    dropped_while_disconnected: u64,
    discarded: u64,
}

impl<T: Transport> LiveSource<T> {
    pub fn new(
        transport: T,
        config: LiveSourceConfig,
        origin: GeoPoint,
        sink: SampleSink,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            transport,
            config,
            origin,
            sink,
            cancel,
            connected: false,
            reported: None,
            subscribed: Vec::new(),
            dropped_while_disconnected: 0,
            discarded: 0,
        }
    }

    /// Start the source as an async task.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(mut self) {
        info!(
            url = %self.config.url,
            status_topic = %self.config.status_topic,
            pose_topic = %self.config.pose_topic,
            path_topic = %self.config.path_topic,
            position_source = %self.config.position_source,
            "Live telemetry source started"
        );

        let connected = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            result = self.transport.connect(&self.config.url) => Some(result),
        };

        let proceed = match connected {
            // Torn down mid-connect: whatever the connect would have done is discarded.
            None => false,
            Some(Ok(())) => self.set_connected(true).await && self.subscribe_all().await,
            Some(Err(e)) => {
                warn!(error = %e, "Live transport connect failed");
                self.set_connected(false).await
            }
        };

        if proceed {
            self.event_loop().await;
        }

        self.teardown();
        info!(
            dropped_while_disconnected = self.dropped_while_disconnected,
            discarded = self.discarded,
            "Live telemetry source stopped"
        );
    }

    async fn event_loop(&mut self) {
        loop {
            let event = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                event = self.transport.next_event() => event,
            };

            let keep_going = match event {
                Some(TransportEvent::Connected) => {
                    info!("Live transport connected");
                    self.set_connected(true).await && self.subscribe_all().await
                }
                Some(TransportEvent::Error(message)) => {
                    warn!(error = %message, "Live transport error");
                    self.set_connected(false).await
                }
                Some(TransportEvent::Closed) => {
                    info!("Live transport closed");
                    self.set_connected(false).await
                }
                Some(TransportEvent::Message { topic, payload }) => {
                    self.handle_message(&topic, &payload).await
                }
                None => {
                    debug!("Live transport finished, idling until reconfigured");
                    if self.set_connected(false).await {
                        self.cancel.cancelled().await;
                    }
                    false
                }
            };

            if !keep_going {
                return;
            }
        }
    }

    /// Subscribe every channel not yet subscribed.
    ///
    /// Returns `false` if cancelled; the caller must then tear down.
    async fn subscribe_all(&mut self) -> bool {
        for (topic, message_type) in self.config.channels() {
            if self.subscribed.contains(&topic) {
                continue;
            }

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                result = self.transport.subscribe(&topic, message_type) => Some(result),
            };

            match result {
                None => {
                    // The request may already be on the wire; unwind it too.
                    self.subscribed.push(topic);
                    return false;
                }
                Some(Ok(())) => {
                    debug!(topic = %topic, message_type, "Subscribed");
                    self.subscribed.push(topic);
                }
                Some(Err(e)) => {
                    warn!(
                        topic = %topic,
                        message_type,
                        error = %e,
                        "Live subscribe failed, waiting for the transport to reconnect"
                    );
                    if !self.set_connected(false).await {
                        return false;
                    }
                }
            }
        }
        true
    }

    async fn handle_message(&mut self, topic: &str, payload: &Value) -> bool {
        if !self.connected {
            self.dropped_while_disconnected += 1;
            trace!(topic, "Dropping message while disconnected");
            return true;
        }

        let event = if topic == self.config.status_topic {
            VehicleStatus::from_json(payload)
                .map(SourceEvent::Status)
                .map_err(messages::DecodeError::from)
        } else if topic == self.config.pose_topic {
            let pose = match self.config.position_source {
                PositionSource::Gps => messages::decode_fix(payload),
                PositionSource::Odometry => messages::decode_odometry(payload, self.origin),
            };
            pose.map(SourceEvent::Pose)
        } else if topic == self.config.path_topic {
            messages::decode_path(payload).map(SourceEvent::Path)
        } else {
            trace!(topic, "Ignoring message on unknown topic");
            return true;
        };

        match event {
            Ok(event) => self.sink.emit(event).await,
            Err(e) => {
                self.discarded += 1;
                debug!(topic, error = %e, "Discarding live sample");
                true
            }
        }
    }

    /// Record the connection state, reporting it when it changes.
    ///
    /// Returns `false` once the consumer is gone.
    async fn set_connected(&mut self, connected: bool) -> bool {
        self.connected = connected;
        if self.reported == Some(connected) {
            return true;
        }
        self.reported = Some(connected);
        self.sink.emit(SourceEvent::Connection(connected)).await
    }

    fn teardown(&mut self) {
        for topic in self.subscribed.drain(..).rev() {
            if let Err(e) = self.transport.unsubscribe(&topic) {
                debug!(topic = %topic, error = %e, "Unsubscribe failed during teardown");
            }
        }
        self.transport.close();
    }
}
