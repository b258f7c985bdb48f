//! Telemetry source adapters.
//!
//! Two variants produce the same [`SourceEvent`] stream:
//!
//! - [`SimulatedSource`] - clock-driven circular trajectory with synthetic status
//! - [`LiveSource`] - publish/subscribe feed over a [`Transport`]
//!
//! Exactly one variant runs at a time. Every emitted event is tagged with
//! the generation it was started under, so the engine can discard
//! anything a retired source sent after the switch point.
//!
//! # Lifecycle
//!
//! ```text
//! TelemetrySource::start() ──► ActiveSource { cancel, task }
//!                                   │
//!                  ActiveSource::stop().await
//!                                   │
//!          cancel token fires ──► task unwinds timers/subscriptions ──► joined
//! ```

pub mod live;
pub mod simulated;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::geo::GeoPoint;
use crate::telemetry::VehicleStatus;

pub use live::{
    LiveSource, LiveSourceConfig, MemoryTransport, MemoryTransportFactory, MemoryTransportHandle,
    RosbridgeTransport, Transport, TransportCall, TransportError, TransportEvent, TransportFactory,
    DEFAULT_PATH_TOPIC, DEFAULT_POSE_TOPIC, DEFAULT_STATUS_TOPIC, DEFAULT_TRANSPORT_URL,
};
pub use simulated::{
    CircularTrajectory, SimulatedSource, SimulationConfig, DEFAULT_RADIUS_M, DEFAULT_TICK,
    DEFAULT_TIME_STEP,
};

/// Which adapter variant is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    #[default]
    Simulated,
    Live,
}

impl SourceMode {
    /// The other variant.
    pub fn toggled(self) -> Self {
        match self {
            SourceMode::Simulated => SourceMode::Live,
            SourceMode::Live => SourceMode::Simulated,
        }
    }
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceMode::Simulated => write!(f, "simulated"),
            SourceMode::Live => write!(f, "live"),
        }
    }
}

impl FromStr for SourceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simulated" | "sim" => Ok(SourceMode::Simulated),
            "live" => Ok(SourceMode::Live),
            other => Err(format!("unknown mode '{}' (expected simulated or live)", other)),
        }
    }
}

/// How the live feed reports position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionSource {
    /// Local-frame odometry, projected around the origin.
    Odometry,
    /// Direct geographic fix, used as-is.
    #[default]
    Gps,
}

impl PositionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionSource::Odometry => "odometry",
            PositionSource::Gps => "gps",
        }
    }
}

impl fmt::Display for PositionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PositionSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "odometry" | "odom" => Ok(PositionSource::Odometry),
            "gps" | "fix" => Ok(PositionSource::Gps),
            other => Err(format!(
                "unknown position source '{}' (expected odometry or gps)",
                other
            )),
        }
    }
}

/// A position sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: GeoPoint,
    pub source_timestamp: Option<DateTime<Utc>>,
}

impl Pose {
    pub fn new(position: GeoPoint) -> Self {
        Self {
            position,
            source_timestamp: None,
        }
    }
}

/// Uniform output of every source variant.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    /// Transport connection state changed.
    Connection(bool),
    Pose(Pose),
    Status(VehicleStatus),
    /// Full replacement of the planned path.
    Path(Vec<GeoPoint>),
}

/// A [`SourceEvent`] tagged with the generation of the source that sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSample {
    pub generation: u64,
    pub event: SourceEvent,
}

/// Sending half handed to a running source.
///
/// Shares the source's cancel token, so a send blocked on a full queue
/// gives up as soon as the source is stopped.
#[derive(Debug, Clone)]
pub struct SampleSink {
    generation: u64,
    tx: mpsc::Sender<SourceSample>,
    cancel: CancellationToken,
}

impl SampleSink {
    pub fn new(
        generation: u64,
        tx: mpsc::Sender<SourceSample>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            generation,
            tx,
            cancel,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Deliver an event. Returns `false` once the receiver is gone or the
    /// source has been cancelled.
    pub async fn emit(&self, event: SourceEvent) -> bool {
        let sample = SourceSample {
            generation: self.generation,
            event,
        };
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            result = self.tx.send(sample) => result.is_ok(),
        }
    }
}

/// A configured source variant, ready to start.
pub enum TelemetrySource<T: Transport> {
    Simulated(SimulatedSource),
    Live(LiveSource<T>),
}

impl<T: Transport> TelemetrySource<T> {
    pub fn mode(&self) -> SourceMode {
        match self {
            TelemetrySource::Simulated(_) => SourceMode::Simulated,
            TelemetrySource::Live(_) => SourceMode::Live,
        }
    }

    /// Spawn the source. `cancel` must be the token the source was built with.
    pub fn start(self, generation: u64, cancel: CancellationToken) -> ActiveSource {
        let mode = self.mode();
        let task = match self {
            TelemetrySource::Simulated(source) => source.start(),
            TelemetrySource::Live(source) => source.start(),
        };
        tracing::info!(%mode, generation, "Telemetry source started");
        ActiveSource {
            mode,
            generation,
            cancel,
            task,
        }
    }
}

/// Handle to the running source.
#[derive(Debug)]
pub struct ActiveSource {
    mode: SourceMode,
    generation: u64,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ActiveSource {
    pub fn mode(&self) -> SourceMode {
        self.mode
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cancel the source and wait until it has released its timer or
    /// transport subscriptions.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(mode = %self.mode, error = %e, "Telemetry source task ended abnormally");
        }
        tracing::info!(mode = %self.mode, generation = self.generation, "Telemetry source stopped");
    }
}
