//! Telemetry-to-map synchronization engine.
//!
//! The [`Engine`] is the single task that owns the track store, the camera
//! controller, the map sync driver (and through it the render surface),
//! and the active telemetry source. Every input is a discrete event:
//!
//! ```text
//!   EngineCommand ──┐
//!   SurfaceEvent ───┼──► Engine::step() ──► TrackStore / ViewState ──► MapSync ──► RenderSurface
//!   SourceSample ───┘                              │
//!                                                  └──► watch<DashboardSnapshot>
//! ```
//!
//! Events are applied one at a time in receipt order, so no two updates
//! ever interleave. Samples carry the generation of the source that sent
//! them; a switch bumps the generation after the old source has been
//! joined, and anything still queued from it is discarded.

mod handle;
mod snapshot;

#[cfg(test)]
mod tests;

pub use handle::{EngineCommand, EngineHandle};
pub use snapshot::DashboardSnapshot;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::geo::{GeoError, GeoPoint};
use crate::render::{MapSync, RenderSurface, SurfaceError, SurfaceEvent};
use crate::source::{
    ActiveSource, LiveSource, SampleSink, SimulatedSource, SourceEvent, SourceMode,
    SourceSample, TelemetrySource, TransportFactory,
};
use crate::telemetry::{StatusReadout, VehicleStatus};
use crate::track::TrackStore;
use crate::view::{CameraMode, StyleKey, ViewState};

const COMMAND_CHANNEL_CAPACITY: usize = 32;
const SAMPLE_CHANNEL_CAPACITY: usize = 256;

/// Engine construction errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid map origin: {0}")]
    InvalidOrigin(#[from] GeoError),
}

/// The synchronization engine.
pub struct Engine<S: RenderSurface, F: TransportFactory> {
    config: DashboardConfig,
    origin: GeoPoint,
    store: TrackStore,
    view: ViewState,
    sync: MapSync<S>,
    transports: F,
    mode: SourceMode,
    generation: u64,
    active: Option<ActiveSource>,
    connected: bool,
    status: Option<VehicleStatus>,
    samples_tx: mpsc::Sender<SourceSample>,
    samples_rx: mpsc::Receiver<SourceSample>,
    commands: mpsc::Receiver<EngineCommand>,
    surface_events: mpsc::UnboundedReceiver<SurfaceEvent>,
    snapshot_tx: watch::Sender<DashboardSnapshot>,
    cancel: CancellationToken,
    discarded_stale: u64,
}

impl<S: RenderSurface, F: TransportFactory> Engine<S, F> {
    /// Build an engine around an already constructed render surface.
    ///
    /// The origin is taken from `config` once and never changes. A failed
    /// surface leaves the engine running with `map_failed` set.
    pub fn new(
        config: DashboardConfig,
        mode: SourceMode,
        surface: Result<S, SurfaceError>,
        surface_events: mpsc::UnboundedReceiver<SurfaceEvent>,
        transports: F,
        cancel: CancellationToken,
    ) -> Result<(Self, EngineHandle), EngineError> {
        let origin = config.origin()?;
        let store = TrackStore::new(config.map.trail_max_length);
        let view = ViewState::new(origin, config.map.zoom, config.map.style);
        let sync = MapSync::new(surface, config.map.style, config.pan_duration());

        let (commands_tx, commands) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (samples_tx, samples_rx) = mpsc::channel(SAMPLE_CHANNEL_CAPACITY);
        let (snapshot_tx, _) = watch::channel(initial_snapshot(origin, mode));

        let mut engine = Self {
            config,
            origin,
            store,
            view,
            sync,
            transports,
            mode,
            generation: 0,
            active: None,
            connected: false,
            status: None,
            samples_tx,
            samples_rx,
            commands,
            surface_events,
            snapshot_tx,
            cancel,
            discarded_stale: 0,
        };
        engine.publish();

        let handle = EngineHandle::new(commands_tx, engine.snapshot_tx.subscribe());
        Ok((engine, handle))
    }

    pub fn mode(&self) -> SourceMode {
        self.mode
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn store(&self) -> &TrackStore {
        &self.store
    }

    pub fn camera_mode(&self) -> CameraMode {
        self.view.camera.mode()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Samples dropped because their source had already been retired.
    pub fn discarded_stale(&self) -> u64 {
        self.discarded_stale
    }

    /// Start the source for the initial mode.
    pub fn start(&mut self) {
        if self.active.is_none() {
            self.activate();
            self.publish();
        }
    }

    /// Run until shutdown, cancellation, or every handle is dropped.
    pub async fn run(mut self) {
        info!(mode = %self.mode, origin = %self.origin, "Engine started");
        self.start();

        while self.step().await {}

        self.deactivate().await;
        self.publish();
        info!(discarded_stale = self.discarded_stale, "Engine stopped");
    }

    /// Wait for and apply one event. Returns `false` when the engine should stop.
    pub async fn step(&mut self) -> bool {
        tokio::select! {
            biased;

            _ = self.cancel.cancelled() => false,

            command = self.commands.recv() => match command {
                Some(command) => self.dispatch(command).await,
                None => {
                    debug!("All engine handles dropped");
                    false
                }
            },

            Some(event) = self.surface_events.recv() => {
                self.on_surface_event(event);
                true
            }

            Some(sample) = self.samples_rx.recv() => {
                self.on_sample(sample);
                true
            }
        }
    }

    /// Apply a user action. Returns `false` for [`EngineCommand::Shutdown`].
    pub async fn dispatch(&mut self, command: EngineCommand) -> bool {
        match command {
            EngineCommand::ToggleFollow => self.toggle_follow(),
            EngineCommand::Recenter => self.recenter(),
            EngineCommand::SwitchMode(mode) => self.switch_mode(mode).await,
            EngineCommand::ApplyConfig(config) => self.apply_config(*config).await,
            EngineCommand::SetStyle(key) => self.set_style(key),
            EngineCommand::Reset => {
                info!("Trail and path cleared");
                self.store.reset();
                self.sync.sync_all(&self.store);
            }
            EngineCommand::Shutdown => {
                info!("Shutdown requested");
                return false;
            }
        }
        self.publish();
        true
    }

    /// Apply one source sample.
    pub fn on_sample(&mut self, sample: SourceSample) {
        if sample.generation != self.generation {
            self.discarded_stale += 1;
            debug!(
                sample_generation = sample.generation,
                current_generation = self.generation,
                "Discarding sample from retired source"
            );
            return;
        }

        match sample.event {
            SourceEvent::Connection(connected) => {
                if connected != self.connected {
                    info!(mode = %self.mode, connected, "Telemetry connection changed");
                }
                self.connected = connected;
            }
            _ if !self.connected => {
                debug!("Dropping sample while disconnected");
                return;
            }
            SourceEvent::Pose(pose) => {
                self.store.on_pose(pose.position);
                let follow = self.view.camera.should_pan_on_update();
                self.sync.sync_position(&self.store, follow);
                if follow {
                    self.view.center = pose.position;
                }
            }
            SourceEvent::Status(status) => {
                self.status = Some(status);
            }
            SourceEvent::Path(points) => {
                debug!(points = points.len(), "Planned path replaced");
                self.store.on_path(points);
                self.sync.sync_path(&self.store);
            }
        }
        self.publish();
    }

    /// Apply one render surface event.
    pub fn on_surface_event(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::Load => {
                debug!("Render surface loaded");
                self.sync.on_load(&self.store);
            }
            SurfaceEvent::StyleData => self.sync.on_style_data(&self.store),
            SurfaceEvent::DragStart => {
                if self.view.camera.on_user_drag() {
                    info!("Follow disengaged by user drag");
                }
            }
            SurfaceEvent::MoveEnd { center, zoom } => self.view.mirror(center, zoom),
            SurfaceEvent::Error { message, fatal } => {
                if fatal {
                    self.sync.fail(&message);
                } else {
                    warn!(error = %message, "Render surface error");
                }
            }
        }
        self.publish();
    }

    /// The most recent state as the widgets see it.
    pub fn snapshot(&self) -> DashboardSnapshot {
        let position = self.store.current_position();
        DashboardSnapshot {
            mode: self.mode,
            connected: self.connected,
            position,
            trail_len: self.store.trail().len(),
            path_len: self.store.path().len(),
            camera: self.view.camera.mode(),
            style: self.sync.style(),
            attribution: self.sync.attribution().to_string(),
            map_failed: self.sync.is_failed(),
            center: self.view.center,
            zoom: self.view.zoom,
            status: self.status.clone(),
            readout: StatusReadout::new(self.status.as_ref(), position),
            fault: StatusReadout::has_fault(self.status.as_ref()),
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }

    fn toggle_follow(&mut self) {
        let mode = self.view.camera.toggle();
        info!(camera = %mode, "Camera mode toggled");
        if mode == CameraMode::Following {
            if let Some(position) = self.store.current_position() {
                self.sync.recenter(position);
                self.view.center = position;
            }
        }
    }

    fn recenter(&mut self) {
        let Some(position) = self.store.current_position() else {
            info!("Recenter ignored, no vehicle position yet");
            return;
        };
        self.view.camera.recenter();
        self.sync.recenter(position);
        self.view.center = position;
    }

    fn set_style(&mut self, key: StyleKey) {
        if self.sync.set_style(key, &self.store) {
            self.view.style = key;
            info!(style = %key, "Map style switched");
        }
    }

    async fn switch_mode(&mut self, mode: SourceMode) {
        if mode == self.mode && self.active.is_some() {
            debug!(%mode, "Already in requested mode");
            return;
        }

        info!(from = %self.mode, to = %mode, "Switching telemetry source");
        self.deactivate().await;

        self.store.on_mode_switch();
        self.status = None;
        self.connected = false;
        self.sync.sync_all(&self.store);

        self.mode = mode;
        self.activate();
    }

    async fn apply_config(&mut self, config: DashboardConfig) {
        if config.map.origin_lat != self.config.map.origin_lat
            || config.map.origin_lon != self.config.map.origin_lon
        {
            warn!(
                origin = %self.origin,
                requested_lat = config.map.origin_lat,
                requested_lon = config.map.origin_lon,
                "Origin is fixed for this session, ignoring change"
            );
        }

        if config.map.trail_max_length != self.config.map.trail_max_length {
            info!(
                trail_max_length = config.map.trail_max_length,
                "Trail length changed"
            );
            self.store.set_trail_max_length(config.map.trail_max_length);
            self.sync.sync_all(&self.store);
        }

        self.sync.set_pan_duration(config.pan_duration());

        if config.map.style != self.sync.style() {
            self.set_style(config.map.style);
        }

        let transport_changed = config.transport != self.config.transport;
        self.config = config;
        self.config.map.origin_lat = self.origin.latitude();
        self.config.map.origin_lon = self.origin.longitude();

        if transport_changed && self.mode == SourceMode::Live && self.active.is_some() {
            info!(url = %self.config.transport.url, "Transport settings changed, reconnecting");
            self.deactivate().await;
            self.connected = false;
            self.activate();
        }
    }

    /// Start a source for the current mode under a fresh generation.
    fn activate(&mut self) {
        self.generation += 1;
        let cancel = self.cancel.child_token();
        let sink = SampleSink::new(self.generation, self.samples_tx.clone(), cancel.clone());

        let source = match self.mode {
            SourceMode::Simulated => TelemetrySource::Simulated(SimulatedSource::new(
                self.config.simulation_config(),
                self.origin,
                sink,
                cancel.clone(),
            )),
            SourceMode::Live => TelemetrySource::Live(LiveSource::new(
                self.transports.create(),
                self.config.live_source_config(),
                self.origin,
                sink,
                cancel.clone(),
            )),
        };

        self.active = Some(source.start(self.generation, cancel));
    }

    /// Stop the active source and wait until it has released everything.
    async fn deactivate(&mut self) {
        if let Some(active) = self.active.take() {
            active.stop().await;
        }
    }
}

fn initial_snapshot(origin: GeoPoint, mode: SourceMode) -> DashboardSnapshot {
    DashboardSnapshot {
        mode,
        connected: false,
        position: None,
        trail_len: 0,
        path_len: 0,
        camera: CameraMode::default(),
        style: StyleKey::default(),
        attribution: String::new(),
        map_failed: false,
        center: origin,
        zoom: 0.0,
        status: None,
        readout: StatusReadout::default(),
        fault: false,
    }
}
