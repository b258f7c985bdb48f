//! Display-facing engine state.

use serde::Serialize;

use crate::geo::GeoPoint;
use crate::source::SourceMode;
use crate::telemetry::{StatusReadout, VehicleStatus};
use crate::view::{CameraMode, StyleKey};

/// Everything the status and map widgets need, published after every
/// engine step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub mode: SourceMode,
    pub connected: bool,
    /// Current vehicle position, if any sample has arrived since the last clear.
    pub position: Option<GeoPoint>,
    pub trail_len: usize,
    pub path_len: usize,
    pub camera: CameraMode,
    pub style: StyleKey,
    pub attribution: String,
    /// The render surface failed; widgets show a placeholder instead of the map.
    pub map_failed: bool,
    pub center: GeoPoint,
    pub zoom: f64,
    /// Last raw status, cleared on mode switch.
    pub status: Option<VehicleStatus>,
    pub readout: StatusReadout,
    /// Alarm state for the status panel.
    pub fault: bool,
}
