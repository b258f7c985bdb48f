//! Trail and path storage.
//!
//! [`TrackStore`] is the single owner of ingested positions. It keeps the
//! bounded [`Trail`] of recent positions and the replaceable
//! [`PlannedPath`]; nothing else mutates either.

mod path;
mod trail;

pub use path::PlannedPath;
pub use trail::{Trail, DEFAULT_TRAIL_MAX_LENGTH};

use crate::geo::GeoPoint;

/// Owner of the trail and planned path.
#[derive(Debug, Clone, Default)]
pub struct TrackStore {
    trail: Trail,
    path: PlannedPath,
}

impl TrackStore {
    pub fn new(trail_max_length: usize) -> Self {
        Self {
            trail: Trail::new(trail_max_length),
            path: PlannedPath::default(),
        }
    }

    /// Append a pose to the trail. It becomes the current position.
    pub fn on_pose(&mut self, position: GeoPoint) {
        self.trail.push(position);
    }

    /// Replace the planned path. Empty input clears it.
    pub fn on_path(&mut self, points: Vec<GeoPoint>) {
        self.path.replace(points);
    }

    /// History from the previous source is meaningless in the new mode.
    pub fn on_mode_switch(&mut self) {
        self.reset();
    }

    /// Clear both trail and path.
    pub fn reset(&mut self) {
        self.trail.clear();
        self.path.clear();
    }

    pub fn set_trail_max_length(&mut self, max_len: usize) {
        self.trail.set_max_len(max_len);
    }

    pub fn current_position(&self) -> Option<GeoPoint> {
        self.trail.last()
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    pub fn path(&self) -> &PlannedPath {
        &self.path
    }
}
