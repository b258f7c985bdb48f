//! Planned route geometry, replaced wholesale on every update.

use crate::geo::GeoPoint;

/// The current planned path. The last message wins; there is no merging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlannedPath {
    points: Vec<GeoPoint>,
}

impl PlannedPath {
    /// Replace the whole path. An empty input clears it.
    pub fn replace(&mut self, points: Vec<GeoPoint>) {
        self.points = points;
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn start(&self) -> Option<GeoPoint> {
        self.points.first().copied()
    }

    /// The end point, present only when the path has a distinct end (two or more points).
    pub fn end(&self) -> Option<GeoPoint> {
        if self.points.len() > 1 {
            self.points.last().copied()
        } else {
            None
        }
    }

    /// Whether a connecting line can be drawn.
    pub fn has_line(&self) -> bool {
        self.points.len() > 1
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
