//! Bounded FIFO history of recent positions.

use std::collections::VecDeque;

use crate::geo::GeoPoint;

/// Default number of positions kept in the trail.
pub const DEFAULT_TRAIL_MAX_LENGTH: usize = 300;

/// Recent-position history, oldest first.
///
/// Appends evict the oldest point once `max_len` is reached, so the
/// length never exceeds the configured bound.
#[derive(Debug, Clone)]
pub struct Trail {
    points: VecDeque<GeoPoint>,
    max_len: usize,
}

impl Trail {
    /// Create an empty trail. A zero bound is raised to one.
    pub fn new(max_len: usize) -> Self {
        let max_len = max_len.max(1);
        Self {
            points: VecDeque::with_capacity(max_len),
            max_len,
        }
    }

    pub fn push(&mut self, point: GeoPoint) {
        while self.points.len() >= self.max_len {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    /// Change the bound, evicting the oldest points if it shrank.
    pub fn set_max_len(&mut self, max_len: usize) {
        self.max_len = max_len.max(1);
        while self.points.len() > self.max_len {
            self.points.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Most recently appended point.
    pub fn last(&self) -> Option<GeoPoint> {
        self.points.back().copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Points in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &GeoPoint> + '_ {
        self.points.iter()
    }
}

impl Default for Trail {
    fn default() -> Self {
        Self::new(DEFAULT_TRAIL_MAX_LENGTH)
    }
}
