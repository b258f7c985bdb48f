//! Follow-vs-free camera arbitration.

use std::fmt;

use serde::Serialize;

/// Camera behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraMode {
    /// Every new position recenters the map.
    #[default]
    Following,
    /// The user's view is authoritative; no autonomous panning.
    Free,
}

impl fmt::Display for CameraMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraMode::Following => write!(f, "Following"),
            CameraMode::Free => write!(f, "Free"),
        }
    }
}

/// Mediates between autonomous recentering and user map interaction.
///
/// A user drag always wins: it drops the camera to `Free` and only an
/// explicit user command brings it back to `Following`.
#[derive(Debug, Clone, Default)]
pub struct CameraController {
    mode: CameraMode,
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn is_following(&self) -> bool {
        self.mode == CameraMode::Following
    }

    /// The render surface reported a user-initiated drag.
    ///
    /// Returns `true` if this disengaged follow mode.
    pub fn on_user_drag(&mut self) -> bool {
        let was_following = self.is_following();
        self.mode = CameraMode::Free;
        was_following
    }

    /// Explicit recenter request; engages follow.
    pub fn recenter(&mut self) {
        self.mode = CameraMode::Following;
    }

    /// Explicit follow toggle. Returns the new mode.
    pub fn toggle(&mut self) -> CameraMode {
        self.mode = match self.mode {
            CameraMode::Following => CameraMode::Free,
            CameraMode::Free => CameraMode::Following,
        };
        self.mode
    }

    /// Whether a new current position should trigger a pan.
    pub fn should_pan_on_update(&self) -> bool {
        self.is_following()
    }
}
