//! Camera and view state.

mod camera;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

pub use camera::{CameraController, CameraMode};

use crate::geo::GeoPoint;

/// Default map zoom level.
pub const DEFAULT_ZOOM: f64 = 16.0;

/// Base map style selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleKey {
    #[default]
    Dark,
    Street,
    Satellite,
}

impl StyleKey {
    pub const ALL: [StyleKey; 3] = [StyleKey::Dark, StyleKey::Street, StyleKey::Satellite];

    pub fn as_str(&self) -> &'static str {
        match self {
            StyleKey::Dark => "dark",
            StyleKey::Street => "street",
            StyleKey::Satellite => "satellite",
        }
    }
}

impl fmt::Display for StyleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StyleKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dark" => Ok(StyleKey::Dark),
            "street" => Ok(StyleKey::Street),
            "satellite" => Ok(StyleKey::Satellite),
            other => Err(format!(
                "unknown style '{}' (expected dark, street, or satellite)",
                other
            )),
        }
    }
}

/// Engine-side view of the map camera.
///
/// `center` and `zoom` belong to the render surface. The engine only
/// mirrors them, except when follow mode forces a pan.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub camera: CameraController,
    pub center: GeoPoint,
    pub zoom: f64,
    pub style: StyleKey,
}

impl ViewState {
    pub fn new(center: GeoPoint, zoom: f64, style: StyleKey) -> Self {
        Self {
            camera: CameraController::new(),
            center,
            zoom,
            style,
        }
    }

    /// Record the camera position reported by the render surface.
    pub fn mirror(&mut self, center: GeoPoint, zoom: f64) {
        self.center = center;
        if zoom.is_finite() {
            self.zoom = zoom;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_key_parse_round_trip() {
        for key in StyleKey::ALL {
            assert_eq!(key.as_str().parse::<StyleKey>().unwrap(), key);
        }
        assert_eq!(" Satellite ".parse::<StyleKey>().unwrap(), StyleKey::Satellite);
        assert!("terrain".parse::<StyleKey>().is_err());
    }

    #[test]
    fn test_mirror_ignores_non_finite_zoom() {
        let origin = GeoPoint::new(14.4208, 50.088).unwrap();
        let mut view = ViewState::new(origin, DEFAULT_ZOOM, StyleKey::Dark);
        let moved = GeoPoint::new(14.5, 50.1).unwrap();
        view.mirror(moved, f64::NAN);
        assert_eq!(view.center, moved);
        assert_eq!(view.zoom, DEFAULT_ZOOM);
    }
}
