//! Geographic and local-frame coordinate types.

use std::fmt;

use serde::Serialize;

use thiserror::Error;

/// Southern bound of valid latitude (degrees).
pub const MIN_LAT: f64 = -90.0;
/// Northern bound of valid latitude (degrees).
pub const MAX_LAT: f64 = 90.0;

/// Western bound of valid longitude (degrees).
pub const MIN_LON: f64 = -180.0;
/// Eastern bound of valid longitude (degrees).
pub const MAX_LON: f64 = 180.0;

/// A validated geographic position in decimal degrees.
///
/// Construction rejects anything outside the WGS84 bounds instead of
/// clamping, so every `GeoPoint` in the engine is known to be drawable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    longitude: f64,
    latitude: f64,
}

impl GeoPoint {
    /// Create a point, rejecting non-finite or out-of-range coordinates.
    pub fn new(longitude: f64, latitude: f64) -> Result<Self, GeoError> {
        if !longitude.is_finite() || !(MIN_LON..=MAX_LON).contains(&longitude) {
            return Err(GeoError::InvalidLongitude(longitude));
        }
        if !latitude.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&latitude) {
            return Err(GeoError::InvalidLatitude(latitude));
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    #[inline]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// `[lon, lat]` pair in GeoJSON axis order.
    #[inline]
    pub fn to_lng_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// Offset in meters on the local tangent plane (x east, y north).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocalOffset {
    pub x: f64,
    pub y: f64,
}

impl LocalOffset {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Errors that can occur during coordinate handling.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeoError {
    /// Latitude outside [-90, 90] or not finite
    #[error("Invalid latitude: {0} (must be between -90 and 90)")]
    InvalidLatitude(f64),

    /// Longitude outside [-180, 180] or not finite
    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),

    /// Projected position falls outside valid geographic bounds
    #[error("Projected position out of range: lon {longitude}, lat {latitude}")]
    ProjectionOutOfRange { longitude: f64, latitude: f64 },

    /// Origin sits on a pole where the east-west scale collapses
    #[error("Origin latitude {0} is too close to a pole for tangent-plane projection")]
    DegenerateOrigin(f64),
}
