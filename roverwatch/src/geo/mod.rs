//! Flat-Earth tangent-plane projection.
//!
//! Converts local east/north offsets in meters around a fixed [`GeoPoint`]
//! origin into longitude/latitude and back. The approximation ignores Earth
//! curvature and is only accurate for offsets of a few tens of kilometers,
//! which covers a ground vehicle operating around its base.

mod types;

pub use types::{GeoError, GeoPoint, LocalOffset, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

/// Meters per degree of latitude (and of longitude at the equator).
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Below this east-west scale the origin is treated as a pole.
const MIN_METERS_PER_DEGREE_LNG: f64 = 1e-6;

/// Meters per degree of longitude at the given latitude.
#[inline]
pub fn meters_per_degree_lng(latitude: f64) -> f64 {
    latitude.to_radians().cos() * METERS_PER_DEGREE
}

/// Project a local offset around `origin` into geographic coordinates.
///
/// # Errors
///
/// Returns [`GeoError::ProjectionOutOfRange`] when the result leaves the
/// valid longitude/latitude bounds. The caller should discard the sample.
pub fn project(offset: LocalOffset, origin: GeoPoint) -> Result<GeoPoint, GeoError> {
    let lng_scale = meters_per_degree_lng(origin.latitude());
    if lng_scale.abs() < MIN_METERS_PER_DEGREE_LNG {
        return Err(GeoError::DegenerateOrigin(origin.latitude()));
    }

    let longitude = origin.longitude() + offset.x / lng_scale;
    let latitude = origin.latitude() + offset.y / METERS_PER_DEGREE;

    GeoPoint::new(longitude, latitude)
        .map_err(|_| GeoError::ProjectionOutOfRange {
            longitude,
            latitude,
        })
}

/// Inverse of [`project`]: the local offset of `point` relative to `origin`.
pub fn unproject(point: GeoPoint, origin: GeoPoint) -> Result<LocalOffset, GeoError> {
    let lng_scale = meters_per_degree_lng(origin.latitude());
    if lng_scale.abs() < MIN_METERS_PER_DEGREE_LNG {
        return Err(GeoError::DegenerateOrigin(origin.latitude()));
    }

    Ok(LocalOffset {
        x: (point.longitude() - origin.longitude()) * lng_scale,
        y: (point.latitude() - origin.latitude()) * METERS_PER_DEGREE,
    })
}
