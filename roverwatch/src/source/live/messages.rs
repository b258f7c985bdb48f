//! Decoders for live feed messages.
//!
//! Message layouts follow the ROS types carried over rosbridge:
//! `sensor_msgs/NavSatFix`, `nav_msgs/Odometry`, and a `NavSatFixList`
//! carrying `fixes[]`.

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::geo::{self, GeoError, GeoPoint, LocalOffset};
use crate::source::Pose;
use crate::telemetry::status::{number_field, value_kind};
use crate::telemetry::SampleError;

pub const STATUS_MESSAGE_TYPE: &str = "hunter_msgs/HunterStatus";
pub const FIX_MESSAGE_TYPE: &str = "sensor_msgs/NavSatFix";
pub const ODOMETRY_MESSAGE_TYPE: &str = "nav_msgs/Odometry";
pub const PATH_MESSAGE_TYPE: &str = "artemis_msgs/msg/NavSatFixList";

/// Why a live message was discarded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Sample(#[from] SampleError),

    #[error(transparent)]
    Geo(#[from] GeoError),
}

/// Decode a geographic fix. Both latitude and longitude are required.
pub fn decode_fix(msg: &Value) -> Result<Pose, DecodeError> {
    let latitude = number_field(msg, "latitude").ok_or(SampleError::MissingField {
        kind: "fix",
        field: "latitude",
    })?;
    let longitude = number_field(msg, "longitude").ok_or(SampleError::MissingField {
        kind: "fix",
        field: "longitude",
    })?;

    Ok(Pose {
        position: GeoPoint::new(longitude, latitude)?,
        source_timestamp: decode_stamp(msg),
    })
}

/// Decode local-frame odometry and project it around `origin`.
pub fn decode_odometry(msg: &Value, origin: GeoPoint) -> Result<Pose, DecodeError> {
    let position = msg
        .pointer("/pose/pose/position")
        .ok_or(SampleError::MissingField {
            kind: "odometry",
            field: "pose.pose.position",
        })?;
    let x = number_field(position, "x").ok_or(SampleError::MissingField {
        kind: "odometry",
        field: "x",
    })?;
    let y = number_field(position, "y").ok_or(SampleError::MissingField {
        kind: "odometry",
        field: "y",
    })?;

    Ok(Pose {
        position: geo::project(LocalOffset::new(x, y), origin)?,
        source_timestamp: decode_stamp(msg),
    })
}

/// Decode a planned path.
///
/// Fixes without usable coordinates are skipped individually. A missing
/// `fixes` array is an empty path, which clears the overlay.
pub fn decode_path(msg: &Value) -> Result<Vec<GeoPoint>, DecodeError> {
    if !msg.is_object() {
        return Err(SampleError::Malformed {
            kind: "path",
            reason: format!("expected object, got {}", value_kind(msg)),
        }
        .into());
    }

    let points = msg
        .get("fixes")
        .and_then(Value::as_array)
        .map(|fixes| {
            fixes
                .iter()
                .filter_map(|fix| {
                    let lon = number_field(fix, "longitude")?;
                    let lat = number_field(fix, "latitude")?;
                    GeoPoint::new(lon, lat).ok()
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(points)
}

/// Read a ROS header stamp, accepting both ROS 2 (`sec`/`nanosec`) and
/// ROS 1 (`secs`/`nsecs`) field names.
pub fn decode_stamp(msg: &Value) -> Option<DateTime<Utc>> {
    let stamp = msg.pointer("/header/stamp")?;
    let secs = stamp
        .get("sec")
        .or_else(|| stamp.get("secs"))
        .and_then(Value::as_i64)?;
    let nanos = stamp
        .get("nanosec")
        .or_else(|| stamp.get("nsecs"))
        .and_then(Value::as_u64)
        .unwrap_or(0);
    DateTime::from_timestamp(secs, u32::try_from(nanos).ok()?)
}
