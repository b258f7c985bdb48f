//! Default values for all configuration settings.

use super::file::config_directory;
use super::settings::*;
use crate::render::DEFAULT_PAN_DURATION;
use crate::source::{
    PositionSource, DEFAULT_PATH_TOPIC, DEFAULT_POSE_TOPIC, DEFAULT_RADIUS_M,
    DEFAULT_STATUS_TOPIC, DEFAULT_TICK, DEFAULT_TRANSPORT_URL,
};
use crate::track::DEFAULT_TRAIL_MAX_LENGTH;
use crate::view::{StyleKey, DEFAULT_ZOOM};

/// Default map origin (Prague).
pub const DEFAULT_ORIGIN_LAT: f64 = 50.0880;
pub const DEFAULT_ORIGIN_LON: f64 = 14.4208;

/// Zoom levels accepted from config.
pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 22.0;

pub const DEFAULT_LOG_FILE_NAME: &str = "roverwatch.log";

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            transport: TransportSettings {
                url: DEFAULT_TRANSPORT_URL.to_string(),
                status_topic: DEFAULT_STATUS_TOPIC.to_string(),
                pose_topic: DEFAULT_POSE_TOPIC.to_string(),
                path_topic: DEFAULT_PATH_TOPIC.to_string(),
                position_source: PositionSource::Gps,
            },
            map: MapSettings {
                origin_lat: DEFAULT_ORIGIN_LAT,
                origin_lon: DEFAULT_ORIGIN_LON,
                zoom: DEFAULT_ZOOM,
                style: StyleKey::Dark,
                trail_max_length: DEFAULT_TRAIL_MAX_LENGTH,
                pan_duration_ms: DEFAULT_PAN_DURATION.as_millis() as u64,
            },
            simulation: SimulationSettings {
                tick_ms: DEFAULT_TICK.as_millis() as u64,
                radius_m: DEFAULT_RADIUS_M,
                seed: None,
            },
            camera: CameraSettings::default(),
            logging: LoggingSettings {
                file: config_directory().join(DEFAULT_LOG_FILE_NAME),
            },
        }
    }
}
