//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.

use std::path::PathBuf;
use std::time::Duration;

use crate::geo::{GeoError, GeoPoint};
use crate::source::{LiveSourceConfig, PositionSource, SimulationConfig, DEFAULT_TIME_STEP};
use crate::view::StyleKey;

/// Complete dashboard configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub transport: TransportSettings,
    pub map: MapSettings,
    pub simulation: SimulationSettings,
    pub camera: CameraSettings,
    pub logging: LoggingSettings,
}

/// Live transport configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSettings {
    /// Websocket URL of the bridge (ws:// or wss://)
    pub url: String,
    pub status_topic: String,
    pub pose_topic: String,
    pub path_topic: String,
    /// Whether `pose_topic` carries local odometry or geographic fixes
    pub position_source: PositionSource,
}

/// Map configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSettings {
    /// Origin latitude. Fixed for the lifetime of the engine.
    pub origin_lat: f64,
    /// Origin longitude. Fixed for the lifetime of the engine.
    pub origin_lon: f64,
    pub zoom: f64,
    pub style: StyleKey,
    /// Maximum number of trail samples kept
    pub trail_max_length: usize,
    /// Duration of follow-mode camera pans
    pub pan_duration_ms: u64,
}

/// Simulated source configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSettings {
    pub tick_ms: u64,
    pub radius_m: f64,
    /// Fixed RNG seed; random when unset
    pub seed: Option<u64>,
}

/// Camera feed configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CameraSettings {
    /// Front camera stream; derived from the transport URL when unset
    pub front_url: Option<String>,
    /// Rear camera stream; derived from the transport URL when unset
    pub rear_url: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}

/// Resolved camera stream URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFeeds {
    pub front: String,
    pub rear: String,
}

impl DashboardConfig {
    /// The map origin.
    pub fn origin(&self) -> Result<GeoPoint, GeoError> {
        GeoPoint::new(self.map.origin_lon, self.map.origin_lat)
    }

    pub fn pan_duration(&self) -> Duration {
        Duration::from_millis(self.map.pan_duration_ms)
    }

    pub fn live_source_config(&self) -> LiveSourceConfig {
        LiveSourceConfig {
            url: self.transport.url.clone(),
            status_topic: self.transport.status_topic.clone(),
            pose_topic: self.transport.pose_topic.clone(),
            path_topic: self.transport.path_topic.clone(),
            position_source: self.transport.position_source,
        }
    }

    pub fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            tick: Duration::from_millis(self.simulation.tick_ms.max(1)),
            radius_m: self.simulation.radius_m,
            time_step: DEFAULT_TIME_STEP,
            seed: self.simulation.seed,
        }
    }

    /// Camera stream URLs, explicit or derived from the transport host.
    pub fn camera_feeds(&self) -> CameraFeeds {
        CameraFeeds {
            front: self
                .camera
                .front_url
                .clone()
                .unwrap_or_else(|| derive_camera_url(&self.transport.url, 1)),
            rear: self
                .camera
                .rear_url
                .clone()
                .unwrap_or_else(|| derive_camera_url(&self.transport.url, 2)),
        }
    }
}

const CAMERA_STREAM_PORT: u16 = 8080;
const FALLBACK_CAMERA_BASE: &str = "http://localhost:8080";

/// Build the stream URL of camera `index` served next to the bridge.
///
/// `wss` maps to `https`, anything else to `http`. A URL without a
/// recognizable scheme or host falls back to localhost.
pub fn derive_camera_url(transport_url: &str, index: u8) -> String {
    let base = camera_base(transport_url).unwrap_or_else(|| FALLBACK_CAMERA_BASE.to_string());
    format!(
        "{}/stream?topic=/camera/camera{}/color/image_raw",
        base, index
    )
}

fn camera_base(transport_url: &str) -> Option<String> {
    let (scheme, rest) = transport_url.trim().split_once("://")?;
    let http_scheme = match scheme.to_lowercase().as_str() {
        "wss" | "https" => "https",
        "ws" | "http" => "http",
        _ => return None,
    };

    let authority = rest.split(['/', '?', '#']).next()?;
    let authority = authority.rsplit('@').next()?;
    let host = if authority.starts_with('[') {
        // IPv6 literal keeps its brackets
        let end = authority.find(']')?;
        &authority[..=end]
    } else {
        authority.split(':').next()?
    };

    if host.is_empty() {
        return None;
    }
    Some(format!("{}://{}:{}", http_scheme, host, CAMERA_STREAM_PORT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_url_from_ws_host() {
        assert_eq!(
            derive_camera_url("ws://10.0.0.5:9090", 1),
            "http://10.0.0.5:8080/stream?topic=/camera/camera1/color/image_raw"
        );
    }

    #[test]
    fn test_camera_url_secure_scheme() {
        assert_eq!(
            derive_camera_url("wss://rover.example.org/bridge", 2),
            "https://rover.example.org:8080/stream?topic=/camera/camera2/color/image_raw"
        );
    }

    #[test]
    fn test_camera_url_ipv6_host() {
        assert_eq!(
            derive_camera_url("ws://[::1]:9090", 1),
            "http://[::1]:8080/stream?topic=/camera/camera1/color/image_raw"
        );
    }

    #[test]
    fn test_camera_url_falls_back_on_garbage() {
        for url in ["", "not a url", "ftp://host", "ws://"] {
            assert_eq!(
                derive_camera_url(url, 1),
                "http://localhost:8080/stream?topic=/camera/camera1/color/image_raw",
                "url {:?}",
                url
            );
        }
    }

    #[test]
    fn test_explicit_camera_url_wins() {
        let mut config = DashboardConfig::default();
        config.camera.rear_url = Some("http://cam/rear".to_string());

        let feeds = config.camera_feeds();
        assert_eq!(feeds.rear, "http://cam/rear");
        assert!(feeds.front.starts_with("http://localhost:8080/"));
    }

    #[test]
    fn test_live_source_config_mirrors_transport() {
        let mut config = DashboardConfig::default();
        config.transport.url = "ws://rover:9090".to_string();
        config.transport.position_source = PositionSource::Odometry;

        let live = config.live_source_config();
        assert_eq!(live.url, "ws://rover:9090");
        assert_eq!(live.position_source, PositionSource::Odometry);
        assert_eq!(live.status_topic, config.transport.status_topic);
    }
}
