//! INI serialization logic for converting `DashboardConfig` → INI string.

use std::path::Path;

use super::settings::DashboardConfig;

/// Convert a `DashboardConfig` to a commented INI string for saving.
pub(super) fn to_config_string(config: &DashboardConfig) -> String {
    let seed = config
        .simulation
        .seed
        .map(|s| s.to_string())
        .unwrap_or_default();
    let front_url = config.camera.front_url.as_deref().unwrap_or("");
    let rear_url = config.camera.rear_url.as_deref().unwrap_or("");

    format!(
        r#"[transport]
; Websocket URL of the rosbridge server (ws:// or wss://)
url = {}
; Vehicle status topic (hunter_msgs/HunterStatus)
status_topic = {}
; Position topic. Its message type follows position_source:
;   gps      - sensor_msgs/NavSatFix, used as-is
;   odometry - nav_msgs/Odometry, projected around the map origin
pose_topic = {}
position_source = {}
; Planned path topic (NavSatFixList with fixes[])
path_topic = {}

[map]
; Origin for projecting local offsets. Fixed once the dashboard starts;
; changes take effect on the next start.
origin_lat = {}
origin_lon = {}
; Initial zoom level (0-22)
zoom = {}
; Base map style: dark, street, or satellite
style = {}
; Number of recent positions drawn as the trail (default: 300)
trail_max_length = {}
; Duration of follow-mode camera pans in milliseconds (default: 500)
pan_duration_ms = {}

[simulation]
; Update interval of the simulated source in milliseconds (default: 120)
tick_ms = {}
; Radius of the simulated circular trajectory in meters (default: 140)
radius_m = {}
; Fixed random seed for reproducible synthetic faults (empty = random)
seed = {}

[camera]
; Camera stream URLs. If empty, derived from the transport host as
; http(s)://HOST:8080/stream?topic=/camera/cameraN/color/image_raw
front_url = {}
rear_url = {}

[logging]
; Log file path
file = {}
"#,
        config.transport.url,
        config.transport.status_topic,
        config.transport.pose_topic,
        config.transport.position_source,
        config.transport.path_topic,
        config.map.origin_lat,
        config.map.origin_lon,
        config.map.zoom,
        config.map.style,
        config.map.trail_max_length,
        config.map.pan_duration_ms,
        config.simulation.tick_ms,
        config.simulation.radius_m,
        seed,
        front_url,
        rear_url,
        path_to_string(&config.logging.file),
    )
}

/// Convert path to string, collapsing home dir to ~.
pub(super) fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
