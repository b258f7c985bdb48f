//! INI parsing logic for converting `Ini` → `DashboardConfig`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::Ini;

use super::defaults::{MAX_ZOOM, MIN_ZOOM};
use super::file::ConfigFileError;
use super::settings::DashboardConfig;
use crate::geo::{MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};
use crate::source::PositionSource;
use crate::view::StyleKey;

/// Parse an `Ini` object into a `DashboardConfig`.
///
/// Starts from `DashboardConfig::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<DashboardConfig, ConfigFileError> {
    let mut config = DashboardConfig::default();

    // [transport] section
    if let Some(section) = ini.section(Some("transport")) {
        if let Some(v) = section.get("url") {
            let v = v.trim();
            if !is_websocket_url(v) {
                return Err(invalid(
                    "transport",
                    "url",
                    v,
                    "must start with 'ws://' or 'wss://'",
                ));
            }
            config.transport.url = v.to_string();
        }
        if let Some(v) = section.get("status_topic") {
            config.transport.status_topic = parse_topic("status_topic", v)?;
        }
        if let Some(v) = section.get("pose_topic") {
            config.transport.pose_topic = parse_topic("pose_topic", v)?;
        }
        if let Some(v) = section.get("path_topic") {
            config.transport.path_topic = parse_topic("path_topic", v)?;
        }
        if let Some(v) = section.get("position_source") {
            config.transport.position_source = PositionSource::from_str(v.trim()).map_err(|_| {
                invalid(
                    "transport",
                    "position_source",
                    v,
                    "must be 'odometry' or 'gps'",
                )
            })?;
        }
    }

    // [map] section
    if let Some(section) = ini.section(Some("map")) {
        if let Some(v) = section.get("origin_lat") {
            config.map.origin_lat = parse_ranged("map", "origin_lat", v, MIN_LAT, MAX_LAT)?;
        }
        if let Some(v) = section.get("origin_lon") {
            config.map.origin_lon = parse_ranged("map", "origin_lon", v, MIN_LON, MAX_LON)?;
        }
        if let Some(v) = section.get("zoom") {
            config.map.zoom = parse_ranged("map", "zoom", v, MIN_ZOOM, MAX_ZOOM)?;
        }
        if let Some(v) = section.get("style") {
            config.map.style = StyleKey::from_str(v.trim()).map_err(|_| {
                invalid("map", "style", v, "must be one of: dark, street, satellite")
            })?;
        }
        if let Some(v) = section.get("trail_max_length") {
            let parsed: usize = v.trim().parse().map_err(|_| {
                invalid("map", "trail_max_length", v, "must be a positive integer")
            })?;
            if parsed == 0 {
                return Err(invalid(
                    "map",
                    "trail_max_length",
                    v,
                    "must be at least 1",
                ));
            }
            config.map.trail_max_length = parsed;
        }
        if let Some(v) = section.get("pan_duration_ms") {
            config.map.pan_duration_ms = v.trim().parse().map_err(|_| {
                invalid(
                    "map",
                    "pan_duration_ms",
                    v,
                    "must be a positive integer (milliseconds)",
                )
            })?;
        }
    }

    // [simulation] section
    if let Some(section) = ini.section(Some("simulation")) {
        if let Some(v) = section.get("tick_ms") {
            let parsed: u64 = v.trim().parse().map_err(|_| {
                invalid(
                    "simulation",
                    "tick_ms",
                    v,
                    "must be a positive integer (milliseconds)",
                )
            })?;
            if parsed == 0 {
                return Err(invalid("simulation", "tick_ms", v, "must be at least 1"));
            }
            config.simulation.tick_ms = parsed;
        }
        if let Some(v) = section.get("radius_m") {
            config.simulation.radius_m =
                parse_ranged("simulation", "radius_m", v, f64::MIN_POSITIVE, 1_000_000.0)?;
        }
        if let Some(v) = section.get("seed") {
            let v = v.trim();
            config.simulation.seed = if v.is_empty() {
                None
            } else {
                Some(v.parse().map_err(|_| {
                    invalid("simulation", "seed", v, "must be an unsigned integer or empty")
                })?)
            };
        }
    }

    // [camera] section
    if let Some(section) = ini.section(Some("camera")) {
        if let Some(v) = section.get("front_url") {
            config.camera.front_url = parse_optional_http_url("front_url", v)?;
        }
        if let Some(v) = section.get("rear_url") {
            config.camera.rear_url = parse_optional_http_url("rear_url", v)?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

pub(super) fn is_websocket_url(value: &str) -> bool {
    (value.starts_with("ws://") && value.len() > "ws://".len())
        || (value.starts_with("wss://") && value.len() > "wss://".len())
}

pub(super) fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_topic(key: &str, value: &str) -> Result<String, ConfigFileError> {
    let v = value.trim();
    if !v.starts_with('/') || v.len() < 2 {
        return Err(invalid("transport", key, v, "must be a topic name starting with '/'"));
    }
    Ok(v.to_string())
}

fn parse_ranged(
    section: &str,
    key: &str,
    value: &str,
    min: f64,
    max: f64,
) -> Result<f64, ConfigFileError> {
    let reason = format!("must be a number between {} and {}", min, max);
    let parsed: f64 = value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, &reason))?;
    if !parsed.is_finite() || parsed < min || parsed > max {
        return Err(invalid(section, key, value, &reason));
    }
    Ok(parsed)
}

fn parse_optional_http_url(key: &str, value: &str) -> Result<Option<String>, ConfigFileError> {
    let v = value.trim();
    if v.is_empty() {
        return Ok(None);
    }
    if !is_http_url(v) {
        return Err(invalid(
            "camera",
            key,
            v,
            "must be empty or a URL starting with 'http://' or 'https://'",
        ));
    }
    Ok(Some(v.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<DashboardConfig, ConfigFileError> {
        let ini = Ini::load_from_str(content).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        assert_eq!(parse("").unwrap(), DashboardConfig::default());
    }

    #[test]
    fn test_overlays_present_keys_only() {
        let config = parse(
            "[transport]\nurl = wss://rover.local:9443\nposition_source = odometry\n\
             [map]\nstyle = satellite\ntrail_max_length = 50\n",
        )
        .unwrap();

        assert_eq!(config.transport.url, "wss://rover.local:9443");
        assert_eq!(config.transport.position_source, PositionSource::Odometry);
        assert_eq!(config.map.style, StyleKey::Satellite);
        assert_eq!(config.map.trail_max_length, 50);
        // Untouched keys keep their defaults
        assert_eq!(config.transport.status_topic, "/hunter_status");
        assert_eq!(config.map.zoom, 16.0);
    }

    #[test]
    fn test_invalid_values_name_section_and_key() {
        let cases = [
            ("[transport]\nurl = http://x\n", "transport", "url"),
            ("[transport]\npose_topic = fix\n", "transport", "pose_topic"),
            ("[transport]\nposition_source = compass\n", "transport", "position_source"),
            ("[map]\norigin_lat = 91\n", "map", "origin_lat"),
            ("[map]\norigin_lon = abc\n", "map", "origin_lon"),
            ("[map]\nzoom = 30\n", "map", "zoom"),
            ("[map]\nstyle = neon\n", "map", "style"),
            ("[map]\ntrail_max_length = 0\n", "map", "trail_max_length"),
            ("[simulation]\ntick_ms = 0\n", "simulation", "tick_ms"),
            ("[simulation]\nradius_m = -5\n", "simulation", "radius_m"),
            ("[simulation]\nseed = x\n", "simulation", "seed"),
            ("[camera]\nfront_url = rtsp://cam\n", "camera", "front_url"),
        ];

        for (content, want_section, want_key) in cases {
            match parse(content) {
                Err(ConfigFileError::InvalidValue { section, key, .. }) => {
                    assert_eq!((section.as_str(), key.as_str()), (want_section, want_key));
                }
                other => panic!("expected InvalidValue for {:?}, got {:?}", content, other),
            }
        }
    }

    #[test]
    fn test_empty_optional_values_clear() {
        let config = parse("[simulation]\nseed =\n[camera]\nfront_url =\n").unwrap();
        assert_eq!(config.simulation.seed, None);
        assert_eq!(config.camera.front_url, None);
    }

    #[test]
    fn test_seed_parses() {
        let config = parse("[simulation]\nseed = 42\n").unwrap();
        assert_eq!(config.simulation.seed, Some(42));
    }
}
