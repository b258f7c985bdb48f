//! Configuration key access and validation.
//!
//! Type-safe get/set of configuration values by `section.key` name, with
//! each key validated by a value specification before it is applied.

use std::str::FromStr;

use thiserror::Error;

use super::defaults::{MAX_ZOOM, MIN_ZOOM};
use super::parser::{expand_tilde, is_http_url, is_websocket_url};
use super::settings::DashboardConfig;
use super::writer::path_to_string;
use crate::geo::{MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};
use crate::source::PositionSource;
use crate::view::StyleKey;

/// Errors that can occur when getting or setting configuration values.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    /// Unknown configuration key.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// Validation failed for the value.
    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    // Transport settings
    TransportUrl,
    TransportStatusTopic,
    TransportPoseTopic,
    TransportPathTopic,
    TransportPositionSource,

    // Map settings
    MapOriginLat,
    MapOriginLon,
    MapZoom,
    MapStyle,
    MapTrailMaxLength,
    MapPanDurationMs,

    // Simulation settings
    SimulationTickMs,
    SimulationRadiusM,
    SimulationSeed,

    // Camera settings
    CameraFrontUrl,
    CameraRearUrl,

    // Logging settings
    LoggingFile,
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == lower)
            .ok_or_else(|| ConfigKeyError::UnknownKey(s.to_string()))
    }
}

impl ConfigKey {
    /// Get the canonical key name (e.g., "map.style").
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::TransportUrl => "transport.url",
            ConfigKey::TransportStatusTopic => "transport.status_topic",
            ConfigKey::TransportPoseTopic => "transport.pose_topic",
            ConfigKey::TransportPathTopic => "transport.path_topic",
            ConfigKey::TransportPositionSource => "transport.position_source",
            ConfigKey::MapOriginLat => "map.origin_lat",
            ConfigKey::MapOriginLon => "map.origin_lon",
            ConfigKey::MapZoom => "map.zoom",
            ConfigKey::MapStyle => "map.style",
            ConfigKey::MapTrailMaxLength => "map.trail_max_length",
            ConfigKey::MapPanDurationMs => "map.pan_duration_ms",
            ConfigKey::SimulationTickMs => "simulation.tick_ms",
            ConfigKey::SimulationRadiusM => "simulation.radius_m",
            ConfigKey::SimulationSeed => "simulation.seed",
            ConfigKey::CameraFrontUrl => "camera.front_url",
            ConfigKey::CameraRearUrl => "camera.rear_url",
            ConfigKey::LoggingFile => "logging.file",
        }
    }

    /// Get the section name (e.g., "map").
    pub fn section(&self) -> &'static str {
        self.name().split('.').next().unwrap_or("")
    }

    /// Get the key name within the section (e.g., "style").
    pub fn key_name(&self) -> &'static str {
        self.name().split('.').nth(1).unwrap_or(self.name())
    }

    /// Get the value from a config as a string.
    pub fn get(&self, config: &DashboardConfig) -> String {
        match self {
            ConfigKey::TransportUrl => config.transport.url.clone(),
            ConfigKey::TransportStatusTopic => config.transport.status_topic.clone(),
            ConfigKey::TransportPoseTopic => config.transport.pose_topic.clone(),
            ConfigKey::TransportPathTopic => config.transport.path_topic.clone(),
            ConfigKey::TransportPositionSource => config.transport.position_source.to_string(),
            ConfigKey::MapOriginLat => config.map.origin_lat.to_string(),
            ConfigKey::MapOriginLon => config.map.origin_lon.to_string(),
            ConfigKey::MapZoom => config.map.zoom.to_string(),
            ConfigKey::MapStyle => config.map.style.to_string(),
            ConfigKey::MapTrailMaxLength => config.map.trail_max_length.to_string(),
            ConfigKey::MapPanDurationMs => config.map.pan_duration_ms.to_string(),
            ConfigKey::SimulationTickMs => config.simulation.tick_ms.to_string(),
            ConfigKey::SimulationRadiusM => config.simulation.radius_m.to_string(),
            ConfigKey::SimulationSeed => config
                .simulation
                .seed
                .map(|s| s.to_string())
                .unwrap_or_default(),
            ConfigKey::CameraFrontUrl => config.camera.front_url.clone().unwrap_or_default(),
            ConfigKey::CameraRearUrl => config.camera.rear_url.clone().unwrap_or_default(),
            ConfigKey::LoggingFile => path_to_string(&config.logging.file),
        }
    }

    /// Set the value in a config.
    ///
    /// Validates the value according to the key's specification before setting.
    pub fn set(&self, config: &mut DashboardConfig, value: &str) -> Result<(), ConfigKeyError> {
        self.validate(value)?;
        let value = value.trim();
        match self {
            ConfigKey::TransportUrl => config.transport.url = value.to_string(),
            ConfigKey::TransportStatusTopic => config.transport.status_topic = value.to_string(),
            ConfigKey::TransportPoseTopic => config.transport.pose_topic = value.to_string(),
            ConfigKey::TransportPathTopic => config.transport.path_topic = value.to_string(),
            ConfigKey::TransportPositionSource => {
                config.transport.position_source = self.parse(value)?
            }
            ConfigKey::MapOriginLat => config.map.origin_lat = self.parse(value)?,
            ConfigKey::MapOriginLon => config.map.origin_lon = self.parse(value)?,
            ConfigKey::MapZoom => config.map.zoom = self.parse(value)?,
            ConfigKey::MapStyle => config.map.style = self.parse(value)?,
            ConfigKey::MapTrailMaxLength => config.map.trail_max_length = self.parse(value)?,
            ConfigKey::MapPanDurationMs => config.map.pan_duration_ms = self.parse(value)?,
            ConfigKey::SimulationTickMs => config.simulation.tick_ms = self.parse(value)?,
            ConfigKey::SimulationRadiusM => config.simulation.radius_m = self.parse(value)?,
            ConfigKey::SimulationSeed => {
                config.simulation.seed = if value.is_empty() {
                    None
                } else {
                    Some(self.parse(value)?)
                }
            }
            ConfigKey::CameraFrontUrl => config.camera.front_url = optional_string(value),
            ConfigKey::CameraRearUrl => config.camera.rear_url = optional_string(value),
            ConfigKey::LoggingFile => config.logging.file = expand_tilde(value),
        }
        Ok(())
    }

    /// Validate a value according to this key's specification.
    pub fn validate(&self, value: &str) -> Result<(), ConfigKeyError> {
        self.specification()
            .is_satisfied_by(value.trim())
            .map_err(|reason| ConfigKeyError::ValidationFailed {
                key: self.name().to_string(),
                reason,
            })
    }

    fn parse<T: FromStr>(&self, value: &str) -> Result<T, ConfigKeyError> {
        value.parse().map_err(|_| ConfigKeyError::ValidationFailed {
            key: self.name().to_string(),
            reason: format!("could not parse '{}'", value),
        })
    }

    /// Get the validation specification for this key.
    fn specification(&self) -> Box<dyn ValueSpecification> {
        match self {
            ConfigKey::TransportUrl => Box::new(WebSocketUrlSpec),
            ConfigKey::TransportStatusTopic
            | ConfigKey::TransportPoseTopic
            | ConfigKey::TransportPathTopic => Box::new(TopicSpec),
            ConfigKey::TransportPositionSource => {
                Box::new(OneOfSpec::new(&["odometry", "odom", "gps", "fix"]))
            }
            ConfigKey::MapOriginLat => Box::new(RangeSpec::new(MIN_LAT, MAX_LAT)),
            ConfigKey::MapOriginLon => Box::new(RangeSpec::new(MIN_LON, MAX_LON)),
            ConfigKey::MapZoom => Box::new(RangeSpec::new(MIN_ZOOM, MAX_ZOOM)),
            ConfigKey::MapStyle => Box::new(OneOfSpec::new(&["dark", "street", "satellite"])),
            ConfigKey::MapTrailMaxLength => Box::new(PositiveIntegerSpec),
            ConfigKey::MapPanDurationMs => Box::new(IntegerSpec),
            ConfigKey::SimulationTickMs => Box::new(PositiveIntegerSpec),
            ConfigKey::SimulationRadiusM => Box::new(RangeSpec::new(f64::MIN_POSITIVE, 1_000_000.0)),
            ConfigKey::SimulationSeed => Box::new(OptionalIntegerSpec),
            ConfigKey::CameraFrontUrl | ConfigKey::CameraRearUrl => Box::new(OptionalUrlSpec),
            ConfigKey::LoggingFile => Box::new(PathSpec),
        }
    }

    /// Get all supported configuration keys.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::TransportUrl,
            ConfigKey::TransportStatusTopic,
            ConfigKey::TransportPoseTopic,
            ConfigKey::TransportPathTopic,
            ConfigKey::TransportPositionSource,
            ConfigKey::MapOriginLat,
            ConfigKey::MapOriginLon,
            ConfigKey::MapZoom,
            ConfigKey::MapStyle,
            ConfigKey::MapTrailMaxLength,
            ConfigKey::MapPanDurationMs,
            ConfigKey::SimulationTickMs,
            ConfigKey::SimulationRadiusM,
            ConfigKey::SimulationSeed,
            ConfigKey::CameraFrontUrl,
            ConfigKey::CameraRearUrl,
            ConfigKey::LoggingFile,
        ]
    }
}

// ============================================================================
// Value Specifications
// ============================================================================

trait ValueSpecification {
    /// Returns Ok(()) if valid, Err(reason) if invalid.
    fn is_satisfied_by(&self, value: &str) -> Result<(), String>;
}

struct OneOfSpec {
    options: &'static [&'static str],
}

impl OneOfSpec {
    fn new(options: &'static [&'static str]) -> Self {
        Self { options }
    }
}

impl ValueSpecification for OneOfSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        let lower = value.to_lowercase();
        if self.options.iter().any(|opt| *opt == lower) {
            Ok(())
        } else {
            Err(format!("must be one of: {}", self.options.join(", ")))
        }
    }
}

struct IntegerSpec;

impl ValueSpecification for IntegerSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        value
            .parse::<u64>()
            .map(|_| ())
            .map_err(|_| "must be a non-negative integer".to_string())
    }
}

struct PositiveIntegerSpec;

impl ValueSpecification for PositiveIntegerSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        match value.parse::<u64>() {
            Ok(n) if n > 0 => Ok(()),
            _ => Err("must be a positive integer".to_string()),
        }
    }
}

struct OptionalIntegerSpec;

impl ValueSpecification for OptionalIntegerSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        if value.is_empty() {
            return Ok(());
        }
        IntegerSpec.is_satisfied_by(value)
    }
}

/// Finite number within an inclusive range.
struct RangeSpec {
    min: f64,
    max: f64,
}

impl RangeSpec {
    fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

impl ValueSpecification for RangeSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        match value.parse::<f64>() {
            Ok(n) if n.is_finite() && n >= self.min && n <= self.max => Ok(()),
            _ => Err(format!(
                "must be a number between {} and {}",
                self.min, self.max
            )),
        }
    }
}

struct TopicSpec;

impl ValueSpecification for TopicSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        if value.starts_with('/') && value.len() > 1 {
            Ok(())
        } else {
            Err("must be a topic name starting with '/'".to_string())
        }
    }
}

struct WebSocketUrlSpec;

impl ValueSpecification for WebSocketUrlSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        if is_websocket_url(value) {
            Ok(())
        } else {
            Err("must be a URL starting with 'ws://' or 'wss://'".to_string())
        }
    }
}

struct OptionalUrlSpec;

impl ValueSpecification for OptionalUrlSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        if value.is_empty() || is_http_url(value) {
            Ok(())
        } else {
            Err("must be empty or a URL starting with 'http://' or 'https://'".to_string())
        }
    }
}

struct PathSpec;

impl ValueSpecification for PathSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        if value.is_empty() {
            Err("must be a valid path".to_string())
        } else {
            Ok(())
        }
    }
}

fn optional_string(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
