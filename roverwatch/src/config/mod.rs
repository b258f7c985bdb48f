//! Dashboard configuration.
//!
//! The user's settings live in `~/.roverwatch/config.ini` and are loaded
//! once at startup into a [`DashboardConfig`]. Settings structs live in
//! [`settings`], constants in [`defaults`], parsing in `parser`, and
//! serialization in `writer`. Runtime changes are applied explicitly by
//! sending the whole config to the engine.

mod defaults;
mod file;
mod keys;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use keys::{ConfigKey, ConfigKeyError};
pub use settings::{
    derive_camera_url, CameraFeeds, CameraSettings, DashboardConfig, LoggingSettings,
    MapSettings, SimulationSettings, TransportSettings,
};
