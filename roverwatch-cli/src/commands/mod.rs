//! CLI command implementations.
//!
//! - [`config`] - Configuration management (get, set, list, path, init)
//! - [`run`] - Start the engine with the dashboard or headless output

pub mod config;
pub mod run;
