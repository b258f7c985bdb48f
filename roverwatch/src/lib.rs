//! Roverwatch - telemetry-to-map synchronization for ground vehicle monitoring
//!
//! This library ingests position and status telemetry from either a
//! simulated generator or a live rosbridge feed, keeps a bounded trail and
//! the planned path, arbitrates follow-vs-free camera behavior, and
//! reconciles all of it onto an external map render surface.
//!
//! # High-Level API
//!
//! ```ignore
//! use roverwatch::config::DashboardConfig;
//! use roverwatch::engine::{Engine, EngineCommand};
//! use roverwatch::source::{RosbridgeTransport, SourceMode};
//!
//! let config = DashboardConfig::load()?;
//! let (engine, handle) = Engine::new(
//!     config,
//!     SourceMode::Simulated,
//!     Ok(surface),
//!     surface_events,
//!     RosbridgeTransport::default,
//!     cancel,
//! )?;
//! tokio::spawn(engine.run());
//! handle.send(EngineCommand::SwitchMode(SourceMode::Live)).await;
//! ```

pub mod config;
pub mod engine;
pub mod geo;
pub mod logging;
pub mod render;
pub mod source;
pub mod telemetry;
pub mod track;
pub mod view;

/// Version of the Roverwatch library and CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
