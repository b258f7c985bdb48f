//! Terminal UI for Roverwatch.
//!
//! Provides the live dashboard and the render surface it draws from.

pub mod dashboard;
pub mod surface;
pub mod widgets;

pub use dashboard::{Dashboard, DashboardEvent};
pub use surface::{MapControls, TerminalSurface};
