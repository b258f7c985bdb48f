//! Dashboard widgets.
//!
//! - `MapWidget` - overlay layers on a braille canvas
//! - `StatusWidget` - vehicle status readout and actuator table

pub mod map;
mod status;

pub use map::MapWidget;
pub use status::StatusWidget;
