//! Vehicle status records and their display sanitization.
//!
//! - [`status`] - the raw numeric status record, every field independently optional
//! - [`format`] - sanitizers and formatters mapping absent values to a placeholder
//! - [`readout`] - the display-ready record handed to status widgets

pub mod format;
pub mod readout;
pub mod status;

use thiserror::Error;

pub use format::{
    format_error_code, format_fixed, format_hex, format_int, format_with_unit,
    sanitize_temperature, PLACEHOLDER,
};
pub use readout::{ActuatorReadout, StatusReadout};
pub use status::{ActuatorState, VehicleStatus};

/// Errors raised while decoding an incoming sample.
///
/// Field-level problems never surface here; they become `None` on the
/// affected field. This error means the whole message was unusable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    /// Message body is not the expected shape
    #[error("Malformed {kind} sample: {reason}")]
    Malformed { kind: &'static str, reason: String },

    /// A field required to use the sample at all is missing
    #[error("{kind} sample missing required field '{field}'")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
}
