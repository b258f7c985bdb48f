//! Display sanitizers for raw telemetry numbers.
//!
//! Every formatter maps an absent or non-finite input to [`PLACEHOLDER`].
//! A missing reading must never be shown as zero.

/// Shown in place of any value that is absent or unusable.
pub const PLACEHOLDER: &str = "—";

/// Lowest plausible temperature; readings at or below it are sensor faults.
const TEMPERATURE_FLOOR: f64 = -20.0;

/// Highest plausible temperature.
const TEMPERATURE_CEILING: f64 = 150.0;

/// Filter out temperature readings that match known sensor fault signatures.
///
/// Rejects non-finite values, anything at or below -20, exactly 0, and
/// anything above 150.
pub fn sanitize_temperature(t: Option<f64>) -> Option<f64> {
    let t = t?;
    if !t.is_finite() || t <= TEMPERATURE_FLOOR || t == 0.0 || t > TEMPERATURE_CEILING {
        return None;
    }
    Some(t)
}

/// Render the unsigned 32-bit interpretation of `n` as `0x` + uppercase hex.
///
/// Fractions are truncated toward zero and the result wraps modulo 2^32,
/// so `-1` renders as `0xFFFFFFFF`.
pub fn format_hex(n: Option<f64>) -> String {
    match n.filter(|v| v.is_finite()) {
        Some(v) => format!("0x{:X}", to_u32_wrapping(v)),
        None => PLACEHOLDER.to_string(),
    }
}

/// Fixed-point rendering with `decimals` fraction digits.
pub fn format_fixed(n: Option<f64>, decimals: usize) -> String {
    match n.filter(|v| v.is_finite()) {
        Some(v) => format!("{:.*}", decimals, v),
        None => PLACEHOLDER.to_string(),
    }
}

/// Round to the nearest integer.
pub fn format_int(n: Option<f64>) -> String {
    match n.filter(|v| v.is_finite()) {
        Some(v) => format!("{}", v.round() as i64),
        None => PLACEHOLDER.to_string(),
    }
}

/// Fixed-point value followed by a unit, e.g. `25.7V`, or the placeholder
/// followed by the unit.
pub fn format_with_unit(n: Option<f64>, decimals: usize, unit: &str) -> String {
    format!("{}{}", format_fixed(n, decimals), unit)
}

/// Error code as `"{decimal} (0xHEX)"`.
pub fn format_error_code(n: Option<f64>) -> String {
    match n.filter(|v| v.is_finite()) {
        Some(v) => format!("{} ({})", format_int(Some(v)), format_hex(Some(v))),
        None => PLACEHOLDER.to_string(),
    }
}

fn to_u32_wrapping(v: f64) -> u32 {
    const MODULUS: f64 = 4_294_967_296.0;
    v.trunc().rem_euclid(MODULUS) as u32
}
