//! Raw vehicle status record.
//!
//! Decoding is lenient: a field that is missing, null, or not a number
//! becomes `None` instead of failing the whole message.

use serde::Serialize;
use serde_json::Value;

use super::SampleError;

/// Per-actuator telemetry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActuatorState {
    pub motor_id: Option<f64>,
    pub current: Option<f64>,
    pub pulse_count: Option<f64>,
    pub rpm: Option<f64>,
    pub driver_voltage: Option<f64>,
    pub driver_temperature: Option<f64>,
    pub motor_temperature: Option<f64>,
    pub driver_state: Option<f64>,
}

/// Flat vehicle status record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VehicleStatus {
    pub linear_velocity: Option<f64>,
    pub steering_angle: Option<f64>,
    pub battery_voltage: Option<f64>,
    pub control_mode: Option<f64>,
    pub vehicle_state: Option<f64>,
    pub error_code: Option<f64>,
    pub actuators: Vec<ActuatorState>,
}

impl VehicleStatus {
    /// Decode a status message body.
    ///
    /// Only a non-object body is an error. A missing or malformed
    /// `actuator_states` array yields an empty actuator list, and
    /// non-object entries inside it are skipped.
    pub fn from_json(msg: &Value) -> Result<Self, SampleError> {
        let obj = msg.as_object().ok_or_else(|| SampleError::Malformed {
            kind: "status",
            reason: format!("expected object, got {}", value_kind(msg)),
        })?;

        let actuators = obj
            .get("actuator_states")
            .and_then(Value::as_array)
            .map(|states| {
                states
                    .iter()
                    .filter(|s| s.is_object())
                    .map(ActuatorState::from_json)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            linear_velocity: number_field(msg, "linear_velocity"),
            steering_angle: number_field(msg, "steering_angle"),
            battery_voltage: number_field(msg, "battery_voltage"),
            control_mode: number_field(msg, "control_mode"),
            vehicle_state: number_field(msg, "vehicle_state"),
            error_code: number_field(msg, "error_code"),
            actuators,
        })
    }
}

impl ActuatorState {
    fn from_json(msg: &Value) -> Self {
        Self {
            motor_id: number_field(msg, "motor_id"),
            current: number_field(msg, "current"),
            pulse_count: number_field(msg, "pulse_count"),
            rpm: number_field(msg, "rpm"),
            driver_voltage: number_field(msg, "driver_voltage"),
            driver_temperature: number_field(msg, "driver_temperature"),
            motor_temperature: number_field(msg, "motor_temperature"),
            driver_state: number_field(msg, "driver_state"),
        }
    }
}

/// Read a numeric field, treating anything non-numeric as absent.
pub(crate) fn number_field(msg: &Value, key: &str) -> Option<f64> {
    msg.get(key).and_then(Value::as_f64).filter(|v| v.is_finite())
}

pub(crate) fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
