//! Display-ready status record.

use serde::Serialize;

use super::format::{
    format_error_code, format_hex, format_int, format_with_unit,
    sanitize_temperature, PLACEHOLDER,
};
use super::status::{ActuatorState, VehicleStatus};
use crate::geo::GeoPoint;

/// Sanitized, formatted view of one actuator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActuatorReadout {
    pub label: String,
    pub rpm: String,
    pub current: String,
    pub motor_temperature: String,
    pub driver_temperature: String,
    pub driver_voltage: String,
    pub driver_state: String,
}

/// Sanitized, formatted status for display widgets.
///
/// Built from an optional [`VehicleStatus`]; every field falls back to the
/// placeholder so widgets never need to know whether data was present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReadout {
    pub speed: String,
    pub steering: String,
    pub battery: String,
    pub control_mode: String,
    pub vehicle_state: String,
    pub error_code: String,
    pub position: String,
    pub actuators: Vec<ActuatorReadout>,
}

impl Default for StatusReadout {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl StatusReadout {
    /// Build the readout from the latest status and position.
    pub fn new(status: Option<&VehicleStatus>, position: Option<GeoPoint>) -> Self {
        let empty = VehicleStatus::default();
        let s = status.unwrap_or(&empty);

        Self {
            speed: format_with_unit(s.linear_velocity, 1, " m/s"),
            steering: format_with_unit(s.steering_angle, 2, " rad"),
            battery: format_with_unit(s.battery_voltage, 1, "V"),
            control_mode: format_int(s.control_mode),
            vehicle_state: format_int(s.vehicle_state),
            error_code: format_error_code(s.error_code),
            position: position
                .map(|p| p.to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            actuators: s
                .actuators
                .iter()
                .enumerate()
                .map(|(i, a)| ActuatorReadout::new(i, a))
                .collect(),
        }
    }

    /// Whether the error code field carries a nonzero fault.
    pub fn has_fault(status: Option<&VehicleStatus>) -> bool {
        status
            .and_then(|s| s.error_code)
            .is_some_and(|code| code != 0.0)
    }
}

impl ActuatorReadout {
    fn new(index: usize, a: &ActuatorState) -> Self {
        let label = match a.motor_id {
            Some(id) => format!("M{}", format_int(Some(id))),
            None => format!("M{}", index),
        };

        Self {
            label,
            rpm: format_int(a.rpm),
            current: format_with_unit(a.current, 2, "A"),
            motor_temperature: format_with_unit(
                sanitize_temperature(a.motor_temperature),
                1,
                "°C",
            ),
            driver_temperature: format_with_unit(
                sanitize_temperature(a.driver_temperature),
                1,
                "°C",
            ),
            driver_voltage: format_with_unit(a.driver_voltage, 1, "V"),
            driver_state: format_hex(a.driver_state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_status() -> VehicleStatus {
        VehicleStatus {
            linear_velocity: Some(1.26),
            steering_angle: Some(-0.123),
            battery_voltage: Some(25.74),
            control_mode: Some(2.0),
            vehicle_state: Some(3.0),
            error_code: Some(4096.0),
            actuators: vec![ActuatorState {
                motor_id: Some(1.0),
                current: Some(0.5),
                pulse_count: Some(100.0),
                rpm: Some(1180.4),
                driver_voltage: Some(26.41),
                driver_temperature: Some(39.2),
                motor_temperature: Some(0.0),
                driver_state: Some(64.0),
            }],
        }
    }

    #[test]
    fn test_absent_status_renders_placeholders() {
        let r = StatusReadout::new(None, None);
        assert_eq!(r.speed, "— m/s");
        assert_eq!(r.steering, "— rad");
        assert_eq!(r.battery, "—V");
        assert_eq!(r.control_mode, PLACEHOLDER);
        assert_eq!(r.vehicle_state, PLACEHOLDER);
        assert_eq!(r.error_code, PLACEHOLDER);
        assert_eq!(r.position, PLACEHOLDER);
        assert!(r.actuators.is_empty());
    }

    #[test]
    fn test_missing_battery_renders_placeholder_not_zero() {
        let status = VehicleStatus {
            battery_voltage: None,
            ..full_status()
        };
        let r = StatusReadout::new(Some(&status), None);
        assert_eq!(r.battery, "—V");
        assert!(!r.battery.contains('0'));
    }

    #[test]
    fn test_full_status_formats() {
        let pos = GeoPoint::new(14.4208, 50.088).unwrap();
        let r = StatusReadout::new(Some(&full_status()), Some(pos));
        assert_eq!(r.speed, "1.3 m/s");
        assert_eq!(r.steering, "-0.12 rad");
        assert_eq!(r.battery, "25.7V");
        assert_eq!(r.control_mode, "2");
        assert_eq!(r.error_code, "4096 (0x1000)");
        assert_eq!(r.position, "50.088000, 14.420800");

        let m = &r.actuators[0];
        assert_eq!(m.label, "M1");
        assert_eq!(m.rpm, "1180");
        assert_eq!(m.driver_state, "0x40");
        assert_eq!(m.driver_temperature, "39.2°C");
        // exact zero is a sensor fault signature
        assert_eq!(m.motor_temperature, "—°C");
    }

    #[test]
    fn test_every_actuator_field_uses_placeholder_when_absent() {
        let status = VehicleStatus {
            actuators: vec![ActuatorState::default()],
            ..VehicleStatus::default()
        };
        let r = StatusReadout::new(Some(&status), None);
        let m = &r.actuators[0];
        assert_eq!(m.label, "M0");
        assert_eq!(m.rpm, PLACEHOLDER);
        assert_eq!(m.current, "—A");
        assert_eq!(m.motor_temperature, "—°C");
        assert_eq!(m.driver_temperature, "—°C");
        assert_eq!(m.driver_voltage, "—V");
        assert_eq!(m.driver_state, PLACEHOLDER);
    }

    #[test]
    fn test_has_fault() {
        assert!(StatusReadout::has_fault(Some(&full_status())));
        assert!(!StatusReadout::has_fault(Some(&VehicleStatus::default())));
        assert!(!StatusReadout::has_fault(None));
    }
}
