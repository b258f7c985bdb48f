//! Vehicle status panel.
//!
//! Layout:
//! ```text
//! ┌─ Vehicle ─────────────────────────────────────────┐
//! │ Source   : simulated | * Connected | Following    │
//! │ Position : 50.088300, 14.420800                   │
//! │ Speed    : 1.3 m/s | Steering: -0.12 rad          │
//! │ Battery  : 25.7V | Mode: 2 | State: 3             │
//! │ Error    : 4096 (0x1000)                          │
//! │ Track    : 42 trail | 8 path                      │
//! │ Front cam: http://rover:8080/stream?topic=...     │
//! │ Rear cam : http://rover:8080/stream?topic=...     │
//! │                                                   │
//! │ Motor   RPM     Current  Motor    Driver   Volt   │
//! │ M1      1180    0.50A    —°C      39.2°C   26.4V  │
//! └───────────────────────────────────────────────────┘
//! ```

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use roverwatch::config::CameraFeeds;
use roverwatch::engine::DashboardSnapshot;
use roverwatch::telemetry::ActuatorReadout;

const LABEL: Style = Style::new().fg(Color::DarkGray);
const VALUE: Style = Style::new().fg(Color::White);

/// Widget rendering the status readout of a [`DashboardSnapshot`].
pub struct StatusWidget<'a> {
    snapshot: &'a DashboardSnapshot,
    cameras: Option<&'a CameraFeeds>,
}

impl<'a> StatusWidget<'a> {
    pub fn new(snapshot: &'a DashboardSnapshot) -> Self {
        Self {
            snapshot,
            cameras: None,
        }
    }

    /// Also list the camera stream URLs.
    pub fn with_cameras(mut self, cameras: &'a CameraFeeds) -> Self {
        self.cameras = Some(cameras);
        self
    }

    fn field(label: &'static str, value: String) -> Vec<Span<'static>> {
        vec![
            Span::styled(format!(" {:<9}: ", label), LABEL),
            Span::styled(value, VALUE),
        ]
    }

    fn separator() -> Span<'static> {
        Span::styled(" | ", LABEL)
    }

    fn source_line(&self) -> Line<'static> {
        let s = self.snapshot;
        let (marker, text, color) = if s.connected {
            ("*", "Connected", Color::Green)
        } else {
            ("x", "Disconnected", Color::Red)
        };

        let mut spans = Self::field("Source", s.mode.to_string());
        spans.push(Self::separator());
        spans.push(Span::styled(
            format!("{} {}", marker, text),
            Style::default().fg(color),
        ));
        spans.push(Self::separator());
        spans.push(Span::styled(s.camera.to_string(), VALUE));
        Line::from(spans)
    }

    fn error_line(&self) -> Line<'static> {
        let style = if self.snapshot.fault {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else {
            VALUE
        };
        Line::from(vec![
            Span::styled(format!(" {:<9}: ", "Error"), LABEL),
            Span::styled(self.snapshot.readout.error_code.clone(), style),
        ])
    }

    fn actuator_header() -> Line<'static> {
        Line::from(Span::styled(
            format!(
                " {:<7} {:<7} {:<8} {:<8} {:<8} {:<7} {}",
                "Motor", "RPM", "Current", "Motor", "Driver", "Volt", "State"
            ),
            LABEL,
        ))
    }

    fn actuator_line(a: &ActuatorReadout) -> Line<'static> {
        Line::from(Span::styled(
            format!(
                " {:<7} {:<7} {:<8} {:<8} {:<8} {:<7} {}",
                a.label,
                a.rpm,
                a.current,
                a.motor_temperature,
                a.driver_temperature,
                a.driver_voltage,
                a.driver_state
            ),
            VALUE,
        ))
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let s = self.snapshot;
        let r = &s.readout;

        let mut speed = Self::field("Speed", r.speed.clone());
        speed.push(Self::separator());
        speed.extend([
            Span::styled("Steering: ", LABEL),
            Span::styled(r.steering.clone(), VALUE),
        ]);

        let mut battery = Self::field("Battery", r.battery.clone());
        battery.extend([
            Self::separator(),
            Span::styled("Mode: ", LABEL),
            Span::styled(r.control_mode.clone(), VALUE),
            Self::separator(),
            Span::styled("State: ", LABEL),
            Span::styled(r.vehicle_state.clone(), VALUE),
        ]);

        let track = Self::field(
            "Track",
            format!("{} trail | {} path", s.trail_len, s.path_len),
        );

        let mut lines = vec![
            self.source_line(),
            Line::from(Self::field("Position", r.position.clone())),
            Line::from(speed),
            Line::from(battery),
            self.error_line(),
            Line::from(track),
        ];

        if let Some(cameras) = self.cameras {
            lines.push(Line::from(Self::field("Front cam", cameras.front.clone())));
            lines.push(Line::from(Self::field("Rear cam", cameras.rear.clone())));
        }

        if !r.actuators.is_empty() {
            lines.push(Line::default());
            lines.push(Self::actuator_header());
            lines.extend(r.actuators.iter().map(Self::actuator_line));
        }
        lines
    }
}

impl Widget for StatusWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.snapshot.fault {
            Color::Red
        } else {
            Color::DarkGray
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(Span::styled(" Vehicle ", Style::default().fg(Color::Cyan)));

        Paragraph::new(self.lines()).block(block).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roverwatch::geo::GeoPoint;
    use roverwatch::source::SourceMode;
    use roverwatch::telemetry::{ActuatorState, StatusReadout, VehicleStatus};
    use roverwatch::view::{CameraMode, StyleKey};

    fn snapshot(status: Option<VehicleStatus>) -> DashboardSnapshot {
        let center = GeoPoint::new(14.4208, 50.088).unwrap();
        DashboardSnapshot {
            mode: SourceMode::Simulated,
            connected: true,
            position: Some(center),
            trail_len: 42,
            path_len: 0,
            camera: CameraMode::Following,
            style: StyleKey::Dark,
            attribution: String::new(),
            map_failed: false,
            center,
            zoom: 16.0,
            readout: StatusReadout::new(status.as_ref(), Some(center)),
            fault: StatusReadout::has_fault(status.as_ref()),
            status,
        }
    }

    fn rendered(snapshot: &DashboardSnapshot) -> String {
        let area = Rect::new(0, 0, 90, 14);
        let mut buf = Buffer::empty(area);
        StatusWidget::new(snapshot).render(area, &mut buf);
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_absent_status_shows_placeholders() {
        let text = rendered(&snapshot(None));
        assert!(text.contains("simulated"));
        assert!(text.contains("Connected"));
        assert!(text.contains("— m/s"));
        assert!(text.contains("50.088000, 14.420800"));
        assert!(text.contains("42 trail"));
        assert!(!text.contains("RPM"));
        assert!(!text.contains("Front cam"));
    }

    #[test]
    fn test_camera_urls_are_listed() {
        let cameras = CameraFeeds {
            front: "http://rover:8080/front".to_string(),
            rear: "http://rover:8080/rear".to_string(),
        };
        let snapshot = snapshot(None);
        let area = Rect::new(0, 0, 90, 14);
        let mut buf = Buffer::empty(area);
        StatusWidget::new(&snapshot)
            .with_cameras(&cameras)
            .render(area, &mut buf);

        let text: String = (0..area.height)
            .flat_map(|y| (0..area.width).map(move |x| (x, y)))
            .map(|pos| buf[pos].symbol().to_string())
            .collect();
        assert!(text.contains("http://rover:8080/front"));
        assert!(text.contains("http://rover:8080/rear"));
    }

    #[test]
    fn test_actuators_are_listed() {
        let status = VehicleStatus {
            battery_voltage: Some(25.74),
            error_code: Some(4096.0),
            actuators: vec![ActuatorState {
                motor_id: Some(1.0),
                rpm: Some(1180.0),
                motor_temperature: Some(0.0),
                ..Default::default()
            }],
            ..Default::default()
        };
        let text = rendered(&snapshot(Some(status)));
        assert!(text.contains("25.7V"));
        assert!(text.contains("4096 (0x1000)"));
        assert!(text.contains("RPM"));
        assert!(text.contains("M1"));
        assert!(text.contains("1180"));
        assert!(text.contains("—°C"));
    }
}
