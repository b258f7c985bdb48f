//! Main TUI dashboard for Roverwatch.
//!
//! Map on the left, vehicle status on the right, key help along the
//! bottom. The dashboard only reads engine snapshots and turns key
//! presses into [`DashboardEvent`]s; the caller decides what to do with
//! them.

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};

use roverwatch::config::CameraFeeds;
use roverwatch::engine::{DashboardSnapshot, EngineCommand};
use roverwatch::view::StyleKey;

use super::surface::MapControls;
use super::widgets::{MapWidget, StatusWidget};

/// Fraction of the visible map moved by one arrow key press.
const PAN_STEP: f64 = 0.25;

const HELP: &[(&str, &str)] = &[
    ("q", "quit"),
    ("f", "follow"),
    ("c", "recenter"),
    ("m", "mode"),
    ("1-3", "style"),
    ("←↑↓→", "pan"),
    ("+/-", "zoom"),
    ("r", "reset"),
    ("l", "reload config"),
];

/// What a key press asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    Quit,
    /// Forward to the engine as is.
    Command(EngineCommand),
    /// Switch to the other telemetry source.
    ToggleMode,
    /// Drag the map by a fraction of the visible extent.
    Pan { east: f64, north: f64 },
    Zoom(f64),
    /// Re-read the configuration file and apply it.
    ReloadConfig,
}

/// Map a key to a dashboard event.
pub fn key_event(code: KeyCode) -> Option<DashboardEvent> {
    let event = match code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => DashboardEvent::Quit,
        KeyCode::Char('f') => DashboardEvent::Command(EngineCommand::ToggleFollow),
        KeyCode::Char('c') => DashboardEvent::Command(EngineCommand::Recenter),
        KeyCode::Char('r') => DashboardEvent::Command(EngineCommand::Reset),
        KeyCode::Char('1') => DashboardEvent::Command(EngineCommand::SetStyle(StyleKey::Dark)),
        KeyCode::Char('2') => DashboardEvent::Command(EngineCommand::SetStyle(StyleKey::Street)),
        KeyCode::Char('3') => {
            DashboardEvent::Command(EngineCommand::SetStyle(StyleKey::Satellite))
        }
        KeyCode::Char('m') => DashboardEvent::ToggleMode,
        KeyCode::Char('l') => DashboardEvent::ReloadConfig,
        KeyCode::Left => DashboardEvent::Pan {
            east: -PAN_STEP,
            north: 0.0,
        },
        KeyCode::Right => DashboardEvent::Pan {
            east: PAN_STEP,
            north: 0.0,
        },
        KeyCode::Up => DashboardEvent::Pan {
            east: 0.0,
            north: PAN_STEP,
        },
        KeyCode::Down => DashboardEvent::Pan {
            east: 0.0,
            north: -PAN_STEP,
        },
        KeyCode::Char('+') | KeyCode::Char('=') => DashboardEvent::Zoom(1.0),
        KeyCode::Char('-') => DashboardEvent::Zoom(-1.0),
        _ => return None,
    };
    Some(event)
}

/// The terminal dashboard.
pub struct Dashboard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Inner size of the map panel at the last draw.
    map_area: Rect,
    cameras: CameraFeeds,
}

impl Dashboard {
    /// Take over the terminal.
    pub fn new(cameras: CameraFeeds) -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        Ok(Self {
            terminal,
            map_area: Rect::default(),
            cameras,
        })
    }

    pub fn set_cameras(&mut self, cameras: CameraFeeds) {
        self.cameras = cameras;
    }

    /// Restore terminal to normal state.
    pub fn restore(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    /// Width and height of the map panel, in cells.
    pub fn map_area(&self) -> (u16, u16) {
        (self.map_area.width, self.map_area.height)
    }

    pub fn draw(&mut self, snapshot: &DashboardSnapshot, controls: &MapControls) -> io::Result<()> {
        let map_area = &mut self.map_area;
        let cameras = &self.cameras;
        self.terminal.draw(|frame| {
            *map_area = render(frame, snapshot, cameras, controls);
        })?;
        Ok(())
    }

    /// Wait up to `timeout` for a key press.
    pub fn poll_event(&mut self, timeout: Duration) -> io::Result<Option<DashboardEvent>> {
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(key_event(key.code));
                }
            }
        }
        Ok(None)
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Lay out and draw one frame. Returns the inner map area.
fn render(
    frame: &mut Frame,
    snapshot: &DashboardSnapshot,
    cameras: &CameraFeeds,
    controls: &MapControls,
) -> Rect {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(1)])
        .split(frame.area());
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(rows[0]);

    controls.read(|model| {
        frame.render_widget(MapWidget::new(model, snapshot), columns[0]);
    });
    frame.render_widget(
        StatusWidget::new(snapshot).with_cameras(cameras),
        columns[1],
    );
    frame.render_widget(help_line(), rows[1]);

    // Inside the border
    Rect {
        x: columns[0].x + 1,
        y: columns[0].y + 1,
        width: columns[0].width.saturating_sub(2),
        height: columns[0].height.saturating_sub(2),
    }
}

fn help_line() -> Paragraph<'static> {
    let mut spans = Vec::with_capacity(HELP.len() * 2);
    for (key, action) in HELP {
        spans.push(Span::styled(format!(" {} ", key), Style::default().fg(Color::Cyan)));
        spans.push(Span::styled(
            format!("{} ", action),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Paragraph::new(Line::from(spans))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_bindings() {
        assert_eq!(key_event(KeyCode::Char('q')), Some(DashboardEvent::Quit));
        assert_eq!(key_event(KeyCode::Esc), Some(DashboardEvent::Quit));
        assert_eq!(
            key_event(KeyCode::Char('f')),
            Some(DashboardEvent::Command(EngineCommand::ToggleFollow))
        );
        assert_eq!(
            key_event(KeyCode::Char('c')),
            Some(DashboardEvent::Command(EngineCommand::Recenter))
        );
        assert_eq!(
            key_event(KeyCode::Char('3')),
            Some(DashboardEvent::Command(EngineCommand::SetStyle(
                StyleKey::Satellite
            )))
        );
        assert_eq!(key_event(KeyCode::Char('m')), Some(DashboardEvent::ToggleMode));
        assert_eq!(key_event(KeyCode::Char('x')), None);
    }

    #[test]
    fn test_arrow_keys_pan_in_compass_directions() {
        assert_eq!(
            key_event(KeyCode::Up),
            Some(DashboardEvent::Pan {
                east: 0.0,
                north: PAN_STEP
            })
        );
        assert_eq!(
            key_event(KeyCode::Left),
            Some(DashboardEvent::Pan {
                east: -PAN_STEP,
                north: 0.0
            })
        );
        assert_eq!(key_event(KeyCode::Char('-')), Some(DashboardEvent::Zoom(-1.0)));
    }
}
