//! Map widget.
//!
//! Draws the overlay layers held by the surface model on a braille canvas
//! centered on the camera. Canvas coordinates are meters east/north of the
//! camera center.
//!
//! ```text
//! ┌─ Map · dark · following ─────────────────────────────┐
//! │        ⠤⠤⠤⠤⠒⠒⠉⠉S                                      │
//! │                  ⠑⠢⠤◉                                 │
//! │                                                       │
//! └─ © OpenStreetMap contributors © CARTO ───────────────┘
//! ```

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Context, Line as CanvasLine},
        Block, Borders, Paragraph, Widget,
    },
};
use serde_json::Value;

use roverwatch::engine::DashboardSnapshot;
use roverwatch::geo::{self, GeoPoint};
use roverwatch::render::{overlay, LayerDescriptor, LayerKind, SurfaceModel};
use roverwatch::view::StyleKey;

/// Web-mercator ground resolution at zoom 0 on the equator, meters per pixel.
const EQUATOR_METERS_PER_PIXEL: f64 = 156_543.033_92;

/// Approximate pixel size of one terminal cell.
const CELL_WIDTH_PX: f64 = 8.0;
const CELL_HEIGHT_PX: f64 = 16.0;

/// Half width and half height of the visible area in meters.
pub fn viewport_half_extent(center: GeoPoint, zoom: f64, area: (u16, u16)) -> (f64, f64) {
    let meters_per_pixel =
        EQUATOR_METERS_PER_PIXEL * center.latitude().to_radians().cos() / 2f64.powf(zoom);
    let half_w = f64::from(area.0) * CELL_WIDTH_PX * meters_per_pixel / 2.0;
    let half_h = f64::from(area.1) * CELL_HEIGHT_PX * meters_per_pixel / 2.0;
    (half_w.max(1.0), half_h.max(1.0))
}

/// A drawable piece of a GeoJSON source, in `[lng, lat]` pairs.
#[derive(Debug, Clone, PartialEq)]
enum Shape {
    Line(Vec<[f64; 2]>),
    Point([f64; 2]),
}

/// Flatten a GeoJSON value into lines and points. Unknown geometry is skipped.
fn shapes(data: &Value) -> Vec<Shape> {
    let mut out = Vec::new();
    collect_shapes(data, &mut out);
    out
}

fn collect_shapes(data: &Value, out: &mut Vec<Shape>) {
    match data.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => {
            for feature in data["features"].as_array().into_iter().flatten() {
                collect_shapes(feature, out);
            }
        }
        Some("Feature") => collect_shapes(&data["geometry"], out),
        Some("LineString") => {
            let coords: Vec<[f64; 2]> = data["coordinates"]
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(lng_lat)
                .collect();
            if coords.len() >= 2 {
                out.push(Shape::Line(coords));
            }
        }
        Some("Point") => {
            if let Some(coord) = lng_lat(&data["coordinates"]) {
                out.push(Shape::Point(coord));
            }
        }
        _ => {}
    }
}

fn lng_lat(value: &Value) -> Option<[f64; 2]> {
    let pair = value.as_array()?;
    Some([pair.first()?.as_f64()?, pair.get(1)?.as_f64()?])
}

fn layer_color(layer: &LayerDescriptor) -> Color {
    let key = match layer.kind {
        LayerKind::Circle => "circle-stroke-color",
        _ => "line-color",
    };
    layer.paint[key]
        .as_str()
        .and_then(|hex| hex.parse().ok())
        .unwrap_or(Color::White)
}

fn background(style: StyleKey) -> Color {
    match style {
        StyleKey::Dark => Color::Black,
        StyleKey::Street => Color::Rgb(38, 42, 48),
        StyleKey::Satellite => Color::Rgb(24, 36, 28),
    }
}

/// Map panel.
pub struct MapWidget<'a> {
    model: &'a SurfaceModel,
    snapshot: &'a DashboardSnapshot,
}

impl<'a> MapWidget<'a> {
    pub fn new(model: &'a SurfaceModel, snapshot: &'a DashboardSnapshot) -> Self {
        Self { model, snapshot }
    }

    fn block(&self) -> Block<'static> {
        let title = format!(
            " Map · {} · {} ",
            self.snapshot.style, self.snapshot.camera
        );
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(title, Style::default().fg(Color::Cyan)))
            .title_bottom(Line::from(Span::styled(
                format!(" {} ", self.snapshot.attribution),
                Style::default().fg(Color::DarkGray),
            )))
    }

    fn paint(&self, ctx: &mut Context<'_>, center: GeoPoint) {
        let to_local = |coord: [f64; 2]| -> Option<(f64, f64)> {
            let point = GeoPoint::new(coord[0], coord[1]).ok()?;
            let offset = geo::unproject(point, center).ok()?;
            Some((offset.x, offset.y))
        };

        for layer in self.model.layers() {
            let Some(data) = self.model.source(&layer.source) else {
                continue;
            };
            let color = layer_color(layer);

            for shape in shapes(data) {
                match shape {
                    Shape::Line(coords) => {
                        let points: Vec<(f64, f64)> =
                            coords.into_iter().filter_map(to_local).collect();
                        for pair in points.windows(2) {
                            ctx.draw(&CanvasLine {
                                x1: pair[0].0,
                                y1: pair[0].1,
                                x2: pair[1].0,
                                y2: pair[1].1,
                                color,
                            });
                        }
                    }
                    Shape::Point(coord) => {
                        let Some((x, y)) = to_local(coord) else {
                            continue;
                        };
                        let (glyph, color) = match layer.id.as_str() {
                            overlay::START_POINT_LAYER => ("S", Color::Green),
                            overlay::END_POINT_LAYER => ("E", Color::Red),
                            _ => ("◉", color),
                        };
                        ctx.print(x, y, Span::styled(glyph, Style::default().fg(color)));
                    }
                }
            }
            // Keep later layers on top of earlier ones.
            ctx.layer();
        }
    }
}

impl Widget for MapWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = self.block();

        if self.snapshot.map_failed {
            Paragraph::new(Line::from(Span::styled(
                "Map unavailable",
                Style::default().fg(Color::Red),
            )))
            .block(block)
            .centered()
            .render(area, buf);
            return;
        }

        let inner = block.inner(area);
        let center = self.model.center();
        let (half_w, half_h) =
            viewport_half_extent(center, self.model.zoom(), (inner.width, inner.height));

        Canvas::default()
            .block(block)
            .marker(Marker::Braille)
            .background_color(background(self.snapshot.style))
            .x_bounds([-half_w, half_w])
            .y_bounds([-half_h, half_h])
            .paint(|ctx| self.paint(ctx, center))
            .render(area, buf);
    }
}
