//! Overlay geometry: ids, icons, GeoJSON payloads, and layer descriptors.
//!
//! Overlays stack bottom to top as trail, path, then vehicle marker.

use serde_json::{json, Value};

use super::surface::{ImageData, LayerDescriptor, LayerKind};
use crate::geo::GeoPoint;

pub const TRAIL_SOURCE: &str = "trail-source";
pub const TRAIL_LAYER: &str = "trail-line";

pub const PATH_SOURCE: &str = "path-source";
pub const START_POINT_SOURCE: &str = "start-point-source";
pub const END_POINT_SOURCE: &str = "end-point-source";

pub const PATH_CASING_LAYER: &str = "path-casing";
pub const PATH_LINE_LAYER: &str = "path-line";
pub const START_POINT_LAYER: &str = "start-point";
pub const END_POINT_LAYER: &str = "end-point";

pub const VEHICLE_SOURCE: &str = "vehicle-source";
pub const VEHICLE_LAYER: &str = "vehicle-marker";

pub const START_ICON: &str = "start-icon";
pub const END_ICON: &str = "end-icon";

/// Path layers in removal order (top first).
pub const PATH_LAYERS: [&str; 4] = [
    END_POINT_LAYER,
    START_POINT_LAYER,
    PATH_LINE_LAYER,
    PATH_CASING_LAYER,
];

pub const PATH_SOURCES: [&str; 3] = [PATH_SOURCE, START_POINT_SOURCE, END_POINT_SOURCE];

/// Green circle with a play triangle.
pub const START_ICON_IMAGE: ImageData = ImageData {
    width: 28,
    height: 28,
    svg: r##"<svg xmlns="http://www.w3.org/2000/svg" width="28" height="28" viewBox="0 0 24 24" fill="none" stroke="white" stroke-width="1.5" stroke-linecap="round" stroke-linejoin="round"><circle cx="12" cy="12" r="10" fill="#22c55e"></circle><polygon points="10,8 16,12 10,16 10,8" fill="white" stroke="none"></polygon></svg>"##,
};

/// Red circle with a check mark.
pub const END_ICON_IMAGE: ImageData = ImageData {
    width: 28,
    height: 28,
    svg: r##"<svg xmlns="http://www.w3.org/2000/svg" width="28" height="28" viewBox="0 0 24 24" fill="none" stroke="white" stroke-width="1.5" stroke-linecap="round" stroke-linejoin="round"><circle cx="12" cy="12" r="10" fill="#ef4444"></circle><path d="m9 12 2 2 4-4" stroke-width="2.5"></path></svg>"##,
};

/// Custom images that must exist before path symbols are drawn.
pub const ICONS: [(&str, &ImageData); 2] = [
    (START_ICON, &START_ICON_IMAGE),
    (END_ICON, &END_ICON_IMAGE),
];

/// A `LineString` feature. Fewer than two points gives an empty collection.
pub fn line_feature<'a>(points: impl IntoIterator<Item = &'a GeoPoint>) -> Value {
    let coords: Vec<[f64; 2]> = points.into_iter().map(GeoPoint::to_lng_lat).collect();
    if coords.len() < 2 {
        return empty_collection();
    }
    json!({
        "type": "Feature",
        "properties": {},
        "geometry": { "type": "LineString", "coordinates": coords }
    })
}

/// A `Point` feature.
pub fn point_feature(point: GeoPoint) -> Value {
    json!({
        "type": "Feature",
        "properties": {},
        "geometry": { "type": "Point", "coordinates": point.to_lng_lat() }
    })
}

pub fn empty_collection() -> Value {
    json!({ "type": "FeatureCollection", "features": [] })
}

fn line_layer(id: &str, source: &str, paint: Value) -> LayerDescriptor {
    LayerDescriptor {
        id: id.to_string(),
        kind: LayerKind::Line,
        source: source.to_string(),
        paint,
        layout: json!({ "line-join": "round", "line-cap": "round" }),
    }
}

fn icon_layer(id: &str, source: &str, icon: &str) -> LayerDescriptor {
    LayerDescriptor {
        id: id.to_string(),
        kind: LayerKind::Symbol,
        source: source.to_string(),
        paint: json!({}),
        layout: json!({ "icon-image": icon, "icon-size": 1, "icon-allow-overlap": true }),
    }
}

pub fn trail_layer() -> LayerDescriptor {
    line_layer(
        TRAIL_LAYER,
        TRAIL_SOURCE,
        json!({ "line-color": "#38bdf8", "line-width": 3, "line-opacity": 0.6 }),
    )
}

pub fn path_casing_layer() -> LayerDescriptor {
    line_layer(
        PATH_CASING_LAYER,
        PATH_SOURCE,
        json!({ "line-color": "#a13c00", "line-width": 8, "line-opacity": 0.4 }),
    )
}

pub fn path_line_layer() -> LayerDescriptor {
    line_layer(
        PATH_LINE_LAYER,
        PATH_SOURCE,
        json!({ "line-color": "#ff7c05", "line-width": 4 }),
    )
}

pub fn start_point_layer() -> LayerDescriptor {
    icon_layer(START_POINT_LAYER, START_POINT_SOURCE, START_ICON)
}

pub fn end_point_layer() -> LayerDescriptor {
    icon_layer(END_POINT_LAYER, END_POINT_SOURCE, END_ICON)
}

pub fn vehicle_layer() -> LayerDescriptor {
    LayerDescriptor {
        id: VEHICLE_LAYER.to_string(),
        kind: LayerKind::Circle,
        source: VEHICLE_SOURCE.to_string(),
        paint: json!({
            "circle-radius": 7,
            "circle-color": "#ffffff",
            "circle-stroke-color": "#0ea5e9",
            "circle-stroke-width": 3
        }),
        layout: json!({}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lon: f64) -> GeoPoint {
        GeoPoint::new(lon, 50.0).unwrap()
    }

    #[test]
    fn test_line_feature_coordinates_are_lng_lat() {
        let points = [pt(14.0), pt(14.5)];
        let feature = line_feature(points.iter());
        assert_eq!(
            feature["geometry"]["coordinates"],
            json!([[14.0, 50.0], [14.5, 50.0]])
        );
    }

    #[test]
    fn test_short_line_is_empty_collection() {
        let points = [pt(14.0)];
        assert_eq!(line_feature(points.iter()), empty_collection());
    }

    #[test]
    fn test_path_layers_share_source() {
        assert_eq!(path_casing_layer().source, PATH_SOURCE);
        assert_eq!(path_line_layer().source, PATH_SOURCE);
        assert_eq!(start_point_layer().layout["icon-image"], START_ICON);
        assert_eq!(end_point_layer().layout["icon-image"], END_ICON);
    }
}
