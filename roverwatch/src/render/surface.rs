//! The render surface contract.
//!
//! A render surface is an external 2-D map that accepts declarative
//! updates (named GeoJSON sources, layers, images, camera pans, style
//! swaps) and reports lifecycle events. The engine depends only on this
//! trait; [`super::MemorySurface`] and the terminal surface in the CLI
//! are the two implementations.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::style::StyleDescriptor;
use crate::geo::GeoPoint;

/// Errors reported by a render surface call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
    /// The surface failed to initialize or hit a fatal error
    #[error("Render surface unavailable: {0}")]
    Unavailable(String),

    /// Style is still loading; overlays cannot be added yet
    #[error("Style is not loaded")]
    StyleNotLoaded,

    #[error("Source '{0}' already exists")]
    DuplicateSource(String),

    #[error("Source '{0}' does not exist")]
    UnknownSource(String),

    #[error("Source '{0}' is still used by a layer")]
    SourceInUse(String),

    #[error("Layer '{0}' already exists")]
    DuplicateLayer(String),

    #[error("Layer '{0}' does not exist")]
    UnknownLayer(String),

    #[error("Layer '{layer}' references missing source '{source_id}'")]
    MissingSource { layer: String, source_id: String },

    #[error("Image '{0}' already exists")]
    DuplicateImage(String),
}

impl SurfaceError {
    /// Fatal errors put the map into the failed placeholder state.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SurfaceError::Unavailable(_))
    }
}

/// Events fired by the render surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// Initial style and map finished loading.
    Load,
    /// Style data changed (fires after every style swap).
    StyleData,
    /// The user started dragging the map.
    DragStart,
    /// The camera settled at a new position.
    MoveEnd { center: GeoPoint, zoom: f64 },
    /// The surface reported an error. Fatal errors disable the map.
    Error { message: String, fatal: bool },
}

/// Construction parameters for a render surface.
#[derive(Debug, Clone)]
pub struct SurfaceOptions {
    pub style: StyleDescriptor,
    pub center: GeoPoint,
    pub zoom: f64,
}

/// Geometry type of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Line,
    Symbol,
    Circle,
    Raster,
}

/// Declarative layer description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    pub source: String,
    pub paint: Value,
    pub layout: Value,
}

/// A custom icon image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub svg: &'static str,
}

/// External map surface driven by [`super::MapSync`].
///
/// Calls are synchronous and never panic; failures come back as
/// [`SurfaceError`]. A surface must drop all overlay sources, layers, and
/// images when its style is replaced.
pub trait RenderSurface: Send + 'static {
    fn set_style(&mut self, style: &StyleDescriptor) -> Result<(), SurfaceError>;

    fn pan_to(&mut self, center: GeoPoint, duration: Duration) -> Result<(), SurfaceError>;

    fn add_source(&mut self, id: &str, data: &Value) -> Result<(), SurfaceError>;

    fn set_source_data(&mut self, id: &str, data: &Value) -> Result<(), SurfaceError>;

    fn remove_source(&mut self, id: &str) -> Result<(), SurfaceError>;

    fn has_source(&self, id: &str) -> bool;

    fn add_layer(&mut self, layer: &LayerDescriptor) -> Result<(), SurfaceError>;

    fn remove_layer(&mut self, id: &str) -> Result<(), SurfaceError>;

    fn has_layer(&self, id: &str) -> bool;

    fn add_image(&mut self, id: &str, image: &ImageData) -> Result<(), SurfaceError>;

    fn has_image(&self, id: &str) -> bool;

    /// Attribution strings of every active source, in source order.
    fn source_attributions(&self) -> Vec<String>;

    fn is_style_loaded(&self) -> bool;

    /// Marks the end of a reconcile pass. Surfaces that present frames
    /// publish here.
    fn commit(&mut self) {}
}
