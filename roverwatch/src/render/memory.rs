//! In-memory render surface.
//!
//! [`SurfaceModel`] reproduces the bookkeeping rules of a declarative map
//! library: ids are unique, layers need their source, and a style swap
//! drops every overlay. [`MemorySurface`] wraps a model with a call log
//! and an event channel. It is cheap to clone, and clones share state, so
//! a test can keep a clone to inspect while the engine owns the surface.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;

use super::style::StyleDescriptor;
use super::surface::{
    ImageData, LayerDescriptor, RenderSurface, SurfaceError, SurfaceEvent, SurfaceOptions,
};
use crate::geo::GeoPoint;

/// Map state as a declarative surface would hold it.
#[derive(Debug, Clone)]
pub struct SurfaceModel {
    style: StyleDescriptor,
    style_loaded: bool,
    sources: Vec<(String, Value)>,
    layers: Vec<LayerDescriptor>,
    images: BTreeSet<String>,
    center: GeoPoint,
    zoom: f64,
}

impl SurfaceModel {
    pub fn new(options: &SurfaceOptions) -> Self {
        Self {
            style: options.style.clone(),
            style_loaded: true,
            sources: Vec::new(),
            layers: Vec::new(),
            images: BTreeSet::new(),
            center: options.center,
            zoom: options.zoom,
        }
    }

    /// Replace the style, dropping every overlay source, layer, and image.
    pub fn apply_style(&mut self, style: &StyleDescriptor, loaded: bool) {
        self.style = style.clone();
        self.style_loaded = loaded;
        self.sources.clear();
        self.layers.clear();
        self.images.clear();
    }

    pub fn mark_style_loaded(&mut self) {
        self.style_loaded = true;
    }

    pub fn style(&self) -> &StyleDescriptor {
        &self.style
    }

    pub fn is_style_loaded(&self) -> bool {
        self.style_loaded
    }

    pub fn add_source(&mut self, id: &str, data: &Value) -> Result<(), SurfaceError> {
        if !self.style_loaded {
            return Err(SurfaceError::StyleNotLoaded);
        }
        if self.has_source(id) {
            return Err(SurfaceError::DuplicateSource(id.to_string()));
        }
        self.sources.push((id.to_string(), data.clone()));
        Ok(())
    }

    pub fn set_source_data(&mut self, id: &str, data: &Value) -> Result<(), SurfaceError> {
        let entry = self
            .sources
            .iter_mut()
            .find(|(sid, _)| sid == id)
            .ok_or_else(|| SurfaceError::UnknownSource(id.to_string()))?;
        entry.1 = data.clone();
        Ok(())
    }

    pub fn remove_source(&mut self, id: &str) -> Result<(), SurfaceError> {
        if self.layers.iter().any(|l| l.source == id) {
            return Err(SurfaceError::SourceInUse(id.to_string()));
        }
        let before = self.sources.len();
        self.sources.retain(|(sid, _)| sid != id);
        if self.sources.len() == before {
            return Err(SurfaceError::UnknownSource(id.to_string()));
        }
        Ok(())
    }

    pub fn has_source(&self, id: &str) -> bool {
        self.sources.iter().any(|(sid, _)| sid == id)
    }

    pub fn source(&self, id: &str) -> Option<&Value> {
        self.sources
            .iter()
            .find(|(sid, _)| sid == id)
            .map(|(_, data)| data)
    }

    pub fn add_layer(&mut self, layer: &LayerDescriptor) -> Result<(), SurfaceError> {
        if !self.style_loaded {
            return Err(SurfaceError::StyleNotLoaded);
        }
        if self.has_layer(&layer.id) {
            return Err(SurfaceError::DuplicateLayer(layer.id.clone()));
        }
        if !self.has_source(&layer.source) {
            return Err(SurfaceError::MissingSource {
                layer: layer.id.clone(),
                source_id: layer.source.clone(),
            });
        }
        self.layers.push(layer.clone());
        Ok(())
    }

    pub fn remove_layer(&mut self, id: &str) -> Result<(), SurfaceError> {
        let before = self.layers.len();
        self.layers.retain(|l| l.id != id);
        if self.layers.len() == before {
            return Err(SurfaceError::UnknownLayer(id.to_string()));
        }
        Ok(())
    }

    pub fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|l| l.id == id)
    }

    /// Layers bottom to top.
    pub fn layers(&self) -> &[LayerDescriptor] {
        &self.layers
    }

    pub fn layer_ids(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.id.as_str()).collect()
    }

    pub fn add_image(&mut self, id: &str) -> Result<(), SurfaceError> {
        if !self.images.insert(id.to_string()) {
            return Err(SurfaceError::DuplicateImage(id.to_string()));
        }
        Ok(())
    }

    pub fn has_image(&self, id: &str) -> bool {
        self.images.contains(id)
    }

    pub fn attributions(&self) -> Vec<String> {
        self.style
            .sources
            .iter()
            .filter_map(|s| s.attribution.clone())
            .collect()
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn set_camera(&mut self, center: GeoPoint, zoom: f64) {
        self.center = center;
        self.zoom = zoom;
    }
}

/// A recorded surface call.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    SetStyle(String),
    PanTo { center: GeoPoint, duration: Duration },
    AddSource(String),
    SetSourceData(String),
    RemoveSource(String),
    AddLayer(String),
    RemoveLayer(String),
    AddImage(String),
    Commit,
}

struct MemoryInner {
    model: SurfaceModel,
    calls: Vec<SurfaceCall>,
    events: mpsc::UnboundedSender<SurfaceEvent>,
    defer_style_load: bool,
    failure: Option<SurfaceError>,
}

/// Render surface backed by a [`SurfaceModel`].
#[derive(Clone)]
pub struct MemorySurface {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemorySurface {
    /// Create a surface and the receiver for its events.
    ///
    /// A `Load` event is queued immediately, as a real map would fire once
    /// its initial style is ready.
    pub fn new(options: SurfaceOptions) -> (Self, mpsc::UnboundedReceiver<SurfaceEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let _ = events.send(SurfaceEvent::Load);
        let surface = Self {
            inner: Arc::new(Mutex::new(MemoryInner {
                model: SurfaceModel::new(&options),
                calls: Vec::new(),
                events,
                defer_style_load: false,
                failure: None,
            })),
        };
        (surface, rx)
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Leave new styles unloaded until [`Self::finish_style_load`].
    pub fn defer_style_loads(&self, defer: bool) {
        self.lock().defer_style_load = defer;
    }

    /// Complete a deferred style load and fire `StyleData`.
    pub fn finish_style_load(&self) {
        let mut guard = self.lock();
        let inner = &mut *guard;
        inner.model.mark_style_loaded();
        let _ = inner.events.send(SurfaceEvent::StyleData);
    }

    /// Fire an event as if the map produced it.
    pub fn emit(&self, event: SurfaceEvent) {
        let _ = self.lock().events.send(event);
    }

    /// Make every subsequent mutating call fail with `error`.
    pub fn fail_with(&self, error: Option<SurfaceError>) {
        self.lock().failure = error;
    }

    pub fn model(&self) -> SurfaceModel {
        self.lock().model.clone()
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn pan_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, SurfaceCall::PanTo { .. }))
            .count()
    }

    fn record(
        &mut self,
        call: SurfaceCall,
        apply: impl FnOnce(&mut SurfaceModel) -> Result<(), SurfaceError>,
    ) -> Result<(), SurfaceError> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if let Some(err) = inner.failure.clone() {
            return Err(err);
        }
        inner.calls.push(call);
        apply(&mut inner.model)
    }
}

impl RenderSurface for MemorySurface {
    fn set_style(&mut self, style: &StyleDescriptor) -> Result<(), SurfaceError> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if let Some(err) = inner.failure.clone() {
            return Err(err);
        }
        inner.calls.push(SurfaceCall::SetStyle(style.name.clone()));
        let loaded = !inner.defer_style_load;
        inner.model.apply_style(style, loaded);
        if loaded {
            let _ = inner.events.send(SurfaceEvent::StyleData);
        }
        Ok(())
    }

    fn pan_to(&mut self, center: GeoPoint, duration: Duration) -> Result<(), SurfaceError> {
        self.record(SurfaceCall::PanTo { center, duration }, |m| {
            let zoom = m.zoom();
            m.set_camera(center, zoom);
            Ok(())
        })
    }

    fn add_source(&mut self, id: &str, data: &Value) -> Result<(), SurfaceError> {
        self.record(SurfaceCall::AddSource(id.to_string()), |m| {
            m.add_source(id, data)
        })
    }

    fn set_source_data(&mut self, id: &str, data: &Value) -> Result<(), SurfaceError> {
        self.record(SurfaceCall::SetSourceData(id.to_string()), |m| {
            m.set_source_data(id, data)
        })
    }

    fn remove_source(&mut self, id: &str) -> Result<(), SurfaceError> {
        self.record(SurfaceCall::RemoveSource(id.to_string()), |m| {
            m.remove_source(id)
        })
    }

    fn has_source(&self, id: &str) -> bool {
        self.lock().model.has_source(id)
    }

    fn add_layer(&mut self, layer: &LayerDescriptor) -> Result<(), SurfaceError> {
        self.record(SurfaceCall::AddLayer(layer.id.clone()), |m| m.add_layer(layer))
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), SurfaceError> {
        self.record(SurfaceCall::RemoveLayer(id.to_string()), |m| {
            m.remove_layer(id)
        })
    }

    fn has_layer(&self, id: &str) -> bool {
        self.lock().model.has_layer(id)
    }

    fn add_image(&mut self, id: &str, _image: &ImageData) -> Result<(), SurfaceError> {
        self.record(SurfaceCall::AddImage(id.to_string()), |m| m.add_image(id))
    }

    fn has_image(&self, id: &str) -> bool {
        self.lock().model.has_image(id)
    }

    fn source_attributions(&self) -> Vec<String> {
        self.lock().model.attributions()
    }

    fn is_style_loaded(&self) -> bool {
        self.lock().model.is_style_loaded()
    }

    fn commit(&mut self) {
        self.lock().calls.push(SurfaceCall::Commit);
    }
}
