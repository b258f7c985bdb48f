//! Map sync driver.
//!
//! [`MapSync`] is the only component that talks to the render surface.
//! Each operation reconciles the surface against the current
//! [`TrackStore`] snapshot: it checks what exists, adds or updates what is
//! missing, and removes what should be gone. Running any operation twice
//! leaves the surface unchanged, and a style swap is just a full redraw
//! on an empty surface.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, warn};

use super::overlay::{self, ICONS, PATH_LAYERS, PATH_SOURCES};
use super::style::{aggregate_attribution, StyleDescriptor};
use super::surface::{LayerDescriptor, RenderSurface, SurfaceError};
use crate::geo::GeoPoint;
use crate::track::TrackStore;
use crate::view::StyleKey;

/// Default animated pan duration.
pub const DEFAULT_PAN_DURATION: Duration = Duration::from_millis(500);

/// Reconciles trail, path, marker, and style onto a render surface.
pub struct MapSync<S: RenderSurface> {
    surface: Option<S>,
    failed: bool,
    style: StyleKey,
    attribution: String,
    pan_duration: Duration,
}

impl<S: RenderSurface> MapSync<S> {
    /// Take ownership of a constructed surface.
    ///
    /// A construction failure puts the driver straight into the failed
    /// state; every later call is a no-op.
    pub fn new(surface: Result<S, SurfaceError>, style: StyleKey, pan_duration: Duration) -> Self {
        let (surface, failed) = match surface {
            Ok(s) => (Some(s), false),
            Err(e) => {
                error!(error = %e, "Render surface failed to initialize");
                (None, true)
            }
        };

        Self {
            surface,
            failed,
            style,
            attribution: String::new(),
            pan_duration,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn style(&self) -> StyleKey {
        self.style
    }

    pub fn attribution(&self) -> &str {
        &self.attribution
    }

    pub fn set_pan_duration(&mut self, duration: Duration) {
        self.pan_duration = duration;
    }

    /// The surface reported a fatal error.
    pub fn fail(&mut self, reason: &str) {
        if !self.failed {
            error!(reason, "Render surface failed, switching to placeholder");
        }
        self.failed = true;
    }

    /// Initial load: register icons and draw everything.
    pub fn on_load(&mut self, store: &TrackStore) {
        self.redraw(store);
    }

    /// Style finished (re)loading: attribution, icons, and overlays.
    pub fn on_style_data(&mut self, store: &TrackStore) {
        if !self.overlay_ready() {
            return;
        }
        self.redraw(store);
    }

    /// Switch base style. Overlays are redrawn once the new style is loaded.
    ///
    /// Returns `false` if `key` is already active.
    pub fn set_style(&mut self, key: StyleKey, store: &TrackStore) -> bool {
        if key == self.style {
            return false;
        }
        self.style = key;

        let descriptor = StyleDescriptor::for_key(key);
        self.call("set_style", |s| s.set_style(&descriptor));
        debug!(style = %key, "Map style changed");

        if self.overlay_ready() {
            self.redraw(store);
        } else {
            self.commit();
        }
        true
    }

    /// A new current position arrived.
    ///
    /// Updates marker and trail, and pans when `follow` is set.
    pub fn sync_position(&mut self, store: &TrackStore, follow: bool) {
        if self.overlay_ready() {
            self.reconcile_trail(store);
            self.reconcile_vehicle(store);
        }
        if follow {
            if let Some(position) = store.current_position() {
                self.pan_to(position);
            }
        }
        self.commit();
    }

    /// The planned path was replaced.
    pub fn sync_path(&mut self, store: &TrackStore) {
        if self.overlay_ready() {
            self.reconcile_path(store);
            self.raise_vehicle();
        }
        self.commit();
    }

    /// Redraw trail, path, and marker from the store without re-registering icons.
    pub fn sync_all(&mut self, store: &TrackStore) {
        if self.overlay_ready() {
            self.reconcile_trail(store);
            self.reconcile_path(store);
            self.reconcile_vehicle(store);
        }
        self.commit();
    }

    /// Explicit recenter, independent of camera mode.
    pub fn recenter(&mut self, position: GeoPoint) {
        self.pan_to(position);
        self.commit();
    }

    fn redraw(&mut self, store: &TrackStore) {
        self.refresh_attribution();
        if self.overlay_ready() {
            self.register_icons();
            self.reconcile_trail(store);
            self.reconcile_path(store);
            self.reconcile_vehicle(store);
        }
        self.commit();
    }

    fn pan_to(&mut self, position: GeoPoint) {
        let duration = self.pan_duration;
        self.call("pan_to", |s| s.pan_to(position, duration));
    }

    fn refresh_attribution(&mut self) {
        if let Some(surface) = self.surface.as_ref() {
            if !self.failed {
                self.attribution = aggregate_attribution(surface.source_attributions());
            }
        }
    }

    fn register_icons(&mut self) {
        for (id, image) in ICONS {
            if !self.has_image(id) {
                self.call("add_image", |s| s.add_image(id, image));
            }
        }
    }

    fn reconcile_trail(&mut self, store: &TrackStore) {
        let data = overlay::line_feature(store.trail().iter());
        self.upsert_source(overlay::TRAIL_SOURCE, &data);
        self.ensure_layer(overlay::trail_layer());
    }

    fn reconcile_vehicle(&mut self, store: &TrackStore) {
        match store.current_position() {
            Some(position) => {
                self.upsert_source(overlay::VEHICLE_SOURCE, &overlay::point_feature(position));
                self.ensure_layer(overlay::vehicle_layer());
            }
            None => {
                self.remove_layer(overlay::VEHICLE_LAYER);
                self.remove_source(overlay::VEHICLE_SOURCE);
            }
        }
    }

    /// Tear down every path layer and source, then rebuild from the store.
    fn reconcile_path(&mut self, store: &TrackStore) {
        for id in PATH_LAYERS {
            self.remove_layer(id);
        }
        for id in PATH_SOURCES {
            self.remove_source(id);
        }

        let path = store.path();
        let Some(start) = path.start() else {
            return;
        };

        self.add_source(overlay::PATH_SOURCE, &overlay::line_feature(path.points()));
        self.add_source(overlay::START_POINT_SOURCE, &overlay::point_feature(start));
        let end_data = path
            .end()
            .map(overlay::point_feature)
            .unwrap_or_else(overlay::empty_collection);
        self.add_source(overlay::END_POINT_SOURCE, &end_data);

        if path.has_line() {
            self.ensure_layer(overlay::path_casing_layer());
            self.ensure_layer(overlay::path_line_layer());
        }

        // Icons vanish with the style; symbols referencing them need them back.
        self.register_icons();
        self.ensure_layer(overlay::start_point_layer());
        if path.end().is_some() {
            self.ensure_layer(overlay::end_point_layer());
        }
    }

    /// Keep the vehicle marker above path layers added after it.
    fn raise_vehicle(&mut self) {
        if self.has_layer(overlay::VEHICLE_LAYER) {
            self.remove_layer(overlay::VEHICLE_LAYER);
            self.ensure_layer(overlay::vehicle_layer());
        }
    }

    fn upsert_source(&mut self, id: &str, data: &Value) {
        if self.has_source(id) {
            self.call("set_source_data", |s| s.set_source_data(id, data));
        } else {
            self.add_source(id, data);
        }
    }

    fn add_source(&mut self, id: &str, data: &Value) {
        self.call("add_source", |s| s.add_source(id, data));
    }

    fn remove_source(&mut self, id: &str) {
        if self.has_source(id) {
            self.call("remove_source", |s| s.remove_source(id));
        }
    }

    fn ensure_layer(&mut self, layer: LayerDescriptor) {
        if !self.has_layer(&layer.id) {
            self.call("add_layer", |s| s.add_layer(&layer));
        }
    }

    fn remove_layer(&mut self, id: &str) {
        if self.has_layer(id) {
            self.call("remove_layer", |s| s.remove_layer(id));
        }
    }

    fn has_source(&self, id: &str) -> bool {
        self.live_surface().is_some_and(|s| s.has_source(id))
    }

    fn has_layer(&self, id: &str) -> bool {
        self.live_surface().is_some_and(|s| s.has_layer(id))
    }

    fn has_image(&self, id: &str) -> bool {
        self.live_surface().is_some_and(|s| s.has_image(id))
    }

    fn overlay_ready(&self) -> bool {
        self.live_surface().is_some_and(|s| s.is_style_loaded())
    }

    fn live_surface(&self) -> Option<&S> {
        if self.failed {
            None
        } else {
            self.surface.as_ref()
        }
    }

    fn commit(&mut self) {
        if self.failed {
            return;
        }
        if let Some(surface) = self.surface.as_mut() {
            surface.commit();
        }
    }

    /// Run one surface call, containing its failure.
    fn call<F>(&mut self, op: &'static str, f: F)
    where
        F: FnOnce(&mut S) -> Result<(), SurfaceError>,
    {
        if self.failed {
            return;
        }
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        if let Err(e) = f(surface) {
            if e.is_fatal() {
                self.fail(&e.to_string());
            } else {
                warn!(op, error = %e, "Render surface call failed");
            }
        }
    }
}
