//! Render surface backed by the terminal map widget.
//!
//! The engine owns a [`TerminalSurface`] and edits a private working copy
//! of the [`SurfaceModel`]. [`RenderSurface::commit`] publishes that copy
//! to the model the dashboard draws from, under one lock, so a frame never
//! shows a reconcile pass half done. The camera is the exception: the
//! dashboard moves it directly through [`MapControls`], which reports user
//! pans back to the engine as surface events.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;

use roverwatch::geo::{self, GeoPoint, LocalOffset};
use roverwatch::render::{
    ImageData, LayerDescriptor, RenderSurface, StyleDescriptor, SurfaceError, SurfaceEvent,
    SurfaceModel, SurfaceOptions,
};

use super::widgets::map::viewport_half_extent;

/// Smallest and largest zoom the arrow keys will reach.
const ZOOM_RANGE: (f64, f64) = (2.0, 20.0);

#[derive(Clone)]
struct SharedModel(Arc<Mutex<SurfaceModel>>);

impl SharedModel {
    fn lock(&self) -> MutexGuard<'_, SurfaceModel> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Engine side of the terminal map.
pub struct TerminalSurface {
    /// Working copy, edited by the engine between commits.
    frame: SurfaceModel,
    /// Pan requested since the last commit.
    pending_pan: Option<GeoPoint>,
    published: SharedModel,
    events: mpsc::UnboundedSender<SurfaceEvent>,
}

/// Dashboard side of the terminal map.
#[derive(Clone)]
pub struct MapControls {
    model: SharedModel,
    events: mpsc::UnboundedSender<SurfaceEvent>,
}

impl TerminalSurface {
    /// Create the surface, its controls, and the event receiver for the engine.
    ///
    /// The terminal has no style to download, so `Load` is queued at once.
    pub fn new(
        options: SurfaceOptions,
    ) -> (Self, MapControls, mpsc::UnboundedReceiver<SurfaceEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let _ = events.send(SurfaceEvent::Load);
        let frame = SurfaceModel::new(&options);
        let published = SharedModel(Arc::new(Mutex::new(frame.clone())));

        let controls = MapControls {
            model: published.clone(),
            events: events.clone(),
        };
        let surface = Self {
            frame,
            pending_pan: None,
            published,
            events,
        };
        (surface, controls, rx)
    }
}

impl RenderSurface for TerminalSurface {
    fn set_style(&mut self, style: &StyleDescriptor) -> Result<(), SurfaceError> {
        self.frame.apply_style(style, true);
        let _ = self.events.send(SurfaceEvent::StyleData);
        Ok(())
    }

    fn pan_to(&mut self, center: GeoPoint, _duration: Duration) -> Result<(), SurfaceError> {
        self.pending_pan = Some(center);
        Ok(())
    }

    fn add_source(&mut self, id: &str, data: &Value) -> Result<(), SurfaceError> {
        self.frame.add_source(id, data)
    }

    fn set_source_data(&mut self, id: &str, data: &Value) -> Result<(), SurfaceError> {
        self.frame.set_source_data(id, data)
    }

    fn remove_source(&mut self, id: &str) -> Result<(), SurfaceError> {
        self.frame.remove_source(id)
    }

    fn has_source(&self, id: &str) -> bool {
        self.frame.has_source(id)
    }

    fn add_layer(&mut self, layer: &LayerDescriptor) -> Result<(), SurfaceError> {
        self.frame.add_layer(layer)
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), SurfaceError> {
        self.frame.remove_layer(id)
    }

    fn has_layer(&self, id: &str) -> bool {
        self.frame.has_layer(id)
    }

    fn add_image(&mut self, id: &str, _image: &ImageData) -> Result<(), SurfaceError> {
        self.frame.add_image(id)
    }

    fn has_image(&self, id: &str) -> bool {
        self.frame.has_image(id)
    }

    fn source_attributions(&self) -> Vec<String> {
        self.frame.attributions()
    }

    fn is_style_loaded(&self) -> bool {
        self.frame.is_style_loaded()
    }

    fn commit(&mut self) {
        let pan = self.pending_pan.take();
        let settled = {
            let mut published = self.published.lock();
            // Keep the camera the dashboard may have moved since the last commit.
            let zoom = published.zoom();
            let center = pan.unwrap_or_else(|| published.center());
            *published = self.frame.clone();
            published.set_camera(center, zoom);
            pan.map(|center| (center, zoom))
        };

        if let Some((center, zoom)) = settled {
            let _ = self.events.send(SurfaceEvent::MoveEnd { center, zoom });
        }
    }
}

impl MapControls {
    /// Run `f` against the current map state.
    pub fn read<R>(&self, f: impl FnOnce(&SurfaceModel) -> R) -> R {
        f(&self.model.lock())
    }

    /// Drag the map by a fraction of the visible extent.
    ///
    /// Positive `east` moves the view east, positive `north` moves it north.
    /// The engine sees a drag start followed by the settled camera.
    pub fn pan(&self, east: f64, north: f64, area: (u16, u16)) {
        let (center, zoom) = {
            let mut model = self.model.lock();
            let zoom = model.zoom();
            let (half_w, half_h) = viewport_half_extent(model.center(), zoom, area);
            let offset = LocalOffset::new(east * half_w, north * half_h);
            let Ok(center) = geo::project(offset, model.center()) else {
                return;
            };
            model.set_camera(center, zoom);
            (center, zoom)
        };
        let _ = self.events.send(SurfaceEvent::DragStart);
        let _ = self.events.send(SurfaceEvent::MoveEnd { center, zoom });
    }

    /// Zoom in or out around the current center.
    pub fn zoom_by(&self, delta: f64) {
        let (center, zoom) = {
            let mut model = self.model.lock();
            let zoom = (model.zoom() + delta).clamp(ZOOM_RANGE.0, ZOOM_RANGE.1);
            let center = model.center();
            model.set_camera(center, zoom);
            (center, zoom)
        };
        let _ = self.events.send(SurfaceEvent::MoveEnd { center, zoom });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use roverwatch::render::{overlay, MapSync};
    use roverwatch::track::TrackStore;
    use roverwatch::view::StyleKey;

    fn options() -> SurfaceOptions {
        SurfaceOptions {
            style: StyleDescriptor::for_key(StyleKey::Dark),
            center: GeoPoint::new(14.4208, 50.088).unwrap(),
            zoom: 16.0,
        }
    }

    #[test]
    fn test_load_is_queued_on_creation() {
        let (_surface, _controls, mut rx) = TerminalSurface::new(options());
        assert_eq!(rx.try_recv().unwrap(), SurfaceEvent::Load);
    }

    #[test]
    fn test_engine_pan_reports_settled_camera() {
        let (mut surface, controls, mut rx) = TerminalSurface::new(options());
        let _ = rx.try_recv();

        let target = GeoPoint::new(14.43, 50.09).unwrap();
        surface.pan_to(target, Duration::from_millis(300)).unwrap();
        assert!(rx.try_recv().is_err(), "nothing settles before commit");
        surface.commit();

        assert_eq!(controls.read(|m| m.center()), target);
        assert_eq!(
            rx.try_recv().unwrap(),
            SurfaceEvent::MoveEnd {
                center: target,
                zoom: 16.0
            }
        );
    }

    #[test]
    fn test_user_pan_reports_drag_then_move() {
        let (_surface, controls, mut rx) = TerminalSurface::new(options());
        let _ = rx.try_recv();

        controls.pan(0.5, 0.0, (80, 24));

        assert_eq!(rx.try_recv().unwrap(), SurfaceEvent::DragStart);
        match rx.try_recv().unwrap() {
            SurfaceEvent::MoveEnd { center, zoom } => {
                assert!(center.longitude() > 14.4208);
                assert_eq!(center.latitude(), 50.088);
                assert_eq!(zoom, 16.0);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_zoom_is_clamped_and_not_a_drag() {
        let (_surface, controls, mut rx) = TerminalSurface::new(options());
        let _ = rx.try_recv();

        controls.zoom_by(10.0);

        match rx.try_recv().unwrap() {
            SurfaceEvent::MoveEnd { zoom, .. } => assert_eq!(zoom, ZOOM_RANGE.1),
            other => panic!("unexpected event {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_style_swap_drops_overlays() {
        let (mut surface, controls, _rx) = TerminalSurface::new(options());
        surface
            .add_source("trail-source", &serde_json::json!({}))
            .unwrap();
        surface.commit();
        assert!(controls.read(|m| m.has_source("trail-source")));

        surface
            .set_style(&StyleDescriptor::for_key(StyleKey::Satellite))
            .unwrap();
        surface.commit();
        assert!(!controls.read(|m| m.has_source("trail-source")));
    }

    #[test]
    fn test_commit_keeps_user_camera() {
        let (mut surface, controls, _rx) = TerminalSurface::new(options());
        controls.zoom_by(-3.0);
        controls.pan(0.5, 0.0, (80, 24));
        let center = controls.read(|m| m.center());

        surface
            .add_source("trail-source", &serde_json::json!({}))
            .unwrap();
        surface.commit();

        controls.read(|m| {
            assert_eq!(m.center(), center);
            assert_eq!(m.zoom(), 13.0);
            assert!(m.has_source("trail-source"));
        });
    }

    /// Surface wrapper that checks what the dashboard would draw after
    /// every single engine call.
    struct Watched {
        inner: TerminalSurface,
        controls: MapControls,
        torn: Arc<AtomicUsize>,
    }

    impl Watched {
        fn check(&self) {
            let complete = self.controls.read(|m| {
                m.has_layer(overlay::PATH_LINE_LAYER)
                    && m.has_layer(overlay::START_POINT_LAYER)
                    && m.has_layer(overlay::END_POINT_LAYER)
                    && m.has_layer(overlay::VEHICLE_LAYER)
            });
            if !complete {
                self.torn.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    impl RenderSurface for Watched {
        fn set_style(&mut self, style: &StyleDescriptor) -> Result<(), SurfaceError> {
            let result = self.inner.set_style(style);
            self.check();
            result
        }

        fn pan_to(&mut self, center: GeoPoint, duration: Duration) -> Result<(), SurfaceError> {
            self.inner.pan_to(center, duration)
        }

        fn add_source(&mut self, id: &str, data: &Value) -> Result<(), SurfaceError> {
            let result = self.inner.add_source(id, data);
            self.check();
            result
        }

        fn set_source_data(&mut self, id: &str, data: &Value) -> Result<(), SurfaceError> {
            let result = self.inner.set_source_data(id, data);
            self.check();
            result
        }

        fn remove_source(&mut self, id: &str) -> Result<(), SurfaceError> {
            let result = self.inner.remove_source(id);
            self.check();
            result
        }

        fn has_source(&self, id: &str) -> bool {
            self.inner.has_source(id)
        }

        fn add_layer(&mut self, layer: &LayerDescriptor) -> Result<(), SurfaceError> {
            let result = self.inner.add_layer(layer);
            self.check();
            result
        }

        fn remove_layer(&mut self, id: &str) -> Result<(), SurfaceError> {
            let result = self.inner.remove_layer(id);
            self.check();
            result
        }

        fn has_layer(&self, id: &str) -> bool {
            self.inner.has_layer(id)
        }

        fn add_image(&mut self, id: &str, image: &ImageData) -> Result<(), SurfaceError> {
            self.inner.add_image(id, image)
        }

        fn has_image(&self, id: &str) -> bool {
            self.inner.has_image(id)
        }

        fn source_attributions(&self) -> Vec<String> {
            self.inner.source_attributions()
        }

        fn is_style_loaded(&self) -> bool {
            self.inner.is_style_loaded()
        }

        fn commit(&mut self) {
            self.inner.commit();
        }
    }

    #[test]
    fn test_dashboard_never_sees_half_replaced_path() {
        let (surface, controls, _rx) = TerminalSurface::new(options());
        let torn = Arc::new(AtomicUsize::new(0));
        let watched = Watched {
            inner: surface,
            controls: controls.clone(),
            torn: Arc::clone(&torn),
        };
        let mut sync = MapSync::new(Ok(watched), StyleKey::Dark, Duration::from_millis(300));

        let center = options().center;
        let mut store = TrackStore::new(100);
        store.on_pose(center);
        store.on_path(vec![
            GeoPoint::new(14.42, 50.08).unwrap(),
            GeoPoint::new(14.43, 50.09).unwrap(),
        ]);
        sync.on_load(&store);
        assert!(controls.read(|m| m.has_layer(overlay::PATH_LINE_LAYER)));
        torn.store(0, Ordering::SeqCst);

        store.on_path(vec![
            GeoPoint::new(14.44, 50.10).unwrap(),
            GeoPoint::new(14.45, 50.11).unwrap(),
        ]);
        sync.sync_path(&store);

        assert_eq!(torn.load(Ordering::SeqCst), 0);
        controls.read(|m| {
            let end = m.source(overlay::END_POINT_SOURCE).unwrap().to_string();
            assert!(end.contains("14.45"), "new path published: {}", end);
        });
    }
}
