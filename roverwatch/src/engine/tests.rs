use serde_json::json;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::render::{overlay, MemorySurface, StyleDescriptor, SurfaceOptions};
use crate::source::{MemoryTransportFactory, Pose, TransportCall, DEFAULT_POSE_TOPIC};

type TestEngine = Engine<MemorySurface, MemoryTransportFactory>;

struct Harness {
    engine: TestEngine,
    handle: EngineHandle,
    surface: MemorySurface,
    transports: MemoryTransportFactory,
}

fn config() -> DashboardConfig {
    let mut config = DashboardConfig::default();
    config.simulation.seed = Some(11);
    config
}

fn harness(mode: SourceMode) -> Harness {
    harness_with(config(), mode)
}

fn harness_with(config: DashboardConfig, mode: SourceMode) -> Harness {
    let (surface, events) = MemorySurface::new(SurfaceOptions {
        style: StyleDescriptor::for_key(config.map.style),
        center: config.origin().unwrap(),
        zoom: config.map.zoom,
    });
    let transports = MemoryTransportFactory::new();
    let (engine, handle) = Engine::new(
        config,
        mode,
        Ok(surface.clone()),
        events,
        transports.clone(),
        CancellationToken::new(),
    )
    .unwrap();
    Harness {
        engine,
        handle,
        surface,
        transports,
    }
}

async fn step_until(engine: &mut TestEngine, mut done: impl FnMut(&TestEngine) -> bool) {
    for _ in 0..500 {
        if done(engine) {
            return;
        }
        assert!(engine.step().await, "engine stopped early");
    }
    panic!("condition not reached");
}

fn point(lon: f64, lat: f64) -> GeoPoint {
    GeoPoint::new(lon, lat).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_simulated_poses_pan_once_each_while_following() {
    let mut h = harness(SourceMode::Simulated);
    h.engine.start();

    step_until(&mut h.engine, |e| e.store().trail().len() >= 5).await;

    assert!(h.engine.is_connected());
    assert_eq!(h.surface.pan_count(), h.engine.store().trail().len());
    let snapshot = h.handle.snapshot();
    assert_eq!(snapshot.mode, SourceMode::Simulated);
    assert_eq!(snapshot.camera, CameraMode::Following);
    assert!(snapshot.status.is_some());
    assert!(h.surface.model().has_layer(overlay::VEHICLE_LAYER));
}

#[tokio::test(start_paused = true)]
async fn test_drag_stops_autonomous_pans_until_recenter() {
    let mut h = harness(SourceMode::Simulated);
    h.engine.start();
    step_until(&mut h.engine, |e| e.store().trail().len() >= 2).await;

    h.surface.emit(SurfaceEvent::DragStart);
    step_until(&mut h.engine, |e| e.camera_mode() == CameraMode::Free).await;
    let pans = h.surface.pan_count();
    let trail = h.engine.store().trail().len();

    step_until(&mut h.engine, |e| e.store().trail().len() >= trail + 3).await;
    assert_eq!(h.surface.pan_count(), pans, "no pans while free");

    assert!(h.engine.dispatch(EngineCommand::Recenter).await);
    assert_eq!(h.surface.pan_count(), pans + 1);
    assert_eq!(h.engine.camera_mode(), CameraMode::Following);
}

#[tokio::test(start_paused = true)]
async fn test_toggle_follow_pans_only_when_engaging() {
    let mut h = harness(SourceMode::Simulated);
    h.engine.start();
    step_until(&mut h.engine, |e| e.store().trail().len() >= 1).await;
    let pans = h.surface.pan_count();

    h.engine.dispatch(EngineCommand::ToggleFollow).await;
    assert_eq!(h.engine.camera_mode(), CameraMode::Free);
    assert_eq!(h.surface.pan_count(), pans);

    h.engine.dispatch(EngineCommand::ToggleFollow).await;
    assert_eq!(h.engine.camera_mode(), CameraMode::Following);
    assert_eq!(h.surface.pan_count(), pans + 1);
}

#[tokio::test]
async fn test_recenter_without_position_is_noop() {
    let mut h = harness(SourceMode::Live);
    h.engine.on_surface_event(SurfaceEvent::DragStart);

    assert!(h.engine.dispatch(EngineCommand::Recenter).await);

    assert_eq!(h.surface.pan_count(), 0);
    assert_eq!(h.engine.camera_mode(), CameraMode::Free);
}

#[tokio::test(start_paused = true)]
async fn test_mode_switch_clears_at_boundary_and_unwinds_live() {
    let mut h = harness(SourceMode::Simulated);
    h.engine.start();
    step_until(&mut h.engine, |e| e.store().trail().len() >= 3).await;

    let generation = h.engine.generation();
    h.engine.on_sample(SourceSample {
        generation,
        event: SourceEvent::Path(vec![point(14.42, 50.08), point(14.43, 50.09)]),
    });
    assert_eq!(h.engine.store().path().len(), 2);

    // Simulated -> Live
    h.engine.dispatch(EngineCommand::SwitchMode(SourceMode::Live)).await;
    let snapshot = h.handle.snapshot();
    assert_eq!(snapshot.mode, SourceMode::Live);
    assert_eq!((snapshot.trail_len, snapshot.path_len), (0, 0));
    assert!(!snapshot.connected);
    assert!(snapshot.status.is_none());
    let model = h.surface.model();
    for id in overlay::PATH_LAYERS {
        assert!(!model.has_layer(id), "{} left behind", id);
    }
    assert!(!model.has_layer(overlay::VEHICLE_LAYER));

    step_until(&mut h.engine, |e| e.is_connected()).await;
    let live = h.transports.latest().unwrap();
    live.publish(DEFAULT_POSE_TOPIC, json!({"latitude": 50.1, "longitude": 14.5}));
    step_until(&mut h.engine, |e| e.store().trail().len() == 1).await;
    assert_eq!(h.engine.store().current_position(), Some(point(14.5, 50.1)));

    // Live -> Simulated
    h.engine
        .dispatch(EngineCommand::SwitchMode(SourceMode::Simulated))
        .await;
    assert_eq!(h.engine.store().trail().len(), 0);
    assert!(live.active_subscriptions().is_empty());
    assert_eq!(live.calls().last(), Some(&TransportCall::Close));
}

#[tokio::test(start_paused = true)]
async fn test_mode_switch_with_full_sample_queue_does_not_hang() {
    let mut h = harness(SourceMode::Simulated);
    h.engine.start();

    // Let the simulator fill the sample queue while nothing drains it.
    tokio::time::sleep(std::time::Duration::from_secs(60)).await;

    let switched = tokio::time::timeout(
        std::time::Duration::from_secs(30),
        h.engine.dispatch(EngineCommand::SwitchMode(SourceMode::Live)),
    )
    .await
    .expect("mode switch blocked on a source stuck sending");
    assert!(switched);
    assert_eq!(h.engine.mode(), SourceMode::Live);

    // Whatever the old simulator left queued is discarded as stale.
    step_until(&mut h.engine, |e| e.is_connected()).await;
    assert!(h.engine.discarded_stale() > 0);
    assert_eq!(h.engine.store().trail().len(), 0);
}

#[tokio::test]
async fn test_samples_from_retired_generation_are_discarded() {
    let mut h = harness(SourceMode::Live);
    h.engine.start();
    step_until(&mut h.engine, |e| e.is_connected()).await;
    let retired = h.engine.generation();

    h.engine
        .dispatch(EngineCommand::SwitchMode(SourceMode::Simulated))
        .await;
    h.engine.on_sample(SourceSample {
        generation: retired,
        event: SourceEvent::Pose(Pose::new(point(14.5, 50.1))),
    });

    assert!(h.engine.store().trail().is_empty());
    assert_eq!(h.engine.discarded_stale(), 1);
}

#[tokio::test]
async fn test_samples_ignored_while_disconnected() {
    let mut h = harness(SourceMode::Live);
    let generation = h.engine.generation();

    h.engine.on_sample(SourceSample {
        generation,
        event: SourceEvent::Pose(Pose::new(point(14.5, 50.1))),
    });
    assert!(h.engine.store().trail().is_empty());

    h.engine.on_sample(SourceSample {
        generation,
        event: SourceEvent::Connection(true),
    });
    h.engine.on_sample(SourceSample {
        generation,
        event: SourceEvent::Pose(Pose::new(point(14.5, 50.1))),
    });
    assert_eq!(h.engine.store().trail().len(), 1);
}

#[tokio::test]
async fn test_empty_path_clears_overlay() {
    let mut h = harness(SourceMode::Live);
    h.engine.on_surface_event(SurfaceEvent::Load);
    let generation = h.engine.generation();
    h.engine.on_sample(SourceSample {
        generation,
        event: SourceEvent::Connection(true),
    });
    h.engine.on_sample(SourceSample {
        generation,
        event: SourceEvent::Path(vec![point(14.42, 50.08), point(14.43, 50.09)]),
    });
    assert!(h.surface.model().has_layer(overlay::PATH_LINE_LAYER));

    h.engine.on_sample(SourceSample {
        generation,
        event: SourceEvent::Path(Vec::new()),
    });

    let model = h.surface.model();
    for id in overlay::PATH_LAYERS {
        assert!(!model.has_layer(id));
    }
    for id in overlay::PATH_SOURCES {
        assert!(!model.has_source(id));
    }
}

#[tokio::test]
async fn test_transport_change_restarts_live_source() {
    let mut h = harness(SourceMode::Live);
    h.engine.start();
    step_until(&mut h.engine, |e| e.is_connected()).await;

    let mut edited = h.engine.config().clone();
    edited.transport.url = "ws://rover:9090".to_string();
    h.engine
        .dispatch(EngineCommand::ApplyConfig(Box::new(edited)))
        .await;

    let handles = h.transports.handles();
    assert_eq!(handles.len(), 2);
    assert!(handles[0].is_closed());
    assert!(handles[0].active_subscriptions().is_empty());
    assert!(!h.engine.is_connected());

    step_until(&mut h.engine, |e| e.is_connected()).await;
    assert_eq!(
        handles[1].calls()[0],
        TransportCall::Connect("ws://rover:9090".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_apply_config_resizes_trail_and_keeps_origin() {
    let mut h = harness(SourceMode::Simulated);
    h.engine.start();
    step_until(&mut h.engine, |e| e.store().trail().len() >= 8).await;
    let newest = h.engine.store().current_position();

    let mut edited = h.engine.config().clone();
    edited.map.trail_max_length = 4;
    edited.map.origin_lat = 10.0;
    h.engine
        .dispatch(EngineCommand::ApplyConfig(Box::new(edited)))
        .await;

    assert_eq!(h.engine.store().trail().len(), 4);
    assert_eq!(h.engine.store().current_position(), newest);
    assert_eq!(h.engine.config().map.origin_lat, 50.088);
    assert_eq!(h.transports.handles().len(), 0);
}

#[tokio::test]
async fn test_style_switch_redraws_overlays() {
    let mut h = harness(SourceMode::Live);
    h.engine.on_surface_event(SurfaceEvent::Load);
    let generation = h.engine.generation();
    h.engine.on_sample(SourceSample {
        generation,
        event: SourceEvent::Connection(true),
    });
    h.engine.on_sample(SourceSample {
        generation,
        event: SourceEvent::Pose(Pose::new(point(14.5, 50.1))),
    });

    h.engine
        .dispatch(EngineCommand::SetStyle(StyleKey::Satellite))
        .await;

    let snapshot = h.handle.snapshot();
    assert_eq!(snapshot.style, StyleKey::Satellite);
    assert!(snapshot.attribution.contains("Esri"));
    let model = h.surface.model();
    assert!(model.has_layer(overlay::VEHICLE_LAYER));
    assert!(model.has_layer(overlay::TRAIL_LAYER));
    assert!(model.has_image(overlay::START_ICON));
}

#[tokio::test]
async fn test_fatal_surface_error_sets_map_failed() {
    let mut h = harness(SourceMode::Live);
    h.engine.on_surface_event(SurfaceEvent::Load);
    h.engine.on_surface_event(SurfaceEvent::Error {
        message: "context lost".to_string(),
        fatal: true,
    });
    h.surface.clear_calls();

    let generation = h.engine.generation();
    h.engine.on_sample(SourceSample {
        generation,
        event: SourceEvent::Connection(true),
    });
    h.engine.on_sample(SourceSample {
        generation,
        event: SourceEvent::Pose(Pose::new(point(14.5, 50.1))),
    });

    assert!(h.handle.snapshot().map_failed);
    assert_eq!(h.engine.store().trail().len(), 1);
    assert!(h.surface.calls().is_empty());
}

#[tokio::test]
async fn test_failed_surface_construction_keeps_engine_alive() {
    let (_, events) = tokio::sync::mpsc::unbounded_channel();
    let (mut engine, handle) = Engine::<MemorySurface, _>::new(
        config(),
        SourceMode::Live,
        Err(SurfaceError::Unavailable("no GPU".to_string())),
        events,
        MemoryTransportFactory::new(),
        CancellationToken::new(),
    )
    .unwrap();

    engine.start();
    step_until(&mut engine, |e| e.is_connected()).await;
    assert!(handle.snapshot().map_failed);
}

#[tokio::test]
async fn test_reset_and_shutdown() {
    let mut h = harness(SourceMode::Live);
    let generation = h.engine.generation();
    h.engine.on_sample(SourceSample {
        generation,
        event: SourceEvent::Connection(true),
    });
    h.engine.on_sample(SourceSample {
        generation,
        event: SourceEvent::Pose(Pose::new(point(14.5, 50.1))),
    });

    assert!(h.engine.dispatch(EngineCommand::Reset).await);
    assert!(h.engine.store().trail().is_empty());
    assert!(!h.engine.dispatch(EngineCommand::Shutdown).await);
}

#[test]
fn test_invalid_origin_is_rejected() {
    let mut config = config();
    config.map.origin_lat = 120.0;
    let (_, events) = tokio::sync::mpsc::unbounded_channel();

    let result = Engine::<MemorySurface, _>::new(
        config,
        SourceMode::Simulated,
        Err(SurfaceError::Unavailable("unused".to_string())),
        events,
        MemoryTransportFactory::new(),
        CancellationToken::new(),
    );
    assert!(matches!(result, Err(EngineError::InvalidOrigin(_))));
}

#[tokio::test(start_paused = true)]
async fn test_run_stops_on_shutdown_and_joins_source() {
    let h = harness(SourceMode::Simulated);
    let task = tokio::spawn(h.engine.run());

    let mut rx = h.handle.subscribe();
    rx.wait_for(|s| s.trail_len >= 2).await.unwrap();
    assert!(h.handle.send(EngineCommand::Shutdown).await);
    task.await.unwrap();

    assert!(!h.handle.send(EngineCommand::Reset).await);
}
