//! End-to-end engine runs against in-memory collaborators.

use std::time::Duration;

use serde_json::json;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use roverwatch::config::DashboardConfig;
use roverwatch::engine::{DashboardSnapshot, Engine, EngineCommand, EngineHandle};
use roverwatch::render::{overlay, MemorySurface, StyleDescriptor, SurfaceOptions};
use roverwatch::source::{
    MemoryTransportFactory, SourceMode, TransportCall, DEFAULT_PATH_TOPIC, DEFAULT_POSE_TOPIC,
    DEFAULT_STATUS_TOPIC,
};
use roverwatch::telemetry::PLACEHOLDER;

struct Session {
    handle: EngineHandle,
    surface: MemorySurface,
    transports: MemoryTransportFactory,
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

fn start(mode: SourceMode) -> Session {
    let config = DashboardConfig::default();
    let (surface, events) = MemorySurface::new(SurfaceOptions {
        style: StyleDescriptor::for_key(config.map.style),
        center: config.origin().unwrap(),
        zoom: config.map.zoom,
    });
    let transports = MemoryTransportFactory::new();
    let cancel = CancellationToken::new();
    let (engine, handle) = Engine::new(
        config,
        mode,
        Ok(surface.clone()),
        events,
        transports.clone(),
        cancel.clone(),
    )
    .unwrap();

    Session {
        handle,
        surface,
        transports,
        cancel,
        task: tokio::spawn(engine.run()),
    }
}

async fn wait_for(
    rx: &mut watch::Receiver<DashboardSnapshot>,
    done: impl FnMut(&DashboardSnapshot) -> bool,
) -> DashboardSnapshot {
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(done))
        .await
        .expect("timed out waiting for snapshot")
        .expect("engine stopped")
        .clone()
}

#[tokio::test]
async fn test_live_session_end_to_end() {
    let session = start(SourceMode::Live);
    let mut rx = session.handle.subscribe();

    wait_for(&mut rx, |s| s.connected).await;
    let live = session.transports.latest().unwrap();

    live.publish(
        DEFAULT_STATUS_TOPIC,
        json!({"linear_velocity": 1.5, "error_code": 4096}),
    );
    let snapshot = wait_for(&mut rx, |s| s.status.is_some()).await;
    assert_eq!(snapshot.readout.speed, "1.5 m/s");
    assert_eq!(snapshot.readout.battery, format!("{}V", PLACEHOLDER));
    assert_eq!(snapshot.readout.error_code, "4096 (0x1000)");
    assert!(snapshot.fault);

    live.publish(
        DEFAULT_PATH_TOPIC,
        json!({"fixes": [{"latitude": 50.09, "longitude": 14.42}]}),
    );
    wait_for(&mut rx, |s| s.path_len == 1).await;
    let model = session.surface.model();
    assert!(model.has_layer(overlay::START_POINT_LAYER));
    assert!(!model.has_layer(overlay::PATH_LINE_LAYER));
    assert!(!model.has_layer(overlay::END_POINT_LAYER));

    live.publish(
        DEFAULT_POSE_TOPIC,
        json!({"latitude": 50.1, "longitude": 14.5}),
    );
    let snapshot = wait_for(&mut rx, |s| s.trail_len == 1).await;
    assert_eq!(snapshot.readout.position, "50.100000, 14.500000");
    assert!(session.surface.model().has_layer(overlay::VEHICLE_LAYER));
    assert_eq!(session.surface.pan_count(), 1);

    assert!(session.handle.send(EngineCommand::Shutdown).await);
    session.task.await.unwrap();

    assert!(live.active_subscriptions().is_empty());
    assert_eq!(live.calls().last(), Some(&TransportCall::Close));
}

#[tokio::test]
async fn test_cancellation_tears_down_live_source() {
    let session = start(SourceMode::Live);
    let mut rx = session.handle.subscribe();
    wait_for(&mut rx, |s| s.connected).await;

    session.cancel.cancel();
    session.task.await.unwrap();

    let live = session.transports.latest().unwrap();
    assert!(live.is_closed());
    assert!(live.active_subscriptions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_switch_back_and_forth_never_leaks_sources() {
    let session = start(SourceMode::Simulated);
    let mut rx = session.handle.subscribe();
    wait_for(&mut rx, |s| s.trail_len >= 3).await;

    for _ in 0..3 {
        session
            .handle
            .send(EngineCommand::SwitchMode(SourceMode::Live))
            .await;
        wait_for(&mut rx, |s| s.mode == SourceMode::Live && s.connected).await;

        session
            .handle
            .send(EngineCommand::SwitchMode(SourceMode::Simulated))
            .await;
        wait_for(&mut rx, |s| s.mode == SourceMode::Simulated && s.trail_len >= 1).await;
    }

    let handles = session.transports.handles();
    assert_eq!(handles.len(), 3);
    for live in handles {
        assert!(live.is_closed());
        assert!(live.active_subscriptions().is_empty());
    }

    session.handle.send(EngineCommand::Shutdown).await;
    session.task.await.unwrap();
}
