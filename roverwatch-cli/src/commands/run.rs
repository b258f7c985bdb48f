//! Run command - start the engine and the dashboard.
//!
//! Loads the configuration, initializes logging, builds the engine around
//! the terminal render surface and the rosbridge transport, then hands
//! control to the interactive dashboard or to the headless printer.

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use roverwatch::config::{CameraFeeds, DashboardConfig};
use roverwatch::engine::{Engine, EngineCommand, EngineError, EngineHandle};
use roverwatch::logging::{init_logging, split_log_path};
use roverwatch::render::{StyleDescriptor, SurfaceOptions};
use roverwatch::source::{RosbridgeTransport, SourceMode};

use crate::error::CliError;
use crate::ui::{Dashboard, DashboardEvent, MapControls, TerminalSurface};

/// Dashboard redraw and key poll interval.
const FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// Interval between headless status lines.
const HEADLESS_INTERVAL: Duration = Duration::from_secs(1);

/// Arguments for the run command.
pub struct RunArgs {
    pub config_path: PathBuf,
    pub mode: SourceMode,
    pub headless: bool,
    pub json: bool,
    pub debug: bool,
}

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let config = DashboardConfig::load_from(&args.config_path)?;

    // The dashboard needs a terminal; anything else gets the line printer
    let headless = args.headless || args.json || !io::stdout().is_terminal();

    // stdout belongs to the dashboard or to the JSON stream
    let stdout_logging = headless && !args.json;
    let (log_dir, log_file) = split_log_path(&config.logging.file);
    let _logging_guard = init_logging(&log_dir, &log_file, stdout_logging, args.debug)
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

    info!("Roverwatch v{}", roverwatch::VERSION);
    info!(
        config = %args.config_path.display(),
        mode = %args.mode,
        headless,
        "Roverwatch CLI: run command"
    );

    let runtime = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;
    runtime.block_on(run_session(config, args, headless))
}

async fn run_session(
    config: DashboardConfig,
    args: RunArgs,
    headless: bool,
) -> Result<(), CliError> {
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    ctrlc::set_handler(move || {
        signal_cancel.cancel();
    })
    .map_err(|e| CliError::Signal(e.to_string()))?;

    let origin = config.origin().map_err(EngineError::from)?;
    let cameras = config.camera_feeds();
    info!(front = %cameras.front, rear = %cameras.rear, "Camera streams");
    let (surface, controls, events) = TerminalSurface::new(SurfaceOptions {
        style: StyleDescriptor::for_key(config.map.style),
        center: origin,
        zoom: config.map.zoom,
    });

    let (engine, handle) = Engine::new(
        config,
        args.mode,
        Ok(surface),
        events,
        RosbridgeTransport::new,
        cancel.clone(),
    )?;
    let engine_task = tokio::spawn(engine.run());

    let result = if headless {
        if !args.json {
            println!("Front camera: {}", cameras.front);
            println!("Rear camera:  {}", cameras.rear);
        }
        run_headless(&handle, &cancel, args.json).await
    } else {
        let handle = handle.clone();
        let cancel = cancel.clone();
        let config_path = args.config_path.clone();
        tokio::task::spawn_blocking(move || {
            run_tui(&handle, &controls, cameras, &cancel, &config_path)
        })
        .await
        .unwrap_or_else(|e| Err(CliError::Terminal(io::Error::other(e))))
    };

    if !handle.send(EngineCommand::Shutdown).await {
        debug!("Engine already stopped");
    }
    if let Err(e) = engine_task.await {
        warn!(error = %e, "Engine task did not finish cleanly");
    }
    info!("Roverwatch stopped");

    result
}

/// Interactive dashboard loop. Blocks until quit or cancellation.
fn run_tui(
    handle: &EngineHandle,
    controls: &MapControls,
    cameras: CameraFeeds,
    cancel: &CancellationToken,
    config_path: &Path,
) -> Result<(), CliError> {
    let mut dashboard = Dashboard::new(cameras).map_err(CliError::Terminal)?;

    while !cancel.is_cancelled() {
        let snapshot = handle.snapshot();
        dashboard
            .draw(&snapshot, controls)
            .map_err(CliError::Terminal)?;

        let Some(event) = dashboard
            .poll_event(FRAME_INTERVAL)
            .map_err(CliError::Terminal)?
        else {
            continue;
        };

        let command = match event {
            DashboardEvent::Quit => break,
            DashboardEvent::Command(command) => command,
            DashboardEvent::ToggleMode => EngineCommand::SwitchMode(snapshot.mode.toggled()),
            DashboardEvent::Pan { east, north } => {
                controls.pan(east, north, dashboard.map_area());
                continue;
            }
            DashboardEvent::Zoom(delta) => {
                controls.zoom_by(delta);
                continue;
            }
            DashboardEvent::ReloadConfig => match DashboardConfig::load_from(config_path) {
                Ok(config) => {
                    info!(path = %config_path.display(), "Configuration reloaded");
                    dashboard.set_cameras(config.camera_feeds());
                    EngineCommand::ApplyConfig(Box::new(config))
                }
                Err(e) => {
                    warn!(error = %e, "Configuration reload failed");
                    continue;
                }
            },
        };

        if !handle.try_send(command) {
            warn!("Engine is not accepting commands");
        }
    }

    dashboard.restore().map_err(CliError::Terminal)
}

/// Print a status line every second until cancelled or the engine stops.
async fn run_headless(
    handle: &EngineHandle,
    cancel: &CancellationToken,
    json: bool,
) -> Result<(), CliError> {
    if !json {
        println!("Roverwatch running headless. Press Ctrl+C to stop.");
    }

    let mut snapshots = handle.subscribe();
    let mut ticker = tokio::time::interval(HEADLESS_INTERVAL);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        if snapshots.has_changed().is_err() {
            debug!("Engine stopped publishing");
            break;
        }
        let snapshot = snapshots.borrow_and_update().clone();

        if json {
            match serde_json::to_string(&snapshot) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!(error = %e, "Failed to serialize snapshot"),
            }
        } else {
            let r = &snapshot.readout;
            println!(
                "[{}] {} | pos {} | speed {} | battery {} | error {} | trail {} | path {} | {}",
                snapshot.mode,
                if snapshot.connected { "connected" } else { "disconnected" },
                r.position,
                r.speed,
                r.battery,
                r.error_code,
                snapshot.trail_len,
                snapshot.path_len,
                snapshot.camera,
            );
        }
    }

    Ok(())
}
