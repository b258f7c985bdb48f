//! Simulated telemetry source.
//!
//! Drives the vehicle around a circle centered on the origin and
//! synthesizes a status record on every tick. A small share of ticks
//! carry non-default control modes, vehicle states, and error codes so
//! the fault paths of the display get exercised.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{Pose, SampleSink, SourceEvent};
use crate::geo::{self, GeoError, GeoPoint, LocalOffset};
use crate::telemetry::{ActuatorState, VehicleStatus};

/// Default tick interval.
pub const DEFAULT_TICK: Duration = Duration::from_millis(120);

/// Default circle radius in meters.
pub const DEFAULT_RADIUS_M: f64 = 140.0;

/// Simulated time advanced per tick.
pub const DEFAULT_TIME_STEP: f64 = 0.04;

const ACTUATOR_COUNT: usize = 3;
const DRIVER_STATES: [f64; 3] = [192.0, 64.0, 128.0];
const MAX_PULSE_COUNT: u32 = 16_777_215;

/// Simulated source settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub tick: Duration,
    pub radius_m: f64,
    pub time_step: f64,
    /// Fixed RNG seed for reproducible fault injection.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick: DEFAULT_TICK,
            radius_m: DEFAULT_RADIUS_M,
            time_step: DEFAULT_TIME_STEP,
            seed: None,
        }
    }
}

/// Pure generator behind the simulated source.
pub struct CircularTrajectory {
    t: f64,
    time_step: f64,
    radius_m: f64,
    origin: GeoPoint,
    rng: fastrand::Rng,
}

impl CircularTrajectory {
    pub fn new(config: &SimulationConfig, origin: GeoPoint) -> Self {
        let rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self {
            t: 0.0,
            time_step: config.time_step,
            radius_m: config.radius_m,
            origin,
            rng,
        }
    }

    /// Elapsed simulated time.
    pub fn time(&self) -> f64 {
        self.t
    }

    /// Advance one tick and produce the pose and status for it.
    pub fn advance(&mut self) -> Result<(Pose, VehicleStatus), GeoError> {
        self.t += self.time_step;
        let t = self.t;

        let offset = LocalOffset::new(t.cos() * self.radius_m, t.sin() * self.radius_m);
        let position = geo::project(offset, self.origin)?;

        Ok((Pose::new(position), self.status_at(t)))
    }

    fn status_at(&mut self, t: f64) -> VehicleStatus {
        let control_mode = if self.rng.f64() > 0.9 { 2.0 } else { 0.0 };
        let vehicle_state = if self.rng.f64() > 0.8 { 3.0 } else { 2.0 };
        let error_code = if self.rng.f64() > 0.95 { 4096.0 } else { 0.0 };

        let actuators = (0..ACTUATOR_COUNT)
            .map(|i| {
                let phase = i as f64;
                ActuatorState {
                    motor_id: Some(phase),
                    current: Some(0.5 + (t * 0.4 + phase).sin() * 0.4),
                    pulse_count: Some(f64::from(self.rng.u32(0..MAX_PULSE_COUNT))),
                    rpm: Some((1200.0 + (t * 0.3 + phase).sin() * 200.0).floor()),
                    driver_voltage: Some(26.4 + (t * 0.2 + phase).sin() * 0.8),
                    driver_temperature: Some(39.0 + (t * 0.15 + phase).sin() * 6.0),
                    motor_temperature: Some(-27.0 + (t * 0.1 + phase).sin() * 13.0),
                    driver_state: Some(DRIVER_STATES[i % DRIVER_STATES.len()]),
                }
            })
            .collect();

        VehicleStatus {
            linear_velocity: Some((t * 0.5).sin().abs() * 1.6),
            steering_angle: Some((t * 0.6).cos() * 0.3),
            battery_voltage: Some(25.7 + (t * 0.1).sin() * 0.5),
            control_mode: Some(control_mode),
            vehicle_state: Some(vehicle_state),
            error_code: Some(error_code),
            actuators,
        }
    }
}

/// Clock-driven simulated source.
pub struct SimulatedSource {
    config: SimulationConfig,
    trajectory: CircularTrajectory,
    sink: SampleSink,
    cancel: CancellationToken,
}

impl SimulatedSource {
    pub fn new(
        config: SimulationConfig,
        origin: GeoPoint,
        sink: SampleSink,
        cancel: CancellationToken,
    ) -> Self {
        let trajectory = CircularTrajectory::new(&config, origin);
        Self {
            config,
            trajectory,
            sink,
            cancel,
        }
    }

    /// Start the tick loop as an async task.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(mut self) {
        info!(
            tick_ms = self.config.tick.as_millis() as u64,
            radius_m = self.config.radius_m,
            "Simulated telemetry source started"
        );

        if !self.sink.emit(SourceEvent::Connection(true)).await {
            return;
        }

        let mut interval = tokio::time::interval(self.config.tick);
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            let (pose, status) = match self.trajectory.advance() {
                Ok(sample) => sample,
                Err(e) => {
                    warn!(error = %e, t = self.trajectory.time(), "Simulated position out of range, skipping tick");
                    continue;
                }
            };

            if !self.sink.emit(SourceEvent::Pose(pose)).await
                || !self.sink.emit(SourceEvent::Status(status)).await
            {
                debug!("Simulated source sink closed or cancelled, stopping");
                break;
            }
        }

        info!("Simulated telemetry source stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceSample;
    use tokio::sync::mpsc;

    fn origin() -> GeoPoint {
        GeoPoint::new(14.4208, 50.088).unwrap()
    }

    fn seeded() -> SimulationConfig {
        SimulationConfig {
            seed: Some(42),
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_trajectory_stays_on_circle() {
        let mut trajectory = CircularTrajectory::new(&seeded(), origin());
        for _ in 0..200 {
            let (pose, _) = trajectory.advance().unwrap();
            let offset = geo::unproject(pose.position, origin()).unwrap();
            let r = (offset.x * offset.x + offset.y * offset.y).sqrt();
            assert!((r - DEFAULT_RADIUS_M).abs() < 1e-6, "radius drifted: {}", r);
        }
    }

    #[test]
    fn test_first_tick_is_one_step_in() {
        let mut trajectory = CircularTrajectory::new(&seeded(), origin());
        let (pose, status) = trajectory.advance().unwrap();
        let expected = geo::project(
            LocalOffset::new(0.04f64.cos() * 140.0, 0.04f64.sin() * 140.0),
            origin(),
        )
        .unwrap();
        assert_eq!(pose.position, expected);
        assert_eq!(status.actuators.len(), 3);
        assert_eq!(status.actuators[1].driver_state, Some(64.0));
    }

    #[test]
    fn test_status_fields_are_always_present() {
        let mut trajectory = CircularTrajectory::new(&seeded(), origin());
        for _ in 0..50 {
            let (_, s) = trajectory.advance().unwrap();
            assert!(s.linear_velocity.is_some_and(|v| (0.0..=1.6).contains(&v)));
            assert!(s.battery_voltage.is_some_and(|v| (25.2..=26.2).contains(&v)));
            assert!(matches!(s.control_mode, Some(c) if c == 0.0 || c == 2.0));
            assert!(matches!(s.error_code, Some(c) if c == 0.0 || c == 4096.0));
            for a in &s.actuators {
                let pulses = a.pulse_count.unwrap();
                assert!((0.0..16_777_215.0).contains(&pulses));
            }
        }
    }

    #[test]
    fn test_fault_injection_is_rare_but_present() {
        let mut trajectory = CircularTrajectory::new(&seeded(), origin());
        let mut errors = 0;
        let mut control = 0;
        let n = 5000;
        for _ in 0..n {
            let (_, s) = trajectory.advance().unwrap();
            if s.error_code == Some(4096.0) {
                errors += 1;
            }
            if s.control_mode == Some(2.0) {
                control += 1;
            }
        }
        // ~5% and ~10% of ticks
        assert!((100..400).contains(&errors), "error ticks: {}", errors);
        assert!((300..700).contains(&control), "control ticks: {}", control);
    }

    #[test]
    fn test_same_seed_same_faults() {
        let mut a = CircularTrajectory::new(&seeded(), origin());
        let mut b = CircularTrajectory::new(&seeded(), origin());
        for _ in 0..20 {
            assert_eq!(a.advance().unwrap(), b.advance().unwrap());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_emits_connection_then_samples_until_cancelled() {
        let (tx, mut rx) = mpsc::channel(64);
        let cancel = CancellationToken::new();
        let sink = SampleSink::new(3, tx, cancel.clone());
        let source = SimulatedSource::new(seeded(), origin(), sink, cancel.clone());
        let task = source.start();

        let first: SourceSample = rx.recv().await.unwrap();
        assert_eq!(first.event, SourceEvent::Connection(true));
        assert_eq!(first.generation, 3);

        for _ in 0..3 {
            assert!(matches!(rx.recv().await.unwrap().event, SourceEvent::Pose(_)));
            assert!(matches!(rx.recv().await.unwrap().event, SourceEvent::Status(_)));
        }

        cancel.cancel();
        task.await.unwrap();

        // Drain what was already queued, then nothing else ever arrives
        while rx.try_recv().is_ok() {}
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }
}
