//! Fault handling: invalid telemetry and rejected outputs never stop control.

use std::ops::Range;
use std::time::Duration;

use volley_common::shooter::config::{SequenceConfig, ShooterConfig, SimulationConfig};
use volley_common::shooter::io::{HalError, ShooterIo, Side, TelemetrySource};
use volley_common::shooter::telemetry::ShooterFaults;
use volley_control::cycle::{Pacing, TickRunner};
use volley_control::sequence::task::Wait;
use volley_control::sequence::{ShootSequencer, ShotOutcome};
use volley_control::telemetry::Dashboard;
use volley_control::{ControlError, DualActuatorShooter};
use volley_hal::SimulationDriver;

const DT: Duration = Duration::from_millis(20);

/// Simulated plant behind a hardware-like backend with scheduled faults.
struct FlakyIo {
    plant: SimulationDriver,
    tick: u64,
    nan_left: Range<u64>,
    reject_right: Range<u64>,
}

impl FlakyIo {
    fn new(nan_left: Range<u64>, reject_right: Range<u64>) -> Self {
        Self {
            plant: SimulationDriver::new(&SimulationConfig::default(), 0.0508),
            tick: 0,
            nan_left,
            reject_right,
        }
    }
}

impl ShooterIo for FlakyIo {
    fn name(&self) -> &'static str {
        "flaky"
    }

    fn source(&self) -> TelemetrySource {
        TelemetrySource::Hardware
    }

    fn begin_tick(&mut self, dt: Duration) {
        self.tick += 1;
        self.plant.begin_tick(dt);
    }

    fn measured_velocity(&self, side: Side) -> f64 {
        if side == Side::Left && self.nan_left.contains(&self.tick) {
            f64::NAN
        } else {
            self.plant.measured_velocity(side)
        }
    }

    fn set_normalized_output(&mut self, side: Side, value: f64) -> Result<(), HalError> {
        if side == Side::Right && self.reject_right.contains(&self.tick) {
            return Err(HalError::OutputRejected {
                side,
                reason: "motor controller brownout".into(),
            });
        }
        self.plant.set_normalized_output(side, value)
    }

    fn close(&mut self) -> Result<(), HalError> {
        self.plant.close()
    }
}

fn flaky_shooter(nan_left: Range<u64>, reject_right: Range<u64>) -> DualActuatorShooter {
    DualActuatorShooter::new(
        &ShooterConfig::default(),
        &SimulationConfig::default(),
        Some(Box::new(FlakyIo::new(nan_left, reject_right))),
    )
    .expect("default configuration is valid")
}

#[test]
fn sensor_dropout_holds_last_command() {
    let mut shooter = flaky_shooter(100..110, 0..0);
    let dashboard = Dashboard::new();
    shooter.set_telemetry_sink(Box::new(dashboard.clone()));
    shooter.set_target_velocity(3000.0);

    for _ in 0..99 {
        shooter.tick(DT).unwrap();
    }
    let held = shooter.drive_command(Side::Left);
    let last_good = shooter.velocity(Side::Left);

    for _ in 100..110 {
        shooter.tick(DT).unwrap();
        assert!(shooter.faults().contains(ShooterFaults::SENSOR_LEFT));
        assert_eq!(shooter.drive_command(Side::Left), held);
        assert_eq!(shooter.velocity(Side::Left), last_good);
        // Dashboard keeps showing the last known value.
        let latest = dashboard.latest().unwrap();
        assert_eq!(latest.left_rpm, last_good);
        assert!(latest.faults.contains(ShooterFaults::SENSOR_LEFT));
    }

    shooter.tick(DT).unwrap();
    assert!(!shooter.faults().contains(ShooterFaults::SENSOR_LEFT));
    assert!(shooter.at_setpoint());
}

#[test]
fn rejected_output_surfaces_and_recovers() {
    let mut shooter = flaky_shooter(0..0, 150..155);
    shooter.set_target_velocity(3000.0);

    for tick in 1..=300u64 {
        let result = shooter.tick(DT);
        if (150..155).contains(&tick) {
            match result {
                Err(ControlError::ActuationFault { side, .. }) => assert_eq!(side, Side::Right),
                other => panic!("tick {tick}: expected actuation fault, got {other:?}"),
            }
            assert!(shooter.faults().contains(ShooterFaults::ACTUATION_RIGHT));
        } else {
            assert!(result.is_ok(), "tick {tick}: {result:?}");
        }
    }
    assert!(shooter.faults().is_empty());
    assert!(shooter.at_setpoint());
}

#[test]
fn runner_keeps_going_through_faults() {
    let mut shooter = flaky_shooter(60..70, 80..90);
    let mut sequencer = ShootSequencer::<DualActuatorShooter>::new(
        &SequenceConfig::default(),
        3000.0,
        Box::new(Wait::new(Duration::from_secs(4))),
    )
    .expect("valid sequence");
    let mut runner = TickRunner::new(DT, Pacing::Unpaced);

    let report = runner.run_shot(&mut shooter, &mut sequencer, 2000);

    assert_eq!(report.result, Some(Ok(ShotOutcome::Fed)));
    assert_eq!(report.ticks, 250);
    assert_eq!(report.actuation_faults, 10);
    assert_eq!(runner.actuation_faults(), 10);
    assert!(report.snapshot.at_setpoint);
}
