//! Closed-loop convergence on the simulated flywheels.

use std::time::Duration;

use volley_common::shooter::config::{ShooterConfig, SimulationConfig};
use volley_common::shooter::io::{Side, TelemetrySource};
use volley_control::cycle::{Pacing, TickRunner};
use volley_control::DualActuatorShooter;

const DT: Duration = Duration::from_millis(20);

fn simulated_shooter() -> DualActuatorShooter {
    DualActuatorShooter::new(&ShooterConfig::default(), &SimulationConfig::default(), None)
        .expect("default configuration is valid")
}

#[test]
fn reaches_3000_rpm_within_300_ticks() {
    let mut shooter = simulated_shooter();
    assert_eq!(shooter.telemetry_source(), TelemetrySource::Simulated);
    shooter.set_target_velocity(3000.0);

    for _ in 0..300 {
        shooter.tick(DT).unwrap();
    }

    for side in Side::ALL {
        let error = (shooter.velocity(side) - 3000.0).abs();
        assert!(error <= 50.0, "{side} off by {error:.1} RPM");
    }
    assert!(shooter.at_setpoint());
    assert!(shooter.snapshot().at_setpoint);
    assert_eq!(shooter.snapshot().tick, 300);
}

#[test]
fn at_setpoint_stays_true_once_settled() {
    let mut shooter = simulated_shooter();
    shooter.set_target_velocity(3000.0);
    let mut settled_at = None;
    for tick in 0..400 {
        shooter.tick(DT).unwrap();
        match settled_at {
            None if shooter.at_setpoint() => settled_at = Some(tick),
            Some(_) => assert!(shooter.at_setpoint(), "left the band at tick {tick}"),
            None => {}
        }
    }
    assert!(settled_at.is_some());
}

#[test]
fn velocity_rises_monotonically_during_spin_up() {
    let mut shooter = simulated_shooter();
    shooter.set_target_velocity(3000.0);
    let mut previous = 0.0;
    for _ in 0..100 {
        shooter.tick(DT).unwrap();
        let v = shooter.velocity(Side::Left);
        assert!(v >= previous);
        assert!(v <= 3100.0);
        previous = v;
    }
}

#[test]
fn both_sides_track_identically() {
    let mut shooter = simulated_shooter();
    shooter.set_target_velocity(4500.0);
    for _ in 0..200 {
        shooter.tick(DT).unwrap();
        assert_eq!(shooter.velocity_difference(), 0.0);
        assert_eq!(shooter.surface_speed_difference(), 0.0);
    }
}

#[test]
fn surface_speed_target() {
    let mut shooter = simulated_shooter();
    // 3000 RPM on a 2 in wheel.
    let speed = 3000.0 / 60.0 * 2.0 * std::f64::consts::PI * 0.0508;
    shooter.set_target_speed(speed);
    assert!((shooter.setpoint(Side::Left) - 3000.0).abs() < 1e-9);

    for _ in 0..300 {
        shooter.tick(DT).unwrap();
    }
    assert!((shooter.surface_speed(Side::Right) - speed).abs() < 50.0 / 60.0 * 2.0 * std::f64::consts::PI * 0.0508);
}

#[test]
fn spin_down_decays_without_reversal() {
    let mut shooter = simulated_shooter();
    shooter.set_target_velocity(3000.0);
    for _ in 0..300 {
        shooter.tick(DT).unwrap();
    }
    shooter.set_target_velocity(0.0);
    let mut previous = shooter.velocity(Side::Left);
    for _ in 0..300 {
        shooter.tick(DT).unwrap();
        let v = shooter.velocity(Side::Left);
        assert!(v <= previous + 1e-9);
        assert!(v >= 0.0, "reversed to {v}");
        previous = v;
    }
    assert!(previous < 50.0);
}

#[test]
fn runner_ticks_without_a_shot() {
    let mut shooter = simulated_shooter();
    shooter.set_target_velocity(3000.0);
    let mut runner = TickRunner::new(DT, Pacing::Unpaced);
    runner.run_for(&mut shooter, 300);
    assert_eq!(runner.stats().ticks(), 300);
    assert_eq!(shooter.tick_count(), 300);
    assert!(shooter.at_setpoint());
}
