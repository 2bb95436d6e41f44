//! Complete shots: sequencer driving the simulated shooter.

use std::time::Duration;

use volley_common::shooter::config::{SequenceConfig, ShooterConfig, SimulationConfig};
use volley_common::shooter::io::Side;
use volley_control::cycle::{Pacing, TickRunner};
use volley_control::sequence::task::{RunOnce, Sequence, Wait, WaitUntil};
use volley_control::sequence::{SequenceStatus, ShootSequencer, ShotOutcome, ShotPhase, Task};
use volley_control::{DualActuatorShooter, SequenceError};

const DT: Duration = Duration::from_millis(20);

fn shooter() -> DualActuatorShooter {
    DualActuatorShooter::new(&ShooterConfig::default(), &SimulationConfig::default(), None)
        .expect("default configuration is valid")
}

fn shot(feed: Box<dyn Task<DualActuatorShooter>>) -> ShootSequencer<DualActuatorShooter> {
    ShootSequencer::new(&SequenceConfig::default(), 3000.0, feed).expect("valid sequence")
}

#[test]
fn feed_at_five_seconds() {
    let mut shooter = shooter();
    let mut sequencer = shot(Box::new(Wait::new(Duration::from_secs(4))));
    let mut runner = TickRunner::new(DT, Pacing::Unpaced);

    let report = runner.run_shot(&mut shooter, &mut sequencer, 2000);

    assert_eq!(report.result, Some(Ok(ShotOutcome::Fed)));
    assert_eq!(report.ticks, 250);
    assert_eq!(report.elapsed, Duration::from_secs(5));
    assert_eq!(
        sequencer.entered_at(ShotPhase::FeedRace),
        Some(Duration::from_secs(1))
    );
    assert_eq!(
        sequencer.entered_at(ShotPhase::Finalize),
        Some(Duration::from_secs(5))
    );
    // Wheels were up to speed when the shot ended, so spin-down was issued.
    assert!(report.snapshot.at_setpoint);
    assert!(sequencer.spin_down_issued());
    assert_eq!(shooter.setpoint(Side::Left), 0.0);
    assert_eq!(shooter.setpoint(Side::Right), 0.0);
}

#[test]
fn deadline_at_fifteen_seconds() {
    let mut shooter = shooter();
    let mut sequencer = shot(Box::new(WaitUntil::new(|_: &DualActuatorShooter| false)));
    let mut runner = TickRunner::new(DT, Pacing::Unpaced);

    let report = runner.run_shot(&mut shooter, &mut sequencer, 2000);

    assert_eq!(report.result, Some(Ok(ShotOutcome::TimedOut)));
    assert_eq!(report.ticks, 750);
    assert_eq!(
        sequencer.entered_at(ShotPhase::Finalize),
        Some(Duration::from_secs(15))
    );
    assert!(sequencer.spin_down_issued());
}

#[test]
fn feed_waiting_on_readiness() {
    // Feed as a composition: wait for both wheels in band, then hold 0.5 s.
    let feed = Sequence::<DualActuatorShooter>::new(vec![
        Box::new(WaitUntil::new(|s: &DualActuatorShooter| s.at_setpoint())),
        Box::new(Wait::new(Duration::from_millis(500))),
    ]);
    let mut shooter = shooter();
    let mut sequencer = shot(Box::new(feed));
    let mut runner = TickRunner::new(DT, Pacing::Unpaced);

    let report = runner.run_shot(&mut shooter, &mut sequencer, 2000);

    assert_eq!(report.result, Some(Ok(ShotOutcome::Fed)));
    // Readiness is reached well before the settle period ends.
    assert_eq!(report.elapsed, Duration::from_millis(1500));
}

#[test]
fn feed_failure_reported_after_spin_down() {
    let feed = RunOnce::new(|_: &mut DualActuatorShooter| -> Result<(), String> {
        Err("note not detected".to_string())
    });
    let mut shooter = shooter();
    let mut sequencer = shot(Box::new(feed));

    let mut last = None;
    for _ in 0..100 {
        shooter.tick(DT).unwrap();
        last = Some(sequencer.step(&mut shooter, DT));
        if sequencer.is_done() {
            break;
        }
    }

    assert_eq!(
        last,
        Some(Err(SequenceError::FeedFailed("note not detected".into())))
    );
    assert_eq!(sequencer.elapsed(), Duration::from_secs(1));
    assert!(sequencer.spin_down_issued());
    assert_eq!(shooter.setpoint(Side::Left), 0.0);
}

#[test]
fn cancellation_leaves_shooter_spinning() {
    let mut shooter = shooter();
    let mut sequencer = shot(Box::new(WaitUntil::new(|_: &DualActuatorShooter| false)));

    for _ in 0..150 {
        shooter.tick(DT).unwrap();
        assert!(matches!(
            sequencer.step(&mut shooter, DT),
            Ok(SequenceStatus::Running(_))
        ));
    }
    assert_eq!(sequencer.phase(), ShotPhase::FeedRace);

    sequencer.cancel(&mut shooter);
    assert_eq!(sequencer.result(), Some(&Ok(ShotOutcome::Cancelled)));
    assert!(!sequencer.spin_down_issued());
    assert_eq!(shooter.setpoint(Side::Left), 3000.0);

    for _ in 0..50 {
        shooter.tick(DT).unwrap();
    }
    assert!(shooter.at_setpoint());
}

#[test]
fn stopped_runner_cancels_shot() {
    let mut shooter = shooter();
    let mut sequencer = shot(Box::new(Wait::new(Duration::from_secs(4))));
    let mut runner = TickRunner::new(DT, Pacing::Unpaced);
    runner
        .running_flag()
        .store(false, std::sync::atomic::Ordering::SeqCst);

    let report = runner.run_shot(&mut shooter, &mut sequencer, 2000);

    assert_eq!(report.ticks, 0);
    assert_eq!(report.result, Some(Ok(ShotOutcome::Cancelled)));
}

#[test]
fn tick_budget_exhausted() {
    let mut shooter = shooter();
    let mut sequencer = shot(Box::new(Wait::new(Duration::from_secs(4))));
    let mut runner = TickRunner::new(DT, Pacing::Unpaced);

    let report = runner.run_shot(&mut shooter, &mut sequencer, 100);

    assert_eq!(report.ticks, 100);
    assert_eq!(report.result, None);
    assert_eq!(sequencer.phase(), ShotPhase::FeedRace);
}
