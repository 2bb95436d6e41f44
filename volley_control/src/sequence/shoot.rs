//! Shot sequencer: spin up, settle, race feed against deadline, spin down.
//!
//! ```text
//!  SpinupWait ──(elapsed ≥ settle)──► FeedRace ──(feed done | deadline)──► Finalize ──► Done
//!       │                                │                                    ▲
//!       └────────────── cancel ──────────┴──────────────► Done (no spin-down) ─┘
//! ```
//!
//! * **SpinupWait**: the target velocity is commanded on the first step.
//!   The settle period is a timer; shooter convergence is not checked.
//! * **FeedRace**: `Race(feed, Wait(deadline − elapsed))`. Both branches are
//!   polled every step, feed first, so a feed that completes on the same
//!   step as the deadline wins.
//! * **Finalize**: `Conditional(left > 0 && right > 0, zero command, Idle)`,
//!   evaluated on the step FeedRace ends. A feed failure is reported only
//!   after this runs.
//!
//! Elapsed time is a `Duration` sum of the `dt` values handed to
//! [`ShootSequencer::step`], so 750 steps of 20 ms reach 15 s exactly.

use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

use volley_common::shooter::config::SequenceConfig;
use volley_common::shooter::io::Side;

use super::task::{
    Conditional, Idle, Race, RaceWinner, RunOnce, Task, TaskStatus, Wait, prepare_shooter,
};
use crate::error::SequenceError;
use crate::shooter::ShooterCommands;

/// Sequencer phase. Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ShotPhase {
    /// Shooter commanded; settle timer running.
    SpinupWait,
    /// Feed racing the overall deadline.
    FeedRace,
    /// Deciding on spin-down.
    Finalize,
    /// Terminal.
    Done,
}

impl fmt::Display for ShotPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShotPhase::SpinupWait => "SPINUP_WAIT",
            ShotPhase::FeedRace => "FEED_RACE",
            ShotPhase::Finalize => "FINALIZE",
            ShotPhase::Done => "DONE",
        };
        f.pad(name)
    }
}

/// How a shot ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotOutcome {
    /// Feed completed before the deadline.
    Fed,
    /// Deadline reached first; feed was cancelled.
    TimedOut,
    /// Cancelled externally before completion.
    Cancelled,
}

/// Result of one [`ShootSequencer::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceStatus {
    /// Still running, in the given phase.
    Running(ShotPhase),
    /// Terminal.
    Finished(ShotOutcome),
}

/// Phase entries with the elapsed time at entry. One entry per phase at most.
pub type PhaseLog = heapless::Vec<(ShotPhase, Duration), 4>;

/// Orchestrates one shot against a shooter `S`.
pub struct ShootSequencer<S: ShooterCommands + 'static> {
    phase: ShotPhase,
    elapsed: Duration,
    settle: Duration,
    deadline: Duration,
    target_rpm: f64,
    prepare: Box<dyn Task<S>>,
    feed: Option<Box<dyn Task<S>>>,
    race: Option<Race<S>>,
    finalize: Conditional<S>,
    pending_failure: Option<SequenceError>,
    result: Option<Result<ShotOutcome, SequenceError>>,
    transitions: PhaseLog,
}

impl<S: ShooterCommands + 'static> ShootSequencer<S> {
    /// Prepare a shot at `target_rpm`; `feed` is started when the settle
    /// period ends.
    ///
    /// # Errors
    /// `SequenceError::Configuration` on invalid timings or a non-finite target.
    pub fn new(
        config: &SequenceConfig,
        target_rpm: f64,
        feed: Box<dyn Task<S>>,
    ) -> Result<Self, SequenceError> {
        config
            .validate()
            .map_err(|err| SequenceError::Configuration(err.to_string()))?;
        if !target_rpm.is_finite() {
            return Err(SequenceError::Configuration(format!(
                "target velocity must be finite (got {target_rpm})"
            )));
        }

        let spin_down = Conditional::new(
            Box::new(|shooter: &S| {
                shooter.velocity(Side::Left) > 0.0 && shooter.velocity(Side::Right) > 0.0
            }),
            Box::new(RunOnce::new(|shooter: &mut S| -> Result<(), String> {
                shooter.set_target_velocity(0.0);
                Ok(())
            })),
            Box::new(Idle),
        );

        let mut transitions = PhaseLog::new();
        // Capacity equals the number of phases.
        let _ = transitions.push((ShotPhase::SpinupWait, Duration::ZERO));

        Ok(Self {
            phase: ShotPhase::SpinupWait,
            elapsed: Duration::ZERO,
            settle: config.settle(),
            deadline: config.deadline(),
            target_rpm,
            prepare: Box::new(prepare_shooter::<S>(target_rpm)),
            feed: Some(feed),
            race: None,
            finalize: spin_down,
            pending_failure: None,
            result: None,
            transitions,
        })
    }

    /// Advance the shot by `dt`.
    ///
    /// Once terminal, every further call returns the same result without
    /// touching the shooter.
    ///
    /// # Errors
    /// `SequenceError::FeedFailed` when the feed reported failure; the
    /// spin-down decision has already been applied by then.
    pub fn step(&mut self, shooter: &mut S, dt: Duration) -> Result<SequenceStatus, SequenceError> {
        if let Some(result) = &self.result {
            return result.clone().map(SequenceStatus::Finished);
        }

        self.elapsed += dt;

        if self.phase == ShotPhase::SpinupWait {
            if let TaskStatus::Failed(reason) = self.prepare.poll(shooter, dt) {
                self.pending_failure = Some(SequenceError::FeedFailed(reason));
                self.enter(ShotPhase::Finalize);
            } else if self.elapsed >= self.settle {
                self.start_race();
                // The race gets no time on the step it starts.
                self.poll_race(shooter, Duration::ZERO);
            }
        } else if self.phase == ShotPhase::FeedRace {
            self.poll_race(shooter, dt);
        }

        if self.phase == ShotPhase::Finalize {
            if self.finalize.poll(shooter, dt).is_done() {
                if self.spin_down_issued() {
                    info!("Spin-down commanded");
                }
                self.enter(ShotPhase::Done);
                let result = match self.pending_failure.take() {
                    Some(err) => Err(err),
                    None => Ok(self.race_outcome()),
                };
                match &result {
                    Ok(outcome) => info!("Shot finished: {outcome:?} after {:?}", self.elapsed),
                    Err(err) => warn!("Shot failed after {:?}: {err}", self.elapsed),
                }
                self.result = Some(result.clone());
                return result.map(SequenceStatus::Finished);
            }
        }

        Ok(SequenceStatus::Running(self.phase))
    }

    fn start_race(&mut self) {
        let Some(feed) = self.feed.take() else {
            return;
        };
        let remaining = self.deadline.saturating_sub(self.elapsed);
        debug!("Feed race: {remaining:?} until deadline");
        self.race = Some(Race::new(feed, Box::new(Wait::new(remaining))));
        self.enter(ShotPhase::FeedRace);
    }

    fn poll_race(&mut self, shooter: &mut S, dt: Duration) {
        let Some(race) = self.race.as_mut() else {
            return;
        };
        match race.poll(shooter, dt) {
            TaskStatus::Running => {}
            TaskStatus::Finished => self.enter(ShotPhase::Finalize),
            TaskStatus::Failed(reason) => {
                self.pending_failure = Some(SequenceError::FeedFailed(reason));
                self.enter(ShotPhase::Finalize);
            }
        }
    }

    fn race_outcome(&self) -> ShotOutcome {
        match self.race.as_ref().and_then(Race::winner) {
            Some(RaceWinner::Second) => ShotOutcome::TimedOut,
            _ => ShotOutcome::Fed,
        }
    }

    fn enter(&mut self, next: ShotPhase) {
        info!("Shot phase {} -> {} at {:?}", self.phase, next, self.elapsed);
        self.phase = next;
        if self.transitions.push((next, self.elapsed)).is_err() {
            warn!("Phase log full; {next} not recorded");
        }
    }

    /// Cancel the shot. Nested feed tasks are cancelled; the shooter's
    /// setpoint is left as last commanded. No effect once terminal.
    pub fn cancel(&mut self, shooter: &mut S) {
        if self.result.is_some() {
            return;
        }
        if let Some(race) = self.race.as_mut() {
            race.cancel(shooter);
        }
        self.enter(ShotPhase::Done);
        info!("Shot cancelled after {:?}", self.elapsed);
        self.result = Some(Ok(ShotOutcome::Cancelled));
    }

    /// Current phase.
    pub fn phase(&self) -> ShotPhase {
        self.phase
    }

    /// Time accumulated since the first step.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Commanded target velocity [RPM].
    pub fn target_rpm(&self) -> f64 {
        self.target_rpm
    }

    /// Terminal result, once reached.
    pub fn result(&self) -> Option<&Result<ShotOutcome, SequenceError>> {
        self.result.as_ref()
    }

    /// Whether the sequencer reached DONE.
    pub fn is_done(&self) -> bool {
        self.phase == ShotPhase::Done
    }

    /// Elapsed time at which each phase was entered.
    pub fn transitions(&self) -> &[(ShotPhase, Duration)] {
        &self.transitions
    }

    /// Elapsed time at which `phase` was entered, if it was.
    pub fn entered_at(&self, phase: ShotPhase) -> Option<Duration> {
        self.transitions
            .iter()
            .find(|(p, _)| *p == phase)
            .map(|(_, at)| *at)
    }

    /// Whether FINALIZE issued the zero-velocity command.
    pub fn spin_down_issued(&self) -> bool {
        self.finalize.branch() == Some(true)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const DT: Duration = Duration::from_millis(20);

    /// Shooter stand-in recording commands; velocities set by the test.
    #[derive(Default)]
    struct FakeShooter {
        velocities: [f64; 2],
        commands: Vec<f64>,
    }

    impl ShooterCommands for FakeShooter {
        fn set_target_velocity(&mut self, rpm: f64) {
            self.commands.push(rpm);
        }

        fn velocity(&self, side: Side) -> f64 {
            self.velocities[side.index()]
        }
    }

    fn sequencer(feed: Box<dyn Task<FakeShooter>>) -> ShootSequencer<FakeShooter> {
        ShootSequencer::new(&SequenceConfig::default(), 3000.0, feed).unwrap()
    }

    fn run(seq: &mut ShootSequencer<FakeShooter>, shooter: &mut FakeShooter) -> usize {
        let mut steps = 0;
        while !seq.is_done() {
            let _ = seq.step(shooter, DT);
            steps += 1;
            assert!(steps < 10_000, "sequencer never finished");
        }
        steps
    }

    #[test]
    fn first_step_commands_target() {
        let mut shooter = FakeShooter::default();
        let mut seq = sequencer(Box::new(Wait::new(Duration::from_secs(4))));
        assert_eq!(
            seq.step(&mut shooter, DT).unwrap(),
            SequenceStatus::Running(ShotPhase::SpinupWait)
        );
        assert_eq!(shooter.commands, [3000.0]);
        seq.step(&mut shooter, DT).unwrap();
        assert_eq!(shooter.commands, [3000.0]);
    }

    #[test]
    fn settle_is_a_timer() {
        let mut shooter = FakeShooter::default();
        let mut seq = sequencer(Box::new(Wait::new(Duration::from_secs(4))));
        for _ in 0..49 {
            assert_eq!(
                seq.step(&mut shooter, DT).unwrap(),
                SequenceStatus::Running(ShotPhase::SpinupWait)
            );
        }
        // Shooter still at rest; the transition happens anyway.
        assert_eq!(
            seq.step(&mut shooter, DT).unwrap(),
            SequenceStatus::Running(ShotPhase::FeedRace)
        );
        assert_eq!(seq.entered_at(ShotPhase::FeedRace), Some(Duration::from_secs(1)));
    }

    #[test]
    fn feed_completion_wins_race() {
        let mut shooter = FakeShooter::default();
        let mut seq = sequencer(Box::new(Wait::new(Duration::from_secs(4))));
        run(&mut seq, &mut shooter);
        assert_eq!(seq.entered_at(ShotPhase::Finalize), Some(Duration::from_secs(5)));
        assert_eq!(seq.result(), Some(&Ok(ShotOutcome::Fed)));
    }

    #[test]
    fn deadline_wins_when_feed_never_completes() {
        let mut shooter = FakeShooter::default();
        let mut seq = sequencer(Box::new(WaitUntilNever));
        let steps = run(&mut seq, &mut shooter);
        assert_eq!(steps, 750);
        assert_eq!(seq.entered_at(ShotPhase::Finalize), Some(Duration::from_secs(15)));
        assert_eq!(seq.result(), Some(&Ok(ShotOutcome::TimedOut)));
    }

    struct WaitUntilNever;

    impl Task<FakeShooter> for WaitUntilNever {
        fn poll(&mut self, _: &mut FakeShooter, _: Duration) -> TaskStatus {
            TaskStatus::Running
        }
    }

    #[test]
    fn spin_down_only_when_both_sides_positive() {
        for (velocities, expect) in [
            ([3000.0, 2990.0], true),
            ([3000.0, 0.0], false),
            ([0.0, 3000.0], false),
            ([-10.0, -10.0], false),
        ] {
            let mut shooter = FakeShooter {
                velocities,
                ..Default::default()
            };
            let mut seq = sequencer(Box::new(Idle));
            run(&mut seq, &mut shooter);
            assert_eq!(seq.spin_down_issued(), expect, "{velocities:?}");
            if expect {
                assert_eq!(shooter.commands, [3000.0, 0.0]);
            } else {
                assert_eq!(shooter.commands, [3000.0]);
            }
        }
    }

    #[test]
    fn finalize_and_done_on_same_step() {
        let mut shooter = FakeShooter::default();
        let mut seq = sequencer(Box::new(Idle));
        run(&mut seq, &mut shooter);
        let at = seq.entered_at(ShotPhase::Finalize);
        assert_eq!(at, seq.entered_at(ShotPhase::Done));
        let phases: Vec<_> = seq.transitions().iter().map(|(p, _)| *p).collect();
        assert_eq!(
            phases,
            [
                ShotPhase::SpinupWait,
                ShotPhase::FeedRace,
                ShotPhase::Finalize,
                ShotPhase::Done
            ]
        );
    }

    #[test]
    fn feed_failure_still_finalizes() {
        let mut shooter = FakeShooter {
            velocities: [2500.0, 2500.0],
            ..Default::default()
        };
        let feed = RunOnce::new(|_: &mut FakeShooter| -> Result<(), String> {
            Err("indexer jammed".to_string())
        });
        let mut seq = sequencer(Box::new(feed));
        let mut last = Ok(SequenceStatus::Running(ShotPhase::SpinupWait));
        for _ in 0..50 {
            last = seq.step(&mut shooter, DT);
        }
        assert_eq!(last, Err(SequenceError::FeedFailed("indexer jammed".into())));
        assert!(seq.spin_down_issued());
        assert_eq!(shooter.commands, [3000.0, 0.0]);
        // Terminal result repeats.
        assert_eq!(
            seq.step(&mut shooter, DT),
            Err(SequenceError::FeedFailed("indexer jammed".into()))
        );
    }

    #[test]
    fn cancel_keeps_setpoint() {
        let mut shooter = FakeShooter {
            velocities: [3000.0, 3000.0],
            ..Default::default()
        };
        let mut seq = sequencer(Box::new(WaitUntilNever));
        for _ in 0..100 {
            seq.step(&mut shooter, DT).unwrap();
        }
        assert_eq!(seq.phase(), ShotPhase::FeedRace);
        seq.cancel(&mut shooter);
        assert!(seq.is_done());
        assert_eq!(seq.result(), Some(&Ok(ShotOutcome::Cancelled)));
        assert_eq!(shooter.commands, [3000.0]);
        assert!(!seq.spin_down_issued());
        assert_eq!(
            seq.step(&mut shooter, DT).unwrap(),
            SequenceStatus::Finished(ShotOutcome::Cancelled)
        );
    }

    #[test]
    fn invalid_config_rejected() {
        let cfg = SequenceConfig {
            settle_s: 3.0,
            deadline_s: 2.0,
        };
        let result = ShootSequencer::<FakeShooter>::new(&cfg, 3000.0, Box::new(Idle));
        assert!(matches!(result, Err(SequenceError::Configuration(_))));
        let result = ShootSequencer::<FakeShooter>::new(
            &SequenceConfig::default(),
            f64::NAN,
            Box::new(Idle),
        );
        assert!(result.is_err());
    }

    #[test]
    fn unrepresentable_deadline_is_a_configuration_error() {
        let cfg = SequenceConfig {
            settle_s: 1.0,
            deadline_s: 1e20,
        };
        let result = ShootSequencer::<FakeShooter>::new(&cfg, 3000.0, Box::new(Idle));
        assert!(matches!(result, Err(SequenceError::Configuration(_))));
    }
}
