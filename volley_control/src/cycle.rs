//! Fixed-period host loop: shooter tick → sequencer step.
//!
//! [`TickRunner`] advances a [`DualActuatorShooter`] and, while a shot is
//! active, its [`ShootSequencer`] once per period. Faults never stop the
//! loop: actuation faults are counted and the next tick proceeds.
//!
//! ## Pacing
//! - [`Pacing::Realtime`] sleeps to the next absolute deadline
//!   (`start + n × period`), so execution jitter does not accumulate.
//! - [`Pacing::Unpaced`] runs back to back; the nominal period is still the
//!   `dt` handed to the shooter and sequencer. Used by simulation and tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::SequenceError;
use crate::sequence::{SequenceStatus, ShootSequencer, ShotOutcome};
use crate::shooter::DualActuatorShooter;
use volley_common::shooter::telemetry::ShooterSnapshot;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// Tick body timing, accumulated in O(1) per tick.
#[derive(Debug, Clone, Default)]
pub struct CycleStats {
    ticks: u64,
    fastest: Option<Duration>,
    slowest: Duration,
    total: Duration,
    total_sq_ns: u128,
    overruns: u64,
    worst_wake_latency: Duration,
}

impl CycleStats {
    /// Empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one tick body that took `busy` and woke `latency` late.
    /// A body longer than `period` counts as an overrun.
    #[inline]
    pub fn record(&mut self, busy: Duration, latency: Duration, period: Duration) {
        self.ticks += 1;
        self.fastest = Some(self.fastest.map_or(busy, |f| f.min(busy)));
        self.slowest = self.slowest.max(busy);
        self.total += busy;
        self.total_sq_ns += busy.as_nanos() * busy.as_nanos();
        self.worst_wake_latency = self.worst_wake_latency.max(latency);
        if busy > period {
            self.overruns += 1;
        }
    }

    /// Ticks recorded.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Shortest tick body (zero before the first tick).
    pub fn fastest(&self) -> Duration {
        self.fastest.unwrap_or_default()
    }

    /// Longest tick body.
    pub fn slowest(&self) -> Duration {
        self.slowest
    }

    /// Ticks whose body outlasted the period.
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Latest wake-up relative to the scheduled deadline.
    pub fn worst_wake_latency(&self) -> Duration {
        self.worst_wake_latency
    }

    /// Mean tick body.
    pub fn mean(&self) -> Duration {
        match u32::try_from(self.ticks) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.total / n,
            Err(_) => Duration::from_secs_f64(self.total.as_secs_f64() / self.ticks as f64),
        }
    }

    /// Population standard deviation of the tick body (zero below two ticks).
    pub fn std_dev(&self) -> Duration {
        if self.ticks < 2 {
            return Duration::ZERO;
        }
        let n = self.ticks as f64;
        let mean_ns = self.total.as_nanos() as f64 / n;
        let variance = self.total_sq_ns as f64 / n - mean_ns * mean_ns;
        Duration::from_nanos(variance.max(0.0).sqrt() as u64)
    }
}

// ─── Runner ─────────────────────────────────────────────────────────

/// How the runner waits between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Sleep to absolute period boundaries.
    Realtime,
    /// No sleeping.
    Unpaced,
}

/// Outcome of [`TickRunner::run_shot`].
#[derive(Debug, Clone)]
pub struct ShotReport {
    /// Terminal sequencer result; `None` if the tick budget ran out first.
    pub result: Option<Result<ShotOutcome, SequenceError>>,
    /// Ticks executed.
    pub ticks: u64,
    /// Simulated time covered by those ticks.
    pub elapsed: Duration,
    /// Shooter snapshot after the last tick.
    pub snapshot: ShooterSnapshot,
    /// Ticks whose actuation was rejected.
    pub actuation_faults: u64,
}

/// Fixed-period driver for the shooter and an optional shot.
pub struct TickRunner {
    period: Duration,
    pacing: Pacing,
    stats: CycleStats,
    running: Arc<AtomicBool>,
    actuation_faults: u64,
}

impl TickRunner {
    /// Runner with nominal `period`.
    pub fn new(period: Duration, pacing: Pacing) -> Self {
        Self {
            period,
            pacing,
            stats: CycleStats::new(),
            running: Arc::new(AtomicBool::new(true)),
            actuation_faults: 0,
        }
    }

    /// Flag that stops the runner when cleared (e.g. from a Ctrl-C handler).
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Timing statistics so far.
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Nominal period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Total rejected actuations seen by this runner.
    pub fn actuation_faults(&self) -> u64 {
        self.actuation_faults
    }

    /// Tick the shooter alone for `ticks` periods (no shot active).
    pub fn run_for(&mut self, shooter: &mut DualActuatorShooter, ticks: u64) {
        let period = self.period;
        self.run_loop(ticks, |runner| {
            runner.tick_shooter(shooter, period);
            true
        });
    }

    /// Run one shot to completion, at most `max_ticks` periods.
    ///
    /// Clearing the running flag cancels the shot.
    pub fn run_shot(
        &mut self,
        shooter: &mut DualActuatorShooter,
        sequencer: &mut ShootSequencer<DualActuatorShooter>,
        max_ticks: u64,
    ) -> ShotReport {
        let period = self.period;
        let faults_before = self.actuation_faults;
        info!(
            "Shot at {:.0} RPM: period {:?}, budget {} ticks",
            sequencer.target_rpm(),
            period,
            max_ticks
        );

        let ticks = self.run_loop(max_ticks, |runner| {
            runner.tick_shooter(shooter, period);
            match sequencer.step(shooter, period) {
                Ok(SequenceStatus::Running(_)) => true,
                Ok(SequenceStatus::Finished(_)) | Err(_) => false,
            }
        });

        if !sequencer.is_done() && !self.running.load(Ordering::Acquire) {
            sequencer.cancel(shooter);
        }

        ShotReport {
            result: sequencer.result().cloned(),
            ticks,
            elapsed: sequencer.elapsed(),
            snapshot: shooter.snapshot(),
            actuation_faults: self.actuation_faults - faults_before,
        }
    }

    fn tick_shooter(&mut self, shooter: &mut DualActuatorShooter, period: Duration) {
        if let Err(err) = shooter.tick(period) {
            self.actuation_faults += 1;
            debug!("tick {} continued after {err}", shooter.tick_count());
        }
    }

    /// Runs `body` until it returns false, `max_ticks` is reached or the
    /// running flag is cleared. Returns the number of ticks executed.
    fn run_loop(&mut self, max_ticks: u64, mut body: impl FnMut(&mut Self) -> bool) -> u64 {
        let start = Instant::now();
        let mut next_wake = start;
        let mut ticks = 0;

        while ticks < max_ticks && self.running.load(Ordering::Acquire) {
            let cycle_start = Instant::now();
            let latency = cycle_start.saturating_duration_since(next_wake);

            let keep_going = body(self);
            ticks += 1;

            let busy = cycle_start.elapsed();
            self.stats.record(busy, latency, self.period);
            if busy > self.period && self.pacing == Pacing::Realtime {
                warn!("tick overrun: {busy:?} > {:?}", self.period);
            }

            if !keep_going {
                break;
            }

            if self.pacing == Pacing::Realtime {
                next_wake += self.period;
                if let Some(remaining) = next_wake.checked_duration_since(Instant::now()) {
                    std::thread::sleep(remaining);
                }
            }
        }
        ticks
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
