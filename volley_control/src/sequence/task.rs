//! Cooperative task algebra.
//!
//! A [`Task`] is polled once per tick with the elapsed time since its last
//! poll and never blocks. Composition primitives:
//!
//! | Primitive       | Finishes when                                        |
//! |-----------------|------------------------------------------------------|
//! | [`Wait`]        | accumulated `dt` reaches its duration                |
//! | [`RunOnce`]     | immediately, after running its action once           |
//! | [`WaitUntil`]   | its predicate holds                                  |
//! | [`Sequence`]    | the last child finishes (children run in order)      |
//! | [`Race`]        | either child finishes (the other is cancelled)       |
//! | [`Conditional`] | the branch chosen on first poll finishes             |
//! | [`Idle`]        | immediately                                          |
//!
//! `C` is the context handed to every poll (typically the shooter).

use std::time::Duration;

use crate::shooter::ShooterCommands;

/// Result of polling a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Not finished yet; poll again next tick.
    Running,
    /// Completed successfully.
    Finished,
    /// Completed with an error.
    Failed(String),
}

impl TaskStatus {
    /// `Finished` or `Failed`.
    #[inline]
    pub fn is_done(&self) -> bool {
        !matches!(self, TaskStatus::Running)
    }
}

/// Unit of cooperative work.
pub trait Task<C: ?Sized> {
    /// Advance by `dt`. Polling a task that already finished returns its
    /// final status again.
    fn poll(&mut self, ctx: &mut C, dt: Duration) -> TaskStatus;

    /// Stop early. Only called on tasks that have not finished.
    fn cancel(&mut self, _ctx: &mut C) {}
}

// ─── Wait ───────────────────────────────────────────────────────────

/// Finishes once the accumulated poll time reaches `duration`.
#[derive(Debug, Clone)]
pub struct Wait {
    duration: Duration,
    elapsed: Duration,
}

impl Wait {
    /// Wait for `duration`.
    pub const fn new(duration: Duration) -> Self {
        Self {
            duration,
            elapsed: Duration::ZERO,
        }
    }

    /// Time accumulated so far.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl<C: ?Sized> Task<C> for Wait {
    fn poll(&mut self, _ctx: &mut C, dt: Duration) -> TaskStatus {
        self.elapsed = self.elapsed.saturating_add(dt);
        if self.elapsed >= self.duration {
            TaskStatus::Finished
        } else {
            TaskStatus::Running
        }
    }
}

// ─── RunOnce ────────────────────────────────────────────────────────

/// Runs an action on first poll and finishes with its result.
pub struct RunOnce<F> {
    action: F,
    result: Option<TaskStatus>,
}

impl<F> RunOnce<F> {
    /// Wrap `action`.
    pub const fn new(action: F) -> Self {
        Self {
            action,
            result: None,
        }
    }
}

impl<C: ?Sized, F> Task<C> for RunOnce<F>
where
    F: FnMut(&mut C) -> Result<(), String>,
{
    fn poll(&mut self, ctx: &mut C, _dt: Duration) -> TaskStatus {
        if let Some(result) = &self.result {
            return result.clone();
        }
        let status = match (self.action)(ctx) {
            Ok(()) => TaskStatus::Finished,
            Err(reason) => TaskStatus::Failed(reason),
        };
        self.result = Some(status.clone());
        status
    }
}

// ─── WaitUntil ──────────────────────────────────────────────────────

/// Finishes on the first poll at which `predicate` holds.
pub struct WaitUntil<P> {
    predicate: P,
}

impl<P> WaitUntil<P> {
    /// Wait for `predicate`.
    pub const fn new(predicate: P) -> Self {
        Self { predicate }
    }
}

impl<C: ?Sized, P> Task<C> for WaitUntil<P>
where
    P: Fn(&C) -> bool,
{
    fn poll(&mut self, ctx: &mut C, _dt: Duration) -> TaskStatus {
        if (self.predicate)(ctx) {
            TaskStatus::Finished
        } else {
            TaskStatus::Running
        }
    }
}

// ─── Idle ───────────────────────────────────────────────────────────

/// Does nothing and finishes immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct Idle;

impl<C: ?Sized> Task<C> for Idle {
    fn poll(&mut self, _ctx: &mut C, _dt: Duration) -> TaskStatus {
        TaskStatus::Finished
    }
}

// ─── Sequence ───────────────────────────────────────────────────────

/// Runs children in order.
///
/// When a child finishes, the next one is polled within the same tick with
/// a zero `dt`, so chains of instantaneous tasks complete in one tick.
pub struct Sequence<C: ?Sized> {
    tasks: Vec<Box<dyn Task<C>>>,
    index: usize,
    failure: Option<String>,
}

impl<C: ?Sized> Sequence<C> {
    /// Run `tasks` in order.
    pub fn new(tasks: Vec<Box<dyn Task<C>>>) -> Self {
        Self {
            tasks,
            index: 0,
            failure: None,
        }
    }

    /// Index of the child currently running.
    pub fn current(&self) -> usize {
        self.index
    }
}

impl<C: ?Sized> Task<C> for Sequence<C> {
    fn poll(&mut self, ctx: &mut C, dt: Duration) -> TaskStatus {
        if let Some(reason) = &self.failure {
            return TaskStatus::Failed(reason.clone());
        }
        let mut step = dt;
        while let Some(task) = self.tasks.get_mut(self.index) {
            match task.poll(ctx, step) {
                TaskStatus::Running => return TaskStatus::Running,
                TaskStatus::Finished => {
                    self.index += 1;
                    step = Duration::ZERO;
                }
                TaskStatus::Failed(reason) => {
                    self.failure = Some(reason.clone());
                    return TaskStatus::Failed(reason);
                }
            }
        }
        TaskStatus::Finished
    }

    fn cancel(&mut self, ctx: &mut C) {
        if self.failure.is_none() {
            if let Some(task) = self.tasks.get_mut(self.index) {
                task.cancel(ctx);
            }
        }
    }
}

// ─── Race ───────────────────────────────────────────────────────────

/// Which branch of a [`Race`] finished first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceWinner {
    /// The first branch.
    First,
    /// The second branch.
    Second,
}

/// Polls both children every tick; the first to finish wins and the other
/// is cancelled.
///
/// The first branch is polled before the second, so if both would finish
/// on the same tick the first branch wins and the second is never polled
/// on that tick.
pub struct Race<C: ?Sized> {
    first: Box<dyn Task<C>>,
    second: Box<dyn Task<C>>,
    outcome: Option<(RaceWinner, TaskStatus)>,
}

impl<C: ?Sized> Race<C> {
    /// Race `first` against `second`.
    pub fn new(first: Box<dyn Task<C>>, second: Box<dyn Task<C>>) -> Self {
        Self {
            first,
            second,
            outcome: None,
        }
    }

    /// Winning branch, once decided.
    pub fn winner(&self) -> Option<RaceWinner> {
        self.outcome.as_ref().map(|(winner, _)| *winner)
    }
}

impl<C: ?Sized> Task<C> for Race<C> {
    fn poll(&mut self, ctx: &mut C, dt: Duration) -> TaskStatus {
        if let Some((_, status)) = &self.outcome {
            return status.clone();
        }

        let status = self.first.poll(ctx, dt);
        if status.is_done() {
            self.second.cancel(ctx);
            self.outcome = Some((RaceWinner::First, status.clone()));
            return status;
        }

        let status = self.second.poll(ctx, dt);
        if status.is_done() {
            self.first.cancel(ctx);
            self.outcome = Some((RaceWinner::Second, status.clone()));
            return status;
        }

        TaskStatus::Running
    }

    fn cancel(&mut self, ctx: &mut C) {
        if self.outcome.is_none() {
            self.first.cancel(ctx);
            self.second.cancel(ctx);
        }
    }
}

// ─── Conditional ────────────────────────────────────────────────────

/// Chooses a branch by evaluating `predicate` once, on the first poll, and
/// then behaves as that branch.
pub struct Conditional<C: ?Sized> {
    predicate: Box<dyn Fn(&C) -> bool>,
    on_true: Box<dyn Task<C>>,
    on_false: Box<dyn Task<C>>,
    branch: Option<bool>,
    finished: bool,
}

impl<C: ?Sized> Conditional<C> {
    /// Build a conditional.
    pub fn new(
        predicate: Box<dyn Fn(&C) -> bool>,
        on_true: Box<dyn Task<C>>,
        on_false: Box<dyn Task<C>>,
    ) -> Self {
        Self {
            predicate,
            on_true,
            on_false,
            branch: None,
            finished: false,
        }
    }

    /// Predicate result, once evaluated.
    pub fn branch(&self) -> Option<bool> {
        self.branch
    }

    fn chosen(&mut self, branch: bool) -> &mut Box<dyn Task<C>> {
        if branch {
            &mut self.on_true
        } else {
            &mut self.on_false
        }
    }
}

impl<C: ?Sized> Task<C> for Conditional<C> {
    fn poll(&mut self, ctx: &mut C, dt: Duration) -> TaskStatus {
        let branch = match self.branch {
            Some(branch) => branch,
            None => {
                let branch = (self.predicate)(ctx);
                self.branch = Some(branch);
                branch
            }
        };
        let status = self.chosen(branch).poll(ctx, dt);
        self.finished = status.is_done();
        status
    }

    fn cancel(&mut self, ctx: &mut C) {
        if let Some(branch) = self.branch {
            if !self.finished {
                self.chosen(branch).cancel(ctx);
            }
        }
    }
}

// ─── Shooter tasks ──────────────────────────────────────────────────

/// Command the shooter to `rpm` on both sides, then finish.
pub fn prepare_shooter<S>(rpm: f64) -> RunOnce<impl FnMut(&mut S) -> Result<(), String>>
where
    S: ShooterCommands + ?Sized,
{
    RunOnce::new(move |shooter: &mut S| {
        shooter.set_target_velocity(rpm);
        Ok(())
    })
}

// ─── Tests ──────────────────────────────────────────────────────────
