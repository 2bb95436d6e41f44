//! Shot sequencing.
//!
//! [`task`] provides the cooperative composition primitives; [`shoot`]
//! builds the shot state machine on top of them.

pub mod shoot;
pub mod task;

pub use shoot::{PhaseLog, SequenceStatus, ShootSequencer, ShotOutcome, ShotPhase};
pub use task::{Task, TaskStatus};
