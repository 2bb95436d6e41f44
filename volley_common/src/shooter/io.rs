//! Actuator I/O capability trait and error types.
//!
//! This module defines:
//! - `Side` - Which of the two shooter actuators is addressed
//! - `TelemetrySource` - Where measured velocities come from
//! - `ShooterIo` trait - Read measured velocity, apply drive command
//! - `HalError` enum - Errors raised by I/O implementations
//!
//! The shooter selects one `ShooterIo` implementation at construction
//! (hardware when a handle is supplied, flywheel simulation otherwise) and
//! never re-evaluates that choice per tick.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::consts::NOMINAL_SUPPLY_VOLTAGE;

/// One of the two independently driven shooter shafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Left shaft.
    Left,
    /// Right shaft.
    Right,
}

impl Side {
    /// Both sides, left first.
    pub const ALL: [Side; 2] = [Side::Left, Side::Right];

    /// Array index (left = 0, right = 1).
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// Origin of measured velocities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TelemetrySource {
    /// Encoders on physical motors.
    Hardware,
    /// Physics-integrated flywheel model.
    Simulated,
}

/// Error types for actuator I/O operations.
#[derive(Debug, Clone, Error)]
pub enum HalError {
    /// The output sink refused a drive command.
    #[error("{side} output rejected: {reason}")]
    OutputRejected {
        /// Side whose output was rejected.
        side: Side,
        /// Driver-provided reason.
        reason: String,
    },

    /// Handles have already been released.
    #[error("I/O handles are closed")]
    Closed,

    /// Driver initialization failed.
    #[error("Initialization failed: {0}")]
    InitFailed(String),
}

/// Capability interface for the two shooter actuators.
///
/// # Lifecycle
///
/// 1. `begin_tick()` - Called once at the start of every control tick
/// 2. `measured_velocity()` - Read for both sides
/// 3. `set_normalized_output()` - Called for both sides with the new commands
/// 4. `close()` - Releases handles; must be idempotent
///
/// Implementations must not block.
pub trait ShooterIo: Send {
    /// Driver identifier (e.g. "simulation").
    fn name(&self) -> &'static str;

    /// Which kind of telemetry this implementation produces.
    fn source(&self) -> TelemetrySource;

    /// Advance internal state before this tick's readings are taken.
    ///
    /// Hardware drivers typically do nothing here.
    fn begin_tick(&mut self, _dt: Duration) {}

    /// Latest measured velocity [RPM], positive in the launch direction.
    ///
    /// May be non-finite when the sensor is faulty; the caller validates.
    fn measured_velocity(&self, side: Side) -> f64;

    /// Apply a normalized drive command in [-1, 1].
    ///
    /// # Errors
    /// `HalError::OutputRejected` when the sink refuses the command,
    /// `HalError::Closed` after `close()`.
    fn set_normalized_output(&mut self, side: Side, value: f64) -> Result<(), HalError>;

    /// Voltage that a command of 1.0 corresponds to [V].
    fn supply_voltage(&self) -> f64 {
        NOMINAL_SUPPLY_VOLTAGE
    }

    /// Release held handles. Calling it twice is not an error.
    fn close(&mut self) -> Result<(), HalError>;
}
