//! Shooter telemetry: fault flags, per-tick snapshot and dashboard sink.
//!
//! A [`ShooterSnapshot`] is produced once per tick and carries both sides
//! together, so a consumer never sees a left reading from one tick paired
//! with a right reading from another.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::io::Side;

bitflags! {
    /// Active shooter fault flags.
    ///
    /// Sensor flags are absorbed by the velocity loops (hold last command);
    /// actuation flags mark a tick whose outputs were rejected.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ShooterFaults: u8 {
        /// Left telemetry invalid on the last tick.
        const SENSOR_LEFT     = 0x01;
        /// Right telemetry invalid on the last tick.
        const SENSOR_RIGHT    = 0x02;
        /// Left output sink rejected the last command.
        const ACTUATION_LEFT  = 0x04;
        /// Right output sink rejected the last command.
        const ACTUATION_RIGHT = 0x08;
    }
}

impl ShooterFaults {
    /// Sensor flag for a side.
    #[inline]
    pub const fn sensor(side: Side) -> Self {
        match side {
            Side::Left => Self::SENSOR_LEFT,
            Side::Right => Self::SENSOR_RIGHT,
        }
    }

    /// Actuation flag for a side.
    #[inline]
    pub const fn actuation(side: Side) -> Self {
        match side {
            Side::Left => Self::ACTUATION_LEFT,
            Side::Right => Self::ACTUATION_RIGHT,
        }
    }
}

impl Default for ShooterFaults {
    fn default() -> Self {
        Self::empty()
    }
}

/// Consistent view of the shooter after one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ShooterSnapshot {
    /// Tick counter at which the snapshot was taken.
    pub tick: u64,
    /// Last valid left velocity [RPM].
    pub left_rpm: f64,
    /// Last valid right velocity [RPM].
    pub right_rpm: f64,
    /// Left setpoint [RPM].
    pub left_setpoint_rpm: f64,
    /// Right setpoint [RPM].
    pub right_setpoint_rpm: f64,
    /// Left normalized drive command.
    pub left_command: f64,
    /// Right normalized drive command.
    pub right_command: f64,
    /// Both sides within tolerance.
    pub at_setpoint: bool,
    /// Active faults.
    pub faults: ShooterFaults,
}

impl ShooterSnapshot {
    /// Measured velocity of one side [RPM].
    #[inline]
    pub fn velocity(&self, side: Side) -> f64 {
        match side {
            Side::Left => self.left_rpm,
            Side::Right => self.right_rpm,
        }
    }
}

/// Failure to publish a snapshot. Never affects control.
#[derive(Debug, Clone, Error)]
#[error("telemetry publish failed: {0}")]
pub struct PublishError(pub String);

/// Non-blocking consumer of periodic shooter snapshots (dashboard, log, ...).
pub trait TelemetrySink: Send {
    /// Publish one snapshot. Must not block.
    fn publish(&mut self, snapshot: &ShooterSnapshot) -> Result<(), PublishError>;
}
