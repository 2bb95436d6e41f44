//! Error types for the control layer.
//!
//! Propagation policy: faults are recovered as close to their source as
//! possible. A [`SensorFault`] is absorbed by the velocity loop that saw it
//! (it holds its last command); only faults that prevent safe continuation
//! ([`ControlError::ActuationFault`], [`ControlError::Configuration`]) reach
//! the caller.

use thiserror::Error;
use volley_common::config::ConfigError;
use volley_common::shooter::io::{HalError, Side};

/// Errors surfaced by controllers and the shooter.
#[derive(Debug, Clone, Error)]
pub enum ControlError {
    /// The output sink rejected a command; this tick's actuation was aborted.
    #[error("actuation fault on {side}: {source}")]
    ActuationFault {
        /// Side whose output was rejected.
        side: Side,
        /// Driver error.
        #[source]
        source: HalError,
    },

    /// Invalid gains, tolerance or other parameter, rejected at the call boundary.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<ConfigError> for ControlError {
    fn from(err: ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

/// Invalid telemetry reading (NaN, infinite, or beyond the physical range).
///
/// Carries the command the loop held instead of recomputing.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("invalid velocity reading {reading}; holding command {held_command:.3}")]
pub struct SensorFault {
    /// Offending reading [RPM].
    pub reading: f64,
    /// Previously computed drive command, returned unchanged.
    pub held_command: f64,
}

/// Errors that end a shot sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// A feed sub-action reported failure.
    #[error("feed failed: {0}")]
    FeedFailed(String),

    /// Invalid sequence timings.
    #[error("sequence configuration error: {0}")]
    Configuration(String),
}
