//! Drive command output stage.
//!
//! Sums PID + FF and saturates to the normalized actuator range.

use super::pid::PidTerms;

/// Normalized drive command limit.
pub const OUTPUT_LIMIT: f64 = 1.0;

/// Saturate a raw command to [-1, 1]. NaN yields 0.
#[inline]
pub fn saturate(raw: f64) -> f64 {
    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(-OUTPUT_LIMIT, OUTPUT_LIMIT)
}

/// Assemble the drive command from PID terms and the feedforward.
#[inline]
pub fn compose_command(pid: &PidTerms, feedforward: f64) -> f64 {
    saturate(pid.sum() + feedforward)
}
