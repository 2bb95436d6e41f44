//! Feedforward controller.
//!
//! Simple motor model: static friction (Ks × sign(velocity)), velocity
//! (Kv × target_velocity) and acceleration (Ka × target_acceleration).
//! Zero gains disable each component.

use volley_common::shooter::config::FeedforwardConfig;

/// Feedforward gains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedforwardGains {
    /// Static friction offset (0 = disabled).
    pub ks: f64,
    /// Velocity feedforward gain (0 = disabled).
    pub kv: f64,
    /// Acceleration feedforward gain (0 = disabled).
    pub ka: f64,
}

impl From<&FeedforwardConfig> for FeedforwardGains {
    fn from(cfg: &FeedforwardConfig) -> Self {
        Self {
            ks: cfg.ks,
            kv: cfg.kv,
            ka: cfg.ka,
        }
    }
}

/// Compute the feedforward contribution.
///
/// ```text
/// ff = Ks × sign(target_velocity) + Kv × target_velocity + Ka × target_acceleration
/// ```
///
/// # Arguments
/// - `gains`: Feedforward gains for this loop.
/// - `target_velocity`: Commanded velocity [RPM].
/// - `target_acceleration`: Commanded acceleration [RPM/s].
#[inline]
pub fn feedforward_compute(
    gains: &FeedforwardGains,
    target_velocity: f64,
    target_acceleration: f64,
) -> f64 {
    let mut output = 0.0;

    if gains.ks != 0.0 && target_velocity != 0.0 {
        output += gains.ks * target_velocity.signum();
    }

    if gains.kv != 0.0 {
        output += gains.kv * target_velocity;
    }

    if gains.ka != 0.0 {
        output += gains.ka * target_acceleration;
    }

    output
}

// ─── Tests ──────────────────────────────────────────────────────────
