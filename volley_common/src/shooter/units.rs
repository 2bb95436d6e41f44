//! Angular ↔ linear speed conversion for the shooter wheels.
//!
//! ```text
//! surface speed [m/s] = (rpm / 60) × 2π × r
//! rpm                 = surface speed × 60 / (2π × r)
//! ```
//!
//! Both directions go through [`WheelGeometry::circumference`], so they are
//! exact inverses up to floating-point rounding.

use std::f64::consts::TAU;

/// Seconds per minute.
const SECONDS_PER_MINUTE: f64 = 60.0;

/// Convert RPM to rad/s.
#[inline]
pub fn rpm_to_rad_per_sec(rpm: f64) -> f64 {
    rpm * TAU / SECONDS_PER_MINUTE
}

/// Convert rad/s to RPM.
#[inline]
pub fn rad_per_sec_to_rpm(rad_per_sec: f64) -> f64 {
    rad_per_sec * SECONDS_PER_MINUTE / TAU
}

/// Wheel geometry used for surface-speed conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelGeometry {
    radius_m: f64,
}

impl WheelGeometry {
    /// Create from a wheel radius [m].
    pub const fn new(radius_m: f64) -> Self {
        Self { radius_m }
    }

    /// Wheel radius [m].
    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius_m
    }

    /// Wheel circumference [m].
    #[inline]
    pub fn circumference(&self) -> f64 {
        TAU * self.radius_m
    }

    /// Angular velocity [RPM] → surface speed [m/s].
    #[inline]
    pub fn angular_to_linear(&self, rpm: f64) -> f64 {
        rpm / SECONDS_PER_MINUTE * self.circumference()
    }

    /// Surface speed [m/s] → angular velocity [RPM].
    #[inline]
    pub fn linear_to_angular(&self, speed: f64) -> f64 {
        speed / self.circumference() * SECONDS_PER_MINUTE
    }
}
