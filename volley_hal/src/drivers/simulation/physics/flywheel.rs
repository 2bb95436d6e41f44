//! Flywheel physics simulator.
//!
//! First-order linear model of a motor-driven flywheel:
//!
//! ```text
//! dω/dt = A·ω + B·V
//! A = −G²·Kt / (Kv·R·J)
//! B =  G·Kt  / (R·J)
//! ```
//!
//! Integrated with an exact zero-order-hold discretization, so any `dt`
//! (not just the nominal tick) gives the analytically correct result:
//!
//! ```text
//! ω(t+dt) = e^{A·dt}·ω(t) + (e^{A·dt} − 1)/A · B·V
//! ```
//!
//! With `V = 0` the update is a pure decay by `e^{A·dt}` ∈ (0, 1): the
//! magnitude shrinks monotonically and the sign never flips.

use std::time::Duration;
use tracing::trace;

use volley_common::shooter::units::rad_per_sec_to_rpm;

use super::motor::DcMotor;

/// Flywheel simulator producing angular velocity from applied voltage.
#[derive(Debug, Clone)]
pub struct FlywheelSimModel {
    /// Continuous-time state coefficient A [1/s] (negative).
    a: f64,
    /// Continuous-time input coefficient B [rad/s² per V].
    b: f64,
    /// Maximum input voltage magnitude [V].
    supply_voltage: f64,
    /// Current angular velocity [rad/s].
    angular_velocity: f64,
}

impl FlywheelSimModel {
    /// Create a flywheel at rest.
    ///
    /// # Arguments
    /// * `motor` - Motor(s) driving the shaft
    /// * `gearing` - Reduction from motor to flywheel (>1 = slower flywheel)
    /// * `moment_of_inertia` - Flywheel inertia [kg·m²]
    /// * `supply_voltage` - Input is clamped to ±this voltage [V]
    pub fn new(motor: DcMotor, gearing: f64, moment_of_inertia: f64, supply_voltage: f64) -> Self {
        let r = motor.resistance();
        let kt = motor.kt();
        let kv = motor.kv();
        let a = -(gearing * gearing) * kt / (kv * r * moment_of_inertia);
        let b = gearing * kt / (r * moment_of_inertia);
        Self {
            a,
            b,
            supply_voltage,
            angular_velocity: 0.0,
        }
    }

    /// Advance the model by `dt` with `voltage` held constant.
    ///
    /// Deterministic: identical state, voltage and `dt` always produce the
    /// same result. A zero `dt` leaves the state untouched.
    ///
    /// # Returns
    /// New angular velocity [rad/s].
    pub fn integrate(&mut self, voltage: f64, dt: Duration) -> f64 {
        let dt_s = dt.as_secs_f64();
        if dt_s <= 0.0 {
            return self.angular_velocity;
        }

        let u = if voltage.is_finite() {
            voltage.clamp(-self.supply_voltage, self.supply_voltage)
        } else {
            0.0
        };

        let decay = (self.a * dt_s).exp();
        let gain = (decay - 1.0) / self.a * self.b;
        self.angular_velocity = decay * self.angular_velocity + gain * u;

        trace!(
            "flywheel: u={:.3}V dt={:.4}s ω={:.3}rad/s",
            u,
            dt_s,
            self.angular_velocity
        );
        self.angular_velocity
    }

    /// Current angular velocity [rad/s].
    #[inline]
    pub fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    /// Current angular velocity [RPM].
    #[inline]
    pub fn angular_velocity_rpm(&self) -> f64 {
        rad_per_sec_to_rpm(self.angular_velocity)
    }

    /// Force the state (e.g. to start a test from a spinning wheel) [rad/s].
    pub fn set_angular_velocity(&mut self, rad_per_sec: f64) {
        self.angular_velocity = rad_per_sec;
    }

    /// Steady-state velocity for a constant input voltage [rad/s].
    #[inline]
    pub fn steady_state_velocity(&self, voltage: f64) -> f64 {
        -self.b / self.a * voltage
    }

    /// Mechanical time constant [s].
    #[inline]
    pub fn time_constant(&self) -> f64 {
        -1.0 / self.a
    }
}
