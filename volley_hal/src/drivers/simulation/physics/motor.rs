//! Brushed/brushless DC motor characteristics.
//!
//! Derived constants follow the standard DC motor model:
//!
//! ```text
//! R  = V_nominal / I_stall                      [Ω]
//! Kv = ω_free / (V_nominal − R · I_free)        [rad/s per V]
//! Kt = τ_stall / I_stall                        [N·m per A]
//! ```

use volley_common::shooter::config::MotorModel;
use volley_common::shooter::units::rpm_to_rad_per_sec;

/// Characteristics of one or more identical motors driving a common shaft.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DcMotor {
    /// Voltage at which the characteristics were measured [V].
    pub nominal_voltage: f64,
    /// Stall torque [N·m].
    pub stall_torque: f64,
    /// Stall current [A].
    pub stall_current: f64,
    /// Free-running current [A].
    pub free_current: f64,
    /// Free speed [rad/s].
    pub free_speed: f64,
}

impl DcMotor {
    /// Build from datasheet values for `count` motors ganged on one shaft.
    pub fn new(
        nominal_voltage: f64,
        stall_torque: f64,
        stall_current: f64,
        free_current: f64,
        free_speed_rpm: f64,
        count: u32,
    ) -> Self {
        let n = f64::from(count);
        Self {
            nominal_voltage,
            stall_torque: stall_torque * n,
            stall_current: stall_current * n,
            free_current: free_current * n,
            free_speed: rpm_to_rad_per_sec(free_speed_rpm),
        }
    }

    /// Published characteristics of a motor model.
    pub fn from_model(model: MotorModel, count: u32) -> Self {
        match model {
            MotorModel::NeoVortex => Self::new(12.0, 3.6, 211.0, 3.6, 6784.0, count),
            MotorModel::Neo => Self::new(12.0, 2.6, 105.0, 1.8, 5676.0, count),
            MotorModel::KrakenX60 => Self::new(12.0, 7.09, 366.0, 2.0, 6000.0, count),
        }
    }

    /// Winding resistance [Ω].
    #[inline]
    pub fn resistance(&self) -> f64 {
        self.nominal_voltage / self.stall_current
    }

    /// Velocity constant [rad/s per V].
    #[inline]
    pub fn kv(&self) -> f64 {
        self.free_speed / (self.nominal_voltage - self.resistance() * self.free_current)
    }

    /// Torque constant [N·m per A].
    #[inline]
    pub fn kt(&self) -> f64 {
        self.stall_torque / self.stall_current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neo_vortex_constants() {
        let m = DcMotor::from_model(MotorModel::NeoVortex, 1);
        assert!((m.resistance() - 12.0 / 211.0).abs() < 1e-12);
        assert!((m.kt() - 3.6 / 211.0).abs() < 1e-12);
        // 710.42 rad/s free speed over (12 − 0.0569·3.6) V
        assert!((m.kv() - 60.23).abs() < 0.01, "kv = {}", m.kv());
    }

    #[test]
    fn ganged_motors_scale_torque_not_speed() {
        let one = DcMotor::from_model(MotorModel::Neo, 1);
        let two = DcMotor::from_model(MotorModel::Neo, 2);
        assert!((two.stall_torque - 2.0 * one.stall_torque).abs() < 1e-12);
        assert!((two.kt() - one.kt()).abs() < 1e-12);
        assert!((two.kv() - one.kv()).abs() < 1e-9);
        assert!(two.resistance() < one.resistance());
    }
}
