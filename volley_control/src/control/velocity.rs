//! Single-actuator velocity loop: PID + feedforward, saturated to [-1, 1].
//!
//! A `VelocityController` exclusively owns its PID memory. Setpoint changes
//! reset that memory unconditionally; gain changes do not.
//!
//! Invalid telemetry (NaN, infinite, or beyond `max_velocity`) is a
//! [`SensorFault`]: the integral is frozen and the previous command is
//! returned unchanged, so the actuator coasts on its last safe output
//! instead of snapping to zero.

use std::time::Duration;
use tracing::debug;

use volley_common::shooter::config::ActuatorConfig;

use super::feedforward::{FeedforwardGains, feedforward_compute};
use super::output::{OUTPUT_LIMIT, compose_command};
use super::pid::{PidGains, PidState, PidTerms, pid_compute};
use crate::error::{ControlError, SensorFault};

/// Closed-loop velocity controller for one actuator.
#[derive(Debug, Clone)]
pub struct VelocityController {
    gains: PidGains,
    feedforward: FeedforwardGains,
    pid: PidState,
    /// Target velocity [RPM].
    setpoint: f64,
    /// Last valid measured velocity [RPM].
    measured: f64,
    /// Last computed drive command.
    command: f64,
    /// At-setpoint band [RPM].
    tolerance: f64,
    /// Readings beyond this magnitude are faults [RPM].
    max_velocity: f64,
    /// Last reading was invalid.
    sensor_fault: bool,
    /// Terms of the last computed cycle.
    last_terms: PidTerms,
}

fn require_finite(name: &str, value: f64) -> Result<(), ControlError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ControlError::Configuration(format!(
            "{name} must be finite (got {value})"
        )))
    }
}

impl VelocityController {
    /// Create an idle controller (setpoint 0, command 0).
    ///
    /// # Errors
    /// `ControlError::Configuration` on non-finite gains or an invalid tolerance.
    pub fn new(
        config: &ActuatorConfig,
        tolerance: f64,
        max_velocity: f64,
    ) -> Result<Self, ControlError> {
        let mut controller = Self {
            gains: PidGains {
                kp: 0.0,
                ki: 0.0,
                kd: 0.0,
                tt: config.gains.tt,
                out_max: OUTPUT_LIMIT,
            },
            feedforward: FeedforwardGains::from(&config.feedforward),
            pid: PidState::default(),
            setpoint: 0.0,
            measured: 0.0,
            command: 0.0,
            tolerance: 0.0,
            max_velocity,
            sensor_fault: false,
            last_terms: PidTerms::default(),
        };
        controller.set_gains(config.gains.kp, config.gains.ki, config.gains.kd)?;
        controller.set_tolerance(tolerance)?;
        require_finite("tt", config.gains.tt)?;
        require_finite("ks", config.feedforward.ks)?;
        require_finite("kv", config.feedforward.kv)?;
        require_finite("ka", config.feedforward.ka)?;
        if !(max_velocity > 0.0) {
            return Err(ControlError::Configuration(format!(
                "max_velocity must be > 0 (got {max_velocity})"
            )));
        }
        Ok(controller)
    }

    /// Set the target velocity [RPM].
    ///
    /// Always clears integral and derivative memory, even if `setpoint`
    /// equals the current one.
    pub fn set_setpoint(&mut self, setpoint: f64) {
        debug!("setpoint {:.1} -> {:.1} RPM", self.setpoint, setpoint);
        self.setpoint = setpoint;
        self.pid.reset();
    }

    /// Current target velocity [RPM].
    #[inline]
    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Run one control cycle against a new measurement.
    ///
    /// # Returns
    /// The saturated drive command in [-1, 1].
    ///
    /// # Errors
    /// [`SensorFault`] when `measured` is invalid; the fault carries the
    /// previous command, which is also left in place for [`command`](Self::command).
    pub fn tick(&mut self, measured: f64, dt: Duration) -> Result<f64, SensorFault> {
        if !measured.is_finite() || measured.abs() > self.max_velocity {
            self.sensor_fault = true;
            return Err(SensorFault {
                reading: measured,
                held_command: self.command,
            });
        }
        self.sensor_fault = false;
        self.measured = measured;

        let error = self.setpoint - measured;
        let terms = pid_compute(&mut self.pid, &self.gains, error, dt.as_secs_f64());
        // Setpoints are steps, so the commanded acceleration is zero.
        let ff = feedforward_compute(&self.feedforward, self.setpoint, 0.0);

        self.last_terms = terms;
        self.command = compose_command(&terms, ff);
        Ok(self.command)
    }

    /// `|setpoint − measured| ≤ tolerance`, using the last valid measurement.
    #[inline]
    pub fn at_setpoint(&self) -> bool {
        (self.setpoint - self.measured).abs() <= self.tolerance
    }

    /// Replace PID gains. Integral and derivative memory are kept.
    ///
    /// # Errors
    /// `ControlError::Configuration` if any gain is non-finite; the
    /// previous gains stay in effect.
    pub fn set_gains(&mut self, kp: f64, ki: f64, kd: f64) -> Result<(), ControlError> {
        require_finite("kp", kp)?;
        require_finite("ki", ki)?;
        require_finite("kd", kd)?;
        self.gains.kp = kp;
        self.gains.ki = ki;
        self.gains.kd = kd;
        Ok(())
    }

    /// Current PID gains.
    #[inline]
    pub fn gains(&self) -> &PidGains {
        &self.gains
    }

    /// Replace the at-setpoint band [RPM].
    ///
    /// # Errors
    /// `ControlError::Configuration` if negative or non-finite.
    pub fn set_tolerance(&mut self, tolerance: f64) -> Result<(), ControlError> {
        require_finite("tolerance", tolerance)?;
        if tolerance < 0.0 {
            return Err(ControlError::Configuration(format!(
                "tolerance must be >= 0 (got {tolerance})"
            )));
        }
        self.tolerance = tolerance;
        Ok(())
    }

    /// At-setpoint band [RPM].
    #[inline]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Last valid measured velocity [RPM].
    #[inline]
    pub fn measured(&self) -> f64 {
        self.measured
    }

    /// Last computed drive command.
    #[inline]
    pub fn command(&self) -> f64 {
        self.command
    }

    /// Whether the most recent reading was rejected.
    #[inline]
    pub fn sensor_fault(&self) -> bool {
        self.sensor_fault
    }

    /// Integral accumulator.
    #[inline]
    pub fn integral(&self) -> f64 {
        self.pid.integral()
    }

    /// PID terms of the last computed cycle.
    #[inline]
    pub fn last_terms(&self) -> PidTerms {
        self.last_terms
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
