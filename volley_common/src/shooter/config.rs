//! Shooter configuration types.
//!
//! All sections deserialize with container-level defaults, so any subset of
//! fields may be given in TOML. Defaults reproduce the competition tuning of
//! the dual NEO Vortex shooter with 4-inch Colson wheels.
//!
//! ```toml
//! [shooter]
//! tolerance_rpm = 50.0
//! wheel_radius_m = 0.0508
//!
//! [shooter.left.gains]
//! kp = 0.0005
//!
//! [shooter.right.feedforward]
//! kv = 0.000147
//!
//! [simulation]
//! motor = "neo_vortex"
//! supply_voltage = 12.0
//!
//! [sequence]
//! settle_s = 1.0
//! deadline_s = 15.0
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ConfigError;
use crate::consts::{
    DEFAULT_DEADLINE_S, DEFAULT_MAX_VELOCITY_RPM, DEFAULT_SETTLE_S, DEFAULT_TOLERANCE_RPM,
    NOMINAL_SUPPLY_VOLTAGE,
};

/// Free speed of the default motor [RPM]; basis of the velocity feedforward.
const DEFAULT_FREE_SPEED_RPM: f64 = 6784.0;

/// 2 inch wheel radius [m].
const DEFAULT_WHEEL_RADIUS_M: f64 = 0.0508;

// ─── Validation helpers ─────────────────────────────────────────────

fn invalid(msg: String) -> ConfigError {
    ConfigError::ValidationError(msg)
}

fn require_finite(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be finite (got {value})")))
    }
}

fn require_non_negative(name: &str, value: f64) -> Result<(), ConfigError> {
    require_finite(name, value)?;
    if value < 0.0 {
        return Err(invalid(format!("{name} must be >= 0 (got {value})")));
    }
    Ok(())
}

fn require_positive(name: &str, value: f64) -> Result<(), ConfigError> {
    require_finite(name, value)?;
    if value <= 0.0 {
        return Err(invalid(format!("{name} must be > 0 (got {value})")));
    }
    Ok(())
}

/// Convert `value` seconds into a `Duration`.
///
/// Fails on negative, non-finite, or unrepresentably large values.
pub fn seconds(name: &str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|e| invalid(format!("{name} ({value} s): {e}")))
}

// ─── PID / Feedforward ──────────────────────────────────────────────

/// PID gains of one velocity loop. Output is normalized duty per RPM of error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidGainsConfig {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain (0 = disabled).
    pub ki: f64,
    /// Derivative gain (0 = disabled).
    pub kd: f64,
    /// Anti-windup tracking time constant [s] (0 = disabled).
    pub tt: f64,
}

impl Default for PidGainsConfig {
    fn default() -> Self {
        Self {
            kp: 0.0005,
            ki: 0.0,
            kd: 0.0,
            tt: 0.0,
        }
    }
}

impl PidGainsConfig {
    /// Gains must be finite; tracking constant must also be non-negative.
    pub fn validate(&self, prefix: &str) -> Result<(), ConfigError> {
        require_finite(&format!("{prefix}.kp"), self.kp)?;
        require_finite(&format!("{prefix}.ki"), self.ki)?;
        require_finite(&format!("{prefix}.kd"), self.kd)?;
        require_non_negative(&format!("{prefix}.tt"), self.tt)
    }
}

/// Simple motor feedforward: `ks·sign(v) + kv·v + ka·a`, in normalized duty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedforwardConfig {
    /// Static friction term.
    pub ks: f64,
    /// Velocity term [duty per RPM].
    pub kv: f64,
    /// Acceleration term [duty per RPM/s].
    pub ka: f64,
}

impl Default for FeedforwardConfig {
    fn default() -> Self {
        Self {
            ks: 0.0,
            kv: 1.0 / DEFAULT_FREE_SPEED_RPM,
            ka: 0.0,
        }
    }
}

impl FeedforwardConfig {
    /// All coefficients must be finite.
    pub fn validate(&self, prefix: &str) -> Result<(), ConfigError> {
        require_finite(&format!("{prefix}.ks"), self.ks)?;
        require_finite(&format!("{prefix}.kv"), self.kv)?;
        require_finite(&format!("{prefix}.ka"), self.ka)
    }
}

/// Per-actuator loop configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    /// PID gains.
    pub gains: PidGainsConfig,
    /// Feedforward coefficients.
    pub feedforward: FeedforwardConfig,
}

impl ActuatorConfig {
    fn validate(&self, prefix: &str) -> Result<(), ConfigError> {
        self.gains.validate(&format!("{prefix}.gains"))?;
        self.feedforward.validate(&format!("{prefix}.feedforward"))
    }
}

// ─── Shooter ────────────────────────────────────────────────────────

/// Dual-actuator shooter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShooterConfig {
    /// At-setpoint band, applied to each side independently [RPM].
    pub tolerance_rpm: f64,
    /// Telemetry magnitude above which a reading is a sensor fault [RPM].
    pub max_velocity_rpm: f64,
    /// Shooter wheel radius [m].
    pub wheel_radius_m: f64,
    /// Left actuator loop.
    pub left: ActuatorConfig,
    /// Right actuator loop.
    pub right: ActuatorConfig,
}

impl Default for ShooterConfig {
    fn default() -> Self {
        Self {
            tolerance_rpm: DEFAULT_TOLERANCE_RPM,
            max_velocity_rpm: DEFAULT_MAX_VELOCITY_RPM,
            wheel_radius_m: DEFAULT_WHEEL_RADIUS_M,
            left: ActuatorConfig::default(),
            right: ActuatorConfig::default(),
        }
    }
}

impl ShooterConfig {
    /// Validate geometry, tolerance and both loops.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_negative("shooter.tolerance_rpm", self.tolerance_rpm)?;
        require_positive("shooter.max_velocity_rpm", self.max_velocity_rpm)?;
        require_positive("shooter.wheel_radius_m", self.wheel_radius_m)?;
        self.left.validate("shooter.left")?;
        self.right.validate("shooter.right")
    }
}

// ─── Simulation ─────────────────────────────────────────────────────

/// Brushless motor models with published characteristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorModel {
    /// REV NEO Vortex.
    #[default]
    NeoVortex,
    /// REV NEO.
    Neo,
    /// WCP Kraken X60.
    KrakenX60,
}

/// Flywheel physics parameters used when no hardware is present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Motor model driving each shaft.
    pub motor: MotorModel,
    /// Motors per shaft.
    pub motors_per_shaft: u32,
    /// Gear reduction (motor turns per wheel turn).
    pub gearing: f64,
    /// Assumed fixed supply voltage [V].
    pub supply_voltage: f64,
    /// Mass of a single wheel [kg].
    pub wheel_mass_kg: f64,
    /// Wheels on one shaft.
    pub wheels_per_shaft: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            motor: MotorModel::NeoVortex,
            motors_per_shaft: 1,
            gearing: 1.0,
            supply_voltage: NOMINAL_SUPPLY_VOLTAGE,
            wheel_mass_kg: 0.245,
            wheels_per_shaft: 4,
        }
    }
}

impl SimulationConfig {
    /// Shaft moment of inertia [kg·m²], treating each wheel as a solid disc.
    pub fn moment_of_inertia(&self, wheel_radius_m: f64) -> f64 {
        let disc = 0.5 * self.wheel_mass_kg * wheel_radius_m * wheel_radius_m;
        disc * f64::from(self.wheels_per_shaft)
    }

    /// Validate physical parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.motors_per_shaft == 0 {
            return Err(invalid("simulation.motors_per_shaft must be > 0".into()));
        }
        if self.wheels_per_shaft == 0 {
            return Err(invalid("simulation.wheels_per_shaft must be > 0".into()));
        }
        require_positive("simulation.gearing", self.gearing)?;
        require_positive("simulation.supply_voltage", self.supply_voltage)?;
        require_positive("simulation.wheel_mass_kg", self.wheel_mass_kg)
    }
}

// ─── Sequence ───────────────────────────────────────────────────────

/// Shot sequencing timings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Fixed settle period after commanding spin-up [s].
    pub settle_s: f64,
    /// Overall deadline measured from sequence start [s].
    pub deadline_s: f64,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            settle_s: DEFAULT_SETTLE_S,
            deadline_s: DEFAULT_DEADLINE_S,
        }
    }
}

impl SequenceConfig {
    /// Settle period as a `Duration` (zero if it fails validation).
    pub fn settle(&self) -> Duration {
        seconds("sequence.settle_s", self.settle_s).unwrap_or_default()
    }

    /// Overall deadline as a `Duration` (zero if it fails validation).
    pub fn deadline(&self) -> Duration {
        seconds("sequence.deadline_s", self.deadline_s).unwrap_or_default()
    }

    /// Both durations positive and finite; the deadline may not precede the settle period.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("sequence.settle_s", self.settle_s)?;
        require_positive("sequence.deadline_s", self.deadline_s)?;
        seconds("sequence.settle_s", self.settle_s)?;
        seconds("sequence.deadline_s", self.deadline_s)?;
        if self.deadline_s < self.settle_s {
            return Err(invalid(format!(
                "sequence.deadline_s ({}) must be >= settle_s ({})",
                self.deadline_s, self.settle_s
            )));
        }
        Ok(())
    }
}
