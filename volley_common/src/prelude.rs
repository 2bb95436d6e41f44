//! Prelude module for common re-exports.
//!
//! ```rust
//! use volley_common::prelude::*;
//! ```

use std::time::Duration;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig, TickConfig, VolleyConfig};
pub use crate::shooter::config::{
    ActuatorConfig, FeedforwardConfig, MotorModel, PidGainsConfig, SequenceConfig, ShooterConfig,
    SimulationConfig,
};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{NOMINAL_SUPPLY_VOLTAGE, TICK_PERIOD_MS};

// ─── Shooter contracts ──────────────────────────────────────────────
pub use crate::shooter::io::{HalError, ShooterIo, Side, TelemetrySource};
pub use crate::shooter::telemetry::{PublishError, ShooterFaults, ShooterSnapshot, TelemetrySink};
pub use crate::shooter::units::WheelGeometry;

/// Nominal tick period as Duration.
pub const TICK_PERIOD: Duration = Duration::from_millis(TICK_PERIOD_MS);
