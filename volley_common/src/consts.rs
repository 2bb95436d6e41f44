//! System-wide constants for the Volley workspace.
//!
//! Single source of truth for numeric defaults.

use static_assertions::const_assert;

/// Nominal control tick period in milliseconds (50 Hz).
pub const TICK_PERIOD_MS: u64 = 20;

/// Nominal supply (battery) voltage [V].
pub const NOMINAL_SUPPLY_VOLTAGE: f64 = 12.0;

/// Default at-setpoint tolerance band [RPM].
pub const DEFAULT_TOLERANCE_RPM: f64 = 50.0;

/// Upper bound on a physically plausible actuator velocity [RPM].
///
/// Telemetry beyond this magnitude is treated as a sensor fault.
pub const DEFAULT_MAX_VELOCITY_RPM: f64 = 10_000.0;

/// Default settle period of a shot before feeding starts [s].
pub const DEFAULT_SETTLE_S: f64 = 1.0;

/// Default overall deadline of a shot [s].
pub const DEFAULT_DEADLINE_S: f64 = 15.0;

/// Number of telemetry snapshots retained by the in-memory dashboard.
pub const TELEMETRY_HISTORY_LEN: usize = 256;

const_assert!(TICK_PERIOD_MS > 0);
const_assert!(TELEMETRY_HISTORY_LEN.is_power_of_two());
