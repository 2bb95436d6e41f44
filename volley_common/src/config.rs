//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load TOML configuration files
//! across all Volley crates, plus the [`VolleyConfig`] bundle consumed by the
//! control binary.
//!
//! # Usage
//!
//! ```rust,no_run
//! use volley_common::config::{ConfigLoader, ConfigError, VolleyConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = VolleyConfig::load(Path::new("volley.toml"))?;
//!     config.validate()?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::consts::TICK_PERIOD_MS;
use crate::shooter::config::{SequenceConfig, ShooterConfig, SimulationConfig};

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, per-tick tracing information.
    Trace,
    /// Debug information useful during tuning.
    Debug,
    /// General information about operation.
    #[default]
    Info,
    /// Warnings (sensor faults, dropped telemetry).
    Warn,
    /// Errors (actuation faults).
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields shared across all Volley applications.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "volley-sim-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            service_name: "volley".to_string(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Host tick configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickConfig {
    /// Nominal tick period [ms].
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,
}

fn default_period_ms() -> u64 {
    TICK_PERIOD_MS
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            period_ms: TICK_PERIOD_MS,
        }
    }
}

impl TickConfig {
    /// Nominal tick period as a `Duration`.
    #[inline]
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

/// Complete configuration of a Volley shooter process.
///
/// Every section is optional in TOML; missing sections take their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolleyConfig {
    /// Shared fields (log level, service name).
    #[serde(default)]
    pub shared: SharedConfig,
    /// Dual-actuator shooter tuning and geometry.
    #[serde(default)]
    pub shooter: ShooterConfig,
    /// Flywheel physics used when no hardware is present.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Shot sequencing timings.
    #[serde(default)]
    pub sequence: SequenceConfig,
    /// Host tick period.
    #[serde(default)]
    pub tick: TickConfig,
}

impl VolleyConfig {
    /// Validate every section, failing on the first invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.shooter.validate()?;
        self.simulation.validate()?;
        self.sequence.validate()?;
        if self.tick.period_ms == 0 {
            return Err(ConfigError::ValidationError(
                "tick.period_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_log_level_default() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_log_level_deserialization() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct TestWrapper {
            level: LogLevel,
        }

        for (text, level) in [
            ("trace", LogLevel::Trace),
            ("debug", LogLevel::Debug),
            ("info", LogLevel::Info),
            ("warn", LogLevel::Warn),
            ("error", LogLevel::Error),
        ] {
            let parsed: TestWrapper = toml::from_str(&format!("level = \"{text}\"")).unwrap();
            assert_eq!(parsed.level, level);
            assert_eq!(level.as_directive(), text);
        }
    }

    #[test]
    fn test_shared_config_validation_empty_service_name() {
        let config = SharedConfig {
            log_level: LogLevel::Info,
            service_name: "".to_string(),
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_config_loader_file_not_found() {
        let result = VolleyConfig::load(Path::new("/nonexistent/path/volley.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound)));
    }

    #[test]
    fn test_config_loader_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid toml {{{{").unwrap();

        let result = VolleyConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let file = NamedTempFile::new().unwrap();
        let config = VolleyConfig::load(file.path()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick.period(), Duration::from_millis(20));
        assert_eq!(config.shooter.tolerance_rpm, 50.0);
        assert_eq!(config.sequence.deadline_s, 15.0);
    }

    #[test]
    fn test_partial_override() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[shared]
log_level = "debug"
service_name = "volley-test"

[shooter]
tolerance_rpm = 40.0

[shooter.left.gains]
kp = 0.001

[sequence]
settle_s = 0.5
"#
        )
        .unwrap();
        file.flush().unwrap();

        let config = VolleyConfig::load(file.path()).unwrap();
        assert_eq!(config.shared.log_level, LogLevel::Debug);
        assert_eq!(config.shooter.tolerance_rpm, 40.0);
        assert_eq!(config.shooter.left.gains.kp, 0.001);
        // Untouched side keeps its defaults.
        assert_eq!(config.shooter.right.gains.kp, 0.0005);
        assert_eq!(config.sequence.settle_s, 0.5);
        assert_eq!(config.sequence.deadline_s, 15.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_tick_period_rejected() {
        let mut config = VolleyConfig::default();
        config.tick.period_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
