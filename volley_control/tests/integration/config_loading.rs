//! Loading a TOML configuration and building the shooter from it.

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use volley_common::config::{ConfigError, ConfigLoader, LogLevel, VolleyConfig};
use volley_common::shooter::config::MotorModel;
use volley_common::shooter::io::Side;
use volley_control::sequence::task::Idle;
use volley_control::sequence::ShootSequencer;
use volley_control::DualActuatorShooter;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn full_config_builds_shooter() {
    let file = write_config(
        r#"
[shared]
log_level = "debug"
service_name = "practice-field"

[shooter]
tolerance_rpm = 25.0
wheel_radius_m = 0.0508

[shooter.left.gains]
kp = 0.0006

[shooter.right.gains]
kp = 0.0004
ki = 0.00001
tt = 0.1

[simulation]
motor = "kraken_x60"
motors_per_shaft = 2

[sequence]
settle_s = 0.5
deadline_s = 8.0

[tick]
period_ms = 10
"#,
    );

    let config = VolleyConfig::load(file.path()).unwrap();
    config.validate().unwrap();

    assert_eq!(config.shared.log_level, LogLevel::Debug);
    assert_eq!(config.simulation.motor, MotorModel::KrakenX60);
    assert_eq!(config.tick.period().as_millis(), 10);
    // Unspecified fields keep their defaults.
    assert!((config.shooter.right.feedforward.kv - 1.0 / 6784.0).abs() < 1e-15);
    assert_eq!(config.shooter.max_velocity_rpm, 10_000.0);

    let shooter =
        DualActuatorShooter::new(&config.shooter, &config.simulation, None).unwrap();
    assert_eq!(shooter.controller(Side::Left).gains().kp, 0.0006);
    assert_eq!(shooter.controller(Side::Right).gains().ki, 0.00001);
    assert_eq!(shooter.controller(Side::Right).tolerance(), 25.0);

    assert!(
        ShootSequencer::<DualActuatorShooter>::new(&config.sequence, 3000.0, Box::new(Idle))
            .is_ok()
    );
}

#[test]
fn empty_file_is_all_defaults() {
    let file = write_config("");
    let config = VolleyConfig::load(file.path()).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.shared.service_name, "volley");
    assert_eq!(config.shooter.tolerance_rpm, 50.0);
    assert_eq!(config.sequence.deadline_s, 15.0);
}

#[test]
fn invalid_values_fail_validation() {
    let file = write_config(
        r#"
[sequence]
settle_s = 3.0
deadline_s = 2.0
"#,
    );
    let config = VolleyConfig::load(file.path()).unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValidationError(_))
    ));

    let file = write_config(
        r#"
[shooter]
tolerance_rpm = -5.0
"#,
    );
    let config = VolleyConfig::load(file.path()).unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("tolerance_rpm"));
}

#[test]
fn unknown_motor_is_a_parse_error() {
    let file = write_config(
        r#"
[simulation]
motor = "cim"
"#,
    );
    assert!(matches!(
        VolleyConfig::load(file.path()),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn missing_file() {
    assert!(matches!(
        VolleyConfig::load(Path::new("/nonexistent/volley.toml")),
        Err(ConfigError::FileNotFound)
    ));
}

#[test]
fn shipped_config_is_valid() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/volley.toml");
    let config = VolleyConfig::load(&path).unwrap();
    config.validate().unwrap();
    assert_eq!(config.simulation.motor, MotorModel::NeoVortex);
    assert_eq!(config.tick.period_ms, 20);
}
