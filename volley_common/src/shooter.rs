//! Shooter contracts shared by the driver and control crates.
//!
//! - [`config`] - Tuning, geometry, simulation and sequencing parameters
//! - [`units`] - Angular ↔ surface speed conversion
//! - [`io`] - Actuator I/O capability trait, sides and HAL errors
//! - [`telemetry`] - Per-tick snapshot, fault flags and dashboard sink trait

pub mod config;
pub mod io;
pub mod telemetry;
pub mod units;

pub use io::Side;
