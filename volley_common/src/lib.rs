//! Volley Common Library
//!
//! This crate provides shared constants, configuration loading and the
//! actuator I/O contracts for all Volley workspace crates.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - System-wide constants
//! - [`shooter`] - Shooter configuration, unit conversion, I/O and telemetry contracts
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use volley_common::config::{ConfigLoader, SharedConfig};
//! use volley_common::shooter::units::WheelGeometry;
//! ```

pub mod config;
pub mod consts;
pub mod prelude;
pub mod shooter;
