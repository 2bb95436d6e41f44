//! Shooter I/O driver implementations.
//!
//! - [`simulation`] - Flywheel physics driver for development and testing
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the `ShooterIo` trait from `volley_common::shooter::io`
//! 3. Hand the boxed driver to `DualActuatorShooter::new`

pub mod simulation;
