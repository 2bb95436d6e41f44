//! Simulation driver module.
//!
//! Software flywheel simulation used when no hardware telemetry source is
//! available.

mod driver;
mod physics;

pub use driver::SimulationDriver;
pub use physics::{DcMotor, FlywheelSimModel};
