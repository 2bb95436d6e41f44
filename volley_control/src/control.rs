//! Control engine root.
//!
//! Per-actuator velocity control: PID + feedforward, saturated output.
//! Each component activated/deactivated by setting its gain to zero.

pub mod feedforward;
pub mod output;
pub mod pid;
pub mod velocity;

pub use velocity::VelocityController;
