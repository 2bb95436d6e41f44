//! Physics simulation module.
//!
//! DC motor characteristics and the flywheel velocity integrator.

mod flywheel;
mod motor;

pub use flywheel::FlywheelSimModel;
pub use motor::DcMotor;
