//! # Volley HAL Library
//!
//! Actuator I/O drivers for the Volley shooter. Drivers implement the
//! `ShooterIo` trait defined in `volley_common::shooter::io`.
//!
//! # Module Structure
//!
//! - [`drivers`] - I/O driver implementations
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 volley_hal (single crate)                │
//! │  ┌──────────────────┐     ┌───────────────────────────┐  │
//! │  │ SimulationDriver │────►│ FlywheelSimModel × 2      │  │
//! │  │ (ShooterIo impl) │     │  (first-order ZOH update) │  │
//! │  └──────────────────┘     └─────────────┬─────────────┘  │
//! │                                         ▼                │
//! │                               ┌──────────────────┐       │
//! │                               │ DcMotor          │       │
//! │                               │ (R, Kv, Kt)      │       │
//! │                               └──────────────────┘       │
//! └──────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod drivers;

pub use crate::drivers::simulation::{DcMotor, FlywheelSimModel, SimulationDriver};
