//! # Volley Control Library
//!
//! Closed-loop velocity control for a dual-flywheel shooter and the shot
//! sequencer that drives it. Everything advances from one fixed-period tick;
//! nothing blocks.
//!
//! ## Layers
//!
//! 1. **VelocityController** - PID + feedforward per actuator, clamped to [-1, 1]
//! 2. **DualActuatorShooter** - two isolated controllers over one I/O backend
//!    (hardware or flywheel simulation, chosen once at construction)
//! 3. **ShootSequencer** - spin-up, settle timer, feed/deadline race, spin-down
//! 4. **TickRunner** - fixed-period host loop with cycle statistics
//!
//! ## Tick Order
//!
//! ```text
//! io.begin_tick ─► read velocities ─► controllers ─► apply outputs ─► snapshot
//!                                                                      │
//!                                          sequencer.step ◄────────────┘
//! ```

pub mod control;
pub mod cycle;
pub mod error;
pub mod sequence;
pub mod shooter;
pub mod telemetry;

pub use error::{ControlError, SensorFault, SequenceError};
pub use shooter::{DualActuatorShooter, ShooterCommands};
