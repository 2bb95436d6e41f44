//! Simulation driver implementation.
//!
//! The `SimulationDriver` implements `ShooterIo` on top of two flywheel
//! models. Commands written during tick N are held and integrated at the
//! start of tick N+1 (`begin_tick`), giving the one-tick actuation latency a
//! physical motor controller exhibits.

use std::time::Duration;
use tracing::{debug, info};

use volley_common::shooter::config::SimulationConfig;
use volley_common::shooter::io::{HalError, ShooterIo, Side, TelemetrySource};

use super::physics::{DcMotor, FlywheelSimModel};

/// Simulation driver implementing the `ShooterIo` trait.
pub struct SimulationDriver {
    /// One flywheel per side (left, right).
    flywheels: [FlywheelSimModel; 2],
    /// Normalized commands applied on the previous tick.
    applied: [f64; 2],
    /// Voltage corresponding to a command of 1.0.
    supply_voltage: f64,
    /// Handles released.
    closed: bool,
}

impl SimulationDriver {
    /// Create a simulation driver from configuration.
    ///
    /// # Arguments
    /// * `config` - Motor model, gearing, supply voltage and wheel masses
    /// * `wheel_radius_m` - Shooter wheel radius used for the inertia [m]
    pub fn new(config: &SimulationConfig, wheel_radius_m: f64) -> Self {
        let motor = DcMotor::from_model(config.motor, config.motors_per_shaft);
        let moi = config.moment_of_inertia(wheel_radius_m);
        let flywheel = FlywheelSimModel::new(motor, config.gearing, moi, config.supply_voltage);

        info!(
            "Simulation driver: {:?} ×{}, J={:.6} kg·m², τ={:.3}s, supply={}V",
            config.motor,
            config.motors_per_shaft,
            moi,
            flywheel.time_constant(),
            config.supply_voltage
        );

        Self {
            flywheels: [flywheel.clone(), flywheel],
            applied: [0.0; 2],
            supply_voltage: config.supply_voltage,
            closed: false,
        }
    }

    /// Flywheel model of one side.
    pub fn flywheel(&self, side: Side) -> &FlywheelSimModel {
        &self.flywheels[side.index()]
    }

    /// Mutable flywheel model of one side (test setup, disturbances).
    pub fn flywheel_mut(&mut self, side: Side) -> &mut FlywheelSimModel {
        &mut self.flywheels[side.index()]
    }

    /// Command most recently applied to one side.
    pub fn applied_command(&self, side: Side) -> f64 {
        self.applied[side.index()]
    }
}

impl ShooterIo for SimulationDriver {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn source(&self) -> TelemetrySource {
        TelemetrySource::Simulated
    }

    fn begin_tick(&mut self, dt: Duration) {
        for side in Side::ALL {
            let volts = self.applied[side.index()] * self.supply_voltage;
            self.flywheels[side.index()].integrate(volts, dt);
        }
    }

    fn measured_velocity(&self, side: Side) -> f64 {
        self.flywheels[side.index()].angular_velocity_rpm()
    }

    fn set_normalized_output(&mut self, side: Side, value: f64) -> Result<(), HalError> {
        if self.closed {
            return Err(HalError::Closed);
        }
        self.applied[side.index()] = value.clamp(-1.0, 1.0);
        Ok(())
    }

    fn supply_voltage(&self) -> f64 {
        self.supply_voltage
    }

    fn close(&mut self) -> Result<(), HalError> {
        if !self.closed {
            debug!("Simulation driver closed");
            self.closed = true;
            self.applied = [0.0; 2];
        }
        Ok(())
    }
}
