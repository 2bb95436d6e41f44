//! Dual-actuator shooter: two independent velocity loops over one I/O backend.
//!
//! The I/O backend (hardware handle or flywheel simulation) is chosen once
//! at construction. Every [`tick`](DualActuatorShooter::tick):
//!
//! 1. lets the backend advance (the simulation integrates the commands
//!    applied on the previous tick),
//! 2. reads both measured velocities and runs both controllers,
//! 3. applies both commands,
//! 4. publishes one [`ShooterSnapshot`] to the optional telemetry sink.
//!
//! The two controllers never share state; readiness is the AND of their
//! individual `at_setpoint()` results.

use std::time::Duration;
use tracing::{debug, info, trace, warn};

use volley_common::shooter::config::{ShooterConfig, SimulationConfig};
use volley_common::shooter::io::{ShooterIo, Side, TelemetrySource};
use volley_common::shooter::telemetry::{ShooterFaults, ShooterSnapshot, TelemetrySink};
use volley_common::shooter::units::WheelGeometry;
use volley_hal::SimulationDriver;

use crate::control::VelocityController;
use crate::error::{ControlError, SensorFault};

/// Narrow command surface the shot sequencer is allowed to use.
///
/// Controller internals (integral, gains, raw terms) are deliberately not
/// reachable through it.
pub trait ShooterCommands {
    /// Command both sides to the same target velocity [RPM].
    fn set_target_velocity(&mut self, rpm: f64);

    /// Last valid measured velocity of one side [RPM].
    fn velocity(&self, side: Side) -> f64;
}

/// Closed-loop dual flywheel shooter.
pub struct DualActuatorShooter {
    controllers: [VelocityController; 2],
    io: Box<dyn ShooterIo>,
    source: TelemetrySource,
    geometry: WheelGeometry,
    faults: ShooterFaults,
    sink: Option<Box<dyn TelemetrySink>>,
    snapshot: ShooterSnapshot,
    tick_count: u64,
    publish_failures: u64,
    closed: bool,
}

impl DualActuatorShooter {
    /// Build the shooter.
    ///
    /// With `hardware = None` a [`SimulationDriver`] built from `simulation`
    /// supplies telemetry.
    ///
    /// # Errors
    /// `ControlError::Configuration` if either configuration fails validation.
    pub fn new(
        config: &ShooterConfig,
        simulation: &SimulationConfig,
        hardware: Option<Box<dyn ShooterIo>>,
    ) -> Result<Self, ControlError> {
        config.validate()?;

        let io: Box<dyn ShooterIo> = match hardware {
            Some(io) => io,
            None => {
                simulation.validate()?;
                Box::new(SimulationDriver::new(simulation, config.wheel_radius_m))
            }
        };
        let source = io.source();
        info!(
            "Shooter I/O: {} ({:?} telemetry), tolerance ±{} RPM, wheel radius {} m",
            io.name(),
            source,
            config.tolerance_rpm,
            config.wheel_radius_m
        );

        let controllers = [
            VelocityController::new(&config.left, config.tolerance_rpm, config.max_velocity_rpm)?,
            VelocityController::new(&config.right, config.tolerance_rpm, config.max_velocity_rpm)?,
        ];

        Ok(Self {
            controllers,
            io,
            source,
            geometry: WheelGeometry::new(config.wheel_radius_m),
            faults: ShooterFaults::empty(),
            sink: None,
            snapshot: ShooterSnapshot::default(),
            tick_count: 0,
            publish_failures: 0,
            closed: false,
        })
    }

    /// Attach a telemetry sink, replacing any previous one.
    pub fn set_telemetry_sink(&mut self, sink: Box<dyn TelemetrySink>) {
        self.sink = Some(sink);
    }

    // ── Setpoints ───────────────────────────────────────────────

    /// Command each side independently [RPM].
    pub fn set_target_velocity_pair(&mut self, left: f64, right: f64) {
        debug!("Shooter target: left {left:.1} RPM, right {right:.1} RPM");
        self.controllers[Side::Left.index()].set_setpoint(left);
        self.controllers[Side::Right.index()].set_setpoint(right);
    }

    /// Command both sides to the same velocity [RPM].
    pub fn set_target_velocity(&mut self, rpm: f64) {
        self.set_target_velocity_pair(rpm, rpm);
    }

    /// Command both sides to a wheel surface speed [m/s].
    pub fn set_target_speed(&mut self, speed: f64) {
        let rpm = self.geometry.linear_to_angular(speed);
        self.set_target_velocity(rpm);
    }

    /// Setpoint of one side [RPM].
    pub fn setpoint(&self, side: Side) -> f64 {
        self.controllers[side.index()].setpoint()
    }

    // ── Tick ────────────────────────────────────────────────────

    /// Advance both loops exactly once.
    ///
    /// Sensor faults are absorbed per side (the side holds its last command
    /// and the matching `SENSOR_*` flag is raised).
    ///
    /// # Errors
    /// `ControlError::ActuationFault` if the backend rejects a command. The
    /// controllers are rolled back to their state before this tick, the
    /// previous commands are re-applied where possible and the `SENSOR_*`
    /// flags keep their previous values.
    pub fn tick(&mut self, dt: Duration) -> Result<(), ControlError> {
        self.io.begin_tick(dt);
        self.tick_count += 1;

        let saved = self.controllers.clone();
        let mut commands = [0.0; 2];
        let mut sensor_faults: [Option<SensorFault>; 2] = [None, None];

        for side in Side::ALL {
            let reading = self.io.measured_velocity(side);
            commands[side.index()] = match self.controllers[side.index()].tick(reading, dt) {
                Ok(command) => command,
                Err(fault) => {
                    let held = fault.held_command;
                    sensor_faults[side.index()] = Some(fault);
                    held
                }
            };
        }

        for side in Side::ALL {
            if let Err(source) = self.io.set_normalized_output(side, commands[side.index()]) {
                warn!("{side} actuation fault: {source}");
                self.controllers = saved;
                for written in Side::ALL.into_iter().take(side.index()) {
                    let previous = self.controllers[written.index()].command();
                    if let Err(err) = self.io.set_normalized_output(written, previous) {
                        warn!("{written} could not restore previous command: {err}");
                    }
                }
                self.faults.insert(ShooterFaults::actuation(side));
                self.publish();
                return Err(ControlError::ActuationFault { side, source });
            }
        }

        self.faults
            .remove(ShooterFaults::ACTUATION_LEFT | ShooterFaults::ACTUATION_RIGHT);
        for side in Side::ALL {
            self.update_sensor_flag(side, sensor_faults[side.index()].as_ref());
        }
        self.publish();

        trace!(
            "tick {}: L {:.1}/{:.1} RPM cmd {:.3}, R {:.1}/{:.1} RPM cmd {:.3}",
            self.tick_count,
            self.snapshot.left_rpm,
            self.snapshot.left_setpoint_rpm,
            self.snapshot.left_command,
            self.snapshot.right_rpm,
            self.snapshot.right_setpoint_rpm,
            self.snapshot.right_command
        );
        Ok(())
    }

    /// Sensor flags change only on committed ticks, so they always match
    /// what the controllers recorded.
    fn update_sensor_flag(&mut self, side: Side, fault: Option<&SensorFault>) {
        let flag = ShooterFaults::sensor(side);
        match fault {
            Some(fault) if !self.faults.contains(flag) => {
                warn!("{side} sensor fault: {fault}");
                self.faults.insert(flag);
            }
            None if self.faults.contains(flag) => {
                info!("{side} telemetry recovered");
                self.faults.remove(flag);
            }
            _ => {}
        }
    }

    fn publish(&mut self) {
        let left = &self.controllers[Side::Left.index()];
        let right = &self.controllers[Side::Right.index()];
        self.snapshot = ShooterSnapshot {
            tick: self.tick_count,
            left_rpm: left.measured(),
            right_rpm: right.measured(),
            left_setpoint_rpm: left.setpoint(),
            right_setpoint_rpm: right.setpoint(),
            left_command: left.command(),
            right_command: right.command(),
            at_setpoint: left.at_setpoint() && right.at_setpoint(),
            faults: self.faults,
        };

        if let Some(sink) = self.sink.as_mut() {
            if let Err(err) = sink.publish(&self.snapshot) {
                self.publish_failures += 1;
                warn!("{err} ({} failures)", self.publish_failures);
            }
        }
    }

    // ── Queries ─────────────────────────────────────────────────

    /// Both sides within tolerance of their own setpoints.
    pub fn at_setpoint(&self) -> bool {
        self.controllers.iter().all(VelocityController::at_setpoint)
    }

    /// Last valid measured velocity of one side [RPM].
    pub fn velocity(&self, side: Side) -> f64 {
        self.controllers[side.index()].measured()
    }

    /// Wheel surface speed of one side [m/s].
    pub fn surface_speed(&self, side: Side) -> f64 {
        self.geometry.angular_to_linear(self.velocity(side))
    }

    /// `left − right` [RPM].
    pub fn velocity_difference(&self) -> f64 {
        self.velocity(Side::Left) - self.velocity(Side::Right)
    }

    /// `left − right` surface speed [m/s].
    pub fn surface_speed_difference(&self) -> f64 {
        self.surface_speed(Side::Left) - self.surface_speed(Side::Right)
    }

    /// Normalized drive command of one side.
    pub fn drive_command(&self, side: Side) -> f64 {
        self.controllers[side.index()].command()
    }

    /// Drive command expressed as motor voltage [V].
    pub fn applied_voltage(&self, side: Side) -> f64 {
        self.drive_command(side) * self.io.supply_voltage()
    }

    /// Where measured velocities come from; fixed at construction.
    pub fn telemetry_source(&self) -> TelemetrySource {
        self.source
    }

    /// Active fault flags.
    pub fn faults(&self) -> ShooterFaults {
        self.faults
    }

    /// Snapshot published on the last tick.
    pub fn snapshot(&self) -> ShooterSnapshot {
        self.snapshot
    }

    /// Ticks executed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Snapshots the sink refused.
    pub fn publish_failures(&self) -> u64 {
        self.publish_failures
    }

    /// Read-only access to one controller.
    pub fn controller(&self, side: Side) -> &VelocityController {
        &self.controllers[side.index()]
    }

    // ── Tuning ──────────────────────────────────────────────────

    /// Replace the PID gains of one side.
    ///
    /// # Errors
    /// `ControlError::Configuration` on a non-finite gain.
    pub fn set_gains(&mut self, side: Side, kp: f64, ki: f64, kd: f64) -> Result<(), ControlError> {
        self.controllers[side.index()].set_gains(kp, ki, kd)?;
        info!("{side} gains: kp={kp} ki={ki} kd={kd}");
        Ok(())
    }

    /// Replace the shared at-setpoint band [RPM].
    ///
    /// # Errors
    /// `ControlError::Configuration` if negative or non-finite; neither side
    /// is changed in that case.
    pub fn set_tolerance(&mut self, tolerance: f64) -> Result<(), ControlError> {
        let mut updated = self.controllers.clone();
        for controller in &mut updated {
            controller.set_tolerance(tolerance)?;
        }
        self.controllers = updated;
        Ok(())
    }

    // ── Lifecycle ───────────────────────────────────────────────

    /// Release I/O handles. Safe to call more than once.
    pub fn close_resources(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        match self.io.close() {
            Ok(()) => info!("Shooter I/O closed"),
            Err(err) => warn!("Shooter I/O close failed: {err}"),
        }
    }
}

impl ShooterCommands for DualActuatorShooter {
    fn set_target_velocity(&mut self, rpm: f64) {
        DualActuatorShooter::set_target_velocity(self, rpm);
    }

    fn velocity(&self, side: Side) -> f64 {
        DualActuatorShooter::velocity(self, side)
    }
}

impl Drop for DualActuatorShooter {
    fn drop(&mut self) {
        self.close_resources();
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
