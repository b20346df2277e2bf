//! Per-axis composition root.
//!
//! [`CableRobotController`] owns the motor device (through the engine), the
//! operational state machine, the axis parameters and the registered state
//! observers. Every command is a pass-through to the engine with the state
//! machine supplied for gating; every rejection is logged here and returned
//! to the caller.
//!
//! ## Tick
//!
//! [`update`](CableRobotController::update) is called once per control tick:
//! 1. Re-evaluate the state machine from the device status flags.
//! 2. In velocity mode, recompute and reissue the velocity command.
//! 3. Refresh the cached actual position.

use std::sync::Arc;
use std::time::Duration;

use cable_common::axis::config::{
    AxisConfig, AxisGeometry, JoggingParameters, MotionParameters, ShutdownParameters,
    TorqueLimits,
};
use cable_common::axis::error::{AxisConfigError, MotionRejection};
use cable_common::axis::snapshot::AxisSnapshot;
use cable_common::axis::state::{MoveType, RobotState};
use cable_common::clock::Clock;
use cable_common::device::{DeviceStatus, MotorDevice};
use tracing::{debug, info, warn};

use crate::error::ParameterError;
use crate::motion::MotionCommandEngine;
use crate::observer::StateObserver;
use crate::state::machine::{RobotEvent, RobotStateMachine, StateTransition};

/// Single cable axis: configuration, state machine and motion engine.
pub struct CableRobotController<D: MotorDevice> {
    name: String,
    clock: Arc<dyn Clock>,
    geometry: Option<AxisGeometry>,
    torque: TorqueLimits,
    machine: RobotStateMachine,
    engine: MotionCommandEngine<D>,
    observers: Vec<Box<dyn StateObserver>>,
    /// Actual position cached by the last `update()` [mm].
    position_mm: f64,
    position_counts: i64,
}

impl<D: MotorDevice> CableRobotController<D> {
    /// Build a controller from validated parameters. The geometry in
    /// `config` is not applied; call [`configure`](Self::configure) before
    /// any motion command.
    pub fn new(device: D, config: &AxisConfig, clock: Arc<dyn Clock>) -> Result<Self, AxisConfigError> {
        config.validate_limits()?;
        let engine = MotionCommandEngine::new(
            device,
            config.motion,
            config.jogging,
            config.shutdown,
            config.ramp,
        )?;
        Ok(Self {
            name: config.name.clone(),
            clock,
            geometry: None,
            torque: config.torque,
            machine: RobotStateMachine::new(),
            engine,
            observers: Vec::new(),
            position_mm: 0.0,
            position_counts: 0,
        })
    }

    /// [`new`](Self::new) followed by [`configure`](Self::configure) with the
    /// geometry from `config`.
    pub fn from_config(device: D, config: &AxisConfig, clock: Arc<dyn Clock>) -> Result<Self, ParameterError> {
        let mut controller = Self::new(device, config, clock)?;
        controller.configure(config.geometry.clone())?;
        Ok(controller)
    }

    /// One-time geometry setup: fixes `mm_per_count` and the rotation sign
    /// and pushes the velocity/acceleration limits to the device.
    pub fn configure(&mut self, geometry: AxisGeometry) -> Result<(), ParameterError> {
        if self.geometry.is_some() {
            return Err(AxisConfigError::AlreadyConfigured.into());
        }
        self.engine.configure(&geometry)?;
        info!(
            axis = %self.name,
            groove = ?geometry.groove,
            mm_per_count = geometry.mm_per_count(),
            "axis configured"
        );
        self.geometry = Some(geometry);
        self.refresh_position();
        Ok(())
    }

    /// Register a state observer.
    pub fn add_observer(&mut self, observer: Box<dyn StateObserver>) {
        self.observers.push(observer);
    }

    // ─── Tick ───────────────────────────────────────────────────────

    /// Per-tick hook. Returns the state after evaluation.
    pub fn update(&mut self) -> RobotState {
        let status = self.engine.device_status();
        let from = self.machine.state();
        let transition = self.machine.evaluate(status);
        self.notify(from, &transition);

        if self.engine.move_type() == MoveType::Velocity {
            if let Some(target) = self.engine.velocity_target() {
                if let Err(reason) = self.engine.move_velocity(&self.machine, target) {
                    warn!(axis = %self.name, %reason, target, "velocity move aborted");
                    self.engine.cancel_velocity();
                }
            }
        }

        self.refresh_position();
        self.machine.state()
    }

    // ─── Commands ───────────────────────────────────────────────────

    /// Absolute position move [mm].
    pub fn move_position(&mut self, target: f64, is_absolute: bool) -> Result<(), MotionRejection> {
        let result = self.engine.move_position(&self.machine, target, is_absolute);
        self.report("move_position", result)
    }

    /// Start (or retarget) a streamed velocity move toward `target` [mm].
    pub fn move_velocity(&mut self, target: f64) -> Result<(), MotionRejection> {
        let result = self.engine.move_velocity(&self.machine, target);
        self.report("move_velocity", result)
    }

    /// One velocity-mode control step without issuing it [RPM]. The axis is
    /// still stopped when it or the target lies outside the soft limits.
    pub fn compute_target_velocity(&mut self, target: f64) -> Result<f64, MotionRejection> {
        let result = self.engine.compute_target_velocity(target);
        if let Err(reason) = &result {
            warn!(axis = %self.name, %reason, "compute_target_velocity rejected");
        }
        result
    }

    pub fn jog_up(&mut self) -> Result<(), MotionRejection> {
        let result = self.engine.jog_up(&self.machine);
        self.report("jog_up", result)
    }

    /// `override_bounds` skips the soft-limit check entirely.
    pub fn jog_down(&mut self, override_bounds: bool) -> Result<(), MotionRejection> {
        let result = self.engine.jog_down(&self.machine, override_bounds);
        self.report("jog_down", result)
    }

    /// Force position mode, zero the ramp and stop the device. Always
    /// allowed.
    pub fn stop(&mut self) -> Result<(), MotionRejection> {
        let result = self.engine.stop();
        self.report("stop", result)
    }

    /// Engage or release the e-stop.
    ///
    /// Engaging always stops the axis first, then engages the device e-stop
    /// and latches the state machine, whatever the outcome of the stop.
    /// Releasing is rejected while the device still reports e-stop.
    pub fn set_e_stop(&mut self, engaged: bool) -> Result<(), MotionRejection> {
        if engaged {
            let stopped = self.engine.stop();
            let device = self.engine.drive.device_mut().set_e_stop(true);
            self.apply_event(RobotEvent::EStopSet);
            warn!(axis = %self.name, "e-stop engaged");
            let result = stopped.and(device.map_err(MotionRejection::from));
            return self.report("set_e_stop", result);
        }

        let result = match self.engine.drive.device_mut().set_e_stop(false) {
            Ok(()) => match self.apply_event(RobotEvent::EStopCleared) {
                StateTransition::Rejected(_) => Err(MotionRejection::EStopped),
                _ => {
                    info!(axis = %self.name, state = %self.machine.state(), "e-stop cleared");
                    Ok(())
                }
            },
            Err(e) => Err(e.into()),
        };
        self.report("clear_e_stop", result)
    }

    /// Enable or disable the drive. Rejected while e-stopped. Disabling
    /// also cancels any velocity move.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), MotionRejection> {
        let result = self.switch_enabled(enabled);
        self.report(if enabled { "enable" } else { "disable" }, result)
    }

    /// Run the device homing routine, blocking up to `timeout`.
    ///
    /// On failure the axis reverts to NotHomed and `Timeout` is returned,
    /// which is fatal: the axis must be re-homed.
    pub fn run_homing_routine(&mut self, timeout: Duration) -> Result<(), MotionRejection> {
        if let Err(reason) = self.engine.e_stop_gate(&self.machine) {
            return self.report("run_homing_routine", Err(reason));
        }
        if let StateTransition::Rejected(why) = self.apply_event(RobotEvent::HomingStarted) {
            warn!(axis = %self.name, why, "homing start not accepted by state machine");
        }

        let result = self.engine.home(timeout);
        let outcome = if result.is_ok() {
            RobotEvent::HomingSucceeded
        } else {
            RobotEvent::HomingFailed
        };
        self.apply_event(outcome);
        self.refresh_position();
        self.report("run_homing_routine", result)
    }

    /// Retract to the hard stop and disable, blocking up to `timeout`.
    ///
    /// `Ok` only when the position converged before the timeout. On
    /// timeout the motor is left enabled.
    pub fn shutdown(&mut self, timeout: Duration) -> Result<(), MotionRejection> {
        let clock = Arc::clone(&self.clock);
        let result = self.engine.shutdown(&self.machine, clock.as_ref(), timeout);
        if result.is_ok() {
            self.apply_event(RobotEvent::Disable);
        }
        self.refresh_position();
        self.report("shutdown", result)
    }

    // ─── Parameters ─────────────────────────────────────────────────

    #[inline]
    pub fn get_motion_parameters(&self) -> MotionParameters {
        self.engine.motion_parameters()
    }

    /// Replace velocity/acceleration limits and bounds; vel/accel are
    /// pushed to the device.
    pub fn set_motion_parameters(&mut self, motion: MotionParameters) -> Result<(), ParameterError> {
        self.engine.set_motion_parameters(motion)?;
        debug!(axis = %self.name, ?motion, "motion parameters updated");
        Ok(())
    }

    /// Replace the soft limits. Re-validated against the shutdown position.
    pub fn set_bounds(&mut self, bounds_min: f64, bounds_max: f64) -> Result<(), AxisConfigError> {
        self.engine.set_bounds(bounds_min, bounds_max)?;
        debug!(axis = %self.name, bounds_min, bounds_max, "bounds updated");
        Ok(())
    }

    #[inline]
    pub fn get_jogging_parameters(&self) -> JoggingParameters {
        self.engine.jogging_parameters()
    }

    pub fn set_jogging_parameters(&mut self, jogging: JoggingParameters) -> Result<(), AxisConfigError> {
        self.engine.set_jogging_parameters(jogging)
    }

    #[inline]
    pub fn get_shutdown_parameters(&self) -> ShutdownParameters {
        self.engine.shutdown_parameters()
    }

    pub fn set_shutdown_parameters(&mut self, shutdown: ShutdownParameters) -> Result<(), AxisConfigError> {
        self.engine.set_shutdown_parameters(shutdown)
    }

    #[inline]
    pub const fn get_torque_limits(&self) -> TorqueLimits {
        self.torque
    }

    pub fn set_torque_limits(&mut self, torque: TorqueLimits) -> Result<(), AxisConfigError> {
        torque.validate()?;
        self.torque = torque;
        Ok(())
    }

    // ─── Queries ────────────────────────────────────────────────────

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub const fn state(&self) -> RobotState {
        self.machine.state()
    }

    /// Homed, enabled and not e-stopped.
    #[inline]
    pub const fn is_ready(&self) -> bool {
        self.machine.is_ready()
    }

    #[inline]
    pub const fn is_configured(&self) -> bool {
        self.geometry.is_some()
    }

    #[inline]
    pub fn geometry(&self) -> Option<&AxisGeometry> {
        self.geometry.as_ref()
    }

    /// Actual position cached by the last tick [mm].
    #[inline]
    pub const fn get_position_actual(&self) -> f64 {
        self.position_mm
    }

    #[inline]
    pub const fn move_type(&self) -> MoveType {
        self.engine.move_type()
    }

    /// Current ramp magnitude [RPM].
    #[inline]
    pub const fn target_velocity(&self) -> f64 {
        self.engine.target_velocity()
    }

    #[inline]
    pub fn device_status(&self) -> DeviceStatus {
        self.engine.device_status()
    }

    #[inline]
    pub fn device(&self) -> &D {
        self.engine.drive().device()
    }

    #[inline]
    pub fn engine(&self) -> &MotionCommandEngine<D> {
        &self.engine
    }

    /// Plain-value view for presentation layers.
    pub fn snapshot(&self) -> AxisSnapshot {
        let state = self.machine.state();
        let motion = self.engine.motion_parameters();
        AxisSnapshot {
            name: self.name.clone(),
            state,
            status: state.as_str(),
            color: state.color(),
            position_mm: self.position_mm,
            position_counts: self.position_counts,
            vel_limit: motion.vel_limit,
            accel_limit: motion.accel_limit,
            move_type: self.engine.move_type(),
            target_velocity: self.engine.target_velocity(),
        }
    }

    // ─── Internals ──────────────────────────────────────────────────

    fn switch_enabled(&mut self, enabled: bool) -> Result<(), MotionRejection> {
        self.engine.e_stop_gate(&self.machine)?;
        if enabled {
            self.engine.drive.device_mut().enable()?;
            self.apply_event(RobotEvent::Enable);
        } else {
            self.engine.cancel_velocity();
            self.engine.drive.device_mut().disable()?;
            self.apply_event(RobotEvent::Disable);
        }
        Ok(())
    }

    fn apply_event(&mut self, event: RobotEvent) -> StateTransition {
        let from = self.machine.state();
        let transition = self.machine.handle_event(event, self.engine.device_status());
        self.notify(from, &transition);
        transition
    }

    fn notify(&mut self, from: RobotState, transition: &StateTransition) {
        if let StateTransition::Ok(to) = *transition {
            info!(axis = %self.name, %from, %to, "state changed");
            for observer in &mut self.observers {
                observer.on_state_changed(&self.name, from, to);
            }
        }
    }

    fn refresh_position(&mut self) {
        self.position_counts = self.engine.drive().position_counts(true);
        if let Ok(mm) = self.engine.drive().position_mm(true) {
            self.position_mm = mm;
        }
    }

    fn report(&self, command: &'static str, result: Result<(), MotionRejection>) -> Result<(), MotionRejection> {
        if let Err(reason) = &result {
            warn!(axis = %self.name, command, %reason, fatal = reason.is_fatal(), "command rejected");
        }
        result
    }
}
