//! Gated motion commands for one axis.
//!
//! Every command method starts with the motion gate, checked in fixed
//! priority `EStopped > NotHomed > NotEnabled`. A rejected command issues
//! no device call. Geometry (`NotConfigured`) is checked after the gate.
//!
//! The engine does not own the state machine; callers pass it in so the
//! e-stop latch participates in the gate.

use cable_common::axis::config::{
    AxisGeometry, JoggingParameters, MotionParameters, RampParameters, ShutdownParameters,
    validate_bounds, validate_shutdown_position,
};
use cable_common::axis::error::{AxisConfigError, MotionRejection};
use cable_common::axis::state::MoveType;
use cable_common::device::{DeviceStatus, MotorDevice};
use tracing::{debug, info, trace};

use super::drive::AxisDrive;
use super::ramp::VelocityRamp;
use crate::bounds::BoundsPolicy;
use crate::error::ParameterError;
use crate::state::machine::RobotStateMachine;

/// Outcome of one velocity-mode step.
#[derive(Debug, Clone, Copy, PartialEq)]
enum VelocityStep {
    /// Signed RPM to command.
    Run(f64),
    /// Decelerating and within the arrival tolerance.
    Arrived { current: f64 },
    /// This position [mm] lies outside the soft limits.
    OutOfBounds(f64),
}

/// Motion limits, parameters and ramp state for one axis.
#[derive(Debug)]
pub struct MotionCommandEngine<D: MotorDevice> {
    pub(crate) drive: AxisDrive<D>,
    bounds: BoundsPolicy,
    motion: MotionParameters,
    jogging: JoggingParameters,
    pub(crate) shutdown: ShutdownParameters,
    pub(crate) ramp: VelocityRamp,
    move_type: MoveType,
    /// Target of the active velocity move [mm].
    velocity_target: Option<f64>,
}

impl<D: MotorDevice> MotionCommandEngine<D> {
    /// Build an engine. Parameters are validated; geometry is configured
    /// separately through [`configure`](Self::configure).
    pub fn new(
        device: D,
        motion: MotionParameters,
        jogging: JoggingParameters,
        shutdown: ShutdownParameters,
        ramp: RampParameters,
    ) -> Result<Self, AxisConfigError> {
        motion.validate()?;
        jogging.validate()?;
        shutdown.validate()?;
        ramp.validate()?;
        validate_shutdown_position(shutdown.position, motion.bounds_max)?;
        Ok(Self {
            drive: AxisDrive::new(device),
            bounds: BoundsPolicy::new(motion.bounds_min, motion.bounds_max)?,
            motion,
            jogging,
            shutdown,
            ramp: VelocityRamp::new(ramp),
            move_type: MoveType::Position,
            velocity_target: None,
        })
    }

    /// Fix geometry (one-time) and push the configured limits to the device.
    pub fn configure(&mut self, geometry: &AxisGeometry) -> Result<(), ParameterError> {
        self.drive.configure(geometry)?;
        self.drive.apply_limits(self.motion.vel_limit, self.motion.accel_limit)?;
        Ok(())
    }

    // ─── Queries ────────────────────────────────────────────────────

    #[inline]
    pub fn drive(&self) -> &AxisDrive<D> {
        &self.drive
    }

    #[inline]
    pub fn device_status(&self) -> DeviceStatus {
        self.drive.status()
    }

    #[inline]
    pub const fn move_type(&self) -> MoveType {
        self.move_type
    }

    /// Target of the active velocity move, if any [mm].
    #[inline]
    pub const fn velocity_target(&self) -> Option<f64> {
        self.velocity_target
    }

    /// Current ramp magnitude [RPM].
    #[inline]
    pub const fn target_velocity(&self) -> f64 {
        self.ramp.velocity()
    }

    #[inline]
    pub const fn bounds(&self) -> BoundsPolicy {
        self.bounds
    }

    #[inline]
    pub const fn motion_parameters(&self) -> MotionParameters {
        self.motion
    }

    #[inline]
    pub const fn jogging_parameters(&self) -> JoggingParameters {
        self.jogging
    }

    #[inline]
    pub const fn shutdown_parameters(&self) -> ShutdownParameters {
        self.shutdown
    }

    #[inline]
    pub const fn ramp_parameters(&self) -> RampParameters {
        self.ramp.params()
    }

    // ─── Parameters ─────────────────────────────────────────────────

    /// Replace the motion limits and push vel/accel to the device once
    /// configured. Bounds are re-validated against the shutdown position.
    pub fn set_motion_parameters(&mut self, motion: MotionParameters) -> Result<(), ParameterError> {
        motion.validate()?;
        validate_shutdown_position(self.shutdown.position, motion.bounds_max)?;
        if self.drive.is_configured() {
            self.drive.apply_limits(motion.vel_limit, motion.accel_limit)?;
        }
        self.bounds = BoundsPolicy::new(motion.bounds_min, motion.bounds_max)?;
        self.motion = motion;
        Ok(())
    }

    /// Replace the soft limits only.
    pub fn set_bounds(&mut self, bounds_min: f64, bounds_max: f64) -> Result<(), AxisConfigError> {
        validate_bounds(bounds_min, bounds_max)?;
        validate_shutdown_position(self.shutdown.position, bounds_max)?;
        self.bounds = BoundsPolicy::new(bounds_min, bounds_max)?;
        self.motion.bounds_min = bounds_min;
        self.motion.bounds_max = bounds_max;
        Ok(())
    }

    pub fn set_jogging_parameters(&mut self, jogging: JoggingParameters) -> Result<(), AxisConfigError> {
        jogging.validate()?;
        self.jogging = jogging;
        Ok(())
    }

    pub fn set_shutdown_parameters(&mut self, shutdown: ShutdownParameters) -> Result<(), AxisConfigError> {
        shutdown.validate()?;
        validate_shutdown_position(shutdown.position, self.motion.bounds_max)?;
        self.shutdown = shutdown;
        Ok(())
    }

    pub fn set_ramp_parameters(&mut self, ramp: RampParameters) -> Result<(), AxisConfigError> {
        ramp.validate()?;
        self.ramp.set_params(ramp);
        Ok(())
    }

    // ─── Gate ───────────────────────────────────────────────────────

    /// The motion gate: `EStopped > NotHomed > NotEnabled`.
    pub fn gate(&self, machine: &RobotStateMachine) -> Result<(), MotionRejection> {
        let status = self.drive.status();
        if machine.is_e_stop_latched() || status.contains(DeviceStatus::ESTOPPED) {
            Err(MotionRejection::EStopped)
        } else if !status.contains(DeviceStatus::HOMED) {
            Err(MotionRejection::NotHomed)
        } else if !status.contains(DeviceStatus::ENABLED) {
            Err(MotionRejection::NotEnabled)
        } else {
            Ok(())
        }
    }

    /// E-stop part of the gate only.
    pub fn e_stop_gate(&self, machine: &RobotStateMachine) -> Result<(), MotionRejection> {
        if machine.is_e_stop_latched() || self.drive.status().contains(DeviceStatus::ESTOPPED) {
            Err(MotionRejection::EStopped)
        } else {
            Ok(())
        }
    }

    // ─── Commands ───────────────────────────────────────────────────

    /// Trapezoidal move to an absolute linear target [mm].
    ///
    /// Relative moves are not supported and report `NotImplemented`, which
    /// is distinct from `OutOfBounds`. Nothing is issued on rejection.
    pub fn move_position(
        &mut self,
        machine: &RobotStateMachine,
        target: f64,
        is_absolute: bool,
    ) -> Result<(), MotionRejection> {
        self.gate(machine)?;
        if !is_absolute {
            return Err(MotionRejection::NotImplemented("relative position moves"));
        }
        let current = self.drive.position_mm(true)?;
        self.bounds.check(target, true, current)?;

        self.cancel_velocity();
        self.drive.move_absolute(target)
    }

    /// One velocity-mode control step toward `target` [mm].
    ///
    /// Returns the signed RPM to command. When the current position or the
    /// target lies outside the soft limits the axis is stopped and the
    /// result is 0. A decelerating move already within the arrival
    /// tolerance also yields 0.
    pub fn compute_target_velocity(&mut self, target: f64) -> Result<f64, MotionRejection> {
        Ok(match self.ramp_toward(target)? {
            VelocityStep::Run(rpm) => rpm,
            VelocityStep::Arrived { .. } | VelocityStep::OutOfBounds(_) => 0.0,
        })
    }

    /// Streamed velocity move toward `target` [mm]. Reissued every tick by
    /// the controller while the axis stays in velocity mode.
    ///
    /// On a gate rejection the ramp is reset and nothing is issued. Once the
    /// ramp is decelerating and the axis is within the arrival tolerance,
    /// the move is finished: the device is stopped and the engine returns
    /// to position mode.
    pub fn move_velocity(&mut self, machine: &RobotStateMachine, target: f64) -> Result<(), MotionRejection> {
        if let Err(reason) = self.gate(machine) {
            self.ramp.reset();
            return Err(reason);
        }
        let rpm = match self.ramp_toward(target)? {
            VelocityStep::Run(rpm) => rpm,
            VelocityStep::Arrived { current } => {
                info!(device = self.drive.device().name(), current, target, "velocity move arrived");
                return self.stop();
            }
            VelocityStep::OutOfBounds(position) => return Err(self.out_of_bounds(position)),
        };
        self.move_type = MoveType::Velocity;
        self.velocity_target = Some(target);
        self.drive.device_mut().move_velocity(rpm)?;
        Ok(())
    }

    /// Jog up (toward `bounds_min`) by the jog distance.
    ///
    /// A jog that would leave the soft limits is redirected to an absolute
    /// move onto `bounds_min`.
    pub fn jog_up(&mut self, machine: &RobotStateMachine) -> Result<(), MotionRejection> {
        let distance = self.jogging.jog_dist;
        self.jog(machine, -distance, false)
    }

    /// Jog down (toward `bounds_max`) by the jog distance.
    ///
    /// `override_bounds` skips the bounds check and issues the relative move
    /// as is; otherwise an out-of-bounds jog is redirected onto `bounds_max`.
    pub fn jog_down(&mut self, machine: &RobotStateMachine, override_bounds: bool) -> Result<(), MotionRejection> {
        let distance = self.jogging.jog_dist;
        self.jog(machine, distance, override_bounds)
    }

    /// Leave velocity mode, zero the ramp and stop the device. Always
    /// allowed, whatever the state.
    pub fn stop(&mut self) -> Result<(), MotionRejection> {
        self.cancel_velocity();
        self.drive.device_mut().stop()?;
        Ok(())
    }

    /// Force position mode and zero the ramp. Issues nothing.
    pub fn cancel_velocity(&mut self) {
        if self.move_type == MoveType::Velocity {
            debug!(device = self.drive.device().name(), "velocity move cancelled");
        }
        self.move_type = MoveType::Position;
        self.velocity_target = None;
        self.ramp.reset();
    }

    // ─── Internals ──────────────────────────────────────────────────

    /// Relative jogs run from the end point of the last queued move, so the
    /// bounds check uses the commanded position.
    fn jog(&mut self, machine: &RobotStateMachine, delta: f64, override_bounds: bool) -> Result<(), MotionRejection> {
        self.gate(machine)?;
        let current = self.drive.position_mm(false)?;
        self.cancel_velocity();

        let JoggingParameters { jog_vel, jog_accel, .. } = self.jogging;
        if override_bounds || self.bounds.is_in_bounds(delta, false, current) {
            self.with_limits(jog_vel, jog_accel, |drive| drive.move_relative(delta))
        } else {
            let limit = self.bounds.limit_toward(delta);
            info!(
                device = self.drive.device().name(),
                current,
                requested = current + delta,
                limit,
                "jog redirected to soft limit"
            );
            self.with_limits(jog_vel, jog_accel, |drive| drive.move_absolute(limit))
        }
    }

    /// Run `op` with the device limits temporarily swapped to `vel`/`accel`.
    ///
    /// The previous limits are restored on every path. The first error wins.
    pub(crate) fn with_limits(
        &mut self,
        vel: f64,
        accel: f64,
        op: impl FnOnce(&mut AxisDrive<D>) -> Result<(), MotionRejection>,
    ) -> Result<(), MotionRejection> {
        let prior_vel = self.drive.device().get_velocity();
        let prior_accel = self.drive.device().get_acceleration();

        let result = match self.drive.apply_limits(vel, accel) {
            Ok(()) => op(&mut self.drive),
            Err(e) => Err(e.into()),
        };
        let restored = self.drive.apply_limits(prior_vel, prior_accel);
        result?;
        restored?;
        Ok(())
    }

    /// Ramp step toward `target`. On [`VelocityStep::OutOfBounds`] the axis
    /// has been stopped.
    fn ramp_toward(&mut self, target: f64) -> Result<VelocityStep, MotionRejection> {
        let current = self.drive.position_mm(true)?;
        for position in [current, target] {
            if !self.bounds.contains(position) {
                self.stop()?;
                return Ok(VelocityStep::OutOfBounds(position));
            }
        }

        let distance = target - current;
        if self.ramp.is_decelerating() && distance.abs() <= self.ramp.params().arrival_tolerance_mm {
            return Ok(VelocityStep::Arrived { current });
        }
        let magnitude = self.ramp.step(distance.abs(), self.motion.vel_limit);
        let travel = if distance > 0.0 { 1.0 } else { -1.0 };
        let rpm = magnitude * travel * self.drive.rotation_sign();
        trace!(
            device = self.drive.device().name(),
            current,
            target,
            rpm,
            decelerating = self.ramp.is_decelerating(),
            "velocity step"
        );
        Ok(VelocityStep::Run(rpm))
    }

    fn out_of_bounds(&self, target: f64) -> MotionRejection {
        MotionRejection::OutOfBounds {
            target,
            min: self.bounds.bounds_min(),
            max: self.bounds.bounds_max(),
        }
    }
}
