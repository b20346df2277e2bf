//! Blocking sequences: homing and shutdown.
//!
//! Both block the calling thread and are bounded by an explicit timeout.
//! Waiting is a retry loop over a [`Clock`]: check, then sleep one poll
//! interval. Neither sequence can be cancelled except by its timeout.
//!
//! ## Shutdown
//!
//! 1. Cancel any velocity move (device stop) and force position mode.
//! 2. Gate check.
//! 3. Absolute move to `bounds_max` at the approach speed.
//! 4. Relative move of `position - bounds_max` past the soft limit at the
//!    final speed. Queued behind step 3 and issued without waiting.
//! 5. Poll until within tolerance of `position` or the timeout expires.
//!    On timeout the motor stays enabled.
//! 6. Settle delay, then disable.

use std::time::Duration;

use cable_common::axis::error::{MotionRejection, Sequence};
use cable_common::axis::state::MoveType;
use cable_common::clock::Clock;
use cable_common::device::MotorDevice;
use tracing::{debug, info, warn};

use super::engine::MotionCommandEngine;
use crate::state::machine::RobotStateMachine;

impl<D: MotorDevice> MotionCommandEngine<D> {
    /// Delegate homing to the device primitive.
    ///
    /// The caller drives the state machine through `HomingStarted` and the
    /// outcome event. Ramp state is cleared before the device is touched.
    pub fn home(&mut self, timeout: Duration) -> Result<(), MotionRejection> {
        self.cancel_velocity();
        info!(device = self.drive.device().name(), ?timeout, "homing started");
        if self.drive.device_mut().run_homing_routine(timeout) {
            info!(device = self.drive.device().name(), "homing complete");
            Ok(())
        } else {
            warn!(device = self.drive.device().name(), ?timeout, "homing failed");
            Err(MotionRejection::Timeout {
                sequence: Sequence::Homing,
                after: timeout,
            })
        }
    }

    /// Retract past `bounds_max` to the hard stop, then disable.
    pub fn shutdown(
        &mut self,
        machine: &RobotStateMachine,
        clock: &dyn Clock,
        timeout: Duration,
    ) -> Result<(), MotionRejection> {
        if self.move_type() == MoveType::Velocity {
            self.stop()?;
        }
        self.cancel_velocity();
        self.gate(machine)?;
        self.drive.units()?;

        let params = self.shutdown;
        let bounds_max = self.bounds().bounds_max();
        info!(
            device = self.drive.device().name(),
            bounds_max,
            position = params.position,
            ?timeout,
            "shutdown started"
        );

        self.with_limits(params.approach_vel, params.approach_accel, |drive| {
            drive.move_absolute(bounds_max)
        })?;
        self.with_limits(params.final_vel, params.final_accel, |drive| {
            drive.move_relative(params.position - bounds_max)
        })?;

        let deadline = clock.now() + timeout;
        loop {
            let position = self.drive.position_mm(true)?;
            if (position - params.position).abs() <= params.tolerance_mm {
                debug!(device = self.drive.device().name(), position, "shutdown position reached");
                break;
            }
            if clock.now() >= deadline {
                warn!(
                    device = self.drive.device().name(),
                    position,
                    target = params.position,
                    "shutdown timed out, motor left enabled"
                );
                return Err(MotionRejection::Timeout {
                    sequence: Sequence::Shutdown,
                    after: timeout,
                });
            }
            clock.sleep(params.poll_interval());
        }

        clock.sleep(params.settle_delay());
        self.drive.device_mut().disable()?;
        info!(device = self.drive.device().name(), "shutdown complete, motor disabled");
        Ok(())
    }
}
