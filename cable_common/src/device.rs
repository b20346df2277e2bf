//! Motor device capability interface.
//!
//! This module defines:
//! - `MotorDevice` trait - the actuator boundary consumed by the control core
//! - `DeviceStatus` bitflags - assembled status snapshot of a device
//!
//! Vendor SDK bindings and simulators implement `MotorDevice`; the control
//! core never sees anything below it. A device handle is exclusively owned
//! by one controller.
//!
//! # Units
//!
//! | Quantity     | Unit                       |
//! |--------------|----------------------------|
//! | position     | encoder counts (signed)    |
//! | velocity     | RPM                        |
//! | acceleration | RPM/s                      |

use std::time::Duration;

use bitflags::bitflags;

use crate::axis::error::DeviceError;

bitflags! {
    /// Device status flags polled by the state machine.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DeviceStatus: u8 {
        /// Homing completed; position reference valid.
        const HOMED    = 0x01;
        /// Drive enabled.
        const ENABLED  = 0x02;
        /// Device-side e-stop engaged.
        const ESTOPPED = 0x04;
        /// A move is executing or queued.
        const MOVING   = 0x08;
        /// Homing routine in progress.
        const HOMING   = 0x10;
    }
}

impl DeviceStatus {
    /// Homed, enabled and not e-stopped.
    #[inline]
    pub const fn is_ready(&self) -> bool {
        self.contains(Self::HOMED.union(Self::ENABLED)) && !self.contains(Self::ESTOPPED)
    }
}

impl Default for DeviceStatus {
    fn default() -> Self {
        Self::empty()
    }
}

/// Trait defining the interface of a single-axis motor device.
///
/// Command methods return `Result<(), DeviceError>`; queries are infallible
/// and reflect the device's last known state.
///
/// # Move queue
///
/// `move_position` commands are queued in issue order. A relative move is
/// relative to the end point of the previously queued move. `stop()` and
/// `move_velocity()` flush the queue.
pub trait MotorDevice: Send {
    /// Device identifier (e.g. "simulated", serial number).
    fn name(&self) -> &str;

    /// Enable the drive.
    fn enable(&mut self) -> Result<(), DeviceError>;

    /// Disable the drive.
    fn disable(&mut self) -> Result<(), DeviceError>;

    /// Whether the drive is enabled.
    fn is_enabled(&self) -> bool;

    /// Whether the device completed homing.
    fn is_homed(&self) -> bool;

    /// Whether the device-side e-stop is engaged.
    fn is_estopped(&self) -> bool;

    /// Engage or release the device-side e-stop.
    fn set_e_stop(&mut self, engaged: bool) -> Result<(), DeviceError>;

    /// Position in counts. `actual = false` returns the commanded position.
    fn get_position(&self, actual: bool) -> i64;

    /// Velocity limit used for position moves [RPM].
    fn get_velocity(&self) -> f64;

    /// Set the velocity limit used for subsequent position moves [RPM].
    fn set_velocity(&mut self, rpm: f64) -> Result<(), DeviceError>;

    /// Acceleration limit [RPM/s].
    fn get_acceleration(&self) -> f64;

    /// Set the acceleration limit used for subsequent moves [RPM/s].
    fn set_acceleration(&mut self, rpm_per_s: f64) -> Result<(), DeviceError>;

    /// Queue a trapezoidal position move.
    fn move_position(&mut self, counts: i64, absolute: bool, add_dwell: bool) -> Result<(), DeviceError>;

    /// Run at a signed velocity until the next command [RPM].
    fn move_velocity(&mut self, rpm: f64) -> Result<(), DeviceError>;

    /// Decelerate to standstill and flush queued moves.
    fn stop(&mut self) -> Result<(), DeviceError>;

    /// Run the device homing primitive, blocking up to `timeout`.
    ///
    /// Returns `true` when the device reports homed before the timeout.
    fn run_homing_routine(&mut self, timeout: Duration) -> bool;

    /// Whether a move is executing or queued.
    /// Default: false (devices without move feedback).
    fn is_moving(&self) -> bool {
        false
    }

    /// Assemble the status flags from the individual queries.
    fn status(&self) -> DeviceStatus {
        let mut status = DeviceStatus::empty();
        status.set(DeviceStatus::HOMED, self.is_homed());
        status.set(DeviceStatus::ENABLED, self.is_enabled());
        status.set(DeviceStatus::ESTOPPED, self.is_estopped());
        status.set(DeviceStatus::MOVING, self.is_moving());
        status
    }
}

impl<T: MotorDevice + ?Sized> MotorDevice for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }
    fn enable(&mut self) -> Result<(), DeviceError> {
        (**self).enable()
    }
    fn disable(&mut self) -> Result<(), DeviceError> {
        (**self).disable()
    }
    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }
    fn is_homed(&self) -> bool {
        (**self).is_homed()
    }
    fn is_estopped(&self) -> bool {
        (**self).is_estopped()
    }
    fn set_e_stop(&mut self, engaged: bool) -> Result<(), DeviceError> {
        (**self).set_e_stop(engaged)
    }
    fn get_position(&self, actual: bool) -> i64 {
        (**self).get_position(actual)
    }
    fn get_velocity(&self) -> f64 {
        (**self).get_velocity()
    }
    fn set_velocity(&mut self, rpm: f64) -> Result<(), DeviceError> {
        (**self).set_velocity(rpm)
    }
    fn get_acceleration(&self) -> f64 {
        (**self).get_acceleration()
    }
    fn set_acceleration(&mut self, rpm_per_s: f64) -> Result<(), DeviceError> {
        (**self).set_acceleration(rpm_per_s)
    }
    fn move_position(&mut self, counts: i64, absolute: bool, add_dwell: bool) -> Result<(), DeviceError> {
        (**self).move_position(counts, absolute, add_dwell)
    }
    fn move_velocity(&mut self, rpm: f64) -> Result<(), DeviceError> {
        (**self).move_velocity(rpm)
    }
    fn stop(&mut self) -> Result<(), DeviceError> {
        (**self).stop()
    }
    fn run_homing_routine(&mut self, timeout: Duration) -> bool {
        (**self).run_homing_routine(timeout)
    }
    fn is_moving(&self) -> bool {
        (**self).is_moving()
    }
    fn status(&self) -> DeviceStatus {
        (**self).status()
    }
}
