//! Error types for the cable axis.
//!
//! - [`MotionRejection`] — why a motion command was not issued. Local to the
//!   controller; never unwinds past it.
//! - [`DeviceError`] — failures reported by a `MotorDevice` implementation.
//! - [`AxisConfigError`] — configuration validation failures.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Blocking sequence that can time out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sequence {
    /// Device homing routine.
    Homing,
    /// Retraction to the hard stop followed by disable.
    Shutdown,
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Homing => f.write_str("homing"),
            Self::Shutdown => f.write_str("shutdown"),
        }
    }
}

/// Error types for motor device operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// Link to the drive failed.
    #[error("Device communication error: {0}")]
    Communication(String),

    /// Drive refused the command (fault, interlock, invalid argument).
    #[error("Device rejected command: {0}")]
    Rejected(String),

    /// Operation not available on this device.
    #[error("Operation not supported by device: {0}")]
    NotSupported(&'static str),
}

/// Reason a motion command was rejected.
///
/// The three gate reasons are always checked in the fixed priority
/// `EStopped > NotHomed > NotEnabled`, so the most safety-critical reason
/// is the one reported.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MotionRejection {
    /// E-stop latched on the controller or reported by the device.
    #[error("axis is e-stopped")]
    EStopped,

    /// Device has not completed homing.
    #[error("axis is not homed")]
    NotHomed,

    /// Device is homed but not enabled.
    #[error("axis is not enabled")]
    NotEnabled,

    /// Requested target fails the bounds policy. No command was issued.
    #[error("target {target:.3} mm outside bounds [{min:.3}, {max:.3}]")]
    OutOfBounds {
        /// Requested target (absolute, or the relative offset) [mm].
        target: f64,
        /// Upper soft limit [mm].
        min: f64,
        /// Lower soft limit [mm].
        max: f64,
    },

    /// Requested move kind is not supported.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// Blocking sequence did not complete in time.
    #[error("{sequence} timed out after {after:?}")]
    Timeout {
        /// Sequence that timed out.
        sequence: Sequence,
        /// Configured timeout.
        after: Duration,
    },

    /// Axis geometry has not been configured; no unit conversion available.
    #[error("axis geometry not configured")]
    NotConfigured,

    /// Device refused or failed the command.
    #[error(transparent)]
    Device(#[from] DeviceError),
}

impl MotionRejection {
    /// Whether this is one of the triple-gate reasons.
    #[inline]
    pub const fn is_gate(&self) -> bool {
        matches!(self, Self::EStopped | Self::NotHomed | Self::NotEnabled)
    }

    /// Whether recovery requires re-homing (or configuration) rather than
    /// simply retrying the command.
    #[inline]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NotHomed
                | Self::NotConfigured
                | Self::Timeout {
                    sequence: Sequence::Homing,
                    ..
                }
        )
    }
}

/// Configuration validation failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AxisConfigError {
    /// Axis name is empty.
    #[error("axis name cannot be empty")]
    EmptyName,

    /// Parameter must be strictly positive and finite.
    #[error("{field} must be positive, got {value}")]
    NotPositive {
        /// Offending field.
        field: &'static str,
        /// Offending value.
        value: f64,
    },

    /// Parameter must be non-negative and finite.
    #[error("{field} must be non-negative, got {value}")]
    Negative {
        /// Offending field.
        field: &'static str,
        /// Offending value.
        value: f64,
    },

    /// `bounds_min > bounds_max` or a bound is not finite.
    #[error("bounds_min {min} exceeds bounds_max {max}")]
    InvertedBounds {
        /// Upper soft limit.
        min: f64,
        /// Lower soft limit.
        max: f64,
    },

    /// Shutdown target must lie beyond the lower soft limit.
    #[error("shutdown position {position} must lie beyond bounds_max {bounds_max}")]
    ShutdownInsideBounds {
        /// Configured shutdown position.
        position: f64,
        /// Lower soft limit.
        bounds_max: f64,
    },

    /// Torque window inverted or outside ±100 %.
    #[error("torque limits [{min}, {max}] invalid")]
    InvalidTorque {
        /// Lower torque limit.
        min: f64,
        /// Upper torque limit.
        max: f64,
    },

    /// Installed cable does not fit on the drum.
    #[error("cable length {length} mm exceeds drum capacity {capacity:.1} mm")]
    CableTooLong {
        /// Installed cable length.
        length: f64,
        /// Spoolable length.
        capacity: f64,
    },

    /// Geometry is fixed once configured.
    #[error("axis already configured")]
    AlreadyConfigured,
}
