//! Control-unit error types.
//!
//! Motion commands report [`MotionRejection`](cable_common::axis::error::MotionRejection)
//! directly. The types here cover setup and parameter changes, which can fail
//! either validation or the device call that applies them, and axis group
//! management.

use cable_common::axis::error::{AxisConfigError, DeviceError};
use thiserror::Error;

/// Failure applying configuration or parameters to an axis.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    /// Parameters failed validation; nothing was applied.
    #[error(transparent)]
    Config(#[from] AxisConfigError),

    /// Validation passed but the device refused the new limits.
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Axis group management errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupError {
    /// Group already holds the maximum number of axes.
    #[error("axis group full ({capacity} axes)")]
    Full {
        /// Fixed group capacity.
        capacity: usize,
    },

    /// An axis with the same name is already registered.
    #[error("duplicate axis name: {0}")]
    DuplicateName(String),

    /// Polling loop period must be non-zero.
    #[error("polling period must be non-zero")]
    ZeroPeriod,
}
