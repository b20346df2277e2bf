//! Prelude module for common re-exports.
//!
//! ```rust
//! use cable_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};

pub use crate::axis::config::{
    AxisConfig, AxisGeometry, GrooveDirection, JoggingParameters, MotionParameters,
    RampParameters, ShutdownParameters, TorqueLimits,
};

// ─── State & Errors ─────────────────────────────────────────────────
pub use crate::axis::error::{AxisConfigError, DeviceError, MotionRejection, Sequence};
pub use crate::axis::snapshot::AxisSnapshot;
pub use crate::axis::state::{MoveType, RobotState, Severity, StatusColor};

// ─── Device & Time ──────────────────────────────────────────────────
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::device::{DeviceStatus, MotorDevice};

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::MAX_AXES;
