//! Read-only axis snapshot for presentation layers.

use serde::Serialize;

use super::state::{MoveType, RobotState, StatusColor};

/// Plain-value view of one axis, produced by the controller on demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisSnapshot {
    /// Axis name.
    pub name: String,
    /// Current operational state.
    pub state: RobotState,
    /// Status text (`RobotState::as_str`).
    pub status: &'static str,
    /// Colour hint.
    pub color: StatusColor,
    /// Cached actual position [mm].
    pub position_mm: f64,
    /// Cached actual position [counts].
    pub position_counts: i64,
    /// Configured velocity limit [RPM].
    pub vel_limit: f64,
    /// Configured acceleration limit [RPM/s].
    pub accel_limit: f64,
    /// Active move type.
    pub move_type: MoveType,
    /// Current velocity ramp magnitude [RPM].
    pub target_velocity: f64,
}
