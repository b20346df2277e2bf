//! State enums for a cable axis.
//!
//! All enums use `#[repr(u8)]` for a compact layout when published to a
//! presentation layer.

use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;

// ─── Robot State ────────────────────────────────────────────────────

/// Operational state of one axis.
///
/// `EStop` and `NotHomed` take priority over `Enabled`/`Disabled` whenever
/// the state is evaluated: an e-stopped, unhomed device is `EStop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RobotState {
    /// Position reference unknown; homing required.
    NotHomed = 0,
    /// Homing routine in progress.
    Homing = 1,
    /// Homed and enabled; motion allowed.
    Enabled = 2,
    /// Homed but disabled.
    Disabled = 3,
    /// Latched safety interlock.
    EStop = 4,
}

const_assert_eq!(core::mem::size_of::<RobotState>(), 1);

impl RobotState {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::NotHomed),
            1 => Some(Self::Homing),
            2 => Some(Self::Enabled),
            3 => Some(Self::Disabled),
            4 => Some(Self::EStop),
            _ => None,
        }
    }

    /// Display string for status panels.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotHomed => "NOT HOMED",
            Self::Homing => "HOMING",
            Self::Enabled => "ENABLED",
            Self::Disabled => "DISABLED",
            Self::EStop => "E-STOP",
        }
    }

    /// Severity of this state for status reporting.
    #[inline]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::EStop => Severity::Critical,
            Self::NotHomed => Severity::Warning,
            Self::Homing | Self::Disabled => Severity::Info,
            Self::Enabled => Severity::Ok,
        }
    }

    /// Colour hint for the presentation layer.
    #[inline]
    pub const fn color(&self) -> StatusColor {
        match self {
            Self::EStop => StatusColor::Red,
            Self::NotHomed => StatusColor::Orange,
            Self::Homing => StatusColor::Yellow,
            Self::Disabled => StatusColor::Grey,
            Self::Enabled => StatusColor::Green,
        }
    }

    /// Whether motion commands can be accepted in this state.
    #[inline]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Enabled)
    }
}

impl Default for RobotState {
    fn default() -> Self {
        Self::NotHomed
    }
}

impl std::fmt::Display for RobotState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Severity / Status ──────────────────────────────────────────────

/// Status severity, ordered from benign to safety-critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Severity {
    Ok = 0,
    Info = 1,
    Warning = 2,
    Critical = 3,
}

impl Severity {
    /// Status text reported for this severity.
    #[inline]
    pub const fn status_text(&self) -> &'static str {
        match self {
            Self::Ok => "ready",
            Self::Info => "standby",
            Self::Warning => "attention required",
            Self::Critical => "halted",
        }
    }

    /// Whether the operator must act (re-home or clear e-stop) before motion.
    #[inline]
    pub const fn requires_operator(&self) -> bool {
        matches!(self, Self::Warning | Self::Critical)
    }
}

/// Border/status colour hint consumed by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum StatusColor {
    Green = 0,
    Grey = 1,
    Yellow = 2,
    Orange = 3,
    Red = 4,
}

// ─── Move Type ──────────────────────────────────────────────────────

/// Per-tick motion behaviour selector.
///
/// Switching to `Position` always cancels any in-flight velocity ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MoveType {
    /// Trapezoidal position moves issued once.
    Position = 0,
    /// Velocity commands reissued every tick toward a target.
    Velocity = 1,
}

const_assert_eq!(core::mem::size_of::<MoveType>(), 1);

impl MoveType {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Position),
            1 => Some(Self::Velocity),
            _ => None,
        }
    }
}

impl Default for MoveType {
    fn default() -> Self {
        Self::Position
    }
}
