//! Configuration structures for a single cable axis.
//!
//! All config types use `serde::Deserialize` for TOML loading.
//! Optional fields use `#[serde(default)]` with defaults from [`crate::consts`].
//! Every struct carries a `validate()` returning [`AxisConfigError`].
//!
//! Units: linear quantities in mm, velocities in RPM, accelerations in RPM/s.

use std::f64::consts::PI;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::{
    ARRIVAL_RADIUS_MM_DEFAULT, ARRIVAL_TOLERANCE_MM_DEFAULT, POLL_INTERVAL_MS_DEFAULT,
    RAMP_ACCEL_STEP_RPM_DEFAULT, SHUTDOWN_SETTLE_DELAY_MS_DEFAULT, SHUTDOWN_TOLERANCE_MM_DEFAULT,
    TORQUE_PERCENT_MAX, TORQUE_PERCENT_MIN,
};

use super::error::AxisConfigError;

// ─── Drum Geometry ──────────────────────────────────────────────────

/// Winding direction of the cable groove on the drum.
///
/// `LeftHanded` drums operate in negative rotation space: paying cable out
/// (moving the carriage down) turns the motor in the negative direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum GrooveDirection {
    /// Smooth drum, no helical groove.
    None = 0,
    /// Left-handed helical groove.
    LeftHanded = 1,
    /// Right-handed helical groove.
    RightHanded = 2,
}

impl GrooveDirection {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::LeftHanded),
            2 => Some(Self::RightHanded),
            _ => None,
        }
    }

    /// Sign applied to every motor count/velocity derived from a linear move.
    #[inline]
    pub const fn rotation_sign(&self) -> f64 {
        match self {
            Self::LeftHanded => -1.0,
            Self::None | Self::RightHanded => 1.0,
        }
    }

    /// Whether the drum has a helical groove (adds pitch to the cable path).
    #[inline]
    pub const fn is_grooved(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl Default for GrooveDirection {
    fn default() -> Self {
        Self::None
    }
}

/// Physical geometry of one axis: where the cable leaves the frame and how
/// the drum converts rotation into cable travel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisGeometry {
    /// Cable exit point in the rig frame [mm].
    #[serde(default)]
    pub mount_position: [f64; 3],

    /// Groove handedness of the drum.
    #[serde(default)]
    pub groove: GrooveDirection,

    /// Drum core diameter [mm].
    pub drum_diameter: f64,

    /// Cable diameter [mm]. Also the groove pitch on grooved drums.
    #[serde(default)]
    pub cable_diameter: f64,

    /// Installed cable length [mm].
    pub cable_length: f64,

    /// Number of groove turns available on the drum.
    pub drum_turns: f64,

    /// Encoder resolution [counts per drum revolution].
    pub counts_per_rev: u32,
}

impl AxisGeometry {
    /// Axial advance of the cable per revolution [mm].
    #[inline]
    pub fn groove_pitch(&self) -> f64 {
        if self.groove.is_grooved() {
            self.cable_diameter
        } else {
            0.0
        }
    }

    /// Cable path length per drum revolution [mm].
    ///
    /// Measured on the cable centreline, including the helical pitch.
    pub fn circumference(&self) -> f64 {
        let effective_diameter = self.drum_diameter + self.cable_diameter;
        (PI * effective_diameter).hypot(self.groove_pitch())
    }

    /// Longest cable the drum can spool [mm].
    pub fn max_cable_length(&self) -> f64 {
        self.circumference() * self.drum_turns
    }

    /// Linear travel per encoder count [mm].
    pub fn mm_per_count(&self) -> f64 {
        self.circumference() / f64::from(self.counts_per_rev)
    }

    /// Validate geometry. A valid geometry always yields `mm_per_count() > 0`.
    pub fn validate(&self) -> Result<(), AxisConfigError> {
        positive("drum_diameter", self.drum_diameter)?;
        non_negative("cable_diameter", self.cable_diameter)?;
        non_negative("cable_length", self.cable_length)?;
        positive("drum_turns", self.drum_turns)?;
        if self.counts_per_rev == 0 {
            return Err(AxisConfigError::NotPositive {
                field: "counts_per_rev",
                value: 0.0,
            });
        }
        let capacity = self.max_cable_length();
        if self.cable_length > capacity {
            return Err(AxisConfigError::CableTooLong {
                length: self.cable_length,
                capacity,
            });
        }
        Ok(())
    }
}

// ─── Motion Limits ──────────────────────────────────────────────────

/// Velocity/acceleration limits and soft travel bounds.
///
/// This is the persistence contract: an external loader/saver reads and
/// writes these four values through the controller accessors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionParameters {
    /// Velocity limit [RPM].
    pub vel_limit: f64,
    /// Acceleration limit [RPM/s].
    pub accel_limit: f64,
    /// Upper soft limit, absolute linear travel [mm].
    pub bounds_min: f64,
    /// Lower soft limit, absolute linear travel [mm].
    pub bounds_max: f64,
}

impl MotionParameters {
    pub fn validate(&self) -> Result<(), AxisConfigError> {
        positive("vel_limit", self.vel_limit)?;
        positive("accel_limit", self.accel_limit)?;
        validate_bounds(self.bounds_min, self.bounds_max)
    }
}

/// Operator jog settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JoggingParameters {
    /// Jog velocity [RPM].
    pub jog_vel: f64,
    /// Jog acceleration [RPM/s].
    pub jog_accel: f64,
    /// Distance travelled per jog [mm].
    pub jog_dist: f64,
}

impl JoggingParameters {
    pub fn validate(&self) -> Result<(), AxisConfigError> {
        positive("jog_vel", self.jog_vel)?;
        positive("jog_accel", self.jog_accel)?;
        positive("jog_dist", self.jog_dist)
    }
}

/// Motor torque window [% of rated torque].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TorqueLimits {
    pub min: f64,
    pub max: f64,
}

impl TorqueLimits {
    pub fn validate(&self) -> Result<(), AxisConfigError> {
        let in_range = |v: f64| (TORQUE_PERCENT_MIN..=TORQUE_PERCENT_MAX).contains(&v);
        if !in_range(self.min) || !in_range(self.max) || self.min > self.max {
            return Err(AxisConfigError::InvalidTorque {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

impl Default for TorqueLimits {
    fn default() -> Self {
        Self {
            min: TORQUE_PERCENT_MIN,
            max: TORQUE_PERCENT_MAX,
        }
    }
}

// ─── Shutdown ───────────────────────────────────────────────────────

/// Parameters of the retraction-to-hard-stop shutdown sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShutdownParameters {
    /// Final carriage position, beyond `bounds_max` at the hard stop [mm].
    pub position: f64,

    /// Velocity for the leg down to `bounds_max` [RPM].
    pub approach_vel: f64,
    /// Acceleration for the leg down to `bounds_max` [RPM/s].
    pub approach_accel: f64,

    /// Velocity for the leg past `bounds_max` to the hard stop [RPM].
    pub final_vel: f64,
    /// Acceleration for the leg past `bounds_max` [RPM/s].
    pub final_accel: f64,

    /// Convergence window around `position` [mm].
    #[serde(default = "default_shutdown_tolerance")]
    pub tolerance_mm: f64,

    /// Delay between convergence and motor disable [ms].
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Position poll interval while waiting for convergence [ms].
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_shutdown_tolerance() -> f64 {
    SHUTDOWN_TOLERANCE_MM_DEFAULT
}
fn default_settle_delay_ms() -> u64 {
    SHUTDOWN_SETTLE_DELAY_MS_DEFAULT
}
fn default_poll_interval_ms() -> u64 {
    POLL_INTERVAL_MS_DEFAULT
}

impl ShutdownParameters {
    #[inline]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn validate(&self) -> Result<(), AxisConfigError> {
        positive("shutdown.approach_vel", self.approach_vel)?;
        positive("shutdown.approach_accel", self.approach_accel)?;
        positive("shutdown.final_vel", self.final_vel)?;
        positive("shutdown.final_accel", self.final_accel)?;
        positive("shutdown.tolerance_mm", self.tolerance_mm)
    }
}

// ─── Velocity Ramp ──────────────────────────────────────────────────

/// Per-tick velocity ramp shaping for streamed velocity moves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RampParameters {
    /// Ramp increment per control tick [RPM].
    #[serde(default = "default_accel_step")]
    pub accel_step_rpm: f64,

    /// Distance from the target inside which the ramp decelerates [mm].
    #[serde(default = "default_arrival_radius")]
    pub arrival_radius_mm: f64,

    /// Once decelerating, a velocity move within this distance of its
    /// target is stopped and the axis returns to position mode [mm].
    #[serde(default = "default_arrival_tolerance")]
    pub arrival_tolerance_mm: f64,
}

fn default_accel_step() -> f64 {
    RAMP_ACCEL_STEP_RPM_DEFAULT
}
fn default_arrival_radius() -> f64 {
    ARRIVAL_RADIUS_MM_DEFAULT
}
fn default_arrival_tolerance() -> f64 {
    ARRIVAL_TOLERANCE_MM_DEFAULT
}

impl RampParameters {
    pub fn validate(&self) -> Result<(), AxisConfigError> {
        positive("ramp.accel_step_rpm", self.accel_step_rpm)?;
        positive("ramp.arrival_radius_mm", self.arrival_radius_mm)?;
        positive("ramp.arrival_tolerance_mm", self.arrival_tolerance_mm)
    }
}

impl Default for RampParameters {
    fn default() -> Self {
        Self {
            accel_step_rpm: RAMP_ACCEL_STEP_RPM_DEFAULT,
            arrival_radius_mm: ARRIVAL_RADIUS_MM_DEFAULT,
            arrival_tolerance_mm: ARRIVAL_TOLERANCE_MM_DEFAULT,
        }
    }
}

// ─── Axis Config ────────────────────────────────────────────────────

/// Complete configuration of one cable axis.
///
/// # TOML Example
///
/// ```toml
/// [axis]
/// name = "winch-a"
///
/// [axis.geometry]
/// groove = "left_handed"
/// drum_diameter = 50.0
/// cable_diameter = 1.5
/// cable_length = 3000.0
/// drum_turns = 25.0
/// counts_per_rev = 800
///
/// [axis.motion]
/// vel_limit = 300.0
/// accel_limit = 600.0
/// bounds_min = 100.0
/// bounds_max = 1800.0
///
/// [axis.jogging]
/// jog_vel = 60.0
/// jog_accel = 200.0
/// jog_dist = 50.0
///
/// [axis.shutdown]
/// position = 1900.0
/// approach_vel = 100.0
/// approach_accel = 200.0
/// final_vel = 20.0
/// final_accel = 100.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    /// Axis name used in logs and snapshots.
    pub name: String,
    pub geometry: AxisGeometry,
    pub motion: MotionParameters,
    pub jogging: JoggingParameters,
    #[serde(default)]
    pub torque: TorqueLimits,
    pub shutdown: ShutdownParameters,
    #[serde(default)]
    pub ramp: RampParameters,
}

impl AxisConfig {
    /// Validate all sections plus cross-section constraints.
    pub fn validate(&self) -> Result<(), AxisConfigError> {
        self.geometry.validate()?;
        self.validate_limits()
    }

    /// Everything except the drum geometry, which is applied separately
    /// when the axis is configured.
    pub fn validate_limits(&self) -> Result<(), AxisConfigError> {
        if self.name.is_empty() {
            return Err(AxisConfigError::EmptyName);
        }
        self.motion.validate()?;
        self.jogging.validate()?;
        self.torque.validate()?;
        self.shutdown.validate()?;
        self.ramp.validate()?;
        validate_shutdown_position(self.shutdown.position, self.motion.bounds_max)
    }
}

// ─── Validation Helpers ─────────────────────────────────────────────

/// Soft bounds must be finite and ordered (`bounds_min <= bounds_max`).
pub fn validate_bounds(bounds_min: f64, bounds_max: f64) -> Result<(), AxisConfigError> {
    if !bounds_min.is_finite() || !bounds_max.is_finite() || bounds_min > bounds_max {
        return Err(AxisConfigError::InvertedBounds {
            min: bounds_min,
            max: bounds_max,
        });
    }
    Ok(())
}

/// The shutdown position lies past the lower soft limit, at the hard stop.
pub fn validate_shutdown_position(position: f64, bounds_max: f64) -> Result<(), AxisConfigError> {
    if !position.is_finite() || position <= bounds_max {
        return Err(AxisConfigError::ShutdownInsideBounds {
            position,
            bounds_max,
        });
    }
    Ok(())
}

fn positive(field: &'static str, value: f64) -> Result<(), AxisConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(AxisConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), AxisConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(AxisConfigError::Negative { field, value })
    }
}
