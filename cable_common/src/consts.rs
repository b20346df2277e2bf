//! Default parameter values shared across the workspace.
//!
//! Every constant here backs a `#[serde(default = ...)]` field in
//! [`crate::axis::config`], so a value can be overridden per axis from TOML.

use std::time::Duration;

/// Maximum number of axes driven by one `AxisGroup`.
pub const MAX_AXES: usize = 8;

/// Distance from the target inside which velocity moves decelerate [mm].
pub const ARRIVAL_RADIUS_MM_DEFAULT: f64 = 50.0;

/// Distance from the target at which a streamed velocity move is finished [mm].
pub const ARRIVAL_TOLERANCE_MM_DEFAULT: f64 = 0.5;

/// Velocity ramp increment applied once per control tick [RPM].
pub const RAMP_ACCEL_STEP_RPM_DEFAULT: f64 = 1.0;

/// Position window for declaring shutdown convergence [mm].
pub const SHUTDOWN_TOLERANCE_MM_DEFAULT: f64 = 1.0;

/// Delay between shutdown convergence and motor disable [ms].
pub const SHUTDOWN_SETTLE_DELAY_MS_DEFAULT: u64 = 1500;

/// Interval between position polls in blocking sequences [ms].
pub const POLL_INTERVAL_MS_DEFAULT: u64 = 10;

/// Default shutdown timeout [s].
pub const SHUTDOWN_TIMEOUT_S_DEFAULT: f64 = 20.0;

/// Default homing timeout [s].
pub const HOMING_TIMEOUT_S_DEFAULT: f64 = 30.0;

/// Default control tick period.
pub const TICK_PERIOD_DEFAULT: Duration = Duration::from_millis(10);

/// Torque limit range accepted by `TorqueLimits::validate` [%].
pub const TORQUE_PERCENT_MIN: f64 = -100.0;
/// Torque limit range accepted by `TorqueLimits::validate` [%].
pub const TORQUE_PERCENT_MAX: f64 = 100.0;
