//! Simulator configuration (`cable_sim --config <file>`).
//!
//! # TOML Example
//!
//! ```toml
//! [shared]
//! service_name = "cable-sim-01"
//! log_level = "info"
//!
//! [axis]
//! name = "winch-a"
//! # [axis.geometry], [axis.motion], [axis.jogging], [axis.shutdown] ...
//!
//! [simulation]
//! start_position = 2546
//! hard_stop_position = 9702
//! homing_rpm = 60.0
//!
//! [control]
//! approach_target_mm = 1000.0
//! ```

use std::time::Duration;

use cable_common::axis::config::AxisConfig;
use cable_common::config::{ConfigError, SharedConfig};
use cable_common::consts::{HOMING_TIMEOUT_S_DEFAULT, SHUTDOWN_TIMEOUT_S_DEFAULT, TICK_PERIOD_DEFAULT};
use serde::{Deserialize, Serialize};

fn default_homing_rpm() -> f64 {
    60.0
}

fn default_dwell_ms() -> u64 {
    50
}

fn default_tick_ms() -> u64 {
    TICK_PERIOD_DEFAULT.as_millis() as u64
}

fn default_approach_tolerance_mm() -> f64 {
    1.0
}

fn default_approach_timeout_s() -> f64 {
    30.0
}

fn default_homing_timeout_s() -> f64 {
    HOMING_TIMEOUT_S_DEFAULT
}

fn default_shutdown_timeout_s() -> f64 {
    SHUTDOWN_TIMEOUT_S_DEFAULT
}

/// Seconds → `Duration`; non-finite or negative values map to zero.
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

/// Simulated drum hardware. Positions are raw encoder counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// Encoder reading at power-up [counts].
    pub start_position: i64,
    /// Mechanical stop found by the homing routine [counts].
    pub hard_stop_position: i64,
    /// Homing search speed toward the hard stop [RPM].
    #[serde(default = "default_homing_rpm")]
    pub homing_rpm: f64,
    /// Hold time applied to moves issued with `add_dwell` [ms].
    #[serde(default = "default_dwell_ms")]
    pub dwell_ms: u64,
}

impl SimulationParameters {
    #[inline]
    pub fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.homing_rpm.is_finite() && self.homing_rpm > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "simulation.homing_rpm must be positive, got {}",
                self.homing_rpm
            )));
        }
        Ok(())
    }
}

/// Scenario driven by the simulator binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlParameters {
    /// Control tick period [ms].
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Velocity-approach target [mm].
    pub approach_target_mm: f64,
    /// Distance at which the approach counts as arrived [mm].
    #[serde(default = "default_approach_tolerance_mm")]
    pub approach_tolerance_mm: f64,
    #[serde(default = "default_approach_timeout_s")]
    pub approach_timeout_s: f64,
    #[serde(default = "default_homing_timeout_s")]
    pub homing_timeout_s: f64,
    #[serde(default = "default_shutdown_timeout_s")]
    pub shutdown_timeout_s: f64,
}

impl ControlParameters {
    #[inline]
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    #[inline]
    pub fn approach_timeout(&self) -> Duration {
        seconds(self.approach_timeout_s)
    }

    #[inline]
    pub fn homing_timeout(&self) -> Duration {
        seconds(self.homing_timeout_s)
    }

    #[inline]
    pub fn shutdown_timeout(&self) -> Duration {
        seconds(self.shutdown_timeout_s)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 {
            return Err(ConfigError::ValidationError("control.tick_ms must be > 0".to_string()));
        }
        for (field, value) in [
            ("approach_tolerance_mm", self.approach_tolerance_mm),
            ("approach_timeout_s", self.approach_timeout_s),
            ("homing_timeout_s", self.homing_timeout_s),
            ("shutdown_timeout_s", self.shutdown_timeout_s),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::ValidationError(format!(
                    "control.{field} must be positive, got {value}"
                )));
            }
        }
        if !self.approach_target_mm.is_finite() {
            return Err(ConfigError::ValidationError(
                "control.approach_target_mm must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete simulator configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub shared: SharedConfig,
    pub axis: AxisConfig,
    pub simulation: SimulationParameters,
    pub control: ControlParameters,
}

impl SimConfig {
    /// Validate every section plus the cross-section constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.axis
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("axis '{}': {e}", self.axis.name)))?;
        self.simulation.validate()?;
        self.control.validate()?;

        let motion = &self.axis.motion;
        let target = self.control.approach_target_mm;
        if target < motion.bounds_min || target > motion.bounds_max {
            return Err(ConfigError::ValidationError(format!(
                "control.approach_target_mm {target} outside bounds [{}, {}]",
                motion.bounds_min, motion.bounds_max
            )));
        }
        Ok(())
    }
}
