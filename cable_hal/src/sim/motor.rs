//! Simulated drum motor implementing [`MotorDevice`].
//!
//! The kinematics are integrated lazily: every call first advances the drum
//! to `clock.now()`. Sharing a `ManualClock` with the controller therefore
//! keeps the drum in lock-step with virtual time, and a `SystemClock` gives
//! real-time behaviour without a background thread.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use cable_common::axis::error::DeviceError;
use cable_common::clock::Clock;
use cable_common::device::{DeviceStatus, MotorDevice};
use tracing::{debug, info, warn};

use super::physics::{DrumPhysics, PlannedMove, rpm_to_rate};
use crate::config::SimulationParameters;

/// Poll interval of the blocking homing routine.
pub const HOMING_POLL: Duration = Duration::from_millis(10);

/// Velocity limit before the controller pushes its own [RPM].
pub const DEFAULT_VELOCITY_RPM: f64 = 60.0;

/// Acceleration limit before the controller pushes its own [RPM/s].
pub const DEFAULT_ACCELERATION_RPM_S: f64 = 600.0;

struct MotorState {
    drum: DrumPhysics,
    last_sync: Duration,
    enabled: bool,
    homed: bool,
    homing: bool,
    estopped: bool,
    vel_limit: f64,
    accel_limit: f64,
}

impl MotorState {
    fn advance_to(&mut self, now: Duration) {
        let dt = now.saturating_sub(self.last_sync);
        self.drum.advance(dt);
        self.last_sync = now;
    }

    fn check_ready(&self) -> Result<(), DeviceError> {
        if self.estopped {
            return Err(DeviceError::Rejected("e-stop engaged".to_string()));
        }
        if !self.enabled {
            return Err(DeviceError::Rejected("drive disabled".to_string()));
        }
        Ok(())
    }
}

fn positive_limit(name: &str, value: f64) -> Result<f64, DeviceError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(DeviceError::Rejected(format!("{name} must be positive, got {value}")))
    }
}

/// Physics-backed motor with a move queue, velocity mode, hard-stop homing
/// and an e-stop latch.
pub struct SimulatedMotor {
    name: String,
    clock: Arc<dyn Clock>,
    counts_per_rev: f64,
    homing_rpm: f64,
    dwell: Duration,
    state: Mutex<MotorState>,
}

impl SimulatedMotor {
    pub fn new(name: impl Into<String>, counts_per_rev: u32, params: &SimulationParameters, clock: Arc<dyn Clock>) -> Self {
        let counts_per_rev = f64::from(counts_per_rev);
        let drum = DrumPhysics::new(
            params.start_position,
            params.hard_stop_position,
            rpm_to_rate(DEFAULT_ACCELERATION_RPM_S, counts_per_rev),
        );
        let state = MotorState {
            drum,
            last_sync: clock.now(),
            enabled: false,
            homed: false,
            homing: false,
            estopped: false,
            vel_limit: DEFAULT_VELOCITY_RPM,
            accel_limit: DEFAULT_ACCELERATION_RPM_S,
        };
        Self {
            name: name.into(),
            clock,
            counts_per_rev,
            homing_rpm: params.homing_rpm,
            dwell: params.dwell(),
            state: Mutex::new(state),
        }
    }

    /// Lock the state after integrating up to the current time.
    fn sync(&self) -> MutexGuard<'_, MotorState> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.advance_to(self.clock.now());
        state
    }

    #[inline]
    fn rate(&self, rpm: f64) -> f64 {
        rpm_to_rate(rpm, self.counts_per_rev)
    }

    /// Actual drum velocity [RPM].
    pub fn actual_rpm(&self) -> f64 {
        self.sync().drum.velocity() * 60.0 / self.counts_per_rev
    }

    /// Number of queued position moves, including the active one.
    pub fn queued_moves(&self) -> usize {
        self.sync().drum.queued()
    }
}

impl MotorDevice for SimulatedMotor {
    fn name(&self) -> &str {
        &self.name
    }

    fn enable(&mut self) -> Result<(), DeviceError> {
        let mut state = self.sync();
        if state.estopped {
            return Err(DeviceError::Rejected("e-stop engaged".to_string()));
        }
        state.enabled = true;
        debug!(device = %self.name, "drive enabled");
        Ok(())
    }

    fn disable(&mut self) -> Result<(), DeviceError> {
        let mut state = self.sync();
        state.enabled = false;
        state.drum.stop();
        debug!(device = %self.name, "drive disabled");
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.sync().enabled
    }

    fn is_homed(&self) -> bool {
        self.sync().homed
    }

    fn is_estopped(&self) -> bool {
        self.sync().estopped
    }

    fn set_e_stop(&mut self, engaged: bool) -> Result<(), DeviceError> {
        let mut state = self.sync();
        if engaged {
            state.drum.halt();
            warn!(device = %self.name, "e-stop engaged");
        } else if state.estopped {
            info!(device = %self.name, "e-stop released");
        }
        state.estopped = engaged;
        Ok(())
    }

    fn get_position(&self, actual: bool) -> i64 {
        let state = self.sync();
        let counts = if actual {
            state.drum.position()
        } else {
            state.drum.commanded_position()
        };
        counts.round() as i64
    }

    fn get_velocity(&self) -> f64 {
        self.sync().vel_limit
    }

    fn set_velocity(&mut self, rpm: f64) -> Result<(), DeviceError> {
        let rpm = positive_limit("velocity", rpm)?;
        self.sync().vel_limit = rpm;
        Ok(())
    }

    fn get_acceleration(&self) -> f64 {
        self.sync().accel_limit
    }

    fn set_acceleration(&mut self, rpm_per_s: f64) -> Result<(), DeviceError> {
        let rpm_per_s = positive_limit("acceleration", rpm_per_s)?;
        let rate = self.rate(rpm_per_s);
        let mut state = self.sync();
        state.accel_limit = rpm_per_s;
        state.drum.set_accel_limit(rate);
        Ok(())
    }

    fn move_position(&mut self, counts: i64, absolute: bool, add_dwell: bool) -> Result<(), DeviceError> {
        let mut state = self.sync();
        state.check_ready()?;
        let base = if absolute { 0.0 } else { state.drum.commanded_position() };
        let planned = PlannedMove {
            target: base + counts as f64,
            velocity: self.rate(state.vel_limit),
            acceleration: self.rate(state.accel_limit),
            dwell: if add_dwell { self.dwell } else { Duration::ZERO },
        };
        debug!(device = %self.name, target = planned.target, absolute, "move queued");
        state.drum.enqueue(planned);
        Ok(())
    }

    fn move_velocity(&mut self, rpm: f64) -> Result<(), DeviceError> {
        if !rpm.is_finite() {
            return Err(DeviceError::Rejected(format!("velocity must be finite, got {rpm}")));
        }
        let mut state = self.sync();
        state.check_ready()?;
        state.drum.run_velocity(self.rate(rpm));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        self.sync().drum.stop();
        Ok(())
    }

    fn run_homing_routine(&mut self, timeout: Duration) -> bool {
        let start = self.clock.now();
        {
            let mut state = self.sync();
            if let Err(e) = state.check_ready() {
                warn!(device = %self.name, error = %e, "homing refused");
                return false;
            }
            state.homed = false;
            state.homing = true;
            let rate = state.drum.stop_side() * self.rate(self.homing_rpm);
            state.drum.run_velocity(rate);
        }
        debug!(device = %self.name, rpm = self.homing_rpm, "searching hard stop");

        loop {
            {
                let mut state = self.sync();
                if state.estopped {
                    state.homing = false;
                    return false;
                }
                if state.drum.at_hard_stop() {
                    state.drum.halt();
                    state.homing = false;
                    state.homed = true;
                    info!(device = %self.name, position = state.drum.position(), "hard stop reached");
                    return true;
                }
                if self.clock.now().saturating_sub(start) >= timeout {
                    state.drum.stop();
                    state.homing = false;
                    warn!(device = %self.name, ?timeout, "hard stop not reached");
                    return false;
                }
            }
            self.clock.sleep(HOMING_POLL);
        }
    }

    fn is_moving(&self) -> bool {
        self.sync().drum.is_moving()
    }

    fn status(&self) -> DeviceStatus {
        let state = self.sync();
        let mut status = DeviceStatus::empty();
        status.set(DeviceStatus::HOMED, state.homed);
        status.set(DeviceStatus::ENABLED, state.enabled);
        status.set(DeviceStatus::ESTOPPED, state.estopped);
        status.set(DeviceStatus::MOVING, state.drum.is_moving());
        status.set(DeviceStatus::HOMING, state.homing);
        status
    }
}
