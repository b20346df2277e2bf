//! Drum kinematics.
//!
//! All quantities are in motor units: position in counts, velocity in
//! counts/s, acceleration in counts/s². Time advances in fixed
//! [`SIM_STEP`] increments, so the result of `advance()` does not depend on
//! how often the owner polls.
//!
//! The drum runs in one of four modes:
//! - `Idle`: standing still
//! - `Stopping`: decelerating at the acceleration limit
//! - `Position`: executing the front of the move queue
//! - `Velocity`: tracking a signed target velocity
//!
//! A mechanical hard stop bounds travel on one side.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::{debug, trace};

/// Integration step.
pub const SIM_STEP: Duration = Duration::from_millis(1);

/// Speed below which the drum counts as stationary [counts/s].
const STANDSTILL: f64 = 1e-3;

/// Distance at which a position move counts as arrived [counts].
const ARRIVAL_WINDOW: f64 = 0.5;

/// RPM → counts/s for a given encoder resolution.
#[inline]
pub fn rpm_to_rate(rpm: f64, counts_per_rev: f64) -> f64 {
    rpm * counts_per_rev / 60.0
}

/// One queued trapezoidal move. Limits are captured when the move is issued.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedMove {
    /// Absolute end point [counts].
    pub target: f64,
    /// Cruise speed [counts/s].
    pub velocity: f64,
    /// Acceleration and deceleration [counts/s²].
    pub acceleration: f64,
    /// Hold time at the end point before the next queued move starts.
    pub dwell: Duration,
}

/// Active drive mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriveMode {
    Idle,
    Stopping,
    Position,
    /// Signed target velocity [counts/s].
    Velocity(f64),
}

/// Kinematic state of one drum.
#[derive(Debug, Clone)]
pub struct DrumPhysics {
    position: f64,
    velocity: f64,
    /// Limit used by `Stopping` and `Velocity` modes [counts/s²].
    accel_limit: f64,
    hard_stop: f64,
    /// +1 when the hard stop lies at larger counts than the start position.
    stop_side: f64,
    mode: DriveMode,
    queue: VecDeque<PlannedMove>,
    dwell_left: Option<Duration>,
}

impl DrumPhysics {
    pub fn new(start: i64, hard_stop: i64, accel_limit: f64) -> Self {
        Self {
            position: start as f64,
            velocity: 0.0,
            accel_limit,
            hard_stop: hard_stop as f64,
            stop_side: if hard_stop >= start { 1.0 } else { -1.0 },
            mode: DriveMode::Idle,
            queue: VecDeque::new(),
            dwell_left: None,
        }
    }

    // ─── Queries ────────────────────────────────────────────────────

    #[inline]
    pub const fn position(&self) -> f64 {
        self.position
    }

    #[inline]
    pub const fn velocity(&self) -> f64 {
        self.velocity
    }

    #[inline]
    pub const fn mode(&self) -> DriveMode {
        self.mode
    }

    #[inline]
    pub const fn stop_side(&self) -> f64 {
        self.stop_side
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// End point of the last queued move, or the current position.
    pub fn commanded_position(&self) -> f64 {
        self.queue.back().map_or(self.position, |m| m.target)
    }

    pub fn is_moving(&self) -> bool {
        self.mode != DriveMode::Idle || self.velocity.abs() > STANDSTILL
    }

    pub fn at_hard_stop(&self) -> bool {
        (self.position - self.hard_stop).abs() < ARRIVAL_WINDOW
    }

    // ─── Commands ───────────────────────────────────────────────────

    pub fn set_accel_limit(&mut self, accel: f64) {
        self.accel_limit = accel;
    }

    /// Append a move. Replaces velocity mode and any deceleration in progress.
    pub fn enqueue(&mut self, planned: PlannedMove) {
        self.queue.push_back(planned);
        self.mode = DriveMode::Position;
    }

    /// Switch to velocity mode and flush the queue.
    pub fn run_velocity(&mut self, rate: f64) {
        self.flush();
        self.mode = DriveMode::Velocity(rate);
    }

    /// Decelerate to standstill and flush the queue.
    pub fn stop(&mut self) {
        self.flush();
        self.mode = if self.velocity.abs() > STANDSTILL {
            DriveMode::Stopping
        } else {
            self.velocity = 0.0;
            DriveMode::Idle
        };
    }

    /// Immediate standstill.
    pub fn halt(&mut self) {
        self.flush();
        self.velocity = 0.0;
        self.mode = DriveMode::Idle;
    }

    fn flush(&mut self) {
        self.queue.clear();
        self.dwell_left = None;
    }

    // ─── Integration ────────────────────────────────────────────────

    /// Advance by `dt` in fixed steps. A trailing partial step is integrated
    /// with its actual length.
    pub fn advance(&mut self, dt: Duration) {
        let mut remaining = dt;
        while !remaining.is_zero() {
            let step = remaining.min(SIM_STEP);
            self.step(step);
            remaining -= step;
        }
    }

    fn step(&mut self, dt: Duration) {
        let dt_s = dt.as_secs_f64();
        match self.mode {
            DriveMode::Idle => {}
            DriveMode::Stopping => {
                self.decelerate(dt_s);
                if self.velocity == 0.0 {
                    self.mode = DriveMode::Idle;
                }
            }
            DriveMode::Velocity(rate) => {
                let max_change = self.accel_limit * dt_s;
                self.velocity += (rate - self.velocity).clamp(-max_change, max_change);
                self.position += self.velocity * dt_s;
            }
            DriveMode::Position => self.step_position(dt, dt_s),
        }
        self.enforce_hard_stop();
    }

    fn step_position(&mut self, dt: Duration, dt_s: f64) {
        if let Some(left) = self.dwell_left {
            let left = left.saturating_sub(dt);
            if left.is_zero() {
                self.dwell_left = None;
                self.finish_move();
            } else {
                self.dwell_left = Some(left);
            }
            return;
        }

        let Some(active) = self.queue.front().copied() else {
            self.mode = DriveMode::Stopping;
            return;
        };

        let error = active.target - self.position;
        if error.abs() < ARRIVAL_WINDOW {
            self.arrive(active);
            return;
        }

        // Triangular/trapezoidal profile: cruise until the stopping distance
        // covers the remaining error, then follow the braking curve.
        let max_vel = active.velocity;
        let max_acc = active.acceleration;
        let stopping_distance = self.velocity * self.velocity / (2.0 * max_acc);
        let desired = if error.abs() <= stopping_distance {
            error.signum() * (2.0 * max_acc * error.abs()).sqrt().min(max_vel)
        } else {
            error.signum() * max_vel
        };

        let max_change = max_acc * dt_s;
        self.velocity += (desired - self.velocity).clamp(-max_change, max_change);
        self.velocity = self.velocity.clamp(-max_vel, max_vel);
        self.position += self.velocity * dt_s;

        let remaining = active.target - self.position;
        if remaining.abs() < ARRIVAL_WINDOW || remaining.signum() != error.signum() {
            self.arrive(active);
        }

        trace!(
            position = self.position,
            velocity = self.velocity,
            target = active.target,
            "position step"
        );
    }

    fn arrive(&mut self, active: PlannedMove) {
        self.position = active.target;
        self.velocity = 0.0;
        if active.dwell.is_zero() {
            self.finish_move();
        } else {
            self.dwell_left = Some(active.dwell);
        }
    }

    fn finish_move(&mut self) {
        self.queue.pop_front();
        if self.queue.is_empty() {
            self.mode = DriveMode::Idle;
        }
    }

    fn decelerate(&mut self, dt_s: f64) {
        if self.velocity.abs() < STANDSTILL {
            self.velocity = 0.0;
            return;
        }
        let decel = self.accel_limit * dt_s;
        self.velocity = if self.velocity > 0.0 {
            (self.velocity - decel).max(0.0)
        } else {
            (self.velocity + decel).min(0.0)
        };
        self.position += self.velocity * dt_s;
    }

    fn enforce_hard_stop(&mut self) {
        if (self.position - self.hard_stop) * self.stop_side <= 0.0 {
            return;
        }
        self.position = self.hard_stop;
        if self.velocity * self.stop_side > 0.0 {
            self.velocity = 0.0;
        }
        // A move ending beyond the stop can never arrive.
        if self.mode == DriveMode::Position {
            if let Some(front) = self.queue.front() {
                if (front.target - self.hard_stop) * self.stop_side > 0.0 {
                    debug!(target = front.target, hard_stop = self.hard_stop, "move stalled at hard stop");
                    self.dwell_left = None;
                    self.finish_move();
                }
            }
        }
    }
}
