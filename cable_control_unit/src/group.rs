//! Axis group polling loop.
//!
//! Owns up to [`MAX_AXES`] independent controllers in a fixed-capacity
//! vector and ticks each one in turn. Controllers share nothing; the group
//! only serialises access so commands and ticks never overlap on one axis.
//!
//! ## Loop
//!
//! `run()` paces ticks on a [`Clock`]: tick all axes, record the tick
//! duration, sleep the remainder of the period. A tick longer than the
//! period counts as an overrun; the loop logs it and carries on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use cable_common::axis::error::MotionRejection;
use cable_common::axis::snapshot::AxisSnapshot;
use cable_common::clock::Clock;
use cable_common::consts::MAX_AXES;
use cable_common::device::MotorDevice;
use heapless::Vec;
use tracing::{debug, info, warn};

use crate::controller::CableRobotController;
use crate::error::GroupError;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-tick timing statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleStats {
    /// Total ticks executed.
    pub cycle_count: u64,
    /// Last tick duration [ns].
    pub last_cycle_ns: u64,
    /// Minimum tick duration [ns].
    pub min_cycle_ns: u64,
    /// Maximum tick duration [ns].
    pub max_cycle_ns: u64,
    /// Running sum for average computation.
    pub sum_cycle_ns: u64,
    /// Ticks that exceeded the period.
    pub overruns: u64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: u64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
        }
    }

    /// Record one tick duration.
    #[inline]
    pub fn record(&mut self, duration: Duration, period: Duration) {
        let ns = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.cycle_count += 1;
        self.last_cycle_ns = ns;
        self.min_cycle_ns = self.min_cycle_ns.min(ns);
        self.max_cycle_ns = self.max_cycle_ns.max(ns);
        self.sum_cycle_ns = self.sum_cycle_ns.saturating_add(ns);
        if duration > period {
            self.overruns += 1;
        }
    }

    /// Average tick time [ns] (0 if no ticks).
    #[inline]
    pub fn avg_cycle_ns(&self) -> u64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Axis Group ─────────────────────────────────────────────────────

/// Fixed-capacity set of axis controllers ticked together.
pub struct AxisGroup<D: MotorDevice> {
    axes: Vec<CableRobotController<D>, MAX_AXES>,
    stats: CycleStats,
}

impl<D: MotorDevice> AxisGroup<D> {
    pub const fn new() -> Self {
        Self {
            axes: Vec::new(),
            stats: CycleStats::new(),
        }
    }

    /// Add an axis. Names must be unique within the group.
    pub fn push(&mut self, axis: CableRobotController<D>) -> Result<(), GroupError> {
        if self.get(axis.name()).is_some() {
            return Err(GroupError::DuplicateName(axis.name().to_string()));
        }
        self.axes
            .push(axis)
            .map_err(|_| GroupError::Full { capacity: MAX_AXES })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.axes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&CableRobotController<D>> {
        self.axes.iter().find(|a| a.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut CableRobotController<D>> {
        self.axes.iter_mut().find(|a| a.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CableRobotController<D>> {
        self.axes.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut CableRobotController<D>> {
        self.axes.iter_mut()
    }

    #[inline]
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Tick every axis once.
    pub fn update_all(&mut self) {
        for axis in self.axes.iter_mut() {
            axis.update();
        }
    }

    /// Stop every axis. All axes are stopped even if one fails; the first
    /// failure is returned.
    pub fn stop_all(&mut self) -> Result<(), MotionRejection> {
        let mut first = Ok(());
        for axis in self.axes.iter_mut() {
            if let Err(e) = axis.stop() {
                first = first.and(Err(e));
            }
        }
        first
    }

    /// Engage or release the e-stop on every axis. The first failure is
    /// returned after all axes were visited.
    pub fn set_e_stop_all(&mut self, engaged: bool) -> Result<(), MotionRejection> {
        let mut first = Ok(());
        for axis in self.axes.iter_mut() {
            if let Err(e) = axis.set_e_stop(engaged) {
                first = first.and(Err(e));
            }
        }
        first
    }

    /// Snapshot of every axis, in insertion order.
    pub fn snapshots(&self) -> Vec<AxisSnapshot, MAX_AXES> {
        let mut out = Vec::new();
        for axis in self.axes.iter() {
            // Same capacity as `axes`.
            let _ = out.push(axis.snapshot());
        }
        out
    }

    /// Run the polling loop until `running` clears. Returns the statistics
    /// accumulated over this run.
    pub fn run(&mut self, period: Duration, running: &AtomicBool, clock: &dyn Clock) -> Result<CycleStats, GroupError> {
        self.run_until(period, running, clock, |_| false)
    }

    /// Like [`run`](Self::run), but also stops after the first tick for
    /// which `done` returns true.
    pub fn run_until<F>(
        &mut self,
        period: Duration,
        running: &AtomicBool,
        clock: &dyn Clock,
        mut done: F,
    ) -> Result<CycleStats, GroupError>
    where
        F: FnMut(&Self) -> bool,
    {
        if period.is_zero() {
            return Err(GroupError::ZeroPeriod);
        }
        info!(axes = self.axes.len(), ?period, "axis group loop started");
        self.stats = CycleStats::new();

        while running.load(Ordering::SeqCst) {
            let start = clock.now();
            self.update_all();
            if done(self) {
                self.stats.record(clock.now().saturating_sub(start), period);
                break;
            }
            let elapsed = clock.now().saturating_sub(start);
            self.stats.record(elapsed, period);
            if elapsed > period {
                warn!(?elapsed, ?period, "tick overrun");
            }
            if let Some(remaining) = period.checked_sub(elapsed) {
                clock.sleep(remaining);
            }
        }

        debug!(
            cycles = self.stats.cycle_count,
            overruns = self.stats.overruns,
            avg_ns = self.stats.avg_cycle_ns(),
            "axis group loop stopped"
        );
        Ok(self.stats.clone())
    }
}

impl<D: MotorDevice> Default for AxisGroup<D> {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
