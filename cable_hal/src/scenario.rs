//! Demonstration sequence run by `cable_sim`.
//!
//! Enable → home → retract into the soft limits → velocity approach through
//! the group loop → jog up → jog down → shutdown. Each step fans out over every axis in the group.
//! When `running` clears between steps, all axes are e-stopped and the
//! sequence ends with [`ScenarioError::Interrupted`].

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use cable_common::axis::error::MotionRejection;
use cable_common::axis::snapshot::AxisSnapshot;
use cable_common::clock::Clock;
use cable_common::device::{DeviceStatus, MotorDevice};
use cable_control_unit::{AxisGroup, CableRobotController, CycleStats, GroupError};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::ControlParameters;

/// Scenario step, for logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Enable,
    Homing,
    Retract,
    Approach,
    JogUp,
    JogDown,
    Shutdown,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Enable => "enable",
            Self::Homing => "homing",
            Self::Retract => "retract",
            Self::Approach => "approach",
            Self::JogUp => "jog up",
            Self::JogDown => "jog down",
            Self::Shutdown => "shutdown",
        })
    }
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("{step} rejected on axis '{axis}': {source}")]
    Rejected {
        step: Step,
        axis: String,
        source: MotionRejection,
    },

    #[error("{step} did not finish within {after:?}")]
    MotionTimeout { step: Step, after: Duration },

    #[error(transparent)]
    Group(#[from] GroupError),

    #[error("interrupted, all axes e-stopped")]
    Interrupted,
}

/// Outcome of a completed scenario.
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    /// Group loop statistics of the velocity approach.
    pub approach: CycleStats,
    /// Final state of every axis.
    pub snapshots: Vec<AxisSnapshot>,
}

/// Run the full sequence.
pub fn run_scenario<D: MotorDevice>(
    group: &mut AxisGroup<D>,
    control: &ControlParameters,
    clock: &dyn Clock,
    running: &AtomicBool,
    skip_shutdown: bool,
) -> Result<ScenarioReport, ScenarioError> {
    each_axis(group, Step::Enable, running, |ax| ax.set_enabled(true))?;
    each_axis(group, Step::Homing, running, |ax| {
        ax.run_homing_routine(control.homing_timeout())
    })?;

    retract(group, control, clock, running)?;
    let approach = approach(group, control, clock, running)?;

    each_axis(group, Step::JogUp, running, |ax| ax.jog_up())?;
    wait_for_standstill(group, Step::JogUp, control, clock, running)?;
    each_axis(group, Step::JogDown, running, |ax| ax.jog_down(false))?;
    wait_for_standstill(group, Step::JogDown, control, clock, running)?;

    if skip_shutdown {
        info!("shutdown skipped");
    } else {
        each_axis(group, Step::Shutdown, running, |ax| {
            ax.shutdown(control.shutdown_timeout())
        })?;
    }

    group.update_all();
    Ok(ScenarioReport {
        approach,
        snapshots: group.snapshots().into_iter().collect(),
    })
}

fn each_axis<D, F>(group: &mut AxisGroup<D>, step: Step, running: &AtomicBool, mut op: F) -> Result<(), ScenarioError>
where
    D: MotorDevice,
    F: FnMut(&mut CableRobotController<D>) -> Result<(), MotionRejection>,
{
    check_running(group, running)?;
    for axis in group.iter_mut() {
        op(axis).map_err(|source| ScenarioError::Rejected {
            step,
            axis: axis.name().to_string(),
            source,
        })?;
        info!(axis = axis.name(), %step, state = %axis.state(), "step complete");
    }
    Ok(())
}

/// Move every axis that homed outside its soft limits onto the nearest
/// bound. Velocity moves refuse to start from outside the limits.
fn retract<D: MotorDevice>(
    group: &mut AxisGroup<D>,
    control: &ControlParameters,
    clock: &dyn Clock,
    running: &AtomicBool,
) -> Result<(), ScenarioError> {
    group.update_all();
    each_axis(group, Step::Retract, running, |ax| {
        let motion = ax.get_motion_parameters();
        let position = ax.get_position_actual();
        let inside = position.clamp(motion.bounds_min, motion.bounds_max);
        if inside == position {
            Ok(())
        } else {
            ax.move_position(inside, true)
        }
    })?;
    wait_for_standstill(group, Step::Retract, control, clock, running)
}

/// Stream velocity moves toward the target until every axis is within
/// tolerance, then stop.
fn approach<D: MotorDevice>(
    group: &mut AxisGroup<D>,
    control: &ControlParameters,
    clock: &dyn Clock,
    running: &AtomicBool,
) -> Result<CycleStats, ScenarioError> {
    let target = control.approach_target_mm;
    let tolerance = control.approach_tolerance_mm;
    each_axis(group, Step::Approach, running, |ax| ax.move_velocity(target))?;

    let deadline = clock.now() + control.approach_timeout();
    let mut arrived = false;
    let stats = group.run_until(control.tick_period(), running, clock, |g| {
        arrived = g
            .iter()
            .all(|ax| (ax.get_position_actual() - target).abs() <= tolerance);
        arrived || clock.now() >= deadline
    })?;

    for axis in group.iter_mut() {
        if let Err(e) = axis.stop() {
            warn!(axis = axis.name(), error = %e, "stop after approach failed");
        }
    }
    check_running(group, running)?;
    if !arrived {
        return Err(ScenarioError::MotionTimeout {
            step: Step::Approach,
            after: control.approach_timeout(),
        });
    }
    info!(
        target,
        cycles = stats.cycle_count,
        avg_ns = stats.avg_cycle_ns(),
        max_ns = stats.max_cycle_ns,
        "approach complete"
    );
    wait_for_standstill(group, Step::Approach, control, clock, running)?;
    Ok(stats)
}

/// Tick until no device reports motion.
fn wait_for_standstill<D: MotorDevice>(
    group: &mut AxisGroup<D>,
    step: Step,
    control: &ControlParameters,
    clock: &dyn Clock,
    running: &AtomicBool,
) -> Result<(), ScenarioError> {
    let deadline = clock.now() + control.approach_timeout();
    loop {
        group.update_all();
        if group
            .iter()
            .all(|ax| !ax.device_status().contains(DeviceStatus::MOVING))
        {
            return Ok(());
        }
        check_running(group, running)?;
        if clock.now() >= deadline {
            return Err(ScenarioError::MotionTimeout {
                step,
                after: control.approach_timeout(),
            });
        }
        clock.sleep(control.tick_period());
    }
}

fn check_running<D: MotorDevice>(group: &mut AxisGroup<D>, running: &AtomicBool) -> Result<(), ScenarioError> {
    if running.load(Ordering::SeqCst) {
        return Ok(());
    }
    warn!("interrupted, engaging e-stop on all axes");
    if let Err(e) = group.set_e_stop_all(true) {
        error!(error = %e, "e-stop fan-out failed");
    }
    Err(ScenarioError::Interrupted)
}
