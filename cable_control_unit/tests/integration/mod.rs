//! Shared fixtures for control-unit integration tests.

#![allow(dead_code)]

pub mod mock;

mod gating;
mod sequences;

use std::sync::Arc;
use std::time::Duration;

use cable_common::axis::config::{
    AxisConfig, AxisGeometry, GrooveDirection, JoggingParameters, MotionParameters,
    RampParameters, ShutdownParameters, TorqueLimits,
};
use cable_common::clock::ManualClock;
use cable_control_unit::CableRobotController;

use mock::{MockHandle, MockMotor};

pub type Controller = CableRobotController<MockMotor>;

/// 50 mm smooth drum, 800 counts/rev: ≈ 0.19635 mm per count.
pub fn geometry(groove: GrooveDirection) -> AxisGeometry {
    AxisGeometry {
        mount_position: [0.0, 0.0, 2500.0],
        groove,
        drum_diameter: 50.0,
        cable_diameter: 0.0,
        cable_length: 2000.0,
        drum_turns: 20.0,
        counts_per_rev: 800,
    }
}

pub fn config(groove: GrooveDirection) -> AxisConfig {
    AxisConfig {
        name: "winch-a".to_string(),
        geometry: geometry(groove),
        motion: MotionParameters {
            vel_limit: 300.0,
            accel_limit: 600.0,
            bounds_min: 100.0,
            bounds_max: 1800.0,
        },
        jogging: JoggingParameters {
            jog_vel: 60.0,
            jog_accel: 200.0,
            jog_dist: 50.0,
        },
        torque: TorqueLimits::default(),
        shutdown: ShutdownParameters {
            position: 1900.0,
            approach_vel: 100.0,
            approach_accel: 200.0,
            final_vel: 20.0,
            final_accel: 100.0,
            tolerance_mm: 1.0,
            settle_delay_ms: 1500,
            poll_interval_ms: 10,
        },
        ramp: RampParameters::default(),
    }
}

pub fn mm_per_count() -> f64 {
    geometry(GrooveDirection::None).mm_per_count()
}

/// Device counts for a linear position on a drum of the given handedness.
pub fn counts_at(mm: f64, groove: GrooveDirection) -> i64 {
    (mm / mm_per_count()).round() as i64 * groove.rotation_sign() as i64
}

/// Configured controller over an unhomed, disabled mock device.
pub fn controller(groove: GrooveDirection) -> (Controller, MockHandle, Arc<ManualClock>) {
    controller_with(config(groove))
}

pub fn controller_with(cfg: AxisConfig) -> (Controller, MockHandle, Arc<ManualClock>) {
    let clock = ManualClock::shared();
    let (device, handle) = MockMotor::new(Arc::clone(&clock));
    let ctrl = CableRobotController::from_config(device, &cfg, clock.clone()).unwrap();
    (ctrl, handle, clock)
}

/// Homed, enabled controller at `start_mm` with a cleared call log.
pub fn ready_controller(groove: GrooveDirection, start_mm: f64) -> (Controller, MockHandle, Arc<ManualClock>) {
    let (mut ctrl, handle, clock) = controller(groove);
    ctrl.set_enabled(true).unwrap();
    ctrl.run_homing_routine(Duration::from_secs(30)).unwrap();
    handle.set_position(counts_at(start_mm, groove));
    ctrl.update();
    assert!(ctrl.is_ready());
    handle.clear_calls();
    (ctrl, handle, clock)
}
