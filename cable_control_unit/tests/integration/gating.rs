//! Motion gate, configuration order and parameter accessors.

use std::sync::{Arc, Mutex};

use cable_common::axis::config::{GrooveDirection, MotionParameters};
use cable_common::axis::error::{AxisConfigError, MotionRejection};
use cable_common::axis::state::{MoveType, RobotState, StatusColor};
use cable_common::clock::ManualClock;
use cable_control_unit::{CableRobotController, ParameterError};

use super::mock::{Call, MockMotor};
use super::{config, controller, counts_at, geometry, ready_controller};

#[test]
fn estopped_device_issues_zero_motion_calls() {
    let (mut ctrl, handle, _clock) = ready_controller(GrooveDirection::None, 500.0);
    handle.set_estopped(true);

    for target in [50.0, 500.0, 2000.0] {
        assert_eq!(ctrl.move_position(target, true), Err(MotionRejection::EStopped));
        assert_eq!(ctrl.move_velocity(target), Err(MotionRejection::EStopped));
    }
    assert_eq!(ctrl.move_position(10.0, false), Err(MotionRejection::EStopped));
    assert_eq!(ctrl.jog_up(), Err(MotionRejection::EStopped));
    assert_eq!(ctrl.jog_down(true), Err(MotionRejection::EStopped));

    assert!(handle.calls().is_empty(), "calls: {:?}", handle.calls());
}

#[test]
fn gate_reports_most_critical_reason_first() {
    let (mut ctrl, handle, _clock) = controller(GrooveDirection::None);

    // Unhomed, disabled and e-stopped: e-stop wins.
    handle.set_estopped(true);
    assert_eq!(ctrl.move_position(500.0, true), Err(MotionRejection::EStopped));

    // Unhomed and disabled: not homed wins.
    handle.set_estopped(false);
    assert_eq!(ctrl.move_position(500.0, true), Err(MotionRejection::NotHomed));

    // Homed but disabled.
    handle.set_homed(true);
    assert_eq!(ctrl.move_position(500.0, true), Err(MotionRejection::NotEnabled));

    handle.set_enabled(true);
    assert_eq!(ctrl.move_position(500.0, true), Ok(()));
}

#[test]
fn latched_estop_gates_after_device_flag_clears() {
    let (mut ctrl, handle, _clock) = ready_controller(GrooveDirection::None, 500.0);
    handle.set_estopped(true);
    assert_eq!(ctrl.update(), RobotState::EStop);

    // Device flag drops, controller latch holds.
    handle.set_estopped(false);
    assert_eq!(ctrl.update(), RobotState::EStop);
    assert_eq!(ctrl.move_position(500.0, true), Err(MotionRejection::EStopped));

    ctrl.set_e_stop(false).unwrap();
    assert_eq!(ctrl.state(), RobotState::Enabled);
    assert_eq!(ctrl.move_position(500.0, true), Ok(()));
}

#[test]
fn motion_before_configure_is_not_configured() {
    let clock = ManualClock::shared();
    let (device, handle) = MockMotor::new(Arc::clone(&clock));
    handle.set_homed(true);
    handle.set_enabled(true);
    let mut ctrl = CableRobotController::new(device, &config(GrooveDirection::None), clock).unwrap();

    assert!(!ctrl.is_configured());
    assert_eq!(ctrl.move_position(500.0, true), Err(MotionRejection::NotConfigured));
    assert_eq!(ctrl.move_velocity(500.0), Err(MotionRejection::NotConfigured));
    assert_eq!(ctrl.jog_up(), Err(MotionRejection::NotConfigured));
    assert_eq!(handle.motion_calls(), 0);
}

#[test]
fn configure_is_one_time() {
    let (mut ctrl, _handle, _clock) = controller(GrooveDirection::None);
    assert!(ctrl.is_configured());
    assert_eq!(
        ctrl.configure(geometry(GrooveDirection::LeftHanded)),
        Err(ParameterError::Config(AxisConfigError::AlreadyConfigured))
    );
}

#[test]
fn configure_rejects_zero_resolution() {
    let clock = ManualClock::shared();
    let (device, _handle) = MockMotor::new(Arc::clone(&clock));
    let mut ctrl = CableRobotController::new(device, &config(GrooveDirection::None), clock).unwrap();
    let mut g = geometry(GrooveDirection::None);
    g.counts_per_rev = 0;
    assert!(matches!(
        ctrl.configure(g),
        Err(ParameterError::Config(AxisConfigError::NotPositive { .. }))
    ));
    assert!(!ctrl.is_configured());
}

#[test]
fn configure_pushes_limits_to_device() {
    let (_ctrl, handle, _clock) = controller(GrooveDirection::None);
    assert_eq!(handle.limits(), (300.0, 600.0));
}

#[test]
fn enable_before_homing_stays_not_homed() {
    let (mut ctrl, handle, _clock) = controller(GrooveDirection::None);
    ctrl.set_enabled(true).unwrap();
    assert!(handle.is_enabled());
    assert_eq!(ctrl.state(), RobotState::NotHomed);
    assert!(!ctrl.is_ready());
}

#[test]
fn enable_rejected_while_estopped() {
    let (mut ctrl, handle, _clock) = ready_controller(GrooveDirection::None, 500.0);
    ctrl.set_e_stop(true).unwrap();
    handle.clear_calls();
    assert_eq!(ctrl.set_enabled(false), Err(MotionRejection::EStopped));
    assert!(handle.calls().is_empty());
}

#[test]
fn disable_cancels_velocity_move() {
    let (mut ctrl, handle, _clock) = ready_controller(GrooveDirection::None, 500.0);
    ctrl.move_velocity(1000.0).unwrap();
    assert_eq!(ctrl.move_type(), MoveType::Velocity);

    ctrl.set_enabled(false).unwrap();
    assert_eq!(ctrl.move_type(), MoveType::Position);
    assert_eq!(ctrl.target_velocity(), 0.0);
    assert_eq!(ctrl.state(), RobotState::Disabled);
    assert_eq!(handle.calls().last(), Some(&Call::Disable));

    // Reissue in the next tick is gated off.
    handle.clear_calls();
    ctrl.update();
    assert_eq!(handle.motion_calls(), 0);
}

#[test]
fn set_bounds_revalidates_shutdown_position() {
    let (mut ctrl, _handle, _clock) = controller(GrooveDirection::None);
    assert_eq!(
        ctrl.set_bounds(100.0, 1950.0),
        Err(AxisConfigError::ShutdownInsideBounds {
            position: 1900.0,
            bounds_max: 1950.0
        })
    );
    assert!(matches!(
        ctrl.set_bounds(900.0, 800.0),
        Err(AxisConfigError::InvertedBounds { .. })
    ));

    ctrl.set_bounds(200.0, 1500.0).unwrap();
    let motion = ctrl.get_motion_parameters();
    assert_eq!((motion.bounds_min, motion.bounds_max), (200.0, 1500.0));
}

#[test]
fn set_motion_parameters_pushes_limits() {
    let (mut ctrl, handle, _clock) = controller(GrooveDirection::None);
    handle.clear_calls();
    let motion = MotionParameters {
        vel_limit: 150.0,
        accel_limit: 400.0,
        bounds_min: 50.0,
        bounds_max: 1700.0,
    };
    ctrl.set_motion_parameters(motion).unwrap();
    assert_eq!(ctrl.get_motion_parameters(), motion);
    assert_eq!(
        handle.calls(),
        vec![Call::SetVelocity(150.0), Call::SetAcceleration(400.0)]
    );

    let bad = MotionParameters { vel_limit: 0.0, ..motion };
    assert!(ctrl.set_motion_parameters(bad).is_err());
    assert_eq!(ctrl.get_motion_parameters(), motion);
}

#[test]
fn jogging_and_torque_accessors_validate() {
    let (mut ctrl, _handle, _clock) = controller(GrooveDirection::None);
    let mut jog = ctrl.get_jogging_parameters();
    jog.jog_dist = 10.0;
    ctrl.set_jogging_parameters(jog).unwrap();
    assert_eq!(ctrl.get_jogging_parameters().jog_dist, 10.0);

    jog.jog_dist = -1.0;
    assert!(ctrl.set_jogging_parameters(jog).is_err());

    let mut torque = ctrl.get_torque_limits();
    torque.min = 60.0;
    torque.max = 20.0;
    assert!(ctrl.set_torque_limits(torque).is_err());
}

#[test]
fn snapshot_reflects_state_and_position() {
    let (mut ctrl, handle, _clock) = ready_controller(GrooveDirection::None, 500.0);
    let snap = ctrl.snapshot();
    assert_eq!(snap.name, "winch-a");
    assert_eq!(snap.state, RobotState::Enabled);
    assert_eq!(snap.status, "ENABLED");
    assert_eq!(snap.color, StatusColor::Green);
    assert_eq!(snap.position_counts, counts_at(500.0, GrooveDirection::None));
    assert!((snap.position_mm - 500.0).abs() < 0.2);
    assert_eq!(snap.vel_limit, 300.0);

    handle.set_position(counts_at(750.0, GrooveDirection::None));
    ctrl.update();
    assert!((ctrl.get_position_actual() - 750.0).abs() < 0.2);

    ctrl.set_e_stop(true).unwrap();
    assert_eq!(ctrl.snapshot().color, StatusColor::Red);
}

#[test]
fn observers_see_every_transition() {
    let (mut ctrl, _handle, _clock) = controller(GrooveDirection::None);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    ctrl.add_observer(Box::new(move |axis: &str, from: RobotState, to: RobotState| {
        sink.lock().unwrap().push((axis.to_string(), from, to));
    }));

    ctrl.set_enabled(true).unwrap();
    ctrl.run_homing_routine(std::time::Duration::from_secs(5)).unwrap();
    ctrl.set_e_stop(true).unwrap();

    let seen = seen.lock().unwrap();
    let transitions: Vec<_> = seen.iter().map(|(_, from, to)| (*from, *to)).collect();
    assert_eq!(
        transitions,
        vec![
            (RobotState::NotHomed, RobotState::Homing),
            (RobotState::Homing, RobotState::Enabled),
            (RobotState::Enabled, RobotState::EStop),
        ]
    );
    assert!(seen.iter().all(|(axis, _, _)| axis == "winch-a"));
}
