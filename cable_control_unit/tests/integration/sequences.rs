//! Homing, shutdown and e-stop sequencing.

use std::time::Duration;

use cable_common::axis::config::GrooveDirection;
use cable_common::axis::error::{MotionRejection, Sequence};
use cable_common::axis::state::{MoveType, RobotState};
use cable_common::clock::Clock;

use super::mock::{Call, Motion};
use super::{controller, counts_at, mm_per_count, ready_controller};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(20);

#[test]
fn shutdown_converges_then_disables() {
    let (mut ctrl, handle, clock) = ready_controller(GrooveDirection::None, 800.0);
    handle.set_motion(Motion::After(Duration::from_secs(12)));
    let start = clock.now();

    assert_eq!(ctrl.shutdown(SHUTDOWN_TIMEOUT), Ok(()));

    let elapsed = clock.now() - start;
    assert!(elapsed >= Duration::from_millis(13_500), "elapsed {elapsed:?}");
    assert!(elapsed < SHUTDOWN_TIMEOUT, "elapsed {elapsed:?}");
    assert!(!handle.is_enabled());
    assert_eq!(handle.calls().last(), Some(&Call::Disable));
    assert_eq!(ctrl.state(), RobotState::Disabled);
    assert!((ctrl.get_position_actual() - 1900.0).abs() <= 1.0);
}

#[test]
fn shutdown_issues_approach_then_override_leg() {
    let (mut ctrl, handle, _clock) = ready_controller(GrooveDirection::None, 800.0);
    ctrl.shutdown(SHUTDOWN_TIMEOUT).unwrap();

    let calls = handle.calls();
    let legs: Vec<_> = calls
        .iter()
        .enumerate()
        .filter(|(_, c)| matches!(c, Call::MovePosition { .. }))
        .collect();
    assert_eq!(legs.len(), 2);

    let (first, approach) = legs[0];
    let (second, past_limit) = legs[1];
    assert_eq!(
        approach,
        &Call::MovePosition {
            counts: counts_at(1800.0, GrooveDirection::None),
            absolute: true
        }
    );
    assert_eq!(
        past_limit,
        &Call::MovePosition {
            counts: (100.0 / mm_per_count()).round() as i64,
            absolute: false
        }
    );
    // Approach leg at approach speed, final leg at final speed.
    assert_eq!(calls[first - 2], Call::SetVelocity(100.0));
    assert_eq!(calls[second - 2], Call::SetVelocity(20.0));
    assert_eq!(calls[second - 1], Call::SetAcceleration(100.0));
}

#[test]
fn shutdown_timeout_leaves_motor_enabled() {
    let (mut ctrl, handle, clock) = ready_controller(GrooveDirection::None, 800.0);
    handle.set_motion(Motion::Stuck);
    let start = clock.now();

    assert_eq!(
        ctrl.shutdown(SHUTDOWN_TIMEOUT),
        Err(MotionRejection::Timeout {
            sequence: Sequence::Shutdown,
            after: SHUTDOWN_TIMEOUT
        })
    );

    let elapsed = clock.now() - start;
    assert!(elapsed >= SHUTDOWN_TIMEOUT);
    assert!(elapsed < SHUTDOWN_TIMEOUT + Duration::from_millis(100));
    assert!(handle.is_enabled());
    assert!(!handle.calls().contains(&Call::Disable));
    assert_eq!(ctrl.state(), RobotState::Enabled);
}

#[test]
fn shutdown_timeout_is_retryable() {
    let err = MotionRejection::Timeout {
        sequence: Sequence::Shutdown,
        after: SHUTDOWN_TIMEOUT,
    };
    assert!(!err.is_fatal());
}

#[test]
fn shutdown_cancels_velocity_move_first() {
    let (mut ctrl, handle, _clock) = ready_controller(GrooveDirection::None, 800.0);
    ctrl.move_velocity(1200.0).unwrap();
    handle.clear_calls();

    ctrl.shutdown(SHUTDOWN_TIMEOUT).unwrap();
    assert_eq!(handle.calls().first(), Some(&Call::Stop));
    assert_eq!(ctrl.move_type(), MoveType::Position);
    assert_eq!(ctrl.target_velocity(), 0.0);
}

#[test]
fn shutdown_is_gated() {
    let (mut ctrl, handle, _clock) = ready_controller(GrooveDirection::None, 800.0);
    handle.set_enabled(false);
    assert_eq!(ctrl.shutdown(SHUTDOWN_TIMEOUT), Err(MotionRejection::NotEnabled));
    assert!(handle.moves().is_empty());
}

#[test]
fn e_stop_stops_before_latching() {
    let (mut ctrl, handle, _clock) = ready_controller(GrooveDirection::None, 500.0);
    ctrl.move_velocity(1200.0).unwrap();
    ctrl.update();
    assert!(ctrl.target_velocity() > 0.0);
    handle.clear_calls();

    ctrl.set_e_stop(true).unwrap();

    assert_eq!(handle.calls(), vec![Call::Stop, Call::SetEStop(true)]);
    assert_eq!(ctrl.target_velocity(), 0.0);
    assert_eq!(ctrl.move_type(), MoveType::Position);
    assert_eq!(ctrl.state(), RobotState::EStop);

    // No velocity reissue on the following tick.
    handle.clear_calls();
    ctrl.update();
    assert_eq!(handle.motion_calls(), 0);
}

#[test]
fn e_stop_clear_rejected_while_device_holds_it() {
    let (mut ctrl, handle, _clock) = ready_controller(GrooveDirection::None, 500.0);
    ctrl.set_e_stop(true).unwrap();
    handle.hold_estop(true);

    assert_eq!(ctrl.set_e_stop(false), Err(MotionRejection::EStopped));
    assert_eq!(ctrl.state(), RobotState::EStop);

    handle.hold_estop(false);
    assert_eq!(ctrl.set_e_stop(false), Ok(()));
    assert_eq!(ctrl.state(), RobotState::Enabled);
}

#[test]
fn homing_success_reports_enabled_or_disabled() {
    let (mut ctrl, handle, _clock) = controller(GrooveDirection::None);
    assert_eq!(ctrl.run_homing_routine(Duration::from_secs(30)), Ok(()));
    assert_eq!(ctrl.state(), RobotState::Disabled);
    assert_eq!(handle.calls().last(), Some(&Call::Home(Duration::from_secs(30))));

    ctrl.set_enabled(true).unwrap();
    assert_eq!(ctrl.state(), RobotState::Enabled);
    assert!(ctrl.is_ready());
}

#[test]
fn homing_failure_reverts_to_not_homed() {
    let (mut ctrl, handle, _clock) = controller(GrooveDirection::None);
    handle.set_homing_succeeds(false);
    ctrl.set_enabled(true).unwrap();

    let err = ctrl.run_homing_routine(Duration::from_secs(5)).unwrap_err();
    assert_eq!(
        err,
        MotionRejection::Timeout {
            sequence: Sequence::Homing,
            after: Duration::from_secs(5)
        }
    );
    assert!(err.is_fatal());
    assert_eq!(ctrl.state(), RobotState::NotHomed);
    assert_eq!(ctrl.move_position(500.0, true), Err(MotionRejection::NotHomed));
}

#[test]
fn homing_rejected_while_estopped() {
    let (mut ctrl, handle, _clock) = controller(GrooveDirection::None);
    ctrl.set_e_stop(true).unwrap();
    handle.clear_calls();

    assert_eq!(
        ctrl.run_homing_routine(Duration::from_secs(5)),
        Err(MotionRejection::EStopped)
    );
    assert!(handle.calls().is_empty());
    assert_eq!(ctrl.state(), RobotState::EStop);
}
