//! Explicit state-change notification.
//!
//! Observers are registered on a controller by the caller. There is no
//! global registry.

use cable_common::axis::state::RobotState;

/// Receives every operational state change of an axis.
pub trait StateObserver: Send {
    fn on_state_changed(&mut self, axis: &str, from: RobotState, to: RobotState);
}

impl<F> StateObserver for F
where
    F: FnMut(&str, RobotState, RobotState) + Send,
{
    fn on_state_changed(&mut self, axis: &str, from: RobotState, to: RobotState) {
        self(axis, from, to)
    }
}
