//! Axis operational state: NotHomed → Homing → Enabled ⇄ Disabled, EStop overlay.
//!
//! Transitions come from two sources:
//! - polling: [`RobotStateMachine::evaluate`] re-derives the state from the
//!   device status flags every tick;
//! - commands: [`RobotStateMachine::handle_event`] applies explicit homing,
//!   enable and e-stop events.
//!
//! Priority is fixed in every evaluation: EStop, then Homing, then NotHomed,
//! then Enabled/Disabled. EStop is latched until an explicit
//! [`RobotEvent::EStopCleared`] while the device no longer reports e-stop.

use cable_common::axis::state::RobotState;
use cable_common::device::DeviceStatus;

/// Result of a state transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateTransition {
    /// State changed to the given state.
    Ok(RobotState),
    /// Event accepted, state unchanged.
    Unchanged(RobotState),
    /// Event rejected — reason.
    Rejected(&'static str),
}

impl StateTransition {
    /// Whether the event was accepted.
    #[inline]
    pub const fn is_accepted(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

/// Explicit events from user commands and sequence outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotEvent {
    /// Homing routine triggered.
    HomingStarted,
    /// Homing routine reported success.
    HomingSucceeded,
    /// Homing routine failed or timed out.
    HomingFailed,
    /// E-stop engaged.
    EStopSet,
    /// E-stop release requested.
    EStopCleared,
    /// Drive enable command.
    Enable,
    /// Drive disable command.
    Disable,
}

/// Per-axis operational state machine.
#[derive(Debug, Clone)]
pub struct RobotStateMachine {
    state: RobotState,
    e_stop_latched: bool,
}

impl RobotStateMachine {
    /// Create a new state machine in NotHomed.
    pub const fn new() -> Self {
        Self {
            state: RobotState::NotHomed,
            e_stop_latched: false,
        }
    }

    /// Current state.
    #[inline]
    pub const fn state(&self) -> RobotState {
        self.state
    }

    /// Whether the e-stop latch is set.
    #[inline]
    pub const fn is_e_stop_latched(&self) -> bool {
        self.e_stop_latched
    }

    /// Homed, enabled and not e-stopped.
    #[inline]
    pub const fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    /// Re-derive the state from polled device flags.
    ///
    /// A device-reported e-stop sets the latch. While latched the state
    /// stays EStop even if the device flag clears.
    pub fn evaluate(&mut self, status: DeviceStatus) -> StateTransition {
        if status.contains(DeviceStatus::ESTOPPED) {
            self.e_stop_latched = true;
        }
        let next = self.resolve(status);
        self.apply(next)
    }

    /// Apply an explicit event. `status` is the device status at the time
    /// of the event; it decides where EStop and Homing exit to.
    pub fn handle_event(&mut self, event: RobotEvent, status: DeviceStatus) -> StateTransition {
        use RobotEvent::*;
        use RobotState::*;

        let next = match (self.state, event) {
            // any → EStop, latched
            (_, EStopSet) => {
                self.e_stop_latched = true;
                EStop
            }

            // EStop → re-evaluate from device flags
            (EStop, EStopCleared) => {
                if status.contains(DeviceStatus::ESTOPPED) {
                    return StateTransition::Rejected("device still reports e-stop");
                }
                self.e_stop_latched = false;
                self.resolve(status)
            }
            (_, EStopCleared) => self.state,

            (EStop, _) => {
                return StateTransition::Rejected("e-stop latched: clear e-stop first");
            }

            // Homing lifecycle
            (Homing, HomingStarted) => {
                return StateTransition::Rejected("homing already in progress");
            }
            (_, HomingStarted) => Homing,
            (Homing, HomingSucceeded) => enabled_or_disabled(status),
            (Homing, HomingFailed) => NotHomed,
            (_, HomingSucceeded | HomingFailed) => {
                return StateTransition::Rejected("no homing in progress");
            }

            // Enable / Disable
            (Homing, Enable | Disable) => {
                return StateTransition::Rejected("homing in progress");
            }
            (NotHomed, Enable | Disable) => NotHomed,
            (Enabled | Disabled, Enable) => Enabled,
            (Enabled | Disabled, Disable) => Disabled,
        };

        self.apply(next)
    }

    /// Priority-ordered resolution from device flags.
    fn resolve(&self, status: DeviceStatus) -> RobotState {
        if self.e_stop_latched || status.contains(DeviceStatus::ESTOPPED) {
            RobotState::EStop
        } else if status.contains(DeviceStatus::HOMING)
            || (self.state == RobotState::Homing && !status.contains(DeviceStatus::HOMED))
        {
            RobotState::Homing
        } else if !status.contains(DeviceStatus::HOMED) {
            RobotState::NotHomed
        } else {
            enabled_or_disabled(status)
        }
    }

    fn apply(&mut self, next: RobotState) -> StateTransition {
        if next == self.state {
            StateTransition::Unchanged(next)
        } else {
            self.state = next;
            StateTransition::Ok(next)
        }
    }
}

impl Default for RobotStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn enabled_or_disabled(status: DeviceStatus) -> RobotState {
    if status.contains(DeviceStatus::ENABLED) {
        RobotState::Enabled
    } else {
        RobotState::Disabled
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
