//! Recording mock motor device.
//!
//! Every command is appended to a call log. Queries are not logged. The
//! device state is shared with a [`MockHandle`] kept by the test, so the
//! test can inspect calls and inject faults after the device has been moved
//! into a controller.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use cable_common::axis::error::DeviceError;
use cable_common::clock::{Clock, ManualClock};
use cable_common::device::MotorDevice;

/// One logged device command.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Enable,
    Disable,
    SetEStop(bool),
    SetVelocity(f64),
    SetAcceleration(f64),
    MovePosition { counts: i64, absolute: bool },
    MoveVelocity(f64),
    Stop,
    Home(Duration),
}

/// How queued position moves complete.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    /// Arrive at the queued end point immediately.
    Instant,
    /// Arrive once the clock has advanced this long past the last issue.
    After(Duration),
    /// Accept moves but never arrive.
    Stuck,
}

#[derive(Debug)]
struct MockState {
    homed: bool,
    enabled: bool,
    estopped: bool,
    /// Device e-stop held by hardware; releasing via command has no effect.
    estop_held: bool,
    homing_succeeds: bool,
    motion: Motion,
    position: i64,
    /// End point of the last queued move and its arrival time.
    pending: Option<(i64, Duration)>,
    velocity: f64,
    acceleration: f64,
    calls: Vec<Call>,
}

impl MockState {
    fn current(&self, now: Duration) -> i64 {
        match self.pending {
            Some((end, at)) if now >= at => end,
            _ => self.position,
        }
    }

    fn queued_end(&self) -> i64 {
        self.pending.map_or(self.position, |(end, _)| end)
    }
}

pub struct MockMotor {
    clock: Arc<ManualClock>,
    state: Arc<Mutex<MockState>>,
}

#[derive(Clone)]
pub struct MockHandle {
    clock: Arc<ManualClock>,
    state: Arc<Mutex<MockState>>,
}

impl MockMotor {
    /// Unhomed, disabled device at position 0.
    pub fn new(clock: Arc<ManualClock>) -> (Self, MockHandle) {
        let state = Arc::new(Mutex::new(MockState {
            homed: false,
            enabled: false,
            estopped: false,
            estop_held: false,
            homing_succeeds: true,
            motion: Motion::Instant,
            position: 0,
            pending: None,
            velocity: 0.0,
            acceleration: 0.0,
            calls: Vec::new(),
        }));
        let handle = MockHandle {
            clock: Arc::clone(&clock),
            state: Arc::clone(&state),
        };
        (Self { clock, state }, handle)
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    fn settle(&self, state: &mut MockState) {
        let now = self.clock.now();
        state.position = state.current(now);
        if matches!(state.pending, Some((_, at)) if now >= at) {
            state.pending = None;
        }
    }
}

impl MockHandle {
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Logged `move_position` calls only.
    pub fn moves(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::MovePosition { .. }))
            .collect()
    }

    /// Count of motion-issuing calls (position, velocity).
    pub fn motion_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::MovePosition { .. } | Call::MoveVelocity(_)))
            .count()
    }

    pub fn set_position(&self, counts: i64) {
        let mut s = self.state.lock().unwrap();
        s.position = counts;
        s.pending = None;
    }

    pub fn position(&self) -> i64 {
        let s = self.state.lock().unwrap();
        s.current(self.clock.now())
    }

    /// End point of the last queued move.
    pub fn commanded(&self) -> i64 {
        self.state.lock().unwrap().queued_end()
    }

    pub fn set_motion(&self, motion: Motion) {
        self.state.lock().unwrap().motion = motion;
    }

    pub fn set_homed(&self, homed: bool) {
        self.state.lock().unwrap().homed = homed;
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.state.lock().unwrap().enabled = enabled;
    }

    /// Device-side e-stop raised outside the controller.
    pub fn set_estopped(&self, estopped: bool) {
        self.state.lock().unwrap().estopped = estopped;
    }

    pub fn hold_estop(&self, held: bool) {
        let mut s = self.state.lock().unwrap();
        s.estop_held = held;
        if held {
            s.estopped = true;
        }
    }

    pub fn set_homing_succeeds(&self, succeeds: bool) {
        self.state.lock().unwrap().homing_succeeds = succeeds;
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock().unwrap().enabled
    }

    pub fn limits(&self) -> (f64, f64) {
        let s = self.state.lock().unwrap();
        (s.velocity, s.acceleration)
    }
}

impl MotorDevice for MockMotor {
    fn name(&self) -> &str {
        "mock"
    }

    fn enable(&mut self) -> Result<(), DeviceError> {
        let mut s = self.lock();
        s.calls.push(Call::Enable);
        s.enabled = true;
        Ok(())
    }

    fn disable(&mut self) -> Result<(), DeviceError> {
        let mut s = self.lock();
        s.calls.push(Call::Disable);
        s.enabled = false;
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    fn is_homed(&self) -> bool {
        self.lock().homed
    }

    fn is_estopped(&self) -> bool {
        self.lock().estopped
    }

    fn set_e_stop(&mut self, engaged: bool) -> Result<(), DeviceError> {
        let mut s = self.lock();
        s.calls.push(Call::SetEStop(engaged));
        s.estopped = engaged || s.estop_held;
        Ok(())
    }

    fn get_position(&self, actual: bool) -> i64 {
        let s = self.lock();
        if actual {
            s.current(self.clock.now())
        } else {
            s.queued_end()
        }
    }

    fn get_velocity(&self) -> f64 {
        self.lock().velocity
    }

    fn set_velocity(&mut self, rpm: f64) -> Result<(), DeviceError> {
        let mut s = self.lock();
        s.calls.push(Call::SetVelocity(rpm));
        s.velocity = rpm;
        Ok(())
    }

    fn get_acceleration(&self) -> f64 {
        self.lock().acceleration
    }

    fn set_acceleration(&mut self, rpm_per_s: f64) -> Result<(), DeviceError> {
        let mut s = self.lock();
        s.calls.push(Call::SetAcceleration(rpm_per_s));
        s.acceleration = rpm_per_s;
        Ok(())
    }

    fn move_position(&mut self, counts: i64, absolute: bool, _add_dwell: bool) -> Result<(), DeviceError> {
        let now = self.clock.now();
        let mut s = self.lock();
        s.calls.push(Call::MovePosition { counts, absolute });
        let end = if absolute { counts } else { s.queued_end() + counts };
        match s.motion {
            Motion::Instant => {
                s.position = end;
                s.pending = None;
            }
            Motion::After(delay) => s.pending = Some((end, now + delay)),
            Motion::Stuck => s.pending = Some((end, Duration::MAX)),
        }
        Ok(())
    }

    fn move_velocity(&mut self, rpm: f64) -> Result<(), DeviceError> {
        let mut s = self.lock();
        s.calls.push(Call::MoveVelocity(rpm));
        s.pending = None;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        let mut guard = self.lock();
        guard.calls.push(Call::Stop);
        self.settle(&mut guard);
        guard.pending = None;
        Ok(())
    }

    fn run_homing_routine(&mut self, timeout: Duration) -> bool {
        let mut s = self.lock();
        s.calls.push(Call::Home(timeout));
        if s.homing_succeeds {
            s.homed = true;
            true
        } else {
            s.homed = false;
            false
        }
    }
}
