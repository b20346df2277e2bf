//! Simulated motor device.
//!
//! - [`physics`] - Drum kinematics: move queue, velocity mode, hard stop
//! - [`motor`] - `SimulatedMotor`, the `MotorDevice` implementation

pub mod motor;
pub mod physics;

pub use motor::SimulatedMotor;
pub use physics::{DriveMode, DrumPhysics, PlannedMove};
