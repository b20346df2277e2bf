//! # Cable Control Unit Library
//!
//! Single-axis cable robot motion control: turns a desired carriage
//! position into a safe, bounded motor command, tracks the axis's
//! operational state and runs the blocking homing and shutdown sequences.
//!
//! ## Components (leaf-first)
//!
//! 1. **UnitConverter** — mm ↔ motor counts
//! 2. **BoundsPolicy** — soft travel limit predicate
//! 3. **RobotStateMachine** — NotHomed / Homing / Enabled / Disabled / EStop
//! 4. **MotionCommandEngine** — gated position, velocity and jog commands,
//!    velocity ramp, homing and shutdown
//! 5. **CableRobotController** — composition root for one axis
//! 6. **AxisGroup** — per-tick polling loop over independent axes
//!
//! ## Motion Gate
//!
//! Every motion command is rejected, with no device call, unless the axis
//! is not e-stopped, homed and enabled. Reasons are reported in the fixed
//! priority `EStopped > NotHomed > NotEnabled`.
//!
//! The control core never touches the file system or the network.

pub mod bounds;
pub mod controller;
pub mod error;
pub mod group;
pub mod motion;
pub mod observer;
pub mod state;
pub mod units;

pub use bounds::BoundsPolicy;
pub use controller::CableRobotController;
pub use error::{GroupError, ParameterError};
pub use group::{AxisGroup, CycleStats};
pub use motion::{AxisDrive, MotionCommandEngine, VelocityRamp};
pub use observer::StateObserver;
pub use state::machine::{RobotEvent, RobotStateMachine, StateTransition};
pub use units::UnitConverter;
