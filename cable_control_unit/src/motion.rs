//! Motion command engine.
//!
//! ## Layers
//!
//! - [`drive`] — device adapter; the only place counts appear.
//! - [`ramp`] — per-tick velocity ramp with arrival deceleration.
//! - [`engine`] — gated position, velocity and jog commands.
//! - [`sequence`] — blocking homing and shutdown sequences.
//!
//! Engine state is kept in mm and RPM throughout.

pub mod drive;
pub mod engine;
pub mod ramp;
pub mod sequence;

pub use drive::AxisDrive;
pub use engine::MotionCommandEngine;
pub use ramp::VelocityRamp;
