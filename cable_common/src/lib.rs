//! Cable Robot Common Library
//!
//! Shared types for every crate in the cable robot workspace: axis
//! configuration, robot state enums, the motion rejection taxonomy, the
//! `MotorDevice` capability interface, the clock abstraction used by
//! blocking sequences, and TOML configuration loading.
//!
//! # Module Structure
//!
//! - [`axis`] - Axis configuration, state, errors and presentation snapshot
//! - [`device`] - `MotorDevice` trait and device status flags
//! - [`clock`] - Monotonic clock abstraction (`SystemClock`, `ManualClock`)
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Default parameter values
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use cable_common::prelude::*;
//! ```

pub mod axis;
pub mod clock;
pub mod config;
pub mod consts;
pub mod device;
pub mod prelude;
