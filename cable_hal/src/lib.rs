//! # Cable HAL Library
//!
//! Hardware side of the cable robot workspace: a physics-based simulated
//! drum motor implementing `cable_common::device::MotorDevice`, the
//! simulator configuration, and the demonstration sequence run by the
//! `cable_sim` binary.
//!
//! # Module Structure
//!
//! - [`sim`] - `SimulatedMotor` and drum kinematics
//! - [`config`] - `SimConfig` TOML layout
//! - [`scenario`] - Enable → home → retract → approach → jog → shutdown sequence
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        cable_sim                             │
//! │  ┌─────────────┐    ┌──────────────────┐    ┌─────────────┐  │
//! │  │  SimConfig  │───►│    AxisGroup     │───►│  scenario   │  │
//! │  └─────────────┘    │ (controller/axis)│    └─────────────┘  │
//! │                     └────────┬─────────┘                     │
//! │                              ▼                               │
//! │                     ┌──────────────────┐                     │
//! │                     │  SimulatedMotor  │ (MotorDevice)       │
//! │                     └──────────────────┘                     │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod scenario;
pub mod sim;

pub use crate::config::{ControlParameters, SimConfig, SimulationParameters};
pub use crate::scenario::{ScenarioError, ScenarioReport, run_scenario};
pub use crate::sim::SimulatedMotor;
