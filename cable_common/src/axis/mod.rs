//! Per-axis shared types.
//!
//! Everything the control core, the HAL simulator and external
//! presentation/persistence layers exchange about a single cable axis:
//! configuration structures, state enums, the rejection taxonomy and the
//! read-only snapshot.

pub mod config;
pub mod error;
pub mod snapshot;
pub mod state;
