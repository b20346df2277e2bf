//! State machine module root.
//!
//! One operational state machine per axis; see [`machine`].

pub mod machine;
