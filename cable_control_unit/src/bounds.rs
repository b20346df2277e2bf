//! Soft travel limit policy.
//!
//! Positions are absolute linear travel in mm, growing downward: `bounds_min`
//! is the upper soft limit and `bounds_max` the lower one. Both limits are
//! inclusive.

use cable_common::axis::config::validate_bounds;
use cable_common::axis::error::{AxisConfigError, MotionRejection};

/// Inclusive `[bounds_min, bounds_max]` travel window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsPolicy {
    bounds_min: f64,
    bounds_max: f64,
}

impl BoundsPolicy {
    /// Create a policy. Rejects `bounds_min > bounds_max`.
    pub fn new(bounds_min: f64, bounds_max: f64) -> Result<Self, AxisConfigError> {
        validate_bounds(bounds_min, bounds_max)?;
        Ok(Self {
            bounds_min,
            bounds_max,
        })
    }

    #[inline]
    pub const fn bounds_min(&self) -> f64 {
        self.bounds_min
    }

    #[inline]
    pub const fn bounds_max(&self) -> f64 {
        self.bounds_max
    }

    /// Whether an absolute position lies inside the window.
    #[inline]
    pub fn contains(&self, position: f64) -> bool {
        position >= self.bounds_min && position <= self.bounds_max
    }

    /// Evaluate a target.
    ///
    /// - Absolute: `target ∈ [bounds_min, bounds_max]`.
    /// - Relative to `current`: a negative `target` moves up and must keep
    ///   `current - |target| >= bounds_min`; a non-negative `target` moves down
    ///   and must keep `current + |target| <= bounds_max`.
    pub fn is_in_bounds(&self, target: f64, is_absolute: bool, current: f64) -> bool {
        if is_absolute {
            return self.contains(target);
        }
        if target < 0.0 {
            current - target.abs() >= self.bounds_min
        } else {
            current + target.abs() <= self.bounds_max
        }
    }

    /// `is_in_bounds` as a `Result` carrying the rejection.
    pub fn check(&self, target: f64, is_absolute: bool, current: f64) -> Result<(), MotionRejection> {
        if self.is_in_bounds(target, is_absolute, current) {
            Ok(())
        } else {
            Err(MotionRejection::OutOfBounds {
                target,
                min: self.bounds_min,
                max: self.bounds_max,
            })
        }
    }

    /// Bound nearest to a relative move's direction of travel.
    #[inline]
    pub fn limit_toward(&self, relative_target: f64) -> f64 {
        if relative_target < 0.0 {
            self.bounds_min
        } else {
            self.bounds_max
        }
    }
}
