//! Per-tick velocity ramp for streamed velocity moves.
//!
//! Velocity commands are reissued every control tick instead of being
//! profiled once by the drive, so the ramp is shaped here:
//!
//! - Outside the arrival radius the magnitude climbs by `accel_step_rpm`
//!   per tick up to the velocity limit.
//! - Inside the radius it follows the approach curve
//!   `vel_limit · distance / radius`. It may still climb by one step per
//!   tick until it first meets the curve; after that it only decreases,
//!   taking `min` with the previous value, until the ramp is reset or the
//!   axis leaves the zone.

use cable_common::axis::config::RampParameters;

/// Ramp magnitude plus the arrival-zone latch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityRamp {
    params: RampParameters,
    /// Current magnitude [RPM], always ≥ 0.
    velocity: f64,
    /// Set once the magnitude meets the approach curve inside the zone.
    decelerating: bool,
}

impl VelocityRamp {
    pub const fn new(params: RampParameters) -> Self {
        Self {
            params,
            velocity: 0.0,
            decelerating: false,
        }
    }

    /// Current ramp magnitude [RPM].
    #[inline]
    pub const fn velocity(&self) -> f64 {
        self.velocity
    }

    #[inline]
    pub const fn is_decelerating(&self) -> bool {
        self.decelerating
    }

    #[inline]
    pub const fn params(&self) -> RampParameters {
        self.params
    }

    /// Replace the shaping parameters. Keeps the current magnitude.
    pub fn set_params(&mut self, params: RampParameters) {
        self.params = params;
    }

    /// Zero the magnitude and clear the latch.
    #[inline]
    pub fn reset(&mut self) {
        self.velocity = 0.0;
        self.decelerating = false;
    }

    /// Advance one tick and return the new magnitude [RPM].
    ///
    /// `distance` is the unsigned distance to the target [mm].
    pub fn step(&mut self, distance: f64, vel_limit: f64) -> f64 {
        let distance = distance.abs();
        let vel_limit = vel_limit.max(0.0);
        let radius = self.params.arrival_radius_mm;
        let step = self.params.accel_step_rpm;

        if distance > radius {
            self.decelerating = false;
            self.velocity = (self.velocity + step).min(vel_limit);
            return self.velocity;
        }

        let curve = vel_limit * distance / radius;
        if self.decelerating {
            self.velocity = self.velocity.min(curve);
        } else if self.velocity + step >= curve {
            self.decelerating = true;
            self.velocity = curve;
        } else {
            self.velocity += step;
        }
        self.velocity
    }
}

impl Default for VelocityRamp {
    fn default() -> Self {
        Self::new(RampParameters::default())
    }
}
