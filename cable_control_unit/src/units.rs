//! Linear distance ↔ motor count conversion.
//!
//! Pure linear scaling by `mm_per_count`. The factor is fixed when the axis
//! is configured and never recomputed afterwards.

use cable_common::axis::config::AxisGeometry;
use cable_common::axis::error::AxisConfigError;

/// Bidirectional mm ↔ count mapping for one drum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConverter {
    mm_per_count: f64,
}

impl UnitConverter {
    /// Build from a validated geometry. Guarantees `mm_per_count > 0`.
    pub fn from_geometry(geometry: &AxisGeometry) -> Result<Self, AxisConfigError> {
        geometry.validate()?;
        Self::new(geometry.mm_per_count())
    }

    /// Build from an explicit factor.
    pub fn new(mm_per_count: f64) -> Result<Self, AxisConfigError> {
        if mm_per_count.is_finite() && mm_per_count > 0.0 {
            Ok(Self { mm_per_count })
        } else {
            Err(AxisConfigError::NotPositive {
                field: "mm_per_count",
                value: mm_per_count,
            })
        }
    }

    #[inline]
    pub const fn mm_per_count(&self) -> f64 {
        self.mm_per_count
    }

    /// Counts → mm. `unsigned` takes the absolute value of the result.
    #[inline]
    pub fn count_to_mm(&self, counts: i64, unsigned: bool) -> f64 {
        let mm = counts as f64 * self.mm_per_count;
        if unsigned { mm.abs() } else { mm }
    }

    /// mm → counts, rounded to the nearest count. `unsigned` takes the
    /// absolute value of the input.
    #[inline]
    pub fn mm_to_count(&self, mm: f64, unsigned: bool) -> i64 {
        let mm = if unsigned { mm.abs() } else { mm };
        (mm / self.mm_per_count).round() as i64
    }
}
