//! Device adapter: converts linear moves into signed motor counts.
//!
//! Linear position in mm is `count_to_mm(counts) · rotation_sign`. A
//! left-handed drum therefore reports growing linear travel as falling
//! counts, and every linear move is issued with the same sign applied.

use cable_common::axis::config::AxisGeometry;
use cable_common::axis::error::{AxisConfigError, DeviceError, MotionRejection};
use cable_common::device::{DeviceStatus, MotorDevice};
use tracing::debug;

use crate::units::UnitConverter;

/// Exclusive owner of one motor device plus its unit mapping.
#[derive(Debug)]
pub struct AxisDrive<D: MotorDevice> {
    device: D,
    units: Option<UnitConverter>,
    rotation_sign: f64,
}

impl<D: MotorDevice> AxisDrive<D> {
    /// Wrap a device. No unit mapping until [`configure`](Self::configure).
    pub fn new(device: D) -> Self {
        Self {
            device,
            units: None,
            rotation_sign: 1.0,
        }
    }

    /// Fix the unit mapping and rotation sign. One-time.
    pub fn configure(&mut self, geometry: &AxisGeometry) -> Result<(), AxisConfigError> {
        if self.units.is_some() {
            return Err(AxisConfigError::AlreadyConfigured);
        }
        let units = UnitConverter::from_geometry(geometry)?;
        self.rotation_sign = geometry.groove.rotation_sign();
        self.units = Some(units);
        Ok(())
    }

    #[inline]
    pub const fn is_configured(&self) -> bool {
        self.units.is_some()
    }

    /// Unit mapping, or `NotConfigured`.
    #[inline]
    pub fn units(&self) -> Result<UnitConverter, MotionRejection> {
        self.units.ok_or(MotionRejection::NotConfigured)
    }

    /// `+1` or `-1`, from the groove handedness.
    #[inline]
    pub const fn rotation_sign(&self) -> f64 {
        self.rotation_sign
    }

    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }

    #[inline]
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Release the device.
    pub fn into_inner(self) -> D {
        self.device
    }

    #[inline]
    pub fn status(&self) -> DeviceStatus {
        self.device.status()
    }

    /// Raw device position [counts].
    #[inline]
    pub fn position_counts(&self, actual: bool) -> i64 {
        self.device.get_position(actual)
    }

    /// Linear position [mm].
    pub fn position_mm(&self, actual: bool) -> Result<f64, MotionRejection> {
        let units = self.units()?;
        Ok(units.count_to_mm(self.device.get_position(actual), false) * self.rotation_sign)
    }

    /// Signed counts for an absolute linear target.
    pub fn absolute_counts(&self, target_mm: f64) -> Result<i64, MotionRejection> {
        let units = self.units()?;
        Ok(units.mm_to_count(target_mm, true) * self.sign_i64())
    }

    /// Signed counts for a relative linear move; positive `delta_mm` is down.
    pub fn relative_counts(&self, delta_mm: f64) -> Result<i64, MotionRejection> {
        let units = self.units()?;
        Ok(units.mm_to_count(delta_mm, false) * self.sign_i64())
    }

    /// Queue an absolute move to `target_mm`.
    pub fn move_absolute(&mut self, target_mm: f64) -> Result<(), MotionRejection> {
        let counts = self.absolute_counts(target_mm)?;
        debug!(device = self.device.name(), target_mm, counts, "absolute move");
        self.device.move_position(counts, true, false)?;
        Ok(())
    }

    /// Queue a relative move by `delta_mm`.
    pub fn move_relative(&mut self, delta_mm: f64) -> Result<(), MotionRejection> {
        let counts = self.relative_counts(delta_mm)?;
        debug!(device = self.device.name(), delta_mm, counts, "relative move");
        self.device.move_position(counts, false, false)?;
        Ok(())
    }

    /// Push velocity and acceleration limits to the device.
    pub fn apply_limits(&mut self, vel_rpm: f64, accel_rpm_per_s: f64) -> Result<(), DeviceError> {
        self.device.set_velocity(vel_rpm)?;
        self.device.set_acceleration(accel_rpm_per_s)
    }

    #[inline]
    fn sign_i64(&self) -> i64 {
        if self.rotation_sign < 0.0 { -1 } else { 1 }
    }
}
