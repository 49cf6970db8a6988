//! Linear rescaling of real samples to unsigned 16-bit.

use ndarray::Array3;

use super::range::IntensityRange;
use crate::stack::Sample;

/// Largest unsigned 16-bit value, as a float.
pub const U16_MAX: f64 = u16::MAX as f64;

/// Maps samples linearly from an intensity range onto `0..=65535`.
///
/// `out = round(clamp((x - min) / (max - min) * 65535, 0, 65535))`.
/// A degenerate range (`min == max`) maps every sample to 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnsignedShortConverter {
    range: IntensityRange,
}

impl UnsignedShortConverter {
    pub fn new(range: IntensityRange) -> Self {
        Self { range }
    }

    pub fn range(&self) -> IntensityRange {
        self.range
    }

    /// Convert one real sample.
    #[inline]
    pub fn convert(&self, value: f64) -> u16 {
        let IntensityRange { min, max } = self.range;
        if min == max {
            return 0;
        }
        let scaled = ((value - min) / (max - min) * U16_MAX)
            .clamp(0.0, U16_MAX)
            .round();
        // NaN saturates to 0
        scaled as u16
    }

    /// Convert a whole volume, keeping its shape.
    pub fn convert_volume<T: Sample>(&self, volume: &Array3<T>) -> Array3<u16> {
        volume.mapv(|sample| self.convert(sample.to_f64()))
    }
}
