//! Intensity ranges and how they are determined.

use serde::{Deserialize, Serialize};

use crate::stack::Sample;

/// Bounds `(min, max)` used to rescale samples into 16-bit output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntensityRange {
    pub min: f64,
    pub max: f64,
}

impl IntensityRange {
    /// Identity of [`IntensityRange::union`]: `(+inf, -inf)`.
    pub const EMPTY: IntensityRange = IntensityRange {
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
    };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether no sample has been folded in yet.
    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// Whether every sample maps to the same output (`min == max`).
    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Widen the range to include `value`.
    ///
    /// A NaN value makes both bounds NaN.
    pub fn include(self, value: f64) -> Self {
        self.union(IntensityRange::new(value, value))
    }

    /// Smallest range covering both; NaN bounds propagate.
    pub fn union(self, other: IntensityRange) -> Self {
        Self {
            min: nan_min(self.min, other.min),
            max: nan_max(self.max, other.max),
        }
    }

    /// Min and max over a set of samples.
    ///
    /// Returns [`IntensityRange::EMPTY`] for an empty iterator.
    pub fn of_samples<'a, T, I>(samples: I) -> Self
    where
        T: Sample,
        I: IntoIterator<Item = &'a T>,
    {
        samples
            .into_iter()
            .fold(Self::EMPTY, |range, &sample| range.include(sample.to_f64()))
    }
}

fn nan_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

/// How an adapter obtains its intensity range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RangeMode {
    /// Use the given bounds verbatim
    Explicit { min: f64, max: f64 },

    /// Scan every view and take the global min and max
    ComputeGlobal,

    /// Use the stack's configured display range
    TakeFromSourceDisplayRange,
}

impl RangeMode {
    pub fn name(&self) -> &'static str {
        match self {
            RangeMode::Explicit { .. } => "explicit",
            RangeMode::ComputeGlobal => "compute",
            RangeMode::TakeFromSourceDisplayRange => "display",
        }
    }
}
