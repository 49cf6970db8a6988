//! Conversion of image stacks to unsigned 16-bit views.
//!
//! # Components
//!
//! - [`ImageConversionAdapter`]: resolves one intensity range per stack and
//!   serves every view as a `u16` volume
//! - [`IntensityRange`]: `(min, max)` rescaling bounds, with a NaN-propagating
//!   union used by the global scan
//! - [`RangeMode`]: explicit bounds, a global scan, or the stack's display range
//! - [`UnsignedShortConverter`]: the per-sample linear rescale

mod adapter;
mod converter;
mod range;

pub use adapter::{ImageConversionAdapter, ViewKey};
pub use converter::{UnsignedShortConverter, U16_MAX};
pub use range::{IntensityRange, RangeMode};
