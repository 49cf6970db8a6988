//! Sample types supported by image stacks.
//!
//! A stack stores one of three pixel types. The [`Sample`] trait ties each
//! Rust primitive to its [`SampleType`] tag and knows how to decode it from
//! raw plane bytes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::io::{read_f32_be, read_f32_le, read_u16_be, read_u16_le};

/// Pixel type of an image stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleType {
    /// 8-bit unsigned integer samples
    Gray8,
    /// 16-bit unsigned integer samples
    Gray16,
    /// 32-bit floating point samples
    Gray32,
}

impl SampleType {
    /// Size of one sample in bytes.
    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleType::Gray8 => 1,
            SampleType::Gray16 => 2,
            SampleType::Gray32 => 4,
        }
    }

    /// Display range used when a stack does not configure one.
    pub fn default_display_range(self) -> (f64, f64) {
        match self {
            SampleType::Gray8 => (0.0, 255.0),
            SampleType::Gray16 => (0.0, 65535.0),
            SampleType::Gray32 => (0.0, 1.0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SampleType::Gray8 => "gray8",
            SampleType::Gray16 => "gray16",
            SampleType::Gray32 => "gray32",
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Byte order of multi-byte samples in raw plane data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    #[default]
    LittleEndian,
    BigEndian,
}

/// A pixel value that can be read from raw plane bytes.
pub trait Sample: Copy + Send + Sync + fmt::Debug + 'static {
    /// The stack sample type this primitive represents.
    const TYPE: SampleType;

    /// Decode one sample from the first `TYPE.bytes_per_sample()` bytes.
    fn decode(bytes: &[u8], order: ByteOrder) -> Self;

    /// Append the raw encoding of this sample.
    fn encode(self, order: ByteOrder, out: &mut Vec<u8>);

    /// Real value of the sample.
    fn to_f64(self) -> f64;
}

impl Sample for u8 {
    const TYPE: SampleType = SampleType::Gray8;

    fn decode(bytes: &[u8], _order: ByteOrder) -> Self {
        bytes[0]
    }

    fn encode(self, _order: ByteOrder, out: &mut Vec<u8>) {
        out.push(self);
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}

impl Sample for u16 {
    const TYPE: SampleType = SampleType::Gray16;

    fn decode(bytes: &[u8], order: ByteOrder) -> Self {
        match order {
            ByteOrder::LittleEndian => read_u16_le(bytes),
            ByteOrder::BigEndian => read_u16_be(bytes),
        }
    }

    fn encode(self, order: ByteOrder, out: &mut Vec<u8>) {
        match order {
            ByteOrder::LittleEndian => out.extend_from_slice(&self.to_le_bytes()),
            ByteOrder::BigEndian => out.extend_from_slice(&self.to_be_bytes()),
        }
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}

impl Sample for f32 {
    const TYPE: SampleType = SampleType::Gray32;

    fn decode(bytes: &[u8], order: ByteOrder) -> Self {
        match order {
            ByteOrder::LittleEndian => read_f32_le(bytes),
            ByteOrder::BigEndian => read_f32_be(bytes),
        }
    }

    fn encode(self, order: ByteOrder, out: &mut Vec<u8>) {
        match order {
            ByteOrder::LittleEndian => out.extend_from_slice(&self.to_le_bytes()),
            ByteOrder::BigEndian => out.extend_from_slice(&self.to_be_bytes()),
        }
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}

/// Decode a whole plane of raw bytes into samples.
pub fn decode_plane<T: Sample>(bytes: &[u8], order: ByteOrder) -> Vec<T> {
    bytes
        .chunks_exact(T::TYPE.bytes_per_sample())
        .map(|chunk| T::decode(chunk, order))
        .collect()
}

/// Encode samples into raw plane bytes.
pub fn encode_plane<T: Sample>(samples: &[T], order: ByteOrder) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * T::TYPE.bytes_per_sample());
    for &sample in samples {
        sample.encode(order, &mut out);
    }
    out
}
