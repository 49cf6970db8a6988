//! 16-bit PNG plane encoder.
//!
//! Exported planes are stored as single-channel 16-bit PNG files, which
//! keep every `u16` value exactly and can be opened by common image tools.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, ImageFormat};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::ExportError;

/// PNG compression effort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PngCompression {
    Fast,
    #[default]
    Default,
    Best,
}

impl From<PngCompression> for CompressionType {
    fn from(value: PngCompression) -> Self {
        match value {
            PngCompression::Fast => CompressionType::Fast,
            PngCompression::Default => CompressionType::Default,
            PngCompression::Best => CompressionType::Best,
        }
    }
}

/// Encodes `u16` planes as grayscale PNG and decodes them back.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngPlaneEncoder {
    compression: PngCompression,
}

impl PngPlaneEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compression(compression: PngCompression) -> Self {
        Self { compression }
    }

    /// Encode a plane of shape `(height, width)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the plane is too large for PNG or encoding fails.
    pub fn encode(&self, plane: ArrayView2<'_, u16>) -> Result<Bytes, ExportError> {
        let (height, width) = plane.dim();
        let (width, height) = (
            u32::try_from(width).map_err(|_| ExportError::Encode("plane too wide".into()))?,
            u32::try_from(height).map_err(|_| ExportError::Encode("plane too tall".into()))?,
        );

        // The encoder takes 16-bit samples as native-endian bytes
        let raw: Vec<u8> = plane.iter().flat_map(|v| v.to_ne_bytes()).collect();

        let mut output = Vec::new();
        PngEncoder::new_with_quality(&mut output, self.compression.into(), FilterType::Adaptive)
            .write_image(&raw, width, height, ExtendedColorType::L16)
            .map_err(|e| ExportError::Encode(format!("Failed to encode PNG: {}", e)))?;

        Ok(Bytes::from(output))
    }

    /// Decode a PNG plane into shape `(height, width)`.
    ///
    /// 8-bit PNGs are widened to 16 bits by the decoder.
    pub fn decode(&self, data: &[u8]) -> Result<Array2<u16>, ExportError> {
        let image = image::ImageReader::with_format(Cursor::new(data), ImageFormat::Png)
            .decode()
            .map_err(|e| ExportError::Encode(format!("Failed to decode PNG: {}", e)))?
            .into_luma16();

        let (width, height) = image.dimensions();
        Array2::from_shape_vec((height as usize, width as usize), image.into_raw())
            .map_err(|e| ExportError::Encode(e.to_string()))
    }
}
