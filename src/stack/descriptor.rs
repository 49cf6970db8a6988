//! JSON descriptor for raw stacks on disk.
//!
//! A raw stack is a headerless binary file holding every plane back to back
//! in hyperstack order, next to a small JSON file describing its layout:
//!
//! ```json
//! {
//!   "name": "embryo",
//!   "width": 512,
//!   "height": 512,
//!   "depth": 40,
//!   "channels": 2,
//!   "timepoints": 10,
//!   "sample_type": "gray16",
//!   "byte_order": "big_endian",
//!   "data_file": "embryo.raw",
//!   "display_range": [100.0, 3000.0],
//!   "voxel_size": { "unit": "µm", "x": 0.4, "y": 0.4, "z": 2.0 }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::sample::{ByteOrder, SampleType};
use crate::error::{FormatError, IoError};

fn one() -> usize {
    1
}

fn default_unit() -> String {
    "pixel".to_string()
}

/// Physical size of one voxel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoxelSize {
    #[serde(default = "default_unit")]
    pub unit: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl VoxelSize {
    pub fn new(unit: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            unit: unit.into(),
            x,
            y,
            z,
        }
    }

    /// Whether every extent is finite and positive.
    pub fn is_valid(&self) -> bool {
        [self.x, self.y, self.z]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
    }
}

/// Layout of a raw stack file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackDescriptor {
    /// Human-readable name; defaults to the data file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub width: usize,

    pub height: usize,

    /// Number of z-planes per view
    #[serde(default = "one")]
    pub depth: usize,

    #[serde(default = "one")]
    pub channels: usize,

    #[serde(default = "one")]
    pub timepoints: usize,

    pub sample_type: SampleType,

    #[serde(default)]
    pub byte_order: ByteOrder,

    /// Raw data file, relative to the descriptor's directory unless absolute
    pub data_file: PathBuf,

    /// Bytes to skip at the start of the data file
    #[serde(default)]
    pub header_offset: u64,

    /// Display range `[min, max]`; the sample type's full range when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_range: Option<[f64; 2]>,

    /// Voxel calibration; uncalibrated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voxel_size: Option<VoxelSize>,
}

impl StackDescriptor {
    /// Parse a descriptor from JSON text and validate it.
    pub fn from_json(json: &str) -> Result<Self, FormatError> {
        let descriptor: StackDescriptor =
            serde_json::from_str(json).map_err(|e| FormatError::InvalidDescriptor(e.to_string()))?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Read and validate a descriptor file.
    ///
    /// A relative `data_file` is resolved against the descriptor's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(IoError::from)?;
        let mut descriptor = Self::from_json(&json)?;

        if descriptor.data_file.is_relative() {
            if let Some(dir) = path.parent() {
                descriptor.data_file = dir.join(&descriptor.data_file);
            }
        }

        Ok(descriptor)
    }

    /// Check that every dimension is usable and the display range is sane.
    pub fn validate(&self) -> Result<(), FormatError> {
        let dimensions = [
            ("width", self.width),
            ("height", self.height),
            ("depth", self.depth),
            ("channels", self.channels),
            ("timepoints", self.timepoints),
        ];
        for (field, value) in dimensions {
            if value == 0 {
                return Err(FormatError::InvalidField {
                    field,
                    message: "must be greater than 0".to_string(),
                });
            }
        }

        if self.required_data_size().is_none() {
            return Err(FormatError::InvalidField {
                field: "width",
                message: "stack size overflows".to_string(),
            });
        }

        if let Some([min, max]) = self.display_range {
            if !min.is_finite() || !max.is_finite() {
                return Err(FormatError::InvalidField {
                    field: "display_range",
                    message: "bounds must be finite".to_string(),
                });
            }
            if min > max {
                return Err(FormatError::InvalidField {
                    field: "display_range",
                    message: format!("min {} is greater than max {}", min, max),
                });
            }
        }

        if let Some(voxel_size) = &self.voxel_size {
            if !voxel_size.is_valid() {
                return Err(FormatError::InvalidField {
                    field: "voxel_size",
                    message: format!(
                        "extents must be finite and positive, got {} x {} x {}",
                        voxel_size.x, voxel_size.y, voxel_size.z
                    ),
                });
            }
        }

        Ok(())
    }

    /// Number of bytes in one plane.
    pub fn plane_bytes(&self) -> usize {
        self.width * self.height * self.sample_type.bytes_per_sample()
    }

    /// Number of planes in the whole stack.
    pub fn num_planes(&self) -> usize {
        self.depth * self.channels * self.timepoints
    }

    /// Minimum data file size, including the header offset.
    ///
    /// Returns `None` if the size does not fit in a `u64`.
    pub fn required_data_size(&self) -> Option<u64> {
        (self.width as u64)
            .checked_mul(self.height as u64)?
            .checked_mul(self.sample_type.bytes_per_sample() as u64)?
            .checked_mul(self.depth as u64)?
            .checked_mul(self.channels as u64)?
            .checked_mul(self.timepoints as u64)?
            .checked_add(self.header_offset)
    }

    /// Configured display range, or the sample type's default.
    pub fn display_range_or_default(&self) -> (f64, f64) {
        match self.display_range {
            Some([min, max]) => (min, max),
            None => self.sample_type.default_display_range(),
        }
    }

    /// Name for logs and manifests.
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.data_file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "stack".to_string())
        })
    }
}
