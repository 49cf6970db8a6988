//! In-memory image stacks.

use bytes::Bytes;
use ndarray::{Array3, Axis};

use super::descriptor::VoxelSize;
use super::sample::{encode_plane, ByteOrder, Sample, SampleType};
use super::source::ImageStack;
use crate::error::StackError;

/// An image stack whose planes are held in memory.
///
/// Useful for stacks produced programmatically and for tests. Planes are
/// stored encoded, exactly as a raw file would hold them.
#[derive(Debug, Clone)]
pub struct MemoryStack {
    name: String,
    sample_type: SampleType,
    byte_order: ByteOrder,
    display_range: (f64, f64),
    voxel_size: Option<VoxelSize>,
    width: usize,
    height: usize,
    depth: usize,
    channels: usize,
    timepoints: usize,
    planes: Vec<Bytes>,
}

impl MemoryStack {
    /// Build a stack from one volume per view.
    ///
    /// `volumes` is timepoint-major: `volumes[t * channels + c]` is the view
    /// at timepoint `t`, channel `c`. Each volume has shape
    /// `(depth, height, width)` and all shapes must agree.
    pub fn from_volumes<T: Sample>(
        name: impl Into<String>,
        channels: usize,
        volumes: Vec<Array3<T>>,
    ) -> Result<Self, StackError> {
        if channels == 0 {
            return Err(StackError::InvalidShape(
                "channel count must be greater than 0".to_string(),
            ));
        }
        let first = volumes
            .first()
            .ok_or_else(|| StackError::InvalidShape("no volumes given".to_string()))?;
        let (depth, height, width) = first.dim();
        if depth == 0 || height == 0 || width == 0 {
            return Err(StackError::InvalidShape(format!(
                "empty volume shape {:?}",
                first.dim()
            )));
        }
        if volumes.len() % channels != 0 {
            return Err(StackError::InvalidShape(format!(
                "{} volumes cannot be split into {} channels",
                volumes.len(),
                channels
            )));
        }
        if let Some(other) = volumes.iter().find(|v| v.dim() != first.dim()) {
            return Err(StackError::InvalidShape(format!(
                "volume shape {:?} differs from {:?}",
                other.dim(),
                first.dim()
            )));
        }

        let timepoints = volumes.len() / channels;
        let byte_order = ByteOrder::LittleEndian;
        let mut planes = Vec::with_capacity(volumes.len() * depth);
        for t in 0..timepoints {
            for z in 0..depth {
                for c in 0..channels {
                    let plane: Vec<T> = volumes[t * channels + c]
                        .index_axis(Axis(0), z)
                        .iter()
                        .copied()
                        .collect();
                    planes.push(Bytes::from(encode_plane(&plane, byte_order)));
                }
            }
        }

        Ok(Self {
            name: name.into(),
            sample_type: T::TYPE,
            byte_order,
            display_range: T::TYPE.default_display_range(),
            voxel_size: None,
            width,
            height,
            depth,
            channels,
            timepoints,
            planes,
        })
    }

    /// Set the display range reported by the stack.
    pub fn with_display_range(mut self, min: f64, max: f64) -> Self {
        self.display_range = (min, max);
        self
    }

    pub fn with_voxel_size(mut self, voxel_size: VoxelSize) -> Self {
        self.voxel_size = Some(voxel_size);
        self
    }
}

impl ImageStack for MemoryStack {
    fn identifier(&self) -> &str {
        &self.name
    }

    fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    fn display_range(&self) -> (f64, f64) {
        self.display_range
    }

    fn voxel_size(&self) -> Option<&VoxelSize> {
        self.voxel_size.as_ref()
    }

    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn num_channels(&self) -> usize {
        self.channels
    }

    fn num_timepoints(&self) -> usize {
        self.timepoints
    }

    fn read_plane(&self, timepoint: usize, channel: usize, z: usize) -> Result<Bytes, StackError> {
        self.check_plane(timepoint, channel, z)?;
        Ok(self.planes[self.plane_index(timepoint, channel, z)].clone())
    }
}
