//! The `ImageStack` trait for plane-addressable image stacks.
//!
//! An image stack is a five-dimensional dataset (x, y, z, channel, timepoint)
//! stored as 2D planes. Implementations only need to hand out raw plane
//! bytes; decoding, caching and conversion happen in the loader layers above.

use std::sync::Arc;

use bytes::Bytes;

use super::descriptor::VoxelSize;
use super::sample::{ByteOrder, SampleType};
use crate::error::StackError;

/// Source of raw planes for a multi-timepoint, multi-channel stack.
///
/// Planes are addressed in hyperstack order: channel varies fastest, then z,
/// then timepoint. See [`ImageStack::plane_index`].
pub trait ImageStack: Send + Sync {
    /// Identifier used in logs and export manifests.
    fn identifier(&self) -> &str;

    /// Declared sample type of every plane.
    fn sample_type(&self) -> SampleType;

    /// Byte order of multi-byte samples in plane data.
    fn byte_order(&self) -> ByteOrder;

    /// Currently configured display range `(min, max)`.
    fn display_range(&self) -> (f64, f64);

    /// Voxel calibration, if the stack carries one.
    fn voxel_size(&self) -> Option<&VoxelSize> {
        None
    }

    /// Plane width in pixels.
    fn width(&self) -> usize;

    /// Plane height in pixels.
    fn height(&self) -> usize;

    /// Number of z-planes per view.
    fn depth(&self) -> usize;

    fn num_channels(&self) -> usize;

    fn num_timepoints(&self) -> usize;

    /// Read the raw bytes of one plane.
    ///
    /// Fails with [`StackError::PlaneOutOfRange`] if any index is outside the
    /// stack.
    fn read_plane(&self, timepoint: usize, channel: usize, z: usize) -> Result<Bytes, StackError>;

    /// Number of samples in one plane.
    fn plane_len(&self) -> usize {
        self.width() * self.height()
    }

    /// Number of bytes in one plane.
    fn plane_bytes(&self) -> usize {
        self.plane_len() * self.sample_type().bytes_per_sample()
    }

    /// Whether `(timepoint, channel)` addresses a view of this stack.
    fn contains_view(&self, timepoint: usize, channel: usize) -> bool {
        timepoint < self.num_timepoints() && channel < self.num_channels()
    }

    /// Linear plane index in hyperstack order.
    fn plane_index(&self, timepoint: usize, channel: usize, z: usize) -> usize {
        let channels = self.num_channels();
        channel + z * channels + timepoint * channels * self.depth()
    }

    /// Validate plane coordinates.
    fn check_plane(&self, timepoint: usize, channel: usize, z: usize) -> Result<(), StackError> {
        if self.contains_view(timepoint, channel) && z < self.depth() {
            Ok(())
        } else {
            Err(StackError::PlaneOutOfRange {
                timepoint,
                channel,
                z,
            })
        }
    }
}

impl<S: ImageStack + ?Sized> ImageStack for Arc<S> {
    fn identifier(&self) -> &str {
        (**self).identifier()
    }

    fn sample_type(&self) -> SampleType {
        (**self).sample_type()
    }

    fn byte_order(&self) -> ByteOrder {
        (**self).byte_order()
    }

    fn display_range(&self) -> (f64, f64) {
        (**self).display_range()
    }

    fn voxel_size(&self) -> Option<&VoxelSize> {
        (**self).voxel_size()
    }

    fn width(&self) -> usize {
        (**self).width()
    }

    fn height(&self) -> usize {
        (**self).height()
    }

    fn depth(&self) -> usize {
        (**self).depth()
    }

    fn num_channels(&self) -> usize {
        (**self).num_channels()
    }

    fn num_timepoints(&self) -> usize {
        (**self).num_timepoints()
    }

    fn read_plane(&self, timepoint: usize, channel: usize, z: usize) -> Result<Bytes, StackError> {
        (**self).read_plane(timepoint, channel, z)
    }
}
