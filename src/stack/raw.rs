//! Raw stacks backed by a range reader.

use std::path::Path;

use bytes::Bytes;
use tracing::{debug, info};

use super::descriptor::{StackDescriptor, VoxelSize};
use super::sample::{ByteOrder, SampleType};
use super::source::ImageStack;
use crate::error::{FormatError, StackError};
use crate::io::{FileRangeReader, RangeReader};

/// An image stack whose planes are read lazily from a raw binary resource.
///
/// Nothing is read at construction beyond the resource size; each
/// [`ImageStack::read_plane`] call issues exactly one range read.
pub struct RawStack<R> {
    reader: R,
    descriptor: StackDescriptor,
    name: String,
}

impl RawStack<FileRangeReader> {
    /// Open a raw stack from its JSON descriptor file.
    pub fn open(descriptor_path: impl AsRef<Path>) -> Result<Self, FormatError> {
        let descriptor = StackDescriptor::load(descriptor_path.as_ref())?;
        let reader = FileRangeReader::open(&descriptor.data_file)?;
        Self::new(reader, descriptor)
    }
}

impl<R: RangeReader> RawStack<R> {
    /// Wrap a reader using the given layout.
    ///
    /// Fails if the descriptor is invalid or the resource is too small to
    /// hold every plane.
    pub fn new(reader: R, descriptor: StackDescriptor) -> Result<Self, FormatError> {
        descriptor.validate()?;

        let required = descriptor
            .required_data_size()
            .ok_or_else(|| FormatError::InvalidField {
                field: "width",
                message: "stack size overflows".to_string(),
            })?;
        let actual = reader.size();
        if actual < required {
            return Err(FormatError::DataFileTooSmall { required, actual });
        }

        let name = descriptor.display_name();
        info!(
            stack = %name,
            width = descriptor.width,
            height = descriptor.height,
            depth = descriptor.depth,
            channels = descriptor.channels,
            timepoints = descriptor.timepoints,
            sample_type = %descriptor.sample_type,
            "opened raw stack"
        );

        Ok(Self {
            reader,
            descriptor,
            name,
        })
    }

    pub fn descriptor(&self) -> &StackDescriptor {
        &self.descriptor
    }

    /// Identifier of the underlying resource.
    pub fn source_identifier(&self) -> &str {
        self.reader.identifier()
    }
}

impl<R: RangeReader> ImageStack for RawStack<R> {
    fn identifier(&self) -> &str {
        &self.name
    }

    fn sample_type(&self) -> SampleType {
        self.descriptor.sample_type
    }

    fn byte_order(&self) -> ByteOrder {
        self.descriptor.byte_order
    }

    fn display_range(&self) -> (f64, f64) {
        self.descriptor.display_range_or_default()
    }

    fn voxel_size(&self) -> Option<&VoxelSize> {
        self.descriptor.voxel_size.as_ref()
    }

    fn width(&self) -> usize {
        self.descriptor.width
    }

    fn height(&self) -> usize {
        self.descriptor.height
    }

    fn depth(&self) -> usize {
        self.descriptor.depth
    }

    fn num_channels(&self) -> usize {
        self.descriptor.channels
    }

    fn num_timepoints(&self) -> usize {
        self.descriptor.timepoints
    }

    fn read_plane(&self, timepoint: usize, channel: usize, z: usize) -> Result<Bytes, StackError> {
        self.check_plane(timepoint, channel, z)?;

        let plane_bytes = self.plane_bytes();
        let index = self.plane_index(timepoint, channel, z);
        let offset = self.descriptor.header_offset + (index as u64) * (plane_bytes as u64);

        debug!(
            stack = %self.name,
            timepoint, channel, z, offset,
            "reading plane"
        );

        Ok(self.reader.read_exact_at(offset, plane_bytes)?)
    }
}
