//! Reading views back from an exported dataset.

use std::path::{Path, PathBuf};

use ndarray::{Array3, Axis};
use tracing::debug;

use super::encoder::PngPlaneEncoder;
use super::manifest::{plane_file_name, ExportManifest};
use crate::convert::ViewKey;
use crate::error::ExportError;
use crate::stack::VoxelSize;

/// A view read from a dataset, with the key it was actually read from.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedView {
    pub key: ViewKey,
    /// Volume of shape `(depth, height, width)`
    pub volume: Array3<u16>,
    /// Calibration recorded at export
    pub voxel_size: Option<VoxelSize>,
}

/// An exported dataset opened for reading.
#[derive(Debug, Clone)]
pub struct ExportedDataset {
    root: PathBuf,
    manifest: ExportManifest,
    encoder: PngPlaneEncoder,
}

impl ExportedDataset {
    /// Open a dataset directory and validate its manifest.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, ExportError> {
        let root = root.as_ref().to_path_buf();
        let manifest = ExportManifest::load(&root)?;
        Ok(Self {
            root,
            manifest,
            encoder: PngPlaneEncoder::new(),
        })
    }

    pub fn manifest(&self) -> &ExportManifest {
        &self.manifest
    }

    /// Clamp indices into the dataset's timepoint and channel ranges.
    pub fn clamp_key(&self, timepoint: usize, channel: usize) -> ViewKey {
        ViewKey::new(
            timepoint.min(self.manifest.timepoints - 1),
            channel.min(self.manifest.channels - 1),
        )
    }

    /// Read one view; out-of-range indices select the nearest view.
    pub fn read_view(&self, timepoint: usize, channel: usize) -> Result<ImportedView, ExportError> {
        let key = self.clamp_key(timepoint, channel);
        let entry = self.manifest.find_view(key).ok_or_else(|| {
            ExportError::InvalidDataset(format!(
                "manifest has no entry for timepoint {}, channel {}",
                key.timepoint, key.channel
            ))
        })?;

        let (width, height, depth) = (
            self.manifest.width,
            self.manifest.height,
            self.manifest.depth,
        );
        let view_path = self.root.join(&entry.directory);
        let mut volume = Array3::<u16>::zeros((depth, height, width));

        for (z, mut slot) in volume.axis_iter_mut(Axis(0)).enumerate() {
            let path = view_path.join(plane_file_name(z));
            let data = std::fs::read(&path)?;
            let plane = self.encoder.decode(&data)?;
            if plane.dim() != (height, width) {
                return Err(ExportError::InvalidDataset(format!(
                    "{} has shape {:?}, expected {:?}",
                    path.display(),
                    plane.dim(),
                    (height, width)
                )));
            }
            slot.assign(&plane);
        }

        debug!(
            dataset = %self.root.display(),
            timepoint = key.timepoint,
            channel = key.channel,
            "read view"
        );

        Ok(ImportedView {
            key,
            volume,
            voxel_size: self.manifest.voxel_size.clone(),
        })
    }
}
