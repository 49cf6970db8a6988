//! Export manifest.
//!
//! Every exported dataset carries a `manifest.json` next to its view
//! directories:
//!
//! ```text
//! out/
//! ├── manifest.json
//! ├── t0000_c00/
//! │   ├── z0000.png
//! │   └── z0001.png
//! └── t0000_c01/
//!     └── ...
//! ```

use std::collections::HashSet;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::convert::{IntensityRange, RangeMode, ViewKey};
use crate::error::ExportError;
use crate::stack::{SampleType, VoxelSize};

/// File name of the manifest inside a dataset directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Current manifest format version.
pub const MANIFEST_VERSION: u32 = 1;

/// One exported view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewEntry {
    pub timepoint: usize,
    pub channel: usize,
    /// View directory, relative to the dataset root
    pub directory: String,
}

/// Description of an exported dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportManifest {
    pub version: u32,
    pub name: String,
    pub source_sample_type: SampleType,
    pub width: usize,
    pub height: usize,
    pub depth: usize,
    pub timepoints: usize,
    pub channels: usize,
    /// Voxel calibration of the source stack
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voxel_size: Option<VoxelSize>,
    pub intensity_range: IntensityRange,
    pub range_mode: RangeMode,
    pub views: Vec<ViewEntry>,
}

impl ExportManifest {
    /// Read a manifest from a dataset directory.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ExportError> {
        let json = std::fs::read_to_string(dir.as_ref().join(MANIFEST_FILE))?;
        let manifest: ExportManifest = serde_json::from_str(&json)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Write the manifest into a dataset directory.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<(), ExportError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(dir.as_ref().join(MANIFEST_FILE), json)?;
        Ok(())
    }

    /// Check the manifest is self-consistent.
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.version != MANIFEST_VERSION {
            return Err(ExportError::InvalidDataset(format!(
                "unsupported manifest version {}",
                self.version
            )));
        }
        if self.width == 0
            || self.height == 0
            || self.depth == 0
            || self.timepoints == 0
            || self.channels == 0
        {
            return Err(ExportError::InvalidDataset(
                "manifest has an empty dimension".to_string(),
            ));
        }
        if self.views.len() != self.timepoints * self.channels {
            return Err(ExportError::InvalidDataset(format!(
                "expected {} views, manifest lists {}",
                self.timepoints * self.channels,
                self.views.len()
            )));
        }

        let mut seen = HashSet::with_capacity(self.views.len());
        for entry in &self.views {
            if entry.timepoint >= self.timepoints || entry.channel >= self.channels {
                return Err(ExportError::InvalidDataset(format!(
                    "view entry for timepoint {}, channel {} is outside the dataset",
                    entry.timepoint, entry.channel
                )));
            }
            if !seen.insert((entry.timepoint, entry.channel)) {
                return Err(ExportError::InvalidDataset(format!(
                    "duplicate view entry for timepoint {}, channel {}",
                    entry.timepoint, entry.channel
                )));
            }
            if !is_plain_relative(&entry.directory) {
                return Err(ExportError::InvalidDataset(format!(
                    "view directory {:?} must be a relative path inside the dataset",
                    entry.directory
                )));
            }
        }

        if let Some(voxel_size) = &self.voxel_size {
            if !voxel_size.is_valid() {
                return Err(ExportError::InvalidDataset(
                    "voxel size extents must be finite and positive".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Look up the entry for a view.
    pub fn find_view(&self, key: ViewKey) -> Option<&ViewEntry> {
        self.views
            .iter()
            .find(|v| v.timepoint == key.timepoint && v.channel == key.channel)
    }
}

/// Non-empty relative path made only of normal components.
fn is_plain_relative(path: &str) -> bool {
    let path = Path::new(path);
    path.components().next().is_some()
        && path.components().all(|c| matches!(c, Component::Normal(_)))
}

/// Directory name of a view inside a dataset.
pub fn view_dir_name(key: ViewKey) -> String {
    format!("t{:04}_c{:02}", key.timepoint, key.channel)
}

/// File name of a plane inside a view directory.
pub fn plane_file_name(z: usize) -> String {
    format!("z{:04}.png", z)
}
