//! Writes every view of a conversion adapter to disk.

use std::fs;
use std::path::Path;

use ndarray::Axis;
use tracing::{debug, info};

use super::encoder::{PngCompression, PngPlaneEncoder};
use super::manifest::{
    plane_file_name, view_dir_name, ExportManifest, ViewEntry, MANIFEST_FILE, MANIFEST_VERSION,
};
use crate::convert::{ImageConversionAdapter, IntensityRange};
use crate::error::ExportError;
use crate::stack::ImageStack;

/// Options controlling an export.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Replace an existing dataset in the output directory
    pub overwrite: bool,

    pub compression: PngCompression,
}

/// What an export produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub views: usize,
    pub planes: usize,
    pub bytes_written: u64,
    pub intensity_range: IntensityRange,
}

/// Exports converted views as 16-bit PNG planes plus a manifest.
///
/// Views are written in timepoint-major order. The manifest is written last,
/// so a directory without `manifest.json` is an incomplete export.
#[derive(Debug, Clone, Default)]
pub struct StackExporter {
    encoder: PngPlaneEncoder,
    options: ExportOptions,
}

impl StackExporter {
    pub fn new(options: ExportOptions) -> Self {
        Self {
            encoder: PngPlaneEncoder::with_compression(options.compression),
            options,
        }
    }

    /// Export every view of `adapter` into `output`.
    pub fn export<S: ImageStack>(
        &self,
        adapter: &ImageConversionAdapter<S>,
        output: &Path,
    ) -> Result<ExportSummary, ExportError> {
        if output.join(MANIFEST_FILE).exists() && !self.options.overwrite {
            return Err(ExportError::OutputExists(output.display().to_string()));
        }
        let range = adapter.intensity_range();
        if !range.is_finite() {
            return Err(ExportError::NonFiniteRange {
                min: range.min,
                max: range.max,
            });
        }
        fs::create_dir_all(output)?;

        let (width, height, depth) = adapter.dimensions();
        let total_views = adapter.num_timepoints() * adapter.num_channels();

        info!(
            stack = adapter.identifier(),
            output = %output.display(),
            views = total_views,
            "starting export"
        );

        let mut views = Vec::with_capacity(total_views);
        let mut planes = 0;
        let mut bytes_written = 0u64;

        for (index, key) in adapter.view_keys().enumerate() {
            let directory = view_dir_name(key);
            let view_path = output.join(&directory);
            fs::create_dir_all(&view_path)?;

            let volume = adapter.get_view(key.timepoint, key.channel)?;
            for (z, plane) in volume.axis_iter(Axis(0)).enumerate() {
                let encoded = self.encoder.encode(plane)?;
                fs::write(view_path.join(plane_file_name(z)), &encoded)?;
                bytes_written += encoded.len() as u64;
                planes += 1;
            }

            debug!(
                timepoint = key.timepoint,
                channel = key.channel,
                "wrote view"
            );
            info!(
                "exported view {}/{} (timepoint {}, channel {})",
                index + 1,
                total_views,
                key.timepoint,
                key.channel
            );

            views.push(ViewEntry {
                timepoint: key.timepoint,
                channel: key.channel,
                directory,
            });
        }

        let manifest = ExportManifest {
            version: MANIFEST_VERSION,
            name: adapter.identifier().to_string(),
            source_sample_type: adapter.sample_type(),
            width,
            height,
            depth,
            timepoints: adapter.num_timepoints(),
            channels: adapter.num_channels(),
            voxel_size: adapter.voxel_size().cloned(),
            intensity_range: adapter.intensity_range(),
            range_mode: adapter.range_mode(),
            views,
        };
        manifest.save(output)?;

        info!(
            views = total_views,
            planes,
            bytes_written,
            "export complete"
        );

        Ok(ExportSummary {
            views: total_views,
            planes,
            bytes_written,
            intensity_range: adapter.intensity_range(),
        })
    }
}
