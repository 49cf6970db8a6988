//! Export of converted stacks.
//!
//! # Components
//!
//! - [`StackExporter`]: writes every view of an
//!   [`ImageConversionAdapter`](crate::convert::ImageConversionAdapter) as
//!   16-bit PNG planes and a JSON manifest
//! - [`ExportedDataset`]: reads single views back, clamping indices into range
//! - [`PngPlaneEncoder`]: 16-bit grayscale PNG encoding of one plane
//! - [`ExportManifest`]: the dataset description

mod dataset;
mod encoder;
mod manifest;
mod writer;

pub use dataset::{ExportedDataset, ImportedView};
pub use encoder::{PngCompression, PngPlaneEncoder};
pub use manifest::{
    plane_file_name, view_dir_name, ExportManifest, ViewEntry, MANIFEST_FILE, MANIFEST_VERSION,
};
pub use writer::{ExportOptions, ExportSummary, StackExporter};
