//! # stack-export
//!
//! Converts multi-timepoint, multi-channel image stacks to unsigned 16-bit
//! volumes for export.
//!
//! Planes are loaded lazily from a raw stack through a size-bounded plane
//! cache. One intensity range, chosen explicitly, taken from the stack's
//! display range or computed over every view, rescales all 8-bit, 16-bit or
//! float samples into `0..=65535`.
//!
//! ## Architecture
//!
//! - [`io`] - Range readers over local files and memory
//! - [`stack`] - Stack abstraction, raw and in-memory stacks, cached loader
//! - [`convert`] - Intensity ranges and the conversion adapter
//! - [`export`] - PNG dataset writer and reader
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use stack_export::{ImageConversionAdapter, RangeMode, RawStack};
//!
//! let stack = RawStack::open("embryo.json").unwrap();
//! let adapter = ImageConversionAdapter::from_stack(stack, RangeMode::ComputeGlobal).unwrap();
//!
//! for key in adapter.view_keys() {
//!     let view = adapter.get_view(key.timepoint, key.channel).unwrap();
//!     println!("{:?}: {:?}", key, view.dim());
//! }
//! ```

pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod io;
pub mod stack;

// Re-export commonly used types
pub use config::{Cli, Command, ExportConfig, ImportConfig, InfoConfig, RangeModeArg};
pub use convert::{
    ImageConversionAdapter, IntensityRange, RangeMode, UnsignedShortConverter, ViewKey,
};
pub use error::{ExportError, FormatError, IoError, LoaderError, StackError};
pub use export::{
    ExportManifest, ExportOptions, ExportSummary, ExportedDataset, ImportedView, PngCompression,
    PngPlaneEncoder, StackExporter,
};
pub use io::{BytesReader, FileRangeReader, RangeReader};
pub use stack::{
    ByteOrder, ImageStack, MemoryStack, PlaneCache, PlaneKey, RawStack, Sample, SampleType,
    StackDescriptor, VirtualStackLoader, VoxelSize,
};
