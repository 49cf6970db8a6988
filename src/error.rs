use thiserror::Error;

use crate::stack::SampleType;

/// I/O errors that can occur when reading raw stack data
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Error from the underlying file system
    #[error("I/O error: {0}")]
    Io(String),

    /// Requested range exceeds resource bounds
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },

    /// File not found
    #[error("File not found: {0}")]
    NotFound(String),
}

impl From<std::io::Error> for IoError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => IoError::NotFound(err.to_string()),
            _ => IoError::Io(err.to_string()),
        }
    }
}

/// Errors related to reading and validating stack descriptors
#[derive(Debug, Clone, Error)]
pub enum FormatError {
    /// I/O error while reading the descriptor or data file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Descriptor is not valid JSON or does not match the schema
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    /// A descriptor field has an unusable value
    #[error("Invalid descriptor field {field}: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    /// The data file is too small to contain every plane
    #[error("Data file too small: need at least {required} bytes, got {actual}")]
    DataFileTooSmall { required: u64, actual: u64 },
}

/// Errors raised by image stacks and the lazy stack loader
#[derive(Debug, Clone, Error)]
pub enum StackError {
    /// I/O error while reading plane data
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Requested view does not exist in the stack
    #[error(
        "View not found: timepoint {timepoint}, channel {channel} \
         (stack has {timepoints} timepoints, {channels} channels)"
    )]
    ViewNotFound {
        timepoint: usize,
        channel: usize,
        timepoints: usize,
        channels: usize,
    },

    /// Requested plane does not exist in the stack
    #[error("Plane out of range: timepoint {timepoint}, channel {channel}, z {z}")]
    PlaneOutOfRange {
        timepoint: usize,
        channel: usize,
        z: usize,
    },

    /// Loader sample type does not match the stack
    #[error("Sample type mismatch: expected {expected}, stack is {actual}")]
    TypeMismatch {
        expected: SampleType,
        actual: SampleType,
    },

    /// Plane data has the wrong length for the stack dimensions
    #[error("Invalid plane size: expected {expected} bytes, got {actual}")]
    InvalidPlaneSize { expected: usize, actual: usize },

    /// Stack dimensions are inconsistent or empty
    #[error("Invalid stack shape: {0}")]
    InvalidShape(String),
}

/// Errors returned by the conversion adapter
#[derive(Debug, Clone, Error)]
pub enum LoaderError {
    /// Declared stack sample type disagrees with the requested variant
    #[error("Sample type mismatch: expected {expected}, stack is {actual}")]
    TypeMismatch {
        expected: SampleType,
        actual: SampleType,
    },

    /// Requested (timepoint, channel) is outside the stack
    #[error("View not found: timepoint {timepoint}, channel {channel}")]
    ViewNotFound { timepoint: usize, channel: usize },

    /// Operation is not implemented by this loader
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// Any other failure from the underlying stack
    #[error("Stack error: {0}")]
    Stack(StackError),
}

impl From<StackError> for LoaderError {
    fn from(err: StackError) -> Self {
        match err {
            StackError::ViewNotFound {
                timepoint, channel, ..
            } => LoaderError::ViewNotFound { timepoint, channel },
            StackError::TypeMismatch { expected, actual } => {
                LoaderError::TypeMismatch { expected, actual }
            }
            other => LoaderError::Stack(other),
        }
    }
}

/// Errors that can occur while writing or reading an exported dataset
#[derive(Debug, Error)]
pub enum ExportError {
    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Conversion adapter failed
    #[error("Loader error: {0}")]
    Loader(#[from] LoaderError),

    /// PNG encoding or decoding failed
    #[error("Encode error: {0}")]
    Encode(String),

    /// Manifest could not be read or written
    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    /// Dataset content does not match its manifest
    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    /// Output directory already holds an export
    #[error("Output already exists: {0}")]
    OutputExists(String),

    /// Intensity range cannot be recorded in a manifest
    #[error("Intensity range [{min}, {max}] is not finite")]
    NonFiniteRange { min: f64, max: f64 },
}
