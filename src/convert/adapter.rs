//! The image-conversion adapter.
//!
//! Wraps an [`ImageStack`] and serves each (timepoint, channel) view as an
//! unsigned 16-bit volume, rescaled with one intensity range shared by all
//! views. The range is resolved once, when the adapter is built.
//!
//! # Memory
//!
//! The underlying plane cache is cleared after every view of the global
//! scan and before every [`ImageConversionAdapter::get_view`] call, so at
//! most one view's planes are held at a time. Repeated requests for the same
//! view re-read its planes from the stack.

use std::path::Path;

use ndarray::Array3;
use tracing::{debug, info, warn};

use super::converter::UnsignedShortConverter;
use super::range::{IntensityRange, RangeMode};
use crate::error::{LoaderError, StackError};
use crate::stack::{
    CacheScope, ImageStack, PlaneCache, SampleType, VirtualStackLoader, VoxelSize,
};

// =============================================================================
// View Key
// =============================================================================

/// Identifies one 3D volume of a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewKey {
    pub timepoint: usize,
    pub channel: usize,
}

impl ViewKey {
    pub fn new(timepoint: usize, channel: usize) -> Self {
        Self { timepoint, channel }
    }

    /// Every key of a stack, timepoint-major.
    pub fn all(timepoints: usize, channels: usize) -> impl Iterator<Item = ViewKey> {
        (0..timepoints).flat_map(move |t| (0..channels).map(move |c| ViewKey::new(t, c)))
    }
}

// =============================================================================
// Typed Loader
// =============================================================================

/// One loader per supported source sample type.
enum TypedLoader<S> {
    Gray8(VirtualStackLoader<u8, S>),
    Gray16(VirtualStackLoader<u16, S>),
    Gray32(VirtualStackLoader<f32, S>),
}

macro_rules! with_loader {
    ($typed:expr, $loader:ident => $body:expr) => {
        match $typed {
            TypedLoader::Gray8($loader) => $body,
            TypedLoader::Gray16($loader) => $body,
            TypedLoader::Gray32($loader) => $body,
        }
    };
}

impl<S: ImageStack> TypedLoader<S> {
    fn new(stack: S, sample_type: SampleType, cache: PlaneCache) -> Result<Self, StackError> {
        Ok(match sample_type {
            SampleType::Gray8 => TypedLoader::Gray8(VirtualStackLoader::with_cache(stack, cache)?),
            SampleType::Gray16 => {
                TypedLoader::Gray16(VirtualStackLoader::with_cache(stack, cache)?)
            }
            SampleType::Gray32 => {
                TypedLoader::Gray32(VirtualStackLoader::with_cache(stack, cache)?)
            }
        })
    }

    fn stack(&self) -> &S {
        with_loader!(self, loader => loader.stack())
    }

    fn cache(&self) -> &PlaneCache {
        with_loader!(self, loader => loader.cache())
    }

    fn sample_type(&self) -> SampleType {
        with_loader!(self, loader => loader.image_type())
    }

    /// Local min/max of one view.
    fn view_range(&self, key: ViewKey) -> Result<IntensityRange, StackError> {
        with_loader!(self, loader => {
            let view = loader.get_view(key.timepoint, key.channel)?;
            Ok(IntensityRange::of_samples(view.iter()))
        })
    }

    fn convert_view(
        &self,
        key: ViewKey,
        converter: &UnsignedShortConverter,
    ) -> Result<Array3<u16>, StackError> {
        with_loader!(self, loader => {
            let view = loader.get_view(key.timepoint, key.channel)?;
            Ok(converter.convert_volume(&view))
        })
    }
}

// =============================================================================
// Adapter
// =============================================================================

/// Serves the views of a stack as unsigned 16-bit volumes.
///
/// # Example
///
/// ```
/// use ndarray::Array3;
/// use stack_export::convert::{ImageConversionAdapter, RangeMode};
/// use stack_export::stack::MemoryStack;
///
/// let t0 = Array3::from_elem((1, 2, 2), 10u16);
/// let t1 = Array3::from_elem((1, 2, 2), 1000u16);
/// let stack = MemoryStack::from_volumes("demo", 1, vec![t0, t1]).unwrap();
///
/// let adapter = ImageConversionAdapter::create_gray16(stack, RangeMode::ComputeGlobal).unwrap();
/// assert_eq!(adapter.intensity_range().min, 10.0);
/// assert_eq!(adapter.intensity_range().max, 1000.0);
///
/// let view = adapter.get_view(1, 0).unwrap();
/// assert!(view.iter().all(|&v| v == 65535));
/// ```
pub struct ImageConversionAdapter<S> {
    loader: TypedLoader<S>,
    range: IntensityRange,
    mode: RangeMode,
}

impl<S: ImageStack> ImageConversionAdapter<S> {
    /// Adapter for a stack of 8-bit samples.
    pub fn create_gray8(stack: S, mode: RangeMode) -> Result<Self, LoaderError> {
        Self::create(stack, SampleType::Gray8, mode, PlaneCache::new())
    }

    /// Adapter for a stack of 16-bit samples.
    pub fn create_gray16(stack: S, mode: RangeMode) -> Result<Self, LoaderError> {
        Self::create(stack, SampleType::Gray16, mode, PlaneCache::new())
    }

    /// Adapter for a stack of 32-bit float samples.
    pub fn create_gray32(stack: S, mode: RangeMode) -> Result<Self, LoaderError> {
        Self::create(stack, SampleType::Gray32, mode, PlaneCache::new())
    }

    /// Adapter whose variant follows the stack's declared sample type.
    pub fn from_stack(stack: S, mode: RangeMode) -> Result<Self, LoaderError> {
        Self::from_stack_with_cache(stack, mode, PlaneCache::new())
    }

    /// Like [`ImageConversionAdapter::from_stack`] with a caller-sized cache.
    pub fn from_stack_with_cache(
        stack: S,
        mode: RangeMode,
        cache: PlaneCache,
    ) -> Result<Self, LoaderError> {
        let sample_type = stack.sample_type();
        Self::create(stack, sample_type, mode, cache)
    }

    /// Validate the sample type, then resolve the intensity range.
    fn create(
        stack: S,
        expected: SampleType,
        mode: RangeMode,
        cache: PlaneCache,
    ) -> Result<Self, LoaderError> {
        let actual = stack.sample_type();
        if actual != expected {
            return Err(LoaderError::TypeMismatch { expected, actual });
        }

        let loader = TypedLoader::new(stack, expected, cache)?;
        let range = resolve_range(&loader, mode)?;

        info!(
            stack = loader.stack().identifier(),
            mode = mode.name(),
            min = range.min,
            max = range.max,
            "resolved intensity range"
        );
        if !range.is_finite() {
            warn!(
                stack = loader.stack().identifier(),
                "intensity range is not finite; converted views will be all zero"
            );
        } else if range.min > range.max {
            warn!(
                stack = loader.stack().identifier(),
                min = range.min,
                max = range.max,
                "intensity range is inverted"
            );
        }

        Ok(Self {
            loader,
            range,
            mode,
        })
    }

    /// Convert one view to unsigned 16-bit.
    ///
    /// The plane cache is cleared before loading. Fails with
    /// [`LoaderError::ViewNotFound`] for keys outside the stack.
    pub fn get_view(&self, timepoint: usize, channel: usize) -> Result<Array3<u16>, LoaderError> {
        self.loader.cache().clear();

        let converter = UnsignedShortConverter::new(self.range);
        let view = self
            .loader
            .convert_view(ViewKey::new(timepoint, channel), &converter)?;

        debug!(
            stack = self.identifier(),
            timepoint,
            channel,
            "converted view"
        );
        Ok(view)
    }

    /// Float output is not provided by this adapter.
    pub fn get_float_view(
        &self,
        _timepoint: usize,
        _channel: usize,
    ) -> Result<Array3<f32>, LoaderError> {
        Err(LoaderError::UnsupportedOperation("float view retrieval"))
    }

    /// Restoring loader state from a dataset descriptor is not supported.
    pub fn init_from_descriptor(
        &mut self,
        _descriptor: &str,
        _base_path: &Path,
    ) -> Result<(), LoaderError> {
        Err(LoaderError::UnsupportedOperation("loading loader metadata"))
    }

    /// Serializing loader state to a dataset descriptor is not supported.
    pub fn to_descriptor(&self, _base_path: &Path) -> Result<String, LoaderError> {
        Err(LoaderError::UnsupportedOperation("saving loader metadata"))
    }

    /// Global rescaling bounds, fixed at construction.
    pub fn intensity_range(&self) -> IntensityRange {
        self.range
    }

    pub fn range_mode(&self) -> RangeMode {
        self.mode
    }

    /// Sample type of the source stack.
    pub fn sample_type(&self) -> SampleType {
        self.loader.sample_type()
    }

    pub fn identifier(&self) -> &str {
        self.loader.stack().identifier()
    }

    pub fn num_timepoints(&self) -> usize {
        self.loader.stack().num_timepoints()
    }

    pub fn num_channels(&self) -> usize {
        self.loader.stack().num_channels()
    }

    /// Voxel calibration of the source stack.
    pub fn voxel_size(&self) -> Option<&VoxelSize> {
        self.loader.stack().voxel_size()
    }

    /// `(width, height, depth)` of every view.
    pub fn dimensions(&self) -> (usize, usize, usize) {
        let stack = self.loader.stack();
        (stack.width(), stack.height(), stack.depth())
    }

    /// Every view key, timepoint-major.
    pub fn view_keys(&self) -> impl Iterator<Item = ViewKey> {
        ViewKey::all(self.num_timepoints(), self.num_channels())
    }

    /// The plane cache shared by range computation and view loading.
    pub fn cache(&self) -> &PlaneCache {
        self.loader.cache()
    }

    pub fn stack(&self) -> &S {
        self.loader.stack()
    }
}

fn resolve_range<S: ImageStack>(
    loader: &TypedLoader<S>,
    mode: RangeMode,
) -> Result<IntensityRange, StackError> {
    match mode {
        RangeMode::Explicit { min, max } => Ok(IntensityRange::new(min, max)),
        RangeMode::TakeFromSourceDisplayRange => {
            let (min, max) = loader.stack().display_range();
            Ok(IntensityRange::new(min, max))
        }
        RangeMode::ComputeGlobal => compute_global_range(loader),
    }
}

/// Fold the local min/max of every view into one range.
///
/// Each view's planes are released as soon as its statistics are known.
fn compute_global_range<S: ImageStack>(
    loader: &TypedLoader<S>,
) -> Result<IntensityRange, StackError> {
    let stack = loader.stack();
    ViewKey::all(stack.num_timepoints(), stack.num_channels()).try_fold(
        IntensityRange::EMPTY,
        |global, key| {
            let _scope = CacheScope::new(loader.cache());
            let local = loader.view_range(key)?;
            debug!(
                stack = stack.identifier(),
                timepoint = key.timepoint,
                channel = key.channel,
                min = local.min,
                max = local.max,
                "scanned view"
            );
            Ok(global.union(local))
        },
    )
}
