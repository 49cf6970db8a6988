//! Typed, cached view loading on top of an [`ImageStack`].

use std::marker::PhantomData;

use ndarray::Array3;
use tracing::trace;

use super::cache::{PlaneCache, PlaneKey};
use super::sample::{decode_plane, Sample, SampleType};
use super::source::ImageStack;
use crate::error::StackError;

/// Loads whole views of a stack as typed volumes, one plane at a time.
///
/// Raw planes go through a [`PlaneCache`]; a repeated request for a plane
/// that is still cached does not touch the stack. The cache is owned by
/// the loader and can be cleared at any time to bound memory.
///
/// # Type Parameters
///
/// * `T` - Sample type of the volumes; must match the stack's declared type
/// * `S` - The stack providing raw planes
pub struct VirtualStackLoader<T, S> {
    stack: S,
    cache: PlaneCache,
    _sample: PhantomData<fn() -> T>,
}

impl<T: Sample, S: ImageStack> VirtualStackLoader<T, S> {
    /// Create a loader with the default plane cache.
    ///
    /// Fails with [`StackError::TypeMismatch`] if `T` is not the stack's
    /// sample type.
    pub fn new(stack: S) -> Result<Self, StackError> {
        Self::with_cache(stack, PlaneCache::new())
    }

    /// Create a loader with a caller-provided plane cache.
    pub fn with_cache(stack: S, cache: PlaneCache) -> Result<Self, StackError> {
        if stack.sample_type() != T::TYPE {
            return Err(StackError::TypeMismatch {
                expected: T::TYPE,
                actual: stack.sample_type(),
            });
        }
        Ok(Self {
            stack,
            cache,
            _sample: PhantomData,
        })
    }

    /// Sample type produced by this loader.
    pub fn image_type(&self) -> SampleType {
        T::TYPE
    }

    pub fn stack(&self) -> &S {
        &self.stack
    }

    pub fn cache(&self) -> &PlaneCache {
        &self.cache
    }

    /// Load the full volume of one view.
    ///
    /// The result has shape `(depth, height, width)`. Fails with
    /// [`StackError::ViewNotFound`] if the key is outside the stack.
    pub fn get_view(&self, timepoint: usize, channel: usize) -> Result<Array3<T>, StackError> {
        if !self.stack.contains_view(timepoint, channel) {
            return Err(StackError::ViewNotFound {
                timepoint,
                channel,
                timepoints: self.stack.num_timepoints(),
                channels: self.stack.num_channels(),
            });
        }

        let (width, height, depth) = (self.stack.width(), self.stack.height(), self.stack.depth());
        let plane_bytes = self.stack.plane_bytes();
        let byte_order = self.stack.byte_order();

        let mut samples = Vec::with_capacity(width * height * depth);
        for z in 0..depth {
            let key = PlaneKey::new(timepoint, channel, z);
            let raw = match self.cache.get(&key) {
                Some(raw) => raw,
                None => {
                    let raw = self.stack.read_plane(timepoint, channel, z)?;
                    if raw.len() != plane_bytes {
                        return Err(StackError::InvalidPlaneSize {
                            expected: plane_bytes,
                            actual: raw.len(),
                        });
                    }
                    self.cache.put(key, raw.clone());
                    raw
                }
            };
            samples.extend(decode_plane::<T>(&raw, byte_order));
        }

        trace!(
            stack = self.stack.identifier(),
            timepoint,
            channel,
            planes = depth,
            "loaded view"
        );

        Array3::from_shape_vec((depth, height, width), samples)
            .map_err(|e| StackError::InvalidShape(e.to_string()))
    }
}
