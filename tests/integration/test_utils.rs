//! Test utilities for integration tests.
//!
//! This module provides a stack that counts plane reads, scratch directories
//! and helpers for writing raw stacks to disk.

use bytes::Bytes;
use ndarray::Array3;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use stack_export::error::{IoError, StackError};
use stack_export::stack::{
    ByteOrder, ImageStack, MemoryStack, PlaneCache, Sample, SampleType, VoxelSize,
};

// =============================================================================
// Stack with Read Tracking
// =============================================================================

/// Wraps a [`MemoryStack`] and counts every plane read.
///
/// Optionally records the length of a watched [`PlaneCache`] at each read,
/// and fails the read of one plane.
pub struct TrackingStack {
    inner: MemoryStack,
    reads: Arc<AtomicUsize>,
    cache_sizes: Arc<Mutex<Vec<usize>>>,
    watched: Option<PlaneCache>,
    failing_plane: Option<(usize, usize, usize)>,
}

impl TrackingStack {
    pub fn new(inner: MemoryStack) -> Self {
        Self {
            inner,
            reads: Arc::new(AtomicUsize::new(0)),
            cache_sizes: Arc::new(Mutex::new(Vec::new())),
            watched: None,
            failing_plane: None,
        }
    }

    /// Record `cache.len()` before every plane read.
    pub fn watch_cache(mut self, cache: &PlaneCache) -> Self {
        self.watched = Some(cache.clone());
        self
    }

    /// Make every read of plane `(timepoint, channel, z)` fail.
    pub fn fail_on_plane(mut self, timepoint: usize, channel: usize, z: usize) -> Self {
        self.failing_plane = Some((timepoint, channel, z));
        self
    }

    /// Shared handle to the read counter, usable after the stack is moved.
    pub fn counter(&self) -> ReadCounter {
        ReadCounter {
            reads: Arc::clone(&self.reads),
            cache_sizes: Arc::clone(&self.cache_sizes),
        }
    }
}

#[derive(Clone)]
pub struct ReadCounter {
    reads: Arc<AtomicUsize>,
    cache_sizes: Arc<Mutex<Vec<usize>>>,
}

impl ReadCounter {
    pub fn get(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Watched cache length observed at each read, in read order.
    pub fn cache_sizes(&self) -> Vec<usize> {
        self.cache_sizes.lock().clone()
    }
}

impl ImageStack for TrackingStack {
    fn identifier(&self) -> &str {
        self.inner.identifier()
    }

    fn sample_type(&self) -> SampleType {
        self.inner.sample_type()
    }

    fn byte_order(&self) -> ByteOrder {
        self.inner.byte_order()
    }

    fn display_range(&self) -> (f64, f64) {
        self.inner.display_range()
    }

    fn voxel_size(&self) -> Option<&VoxelSize> {
        self.inner.voxel_size()
    }

    fn width(&self) -> usize {
        self.inner.width()
    }

    fn height(&self) -> usize {
        self.inner.height()
    }

    fn depth(&self) -> usize {
        self.inner.depth()
    }

    fn num_channels(&self) -> usize {
        self.inner.num_channels()
    }

    fn num_timepoints(&self) -> usize {
        self.inner.num_timepoints()
    }

    fn read_plane(&self, timepoint: usize, channel: usize, z: usize) -> Result<Bytes, StackError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(cache) = &self.watched {
            self.cache_sizes.lock().push(cache.len());
        }
        if self.failing_plane == Some((timepoint, channel, z)) {
            return Err(StackError::Io(IoError::Io(format!(
                "unreadable plane {} of timepoint {}, channel {}",
                z, timepoint, channel
            ))));
        }
        self.inner.read_plane(timepoint, channel, z)
    }
}

// =============================================================================
// Volumes
// =============================================================================

/// Build a `(depth, height, width)` volume from a function of `(z, y, x)`.
pub fn volume<T, F>(depth: usize, height: usize, width: usize, f: F) -> Array3<T>
where
    F: FnMut((usize, usize, usize)) -> T,
{
    Array3::from_shape_fn((depth, height, width), f)
}

/// Two-timepoint, one-channel 16-bit stack with values in `[10, 1000]`.
///
/// Timepoint 0 holds 10 everywhere except `(0, 0, 0) = 500`; timepoint 1
/// holds 1000 everywhere except `(1, 1, 1) = 20`.
pub fn two_timepoint_stack() -> MemoryStack {
    let t0 = volume(2, 2, 2, |idx| if idx == (0, 0, 0) { 500u16 } else { 10 });
    let t1 = volume(2, 2, 2, |idx| if idx == (1, 1, 1) { 20u16 } else { 1000 });
    MemoryStack::from_volumes("two-timepoints", 1, vec![t0, t1]).unwrap()
}

// =============================================================================
// Scratch Directories
// =============================================================================

/// A scratch directory removed on drop.
pub struct TestDir {
    path: PathBuf,
}

impl TestDir {
    pub fn new(label: &str) -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let path = std::env::temp_dir().join(format!(
            "stack-export-it-{}-{}-{}",
            label,
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::SeqCst)
        ));
        let _ = std::fs::remove_dir_all(&path);
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

// =============================================================================
// Raw Stack Files
// =============================================================================

/// Encode planes back to back in the given byte order.
pub fn encode_planes<T: Sample>(planes: &[Vec<T>], order: ByteOrder) -> Vec<u8> {
    let mut data = Vec::new();
    for plane in planes {
        for &sample in plane {
            sample.encode(order, &mut data);
        }
    }
    data
}

/// Write `name.raw` and `name.json` into `dir` and return the descriptor path.
///
/// `descriptor` is the JSON object body without `data_file`.
pub fn write_raw_stack(dir: &Path, name: &str, descriptor: &str, data: &[u8]) -> PathBuf {
    let data_file = format!("{}.raw", name);
    std::fs::write(dir.join(&data_file), data).unwrap();

    let json = format!(
        "{{ {}, \"data_file\": \"{}\" }}",
        descriptor.trim().trim_start_matches('{').trim_end_matches('}'),
        data_file
    );
    let descriptor_path = dir.join(format!("{}.json", name));
    std::fs::write(&descriptor_path, json).unwrap();
    descriptor_path
}
