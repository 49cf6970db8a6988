//! Plane cache for lazily loaded stacks.
//!
//! This module provides an LRU cache for raw plane data, so repeated access
//! to the same plane does not hit the backing store again.
//!
//! # Cache Key
//!
//! Planes are cached by a composite key:
//! - Timepoint index
//! - Channel index
//! - Z index
//!
//! # Size-Based Eviction
//!
//! The cache tracks the total size of cached planes in bytes and evicts
//! least-recently-used entries when the capacity is exceeded. Callers that
//! need a hard memory bound clear the cache explicitly between views.

use std::num::NonZeroUsize;
use std::sync::Arc;

use bytes::Bytes;
use lru::LruCache;
use parking_lot::Mutex;

/// Default cache capacity: 256MB
pub const DEFAULT_PLANE_CACHE_CAPACITY: usize = 256 * 1024 * 1024;

/// Default maximum number of entries (to bound LRU overhead)
const DEFAULT_MAX_ENTRIES: usize = 65_536;

// =============================================================================
// Cache Key
// =============================================================================

/// Cache key for one plane of a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaneKey {
    pub timepoint: usize,
    pub channel: usize,
    pub z: usize,
}

impl PlaneKey {
    pub fn new(timepoint: usize, channel: usize, z: usize) -> Self {
        Self {
            timepoint,
            channel,
            z,
        }
    }
}

// =============================================================================
// Plane Cache
// =============================================================================

struct CacheState {
    entries: LruCache<PlaneKey, Bytes>,
    current_size: usize,
    hits: u64,
    misses: u64,
}

/// LRU cache for raw planes with size-based capacity.
///
/// Clones are handles to the same entries.
///
/// # Example
///
/// ```
/// use stack_export::stack::{PlaneCache, PlaneKey};
/// use bytes::Bytes;
///
/// let cache = PlaneCache::with_capacity(1024);
/// let key = PlaneKey::new(0, 1, 2);
///
/// cache.put(key, Bytes::from(vec![0u8; 16]));
/// assert!(cache.get(&key).is_some());
///
/// cache.clear();
/// assert!(cache.is_empty());
/// ```
#[derive(Clone)]
pub struct PlaneCache {
    state: Arc<Mutex<CacheState>>,

    /// Maximum total size in bytes
    max_size: usize,
}

impl PlaneCache {
    /// Create a new plane cache with default capacity (256MB).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_PLANE_CACHE_CAPACITY)
    }

    /// Create a new plane cache with the specified capacity in bytes.
    pub fn with_capacity(max_size: usize) -> Self {
        Self::with_capacity_and_entries(max_size, DEFAULT_MAX_ENTRIES)
    }

    /// Create a new plane cache with specified capacity and maximum entries.
    ///
    /// # Arguments
    ///
    /// * `max_size` - Maximum total size of cached planes in bytes
    /// * `max_entries` - Maximum number of entries in the cache
    pub fn with_capacity_and_entries(max_size: usize, max_entries: usize) -> Self {
        let entries = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Arc::new(Mutex::new(CacheState {
                entries: LruCache::new(entries),
                current_size: 0,
                hits: 0,
                misses: 0,
            })),
            max_size,
        }
    }

    /// Get a plane from the cache.
    ///
    /// Marks the entry as recently used and updates the hit/miss counters.
    pub fn get(&self, key: &PlaneKey) -> Option<Bytes> {
        let mut state = self.state.lock();
        let found = state.entries.get(key).cloned();
        if found.is_some() {
            state.hits += 1;
        } else {
            state.misses += 1;
        }
        found
    }

    /// Check if a plane is cached without updating LRU order.
    pub fn contains(&self, key: &PlaneKey) -> bool {
        self.state.lock().entries.contains(key)
    }

    /// Store a plane in the cache.
    ///
    /// If the cache is over capacity after insertion, least-recently-used
    /// entries are evicted until it fits. A plane larger than the whole
    /// capacity is therefore not retained.
    pub fn put(&self, key: PlaneKey, data: Bytes) {
        let data_size = data.len();
        let mut state = self.state.lock();

        if let Some(old) = state.entries.peek(&key) {
            let old_size = old.len();
            state.current_size = state.current_size.saturating_sub(old_size);
        }

        // A full entry table evicts on its own; account for it
        if let Some((evicted_key, evicted)) = state.entries.push(key, data) {
            if evicted_key != key {
                state.current_size = state.current_size.saturating_sub(evicted.len());
            }
        }
        state.current_size += data_size;

        while state.current_size > self.max_size {
            match state.entries.pop_lru() {
                Some((_, evicted)) => {
                    state.current_size = state.current_size.saturating_sub(evicted.len());
                }
                None => break,
            }
        }
    }

    /// Remove a plane from the cache.
    pub fn remove(&self, key: &PlaneKey) -> Option<Bytes> {
        let mut state = self.state.lock();
        let removed = state.entries.pop(key);
        if let Some(ref data) = removed {
            state.current_size = state.current_size.saturating_sub(data.len());
        }
        removed
    }

    /// Release every cached plane.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.current_size = 0;
    }

    /// Number of cached planes.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Current total size of cached planes in bytes.
    pub fn size(&self) -> usize {
        self.state.lock().current_size
    }

    /// Maximum capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.max_size
    }

    /// `(hits, misses)` since the cache was created.
    pub fn stats(&self) -> (u64, u64) {
        let state = self.state.lock();
        (state.hits, state.misses)
    }
}

impl Default for PlaneCache {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Cache Scope
// =============================================================================

/// Clears a [`PlaneCache`] when dropped.
///
/// Holding a scope while a view is processed guarantees the view's planes
/// are released afterwards, including on early return through `?`.
pub struct CacheScope<'a> {
    cache: &'a PlaneCache,
}

impl<'a> CacheScope<'a> {
    pub fn new(cache: &'a PlaneCache) -> Self {
        Self { cache }
    }
}

impl Drop for CacheScope<'_> {
    fn drop(&mut self) {
        self.cache.clear();
    }
}

// =============================================================================
// Tests
// =============================================================================
