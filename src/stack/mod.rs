//! Image stack abstraction layer.
//!
//! This module provides plane-level access to multi-timepoint,
//! multi-channel image stacks and a typed, cached loader on top of it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          Conversion adapter             │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │         VirtualStackLoader<T>           │
//! │  (decodes planes, owns PlaneCache)      │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │           ImageStack Trait              │
//! │  (raw planes in hyperstack order)       │
//! └────────────────────┬────────────────────┘
//!                      │
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//! ┌─────────────────┐    ┌─────────────────────┐
//! │    RawStack     │    │    MemoryStack      │
//! │ (descriptor +   │    │  (planes in memory) │
//! │  raw file)      │    │                     │
//! └─────────────────┘    └─────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use stack_export::stack::{RawStack, VirtualStackLoader};
//!
//! let stack = RawStack::open("embryo.json")?;
//! let loader = VirtualStackLoader::<u16, _>::new(stack)?;
//!
//! // Volume of timepoint 3, channel 1 with shape (depth, height, width)
//! let view = loader.get_view(3, 1)?;
//! ```

mod cache;
mod descriptor;
mod loader;
mod memory;
mod raw;
mod sample;
mod source;

pub use cache::{CacheScope, PlaneCache, PlaneKey, DEFAULT_PLANE_CACHE_CAPACITY};
pub use descriptor::{StackDescriptor, VoxelSize};
pub use loader::VirtualStackLoader;
pub use memory::MemoryStack;
pub use raw::RawStack;
pub use sample::{decode_plane, encode_plane, ByteOrder, Sample, SampleType};
pub use source::ImageStack;
