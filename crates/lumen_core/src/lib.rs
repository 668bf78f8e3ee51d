//! # LUMEN Core
//!
//! Engine-agnostic building blocks shared by the material and particle
//! systems:
//! - Growable ring storage whose growth can be replayed on parallel arrays
//! - Colors, value ranges and bounding boxes
//! - A single background worker draining a FIFO job queue
//!
//! ## Architecture Rules
//!
//! 1. **Storage never frees individual slots** - rings only advance their head
//! 2. **Growth is observable** - every reallocation yields a [`Growth`] record
//! 3. **Workers have owners** - no lazily spawned process-wide threads
//!
//! ## Example
//!
//! ```rust,ignore
//! use lumen_core::RingBuffer;
//!
//! let mut ring: RingBuffer<f32> = RingBuffer::with_capacity(4);
//! let (slot, growth) = ring.push_back(1.0);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod math;
pub mod memory;
pub mod sync;

pub use error::{CoreError, CoreResult};
pub use math::{BoundingBox, Color, ValueRange};
pub use memory::{Growth, RingBuffer};
pub use sync::{UpdateJob, UpdateWorker, WorkerConfig};
