//! # Memory Management
//!
//! Growable ring storage for short-lived, FIFO-retired objects.
//!
//! ## Design Philosophy
//!
//! Objects are appended at the tail and retired only from the head, so
//! a slot is never freed individually. When the ring fills, it doubles
//! and physically moves its wrapped segment to the end of the new
//! allocation. That move is described by a [`Growth`] record so any
//! array kept parallel to the ring can replay it and stay aligned.

mod ring;

pub use ring::{Growth, RingBuffer};
