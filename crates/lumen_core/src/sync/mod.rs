//! # Background Update Worker
//!
//! ```text
//! Render thread:   draw(N) ──submit──┐      draw(N+1) ──submit──┐
//!                                    ▼                          ▼
//! Queue (FIFO):    [ job N ] ──────> [ job N, job N+1 ] ──> ...
//!                                    │
//! Worker thread:                     └──> run(job N) ──> run(job N+1)
//! ```
//!
//! One worker, one queue. Jobs run in submission order. The worker
//! blocks on the channel while the queue is empty and exits once its
//! owner shuts it down, after draining whatever was already queued.

mod worker;

pub use worker::{UpdateJob, UpdateWorker, WorkerConfig};
