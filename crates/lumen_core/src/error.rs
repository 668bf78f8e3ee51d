//! # Core Error Types
//!
//! Errors raised by the core building blocks.

use thiserror::Error;

/// Errors that can occur in the core crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A job was submitted after the worker was shut down.
    #[error("worker `{name}` is stopped")]
    WorkerStopped {
        /// Thread name of the stopped worker.
        name: String,
    },

    /// The operating system refused to spawn the worker thread.
    #[error("failed to spawn worker `{name}`: {reason}")]
    WorkerSpawn {
        /// Thread name of the worker.
        name: String,
        /// Error reported by the OS.
        reason: String,
    },
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
