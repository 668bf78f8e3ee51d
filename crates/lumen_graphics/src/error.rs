//! # Graphics Error Types
//!
//! All recoverable errors raised by materials and particle effects.
//! Contract violations (unbalanced init brackets, indexing a part that
//! does not exist) panic instead; they are programming errors.

use crate::material::MaterialUsage;
use lumen_core::CoreError;
use thiserror::Error;

/// Errors that can occur in the graphics crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// An ad-hoc parameter was set on a bound program that does not declare it.
    #[error("cannot find parameter `{name}` in the bound shader program")]
    UnknownParameter {
        /// Parameter name as requested.
        name: String,
    },

    /// A material was applied before its shader program was built.
    #[error("material has no shader program; attach a shader builder or a precompiled program")]
    ProgramNotBuilt,

    /// The shader collaborator rejected the fragment list.
    #[error("failed to build shader for {usage:?}: {reason}")]
    ShaderBuild {
        /// Usage variant being built.
        usage: MaterialUsage,
        /// Collaborator-supplied reason.
        reason: String,
    },

    /// A parameter declaration line could not be parsed.
    #[error("invalid shader parameter declaration: `{line}`")]
    InvalidShaderDeclaration {
        /// The offending line, trimmed.
        line: String,
    },

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The particle update scheduler failed.
    #[error(transparent)]
    Scheduler(#[from] CoreError),
}

/// Result type for graphics operations.
pub type GraphicsResult<T> = Result<T, GraphicsError>;
