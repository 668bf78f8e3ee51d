//! # Material System
//!
//! Materials are compositions of parts. A [`MaterialGroup`] owns an
//! ordered list of [`MaterialPart`]s, asks a [`ShaderBuilder`] to turn
//! their fragments into a [`ShaderProgram`], and applies parameters
//! around each draw:
//!
//! ```text
//!   ┌────────────────┐   fragments   ┌───────────────┐
//!   │ MaterialGroup  │──────────────►│ ShaderBuilder │
//!   │  [part, part]  │◄──────────────│               │
//!   └───────┬────────┘    program    └───────────────┘
//!           │ begin_apply / end_apply
//!           ▼
//!   ┌────────────────┐  semantic   ┌───────────────────┐
//!   │  MaterialPart  │────────────►│ binding table     │
//!   │  (handles)     │             │ WORLD, VIEW, ...  │
//!   └────────────────┘             └───────────────────┘
//! ```
//!
//! ## Usage Variants
//!
//! The same material renders differently in a depth pass, a normal pass
//! or a light pass. [`MaterialGroup::resolve`] returns the variant for a
//! [`MaterialUsage`], building it on first use with [`VariantBuilder`],
//! and copies runtime values onto it.

mod base;
mod batch;
pub mod binding;
mod builder;
mod custom;
mod group;
mod parameter;
pub mod part;
pub mod parts;
pub mod shader;
mod usage;

pub use base::MaterialBase;
pub use batch::{Material, MaterialBatch};
pub use binding::{find_binding, ParameterBinding, SemanticBindings};
pub use builder::{expand_dependencies, VariantBuilder};
pub use custom::{CustomMaterial, CustomMaterialParameters};
pub use group::{GroupId, MaterialGroup, MaterialPartCollection, PartMut};
pub use parameter::{ParameterHandle, ParameterKind, ParameterValue, ProgramId, ShaderProgram};
pub use part::{MaterialPart, PartBinder, PartType};
pub use shader::{DeclarationShaderBuilder, ShaderBuilder, ShaderFragment};
pub use usage::MaterialUsage;
