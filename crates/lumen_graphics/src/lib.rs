//! # LUMEN Graphics
//!
//! Material composition and particle effects:
//! - Materials built from ordered, reusable shader parts
//! - Semantic parameter binding with global/local separation
//! - Usage variants (depth, normal, light passes) resolved on demand
//! - Ring-buffered particle effects with an asynchronous update worker
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        FRAME                                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ParticleEffect::update → (worker) step → geometry          │
//! │        ↓                                    ↓               │
//! │  MaterialGroup::resolve(usage) → begin_apply → draw → end   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ARCHITECT'S MANDATE
//!
//! - Part order is shader order
//! - Global parameters are written once per program switch
//! - Particle simulation trails the frame by at most `max_frames_behind`
//! - Material state belongs to the render thread

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod context;
pub mod effects;
pub mod error;
pub mod material;
pub mod texture;

pub use config::ParticleSettings;
pub use context::{DirectionalLight, DrawingContext, Fog, ShadowMap};
pub use error::{GraphicsError, GraphicsResult};
pub use texture::{Texture, TextureUsage};

pub use material::{
    CustomMaterial, CustomMaterialParameters, Material, MaterialBase, MaterialBatch,
    MaterialGroup, MaterialPart, MaterialPartCollection, MaterialUsage, ParameterHandle,
    PartType, ShaderBuilder, ShaderProgram, VariantBuilder,
};

pub use effects::{
    EffectState, EmitterShape, ParticleController, ParticleControllerCollection, ParticleEffect,
    ParticleEffectBuilder, ParticleEffectCollection, ParticleEmitter, ParticleGeometry,
    ParticleType, ParticleUpdateScheduler, StandardEmitter,
};
