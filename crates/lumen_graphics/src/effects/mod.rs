//! # Particle Effects
//!
//! ARCHITECT'S MANDATE: particles never stall the frame.
//!
//! ```text
//! ┌──────────────┐   emit    ┌──────────────┐  update   ┌──────────────┐
//! │   Emitter    │ ────────> │  Ring buffer │ <──────── │ Controllers  │
//! └──────────────┘           └──────┬───────┘           └──────────────┘
//!                                   │ rebuild (nested lock)
//!                                   ▼
//!                            ┌──────────────┐   draw    ┌──────────────┐
//!                            │   Geometry   │ ────────> │   Renderer   │
//!                            └──────────────┘           └──────────────┘
//! ```
//!
//! This module provides:
//! - [`ParticleEffect`] - ring storage, stepping and the frame-lag protocol
//! - [`ParticleUpdateScheduler`] - the single background step worker
//! - [`ParticleEffectCollection`] - per-scene update, draw and detach
//! - [`StandardEmitter`] and the built-in controllers

mod collection;
mod controller;
mod controllers;
mod effect;
mod emitter;
mod emitters;
mod geometry;
mod particle;
mod scheduler;

pub use collection::ParticleEffectCollection;
pub use controller::{ParticleController, ParticleControllerCollection};
pub use controllers::{
    AbsorbController, ColorController, FadeController, ForceController, RotationController,
    SizeController, SpeedController, TangentForceController,
};
pub use effect::{EffectState, ParticleEffect, ParticleEffectBuilder, DEFAULT_EFFECT_SEED};
pub use emitter::{EmitContext, ParticleCallback, ParticleEmitter};
pub use emitters::{EmitterShape, StandardEmitter, DEFAULT_EMITTER_SEED};
pub use geometry::{
    CameraFrame, ParticleAppearance, ParticleBlend, ParticleGeometry, ParticleType,
    ParticleVertex, SourceRect, MAX_QUADS,
};
pub use particle::{Particle, RETIRED_AGE};
pub use scheduler::ParticleUpdateScheduler;
