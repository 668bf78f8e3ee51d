//! # Math Primitives
//!
//! Small value types shared by materials and particles. Vectors and
//! matrices come straight from `glam`; this module only adds what glam
//! does not model:
//! - [`Color`] - linear RGBA with interpolation
//! - [`ValueRange`] - a min/max pair sampled per particle
//! - [`BoundingBox`] - axis-aligned bounds for culling

mod bounds;
mod color;
mod range;

pub use bounds::BoundingBox;
pub use color::Color;
pub use range::{Lerp, ValueRange};
