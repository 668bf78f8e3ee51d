//! Per-instance state every material carries.

use crate::texture::Texture;
use glam::{Mat4, Vec2, Vec3};

/// Values that belong to a material instance rather than to any part.
///
/// Semantic bindings such as `WORLD` or `ALPHA` read from here.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialBase {
    /// Object to world transform of the drawable using this material.
    pub world: Mat4,
    /// Overall opacity.
    pub alpha: f32,
    /// Material-wide diffuse tint.
    pub diffuse_color: Vec3,
    /// Main texture, if any.
    pub texture: Option<Texture>,
    /// Forces transparent sorting even at full alpha.
    pub is_transparent: bool,
    /// Disables back-face culling.
    pub two_sided: bool,
    /// Blend masks sampled by paint groups, one per paint layer group.
    pub mask_textures: Vec<Texture>,
    /// UV scale applied to the mask textures.
    pub mask_texture_scale: Vec2,
}

impl MaterialBase {
    /// Defaults, usable in `const` contexts.
    pub const DEFAULT: Self = Self {
        world: Mat4::IDENTITY,
        alpha: 1.0,
        diffuse_color: Vec3::ONE,
        texture: None,
        is_transparent: false,
        two_sided: false,
        mask_textures: Vec::new(),
        mask_texture_scale: Vec2::ONE,
    };

    /// Whether the material must be drawn in the transparent pass.
    #[inline]
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.is_transparent || self.alpha < 1.0
    }
}

impl Default for MaterialBase {
    fn default() -> Self {
        Self::DEFAULT
    }
}
