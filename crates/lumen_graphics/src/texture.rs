//! Opaque texture handles.

/// A texture owned by the graphics runtime.
///
/// Only the identity and dimensions are visible here; the pixels live
/// on the other side of the graphics API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Texture {
    id: u32,
    width: u32,
    height: u32,
}

impl Texture {
    /// Wraps a runtime texture id.
    #[inline]
    #[must_use]
    pub const fn new(id: u32, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }

    /// Runtime id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Width in texels.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in texels.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Width divided by height; 1.0 for a degenerate texture.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Role a texture plays when assigned through
/// [`MaterialGroup::set_texture`](crate::material::MaterialGroup::set_texture).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureUsage {
    /// Base color.
    Diffuse,
    /// Specular intensity map.
    Specular,
    /// Tangent-space normal map.
    NormalMap,
    /// Paint-group blend mask.
    Mask,
    /// Depth map rendered from the main light.
    ShadowMap,
}
