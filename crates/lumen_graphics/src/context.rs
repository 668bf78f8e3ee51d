//! # Drawing Context
//!
//! Per-frame globals handed to materials: camera matrices, time,
//! viewport, ambient/fog and the main directional light. Materials only
//! read from it.

use crate::texture::Texture;
use glam::{Mat4, Vec2, Vec3};

/// Linear distance fog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    /// Whether fog is applied at all.
    pub enabled: bool,
    /// Fog color.
    pub color: Vec3,
    /// Distance where fog starts.
    pub start: f32,
    /// Distance where fog is opaque.
    pub end: f32,
}

impl Default for Fog {
    fn default() -> Self {
        Self {
            enabled: false,
            color: Vec3::ONE,
            start: 1.0,
            end: 100.0,
        }
    }
}

/// Shadow map rendered from a light's point of view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowMap {
    /// Depth texture.
    pub texture: Texture,
    /// Light space transform used to render it.
    pub light_view_projection: Mat4,
}

/// The dominant directional light of the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Direction the light travels, normalized.
    pub direction: Vec3,
    /// Diffuse color.
    pub diffuse: Vec3,
    /// Specular color.
    pub specular: Vec3,
    /// Shadow map, when the light casts shadows this frame.
    pub shadow: Option<ShadowMap>,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-1.0, -1.0, -1.0).normalize(),
            diffuse: Vec3::ONE,
            specular: Vec3::ZERO,
            shadow: None,
        }
    }
}

/// Read-only per-frame state consumed by materials and particle effects.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingContext {
    view: Mat4,
    view_inverse: Mat4,
    projection: Mat4,
    projection_inverse: Mat4,
    view_projection: Mat4,
    view_projection_inverse: Mat4,
    /// Seconds since the previous frame.
    pub elapsed_seconds: f32,
    /// Seconds since the application started.
    pub total_seconds: f32,
    /// Render target size in pixels.
    pub viewport: Vec2,
    /// Ambient light color.
    pub ambient_light: Vec3,
    /// Scene fog.
    pub fog: Fog,
    /// Main directional light.
    pub directional_light: DirectionalLight,
}

impl DrawingContext {
    /// Creates a context for the given camera.
    #[must_use]
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        let mut context = Self {
            view: Mat4::IDENTITY,
            view_inverse: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            projection_inverse: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
            view_projection_inverse: Mat4::IDENTITY,
            elapsed_seconds: 0.0,
            total_seconds: 0.0,
            viewport: Vec2::new(1280.0, 720.0),
            ambient_light: Vec3::splat(0.2),
            fog: Fog::default(),
            directional_light: DirectionalLight::default(),
        };
        context.set_camera(view, projection);
        context
    }

    /// Replaces the camera and recomputes the derived matrices.
    pub fn set_camera(&mut self, view: Mat4, projection: Mat4) {
        self.view = view;
        self.projection = projection;
        self.view_inverse = view.inverse();
        self.projection_inverse = projection.inverse();
        self.view_projection = projection * view;
        self.view_projection_inverse = self.view_projection.inverse();
    }

    /// Sets frame timing.
    #[must_use]
    pub fn with_time(mut self, elapsed_seconds: f32, total_seconds: f32) -> Self {
        self.elapsed_seconds = elapsed_seconds;
        self.total_seconds = total_seconds;
        self
    }

    /// Sets the render target size.
    #[must_use]
    pub fn with_viewport(mut self, width: f32, height: f32) -> Self {
        self.viewport = Vec2::new(width, height);
        self
    }

    /// World to view transform.
    #[inline]
    #[must_use]
    pub fn view(&self) -> Mat4 {
        self.view
    }

    /// View to world transform.
    #[inline]
    #[must_use]
    pub fn view_inverse(&self) -> Mat4 {
        self.view_inverse
    }

    /// View to clip transform.
    #[inline]
    #[must_use]
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Clip to view transform.
    #[inline]
    #[must_use]
    pub fn projection_inverse(&self) -> Mat4 {
        self.projection_inverse
    }

    /// World to clip transform.
    #[inline]
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.view_projection
    }

    /// Clip to world transform.
    #[inline]
    #[must_use]
    pub fn view_projection_inverse(&self) -> Mat4 {
        self.view_projection_inverse
    }

    /// Camera position in world space.
    #[inline]
    #[must_use]
    pub fn eye_position(&self) -> Vec3 {
        self.view_inverse.w_axis.truncate()
    }

    /// Half a pixel in texture coordinates.
    #[inline]
    #[must_use]
    pub fn half_pixel(&self) -> Vec2 {
        Vec2::new(0.5 / self.viewport.x.max(1.0), 0.5 / self.viewport.y.max(1.0))
    }
}

impl Default for DrawingContext {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eye_position_from_view() {
        let eye = Vec3::new(3.0, 4.0, 5.0);
        let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
        let context = DrawingContext::new(view, Mat4::IDENTITY);
        assert!((context.eye_position() - eye).length() < 1e-4);
    }

    #[test]
    fn test_half_pixel() {
        let context = DrawingContext::default().with_viewport(200.0, 100.0);
        assert_eq!(context.half_pixel(), Vec2::new(0.0025, 0.005));
    }
}
