//! # Particle Geometry
//!
//! CPU-side quads rebuilt after every simulation step and read by the
//! renderer during draw.
//!
//! ```text
//!  Billboard                 ConstrainedBillboard       ConstrainedBillboardUp
//!  faces the camera          stretched along velocity   stretched along `up`
//!
//!   0 ───── 1                   0 ── 1                    0 ── 1
//!   │   ●   │                   │    │  ▲ velocity        │    │  ▲ up
//!   3 ───── 2                   │ ●  │  │                 │ ●  │  │
//!                               3 ── 2                    3 ── 2
//! ```
//!
//! Vertices carry color premultiplied by the particle's alpha.

use super::Particle;
use crate::texture::Texture;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

/// Quads addressable with `u16` indices.
pub const MAX_QUADS: usize = (u16::MAX as usize + 1) / 4;

/// How particles are oriented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParticleType {
    /// Always faces the camera, rotated by the particle's rotation.
    #[default]
    Billboard,
    /// Stretched along the particle's velocity.
    ConstrainedBillboard,
    /// Stretched along the effect's `up` axis.
    ConstrainedBillboardUp,
}

/// Blend state the renderer should use for the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParticleBlend {
    /// Colors add up; order independent.
    #[default]
    Additive,
    /// Regular alpha blending.
    AlphaBlend,
}

/// Texel rectangle inside a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRect {
    /// Left edge in texels.
    pub x: u32,
    /// Top edge in texels.
    pub y: u32,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
}

/// How an effect turns particles into quads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleAppearance {
    /// Orientation mode.
    pub particle_type: ParticleType,
    /// Blend mode.
    pub blend: ParticleBlend,
    /// Nothing is drawn without a texture.
    pub texture: Option<Texture>,
    /// Region of `texture` to sample. The whole texture when `None`.
    pub source_rect: Option<SourceRect>,
    /// Length multiplier for constrained billboards.
    pub stretch: f32,
    /// Axis used by [`ParticleType::ConstrainedBillboardUp`].
    pub up: Vec3,
}

impl Default for ParticleAppearance {
    fn default() -> Self {
        Self {
            particle_type: ParticleType::Billboard,
            blend: ParticleBlend::Additive,
            texture: None,
            source_rect: None,
            stretch: 1.0,
            up: Vec3::Y,
        }
    }
}

impl ParticleAppearance {
    /// UV rectangle as `(min, max)`.
    #[allow(clippy::cast_precision_loss)]
    fn uv_rect(&self, texture: Texture) -> (Vec2, Vec2) {
        match self.source_rect {
            Some(rect) if texture.width() > 0 && texture.height() > 0 => {
                let size = Vec2::new(texture.width() as f32, texture.height() as f32);
                let min = Vec2::new(rect.x as f32, rect.y as f32) / size;
                let max = min + Vec2::new(rect.width as f32, rect.height as f32) / size;
                (min, max)
            }
            _ => (Vec2::ZERO, Vec2::ONE),
        }
    }

    /// Width over height of the sampled region.
    #[allow(clippy::cast_precision_loss)]
    fn aspect_ratio(&self, texture: Texture) -> f32 {
        match self.source_rect {
            Some(rect) if rect.height > 0 => rect.width as f32 / rect.height as f32,
            _ => texture.aspect_ratio(),
        }
    }
}

/// Camera state the quads are oriented against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    /// View to world transform.
    pub view_inverse: Mat4,
    /// Camera position in world space.
    pub eye: Vec3,
}

impl Default for CameraFrame {
    fn default() -> Self {
        Self {
            view_inverse: Mat4::IDENTITY,
            eye: Vec3::ZERO,
        }
    }
}

/// A particle vertex as uploaded to the GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleVertex {
    /// World-space position.
    pub position: [f32; 3],
    /// Texture coordinate.
    pub uv: [f32; 2],
    /// Premultiplied color.
    pub color: [f32; 4],
}

impl ParticleVertex {
    /// Size of a vertex in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

/// Vertex and index lists for one effect.
#[derive(Debug, Clone, Default)]
pub struct ParticleGeometry {
    vertices: Vec<ParticleVertex>,
    indices: Vec<u16>,
}

impl ParticleGeometry {
    /// Empty geometry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Vertex list.
    #[inline]
    #[must_use]
    pub fn vertices(&self) -> &[ParticleVertex] {
        &self.vertices
    }

    /// Index list, six per quad.
    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// Vertex data as raw bytes.
    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Number of quads.
    #[inline]
    #[must_use]
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// Returns `true` if there is nothing to draw.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Drops every quad, keeping the allocations.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    /// Replaces the contents with one quad per live particle.
    ///
    /// Produces nothing without a texture. Particles past [`MAX_QUADS`]
    /// are skipped.
    pub fn rebuild<'a>(
        &mut self,
        particles: impl IntoIterator<Item = &'a Particle>,
        appearance: &ParticleAppearance,
        camera: &CameraFrame,
    ) {
        self.clear();
        let Some(texture) = appearance.texture else {
            return;
        };
        let (uv_min, uv_max) = appearance.uv_rect(texture);
        let aspect = appearance.aspect_ratio(texture);
        let mut skipped = 0usize;

        for particle in particles.into_iter().filter(|p| p.is_live()) {
            if self.quad_count() >= MAX_QUADS {
                skipped += 1;
                continue;
            }
            let corners = match appearance.particle_type {
                ParticleType::Billboard => billboard(particle, camera),
                ParticleType::ConstrainedBillboard => {
                    constrained(particle, particle.velocity, appearance.stretch, aspect, camera)
                }
                ParticleType::ConstrainedBillboardUp => {
                    constrained(particle, appearance.up, appearance.stretch, aspect, camera)
                }
            };
            self.push_quad(corners, uv_min, uv_max, particle.premultiplied_color());
        }

        if skipped > 0 {
            tracing::warn!(skipped, max = MAX_QUADS, "particle geometry full");
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn push_quad(&mut self, corners: [Vec3; 4], uv_min: Vec2, uv_max: Vec2, color: [f32; 4]) {
        let base = self.vertices.len() as u16;
        let uvs = [
            [uv_min.x, uv_min.y],
            [uv_max.x, uv_min.y],
            [uv_max.x, uv_max.y],
            [uv_min.x, uv_max.y],
        ];
        for (corner, uv) in corners.iter().zip(uvs) {
            self.vertices.push(ParticleVertex {
                position: corner.to_array(),
                uv,
                color,
            });
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// Camera-facing quad rotated in screen space.
fn billboard(particle: &Particle, camera: &CameraFrame) -> [Vec3; 4] {
    let (sin, cos) = particle.rotation.sin_cos();
    let right = camera.view_inverse.x_axis.truncate();
    let up = camera.view_inverse.y_axis.truncate();
    let half = particle.size * 0.5;
    let x = (right * cos + up * sin) * half;
    let y = (up * cos - right * sin) * half;
    let p = particle.position;
    [p - x + y, p + x + y, p + x - y, p - x - y]
}

/// Quad spanning `position ± axis` and facing the camera around that axis.
fn constrained(
    particle: &Particle,
    axis: Vec3,
    stretch: f32,
    aspect: f32,
    camera: &CameraFrame,
) -> [Vec3; 4] {
    let forward = axis.normalize_or_zero() * 0.5 * particle.size * stretch * aspect;
    let start = particle.position - forward;
    let end = particle.position + forward;
    let side = forward
        .cross(camera.eye - particle.position)
        .normalize_or_zero()
        * particle.size
        * 0.5;
    [end - side, end + side, start + side, start - side]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live(position: Vec3) -> Particle {
        Particle::new(position, Vec3::Y, 1.0)
    }

    fn textured() -> ParticleAppearance {
        ParticleAppearance {
            texture: Some(Texture::new(1, 64, 64)),
            ..ParticleAppearance::default()
        }
    }

    #[test]
    fn test_no_texture_no_geometry() {
        let mut geometry = ParticleGeometry::new();
        geometry.rebuild(&[live(Vec3::ZERO)], &ParticleAppearance::default(), &CameraFrame::default());
        assert!(geometry.is_empty());
    }

    #[test]
    fn test_retired_particles_are_skipped() {
        let mut dead = live(Vec3::ONE);
        dead.retire();
        let mut geometry = ParticleGeometry::new();
        geometry.rebuild(&[live(Vec3::ZERO), dead], &textured(), &CameraFrame::default());
        assert_eq!(geometry.quad_count(), 1);
        assert_eq!(geometry.indices(), &[0, 1, 2, 0, 2, 3]);
        assert_eq!(geometry.vertex_bytes().len(), 4 * ParticleVertex::SIZE);
    }

    #[test]
    fn test_billboard_faces_identity_camera() {
        let mut particle = live(Vec3::ZERO);
        particle.size = 2.0;
        let corners = billboard(&particle, &CameraFrame::default());
        assert_eq!(corners[0], Vec3::new(-1.0, 1.0, 0.0));
        assert_eq!(corners[2], Vec3::new(1.0, -1.0, 0.0));
    }

    #[test]
    fn test_constrained_spans_velocity() {
        let particle = Particle {
            size: 2.0,
            ..Particle::new(Vec3::ZERO, Vec3::new(0.0, 5.0, 0.0), 1.0)
        };
        let camera = CameraFrame {
            eye: Vec3::new(0.0, 0.0, 10.0),
            ..CameraFrame::default()
        };
        let corners = constrained(&particle, particle.velocity, 1.0, 1.0, &camera);
        assert!(corners.iter().all(|c| c.z.abs() < 1e-6));
        assert!((corners[0].y - 1.0).abs() < 1e-6);
        assert!((corners[3].y + 1.0).abs() < 1e-6);
        assert!((corners[0].x.abs() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_source_rect_maps_to_uv() {
        let appearance = ParticleAppearance {
            source_rect: Some(SourceRect {
                x: 32,
                y: 0,
                width: 32,
                height: 16,
            }),
            ..textured()
        };
        let texture = Texture::new(1, 64, 64);
        assert_eq!(
            appearance.uv_rect(texture),
            (Vec2::new(0.5, 0.0), Vec2::new(1.0, 0.25))
        );
        assert!((appearance.aspect_ratio(texture) - 2.0).abs() < f32::EPSILON);
    }
}
