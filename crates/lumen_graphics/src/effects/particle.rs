//! The simulated particle.

use glam::Vec3;
use lumen_core::Color;

/// Age written into a slot once its particle has been retired.
///
/// Anything above 1.0 is dead; this sentinel keeps a retired slot from
/// ever being mistaken for a live one while it waits for the head of
/// the ring to pass it.
pub const RETIRED_AGE: f32 = f32::MAX;

/// A single particle.
///
/// `age` is normalized: 0 at emission, 1 at the end of `duration`.
/// A slot is live while `age <= 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// World-space position.
    pub position: Vec3,
    /// Units per second.
    pub velocity: Vec3,
    /// Screen-space rotation in radians (billboards only).
    pub rotation: f32,
    /// Edge length of the quad.
    pub size: f32,
    /// Tint, including its own alpha.
    pub color: Color,
    /// Extra opacity multiplied into `color` when drawn.
    pub alpha: f32,
    /// Normalized age.
    pub age: f32,
    /// Seconds since emission.
    pub elapsed_time: f32,
    /// Lifetime in seconds.
    pub duration: f32,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            rotation: 0.0,
            size: 1.0,
            color: Color::WHITE,
            alpha: 1.0,
            age: RETIRED_AGE,
            elapsed_time: 0.0,
            duration: 1.0,
        }
    }
}

impl Particle {
    /// Creates a particle at `position` living for `duration` seconds.
    #[must_use]
    pub fn new(position: Vec3, velocity: Vec3, duration: f32) -> Self {
        Self {
            position,
            velocity,
            age: 0.0,
            duration,
            ..Self::default()
        }
    }

    /// Returns `true` while the particle has not outlived its duration.
    #[inline]
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.age <= 1.0
    }

    /// Advances the particle by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        self.elapsed_time += dt;
        self.position += self.velocity * dt;
        self.age = if self.duration > 0.0 {
            self.elapsed_time / self.duration
        } else {
            // Zero-length particles die on their first step.
            RETIRED_AGE
        };
    }

    /// Marks the slot as retired.
    #[inline]
    pub fn retire(&mut self) {
        self.age = RETIRED_AGE;
    }

    /// `color` with `alpha` multiplied into every channel.
    #[inline]
    #[must_use]
    pub fn premultiplied_color(&self) -> [f32; 4] {
        (self.color.to_vec4() * self.alpha).to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_integrates_and_ages() {
        let mut particle = Particle::new(Vec3::ZERO, Vec3::X, 2.0);
        particle.update(0.5);
        assert_eq!(particle.position, Vec3::new(0.5, 0.0, 0.0));
        assert!((particle.age - 0.25).abs() < 1e-6);
        assert!(particle.is_live());
        particle.update(1.6);
        assert!(!particle.is_live());
    }

    #[test]
    fn test_default_slot_is_dead() {
        assert!(!Particle::default().is_live());
    }

    #[test]
    fn test_zero_duration_retires_immediately() {
        let mut particle = Particle::new(Vec3::ZERO, Vec3::ZERO, 0.0);
        particle.update(0.01);
        assert!(!particle.is_live());
    }

    #[test]
    fn test_premultiplied_color() {
        let particle = Particle {
            alpha: 0.5,
            color: Color::new(1.0, 0.5, 0.0, 1.0),
            ..Particle::new(Vec3::ZERO, Vec3::ZERO, 1.0)
        };
        assert_eq!(particle.premultiplied_color(), [0.5, 0.25, 0.0, 0.5]);
    }
}
