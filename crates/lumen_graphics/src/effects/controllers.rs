//! Built-in controllers.
//!
//! | Controller | Tag | Effect |
//! |------------|-----|--------|
//! | [`ColorController`] | start/end color | lerps color by age |
//! | [`FadeController`] | - | fades in and out |
//! | [`SizeController`] | growth rate | grows toward an end size |
//! | [`RotationController`] | spin rate | turns toward an end rotation |
//! | [`SpeedController`] | end factor | scales speed by the end of life |
//! | [`ForceController`] | - | constant acceleration |
//! | [`TangentForceController`] | - | swirls around an axis |
//! | [`AbsorbController`] | - | pulls toward a point |

use super::{Particle, ParticleController};
use glam::Vec3;
use lumen_core::{Color, ValueRange};
use rand::RngCore;

/// Interpolates each particle from its emitted color to a random end color.
#[derive(Debug, Clone)]
pub struct ColorController {
    /// Whether the controller runs.
    pub enabled: bool,
    /// Range the end color is drawn from.
    pub end_color: ValueRange<Color>,
}

impl Default for ColorController {
    fn default() -> Self {
        Self {
            enabled: true,
            end_color: ValueRange::constant(Color::WHITE),
        }
    }
}

impl ParticleController for ColorController {
    type Tag = ValueRange<Color>;

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn reset(&mut self, particle: &mut Particle, tag: &mut Self::Tag, rng: &mut dyn RngCore) {
        tag.min = particle.color;
        tag.max = self.end_color.sample(rng);
    }

    fn update(&mut self, particle: &mut Particle, tag: &mut Self::Tag, _dt: f32) {
        particle.color = tag.lerp(particle.age);
    }
}

/// Fades alpha in quickly and out slowly.
#[derive(Debug, Clone)]
pub struct FadeController {
    /// Whether the controller runs.
    pub enabled: bool,
}

impl Default for FadeController {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl ParticleController for FadeController {
    type Tag = ();

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn update(&mut self, particle: &mut Particle, _tag: &mut (), _dt: f32) {
        let age = particle.age;
        // Peaks at roughly 1.0 a third of the way through.
        particle.alpha = age * (1.0 - age) * (1.0 - age) * 6.7;
    }
}

macro_rules! rate_controller {
    ($name:ident, $end:ident, $field:ident, $default:expr, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone)]
        pub struct $name {
            /// Whether the controller runs.
            pub enabled: bool,
            /// Range the end value is drawn from.
            pub $end: ValueRange<f32>,
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    enabled: true,
                    $end: ValueRange::constant($default),
                }
            }
        }

        impl ParticleController for $name {
            /// Change per second needed to reach the end value on time.
            type Tag = f32;

            fn is_enabled(&self) -> bool {
                self.enabled
            }

            fn reset(&mut self, particle: &mut Particle, tag: &mut f32, rng: &mut dyn RngCore) {
                *tag = if particle.duration > 0.0 {
                    (self.$end.sample(rng) - particle.$field) / particle.duration
                } else {
                    0.0
                };
            }

            fn update(&mut self, particle: &mut Particle, tag: &mut f32, dt: f32) {
                particle.$field += *tag * dt;
            }
        }
    };
}

rate_controller!(
    SizeController,
    end_size,
    size,
    1.0,
    "Grows or shrinks each particle linearly to a random end size."
);

rate_controller!(
    RotationController,
    end_rotation,
    rotation,
    0.0,
    "Spins each particle linearly to a random end rotation."
);

/// Scales each particle's speed so it reaches `end_speed` times its
/// emitted speed at the end of its life.
#[derive(Debug, Clone)]
pub struct SpeedController {
    /// Whether the controller runs.
    pub enabled: bool,
    /// Range the end factor is drawn from.
    pub end_speed: ValueRange<f32>,
}

impl Default for SpeedController {
    fn default() -> Self {
        Self {
            enabled: true,
            end_speed: ValueRange::constant(1.0),
        }
    }
}

impl ParticleController for SpeedController {
    type Tag = f32;

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn reset(&mut self, _particle: &mut Particle, tag: &mut f32, rng: &mut dyn RngCore) {
        *tag = self.end_speed.sample(rng);
    }

    fn update(&mut self, particle: &mut Particle, tag: &mut f32, dt: f32) {
        let remaining = particle.duration - particle.elapsed_time;
        if remaining > f32::EPSILON {
            particle.velocity -= particle.velocity * (1.0 - *tag) * (dt / remaining);
        }
    }
}

/// Applies a constant acceleration.
#[derive(Debug, Clone)]
pub struct ForceController {
    /// Whether the controller runs.
    pub enabled: bool,
    /// Acceleration in units per second squared.
    pub force: Vec3,
}

impl Default for ForceController {
    fn default() -> Self {
        Self {
            enabled: true,
            force: Vec3::NEG_Y,
        }
    }
}

impl ParticleController for ForceController {
    type Tag = ();

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn update(&mut self, particle: &mut Particle, _tag: &mut (), dt: f32) {
        particle.velocity += self.force * dt;
    }
}

/// Accelerates particles tangentially around an axis through `center`.
#[derive(Debug, Clone)]
pub struct TangentForceController {
    /// Whether the controller runs.
    pub enabled: bool,
    /// Tangential acceleration.
    pub force: f32,
    /// Axis of rotation.
    pub up: Vec3,
    /// Point the axis passes through.
    pub center: Vec3,
}

impl Default for TangentForceController {
    fn default() -> Self {
        Self {
            enabled: true,
            force: 0.0,
            up: Vec3::Y,
            center: Vec3::ZERO,
        }
    }
}

impl ParticleController for TangentForceController {
    type Tag = ();

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn update(&mut self, particle: &mut Particle, _tag: &mut (), dt: f32) {
        let tangent = self.up.cross(particle.position - self.center).normalize_or_zero();
        particle.velocity += tangent * self.force * dt;
    }
}

/// Pulls particles toward `position`.
#[derive(Debug, Clone)]
pub struct AbsorbController {
    /// Whether the controller runs.
    pub enabled: bool,
    /// Attractor location.
    pub position: Vec3,
    /// Acceleration toward the attractor.
    pub force: f32,
}

impl Default for AbsorbController {
    fn default() -> Self {
        Self {
            enabled: true,
            position: Vec3::ZERO,
            force: 0.0,
        }
    }
}

impl ParticleController for AbsorbController {
    type Tag = ();

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn update(&mut self, particle: &mut Particle, _tag: &mut (), dt: f32) {
        let toward = (self.position - particle.position).normalize_or_zero();
        particle.velocity += toward * self.force * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn particle() -> Particle {
        Particle::new(Vec3::ZERO, Vec3::X, 2.0)
    }

    #[test]
    fn test_color_reaches_end_color_at_end_of_life() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut controller = ColorController {
            end_color: ValueRange::constant(Color::BLACK),
            ..ColorController::default()
        };
        let mut p = particle();
        let mut tag = ValueRange::default();
        controller.reset(&mut p, &mut tag, &mut rng);
        p.age = 1.0;
        controller.update(&mut p, &mut tag, 0.0);
        assert_eq!(p.color, Color::BLACK);
        p.age = 0.0;
        controller.update(&mut p, &mut tag, 0.0);
        assert_eq!(p.color, Color::WHITE);
    }

    #[test]
    fn test_fade_curve() {
        let mut controller = FadeController::default();
        let mut p = particle();
        for (age, expected) in [(0.0, 0.0), (1.0, 0.0), (0.5, 0.8375)] {
            p.age = age;
            controller.update(&mut p, &mut (), 0.0);
            assert!((p.alpha - expected).abs() < 1e-5, "age {age}");
        }
    }

    #[test]
    fn test_size_reaches_end_size_over_duration() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut controller = SizeController {
            end_size: ValueRange::constant(5.0),
            ..SizeController::default()
        };
        let mut p = particle();
        let mut tag = 0.0;
        controller.reset(&mut p, &mut tag, &mut rng);
        for _ in 0..20 {
            controller.update(&mut p, &mut tag, 0.1);
        }
        assert!((p.size - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_speed_scales_to_end_factor() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut controller = SpeedController {
            end_speed: ValueRange::constant(0.0),
            ..SpeedController::default()
        };
        let mut p = particle();
        let mut tag = 0.0;
        controller.reset(&mut p, &mut tag, &mut rng);
        for _ in 0..19 {
            controller.update(&mut p, &mut tag, 0.1);
            p.update(0.1);
        }
        assert!(p.velocity.length() < 0.06);
        assert!(p.velocity.x > 0.0);
    }

    #[test]
    fn test_default_force_pulls_down() {
        let mut controller = ForceController::default();
        let mut p = particle();
        controller.update(&mut p, &mut (), 0.5);
        assert_eq!(p.velocity, Vec3::new(1.0, -0.5, 0.0));
    }

    #[test]
    fn test_tangent_force_is_perpendicular() {
        let mut controller = TangentForceController {
            force: 2.0,
            ..TangentForceController::default()
        };
        let mut p = Particle::new(Vec3::X, Vec3::ZERO, 1.0);
        controller.update(&mut p, &mut (), 0.5);
        assert!((p.velocity - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-6);
    }

    #[test]
    fn test_absorb_pulls_toward_point() {
        let mut controller = AbsorbController {
            position: Vec3::new(0.0, 10.0, 0.0),
            force: 4.0,
            ..AbsorbController::default()
        };
        let mut p = Particle::new(Vec3::ZERO, Vec3::ZERO, 1.0);
        controller.update(&mut p, &mut (), 0.25);
        assert_eq!(p.velocity, Vec3::Y);
    }
}
