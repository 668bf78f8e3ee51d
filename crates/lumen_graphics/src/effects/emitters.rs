//! # Standard Emitter
//!
//! Timed emission from a simple shape:
//!
//! ```text
//!   t = 0 ─ delay ──┬─ first particle
//!                   ├─ one particle every 1/emission seconds
//!                   └─ delay + lifetime ──> done (update returns true)
//! ```
//!
//! With `emit_count > 0` the emitter is a burst: it emits that many
//! particles on its first active update and is done immediately.
//!
//! All randomness comes from a seeded ChaCha stream, so two emitters with
//! the same seed and settings produce identical particles.

use super::{EmitContext, Particle, ParticleEmitter};
use glam::{Mat4, Vec3};
use lumen_core::{BoundingBox, Color, ValueRange};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Seed used by [`StandardEmitter::new`].
pub const DEFAULT_EMITTER_SEED: u64 = 0x5EED_1E55;

/// Where particles are born and which way they head.
#[derive(Debug, Clone, PartialEq)]
pub enum EmitterShape {
    /// The emitter origin.
    Point,
    /// Uniformly inside a box.
    Box(BoundingBox),
    /// Inside or on the surface of a sphere around the origin.
    Sphere {
        /// Sphere radius.
        radius: f32,
        /// Emit on the surface only.
        shell: bool,
        /// Head straight away from the center instead of a random spread.
        radiate: bool,
    },
    /// Along line segments, weighted by their length.
    Line(Vec<(Vec3, Vec3)>),
}

impl EmitterShape {
    /// Local-space bounds of the shape.
    #[must_use]
    pub fn bounds(&self) -> BoundingBox {
        match self {
            Self::Point => BoundingBox::from_point(Vec3::ZERO),
            Self::Box(bounds) => *bounds,
            Self::Sphere { radius, .. } => BoundingBox::from_center(Vec3::ZERO, Vec3::splat(*radius)),
            Self::Line(segments) => segments
                .iter()
                .map(|&(a, b)| BoundingBox::from_point(a).merge(&BoundingBox::from_point(b)))
                .reduce(|acc, segment| acc.merge(&segment))
                .unwrap_or_else(|| BoundingBox::from_point(Vec3::ZERO)),
        }
    }
}

/// The general-purpose emitter.
#[derive(Debug, Clone)]
pub struct StandardEmitter {
    /// Disabled emitters emit nothing but are never done.
    pub enabled: bool,
    /// Burst size. Zero means continuous emission.
    pub emit_count: usize,
    /// Particles per second in continuous mode.
    pub emission: f32,
    /// Seconds before the first particle.
    pub delay: f32,
    /// Seconds of emission after the delay.
    pub lifetime: f32,
    /// Particle lifetime in seconds.
    pub duration: ValueRange<f32>,
    /// Initial color.
    pub color: ValueRange<Color>,
    /// Initial size.
    pub size: ValueRange<f32>,
    /// Initial rotation.
    pub rotation: ValueRange<f32>,
    /// Initial speed.
    pub speed: ValueRange<f32>,
    /// Cone half-angle around +Y. `PI` or more means any direction.
    pub spread: f32,
    /// Emission shape.
    pub shape: EmitterShape,
    transform: Mat4,
    elapsed: f32,
    time_left_over: f32,
    first_emitted: bool,
    rng: ChaCha8Rng,
}

impl StandardEmitter {
    /// Continuous emitter of one particle per second, seeded with
    /// [`DEFAULT_EMITTER_SEED`].
    #[must_use]
    pub fn new(shape: EmitterShape) -> Self {
        Self {
            enabled: true,
            emit_count: 0,
            emission: 1.0,
            delay: 0.0,
            lifetime: f32::INFINITY,
            duration: ValueRange::constant(1.0),
            color: ValueRange::constant(Color::WHITE),
            size: ValueRange::constant(1.0),
            rotation: ValueRange::constant(0.0),
            speed: ValueRange::constant(0.0),
            spread: PI,
            shape,
            transform: Mat4::IDENTITY,
            elapsed: 0.0,
            time_left_over: 0.0,
            first_emitted: false,
            rng: ChaCha8Rng::seed_from_u64(DEFAULT_EMITTER_SEED),
        }
    }

    /// Replaces the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    /// Local to world transform applied to positions and velocities.
    #[inline]
    #[must_use]
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// Moves the emitter.
    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
    }

    /// Restarts delay, lifetime and the emission clock.
    pub fn restart(&mut self) {
        self.elapsed = 0.0;
        self.time_left_over = 0.0;
        self.first_emitted = false;
    }

    /// Random unit vector within `spread` of +Y.
    fn random_direction(&mut self) -> Vec3 {
        if self.spread >= PI {
            let angle = self.rng.gen::<f32>() * TAU;
            let y = self.rng.gen::<f32>() * 2.0 - 1.0;
            let r = (1.0 - y * y).max(0.0).sqrt();
            Vec3::new(angle.cos() * r, y, angle.sin() * r)
        } else if self.spread <= 0.0 {
            Vec3::Y
        } else {
            let a = self.rng.gen::<f32>() * TAU;
            let b = FRAC_PI_2 - self.rng.gen::<f32>() * self.spread;
            let r = b.cos();
            Vec3::new(r * a.cos(), b.sin(), r * a.sin())
        }
    }

    /// Local position and unit direction for a new particle.
    fn sample_shape(&mut self) -> Option<(Vec3, Vec3)> {
        match &self.shape {
            EmitterShape::Point => Some((Vec3::ZERO, self.random_direction())),
            EmitterShape::Box(bounds) => {
                let (min, size) = (bounds.min, bounds.size());
                let t = Vec3::new(self.rng.gen(), self.rng.gen(), self.rng.gen());
                Some((min + size * t, self.random_direction()))
            }
            &EmitterShape::Sphere {
                radius,
                shell,
                radiate,
            } => {
                let spread = std::mem::replace(&mut self.spread, PI);
                let normal = self.random_direction();
                self.spread = spread;
                let direction = if radiate { normal } else { self.random_direction() };
                let radius = if shell { radius } else { radius * self.rng.gen::<f32>() };
                Some((normal * radius, direction))
            }
            EmitterShape::Line(segments) => {
                let total: f32 = segments.iter().map(|(a, b)| a.distance(*b)).sum();
                if segments.is_empty() {
                    return None;
                }
                let mut pick = self.rng.gen::<f32>() * total;
                let mut chosen = segments[segments.len() - 1];
                for &(a, b) in segments {
                    let length = a.distance(b);
                    if pick <= length {
                        chosen = (a, b);
                        break;
                    }
                    pick -= length;
                }
                let (a, b) = chosen;
                let t = self.rng.gen::<f32>();
                Some((a.lerp(b, t), self.random_direction()))
            }
        }
    }

    fn emit_one(&mut self, emit: &mut EmitContext<'_>) {
        let Some((position, direction)) = self.sample_shape() else {
            return;
        };
        let speed = self.speed.sample(&mut self.rng);
        let mut particle = Particle::new(
            self.transform.transform_point3(position),
            self.transform.transform_vector3(direction * speed),
            self.duration.sample(&mut self.rng),
        );
        particle.rotation = self.rotation.sample(&mut self.rng);
        particle.size = self.size.sample(&mut self.rng);
        particle.color = self.color.sample(&mut self.rng);
        emit.emit(particle);
    }
}

impl ParticleEmitter for StandardEmitter {
    fn update(&mut self, emit: &mut EmitContext<'_>, dt: f32) -> bool {
        if !self.enabled || dt < 0.0 {
            return false;
        }

        self.elapsed += dt;
        if self.elapsed < self.delay {
            return false;
        }
        if self.elapsed > self.delay + self.lifetime {
            return true;
        }

        if self.emit_count > 0 {
            for _ in 0..self.emit_count {
                self.emit_one(emit);
            }
            return true;
        }

        if !self.first_emitted {
            self.emit_one(emit);
            self.first_emitted = true;
        }

        // A non-positive or non-finite rate emits only the first particle.
        if !(self.emission.is_finite() && self.emission > 0.0) {
            return false;
        }
        let interval = 1.0 / self.emission;
        let mut budget = self.time_left_over + dt;
        while budget > interval {
            budget -= interval;
            self.emit_one(emit);
        }
        self.time_left_over = budget;
        false
    }

    fn bounding_box(&self) -> BoundingBox {
        let border = self.speed.max * self.duration.max + self.size.max * 0.5;
        self.shape.bounds().transform(&self.transform).inflate(border)
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn estimated_capacity(&self) -> Option<usize> {
        if self.emit_count > 0 {
            return Some(self.emit_count);
        }
        let estimate = self.emission * (self.duration.max + self.duration.min) * 0.8;
        if !estimate.is_finite() {
            return None;
        }
        Some((estimate as usize).next_power_of_two())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::emitter::ParticleEvents;
    use crate::effects::ParticleControllerCollection;
    use lumen_core::RingBuffer;

    struct Harness {
        ring: RingBuffer<Particle>,
        controllers: ParticleControllerCollection,
        rng: ChaCha8Rng,
        events: ParticleEvents,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                ring: RingBuffer::with_capacity(4),
                controllers: ParticleControllerCollection::new(),
                rng: ChaCha8Rng::seed_from_u64(0),
                events: ParticleEvents::default(),
            }
        }

        fn run(&mut self, emitter: &mut StandardEmitter, dt: f32) -> bool {
            let mut emit = EmitContext::new(
                &mut self.ring,
                &mut self.controllers,
                &mut self.rng,
                &mut self.events,
            );
            emitter.update(&mut emit, dt)
        }
    }

    #[test]
    fn test_burst_emits_once_and_finishes() {
        let mut harness = Harness::new();
        let mut emitter = StandardEmitter::new(EmitterShape::Point);
        emitter.emit_count = 10;
        assert!(harness.run(&mut emitter, 0.016));
        assert_eq!(harness.ring.len(), 10);
        assert_eq!(harness.events.emitted, 10);
    }

    #[test]
    fn test_continuous_rate() {
        let mut harness = Harness::new();
        let mut emitter = StandardEmitter::new(EmitterShape::Point);
        emitter.emission = 10.0;
        for _ in 0..10 {
            assert!(!harness.run(&mut emitter, 0.1001));
        }
        // One up front, then one per interval.
        assert_eq!(harness.ring.len(), 11);
    }

    #[test]
    fn test_delay_and_lifetime() {
        let mut harness = Harness::new();
        let mut emitter = StandardEmitter::new(EmitterShape::Point);
        emitter.delay = 0.5;
        emitter.lifetime = 1.0;
        assert!(!harness.run(&mut emitter, 0.25));
        assert_eq!(harness.ring.len(), 0);
        assert!(!harness.run(&mut emitter, 0.5));
        assert_eq!(harness.ring.len(), 1);
        assert!(harness.run(&mut emitter, 1.0));
    }

    #[test]
    fn test_same_seed_same_particles() {
        let mut a = Harness::new();
        let mut b = Harness::new();
        let make = || {
            let mut emitter = StandardEmitter::new(EmitterShape::Sphere {
                radius: 2.0,
                shell: false,
                radiate: false,
            })
            .with_seed(9);
            emitter.emit_count = 5;
            emitter.speed = ValueRange::new(1.0, 2.0);
            emitter
        };
        a.run(&mut make(), 0.1);
        b.run(&mut make(), 0.1);
        assert!(a.ring.iter().eq(b.ring.iter()));
    }

    #[test]
    fn test_shell_sphere_places_particles_on_surface() {
        let mut harness = Harness::new();
        let mut emitter = StandardEmitter::new(EmitterShape::Sphere {
            radius: 3.0,
            shell: true,
            radiate: true,
        });
        emitter.emit_count = 8;
        emitter.speed = ValueRange::constant(1.0);
        harness.run(&mut emitter, 0.1);
        for p in harness.ring.iter() {
            assert!((p.position.length() - 3.0).abs() < 1e-4);
            assert!((p.velocity - p.position / 3.0).length() < 1e-4);
        }
    }

    #[test]
    fn test_narrow_spread_heads_up() {
        let mut harness = Harness::new();
        let mut emitter = StandardEmitter::new(EmitterShape::Point);
        emitter.spread = 0.0;
        emitter.emit_count = 3;
        emitter.speed = ValueRange::constant(2.0);
        harness.run(&mut emitter, 0.1);
        assert!(harness.ring.iter().all(|p| p.velocity == Vec3::new(0.0, 2.0, 0.0)));
    }

    #[test]
    fn test_capacity_estimate() {
        let mut emitter = StandardEmitter::new(EmitterShape::Point);
        emitter.emission = 10.0;
        emitter.duration = ValueRange::new(1.0, 2.0);
        // 10 * 3 * 0.8 = 24 -> 32
        assert_eq!(emitter.estimated_capacity(), Some(32));
        emitter.emission = 0.0;
        assert_eq!(emitter.estimated_capacity(), Some(1));
        emitter.emit_count = 7;
        assert_eq!(emitter.estimated_capacity(), Some(7));
    }

    #[test]
    fn test_capacity_estimate_truncates_before_rounding_up() {
        let mut emitter = StandardEmitter::new(EmitterShape::Point);
        emitter.emission = 1.75;
        emitter.duration = ValueRange::new(1.0, 2.0);
        // 1.75 * 3 * 0.8 = 4.2 -> 4
        assert_eq!(emitter.estimated_capacity(), Some(4));
        emitter.emission = -3.0;
        assert_eq!(emitter.estimated_capacity(), Some(1));
    }

    #[test]
    fn test_non_positive_emission_terminates() {
        for emission in [-5.0, 0.0, f32::INFINITY, f32::NAN] {
            let mut harness = Harness::new();
            let mut emitter = StandardEmitter::new(EmitterShape::Point);
            emitter.emission = emission;
            assert!(!harness.run(&mut emitter, 0.5));
            assert!(!harness.run(&mut emitter, 0.5));
            assert_eq!(harness.ring.len(), 1);
        }
    }

    #[test]
    fn test_bounding_box_includes_travel() {
        let mut emitter = StandardEmitter::new(EmitterShape::Point);
        emitter.speed = ValueRange::constant(2.0);
        emitter.set_transform(Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)));
        let bounds = emitter.bounding_box();
        assert!(bounds.contains(Vec3::new(12.4, 0.0, 0.0)));
        assert!(!bounds.contains(Vec3::new(13.0, 0.0, 0.0)));
    }
}
