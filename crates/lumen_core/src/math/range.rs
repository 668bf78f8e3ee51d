//! Min/max value ranges.

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::Color;

/// Types that can be linearly interpolated.
pub trait Lerp: Copy {
    /// Interpolates from `self` towards `other` by `t`.
    #[must_use]
    fn lerp_to(self, other: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    #[inline]
    fn lerp_to(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for Vec2 {
    #[inline]
    fn lerp_to(self, other: Self, t: f32) -> Self {
        self.lerp(other, t)
    }
}

impl Lerp for Vec3 {
    #[inline]
    fn lerp_to(self, other: Self, t: f32) -> Self {
        self.lerp(other, t)
    }
}

impl Lerp for Color {
    #[inline]
    fn lerp_to(self, other: Self, t: f32) -> Self {
        self.lerp(other, t)
    }
}

/// An inclusive `[min, max]` range of values.
///
/// Emitters sample one value per particle; controllers interpolate
/// across it over a particle's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueRange<T> {
    /// Lower end.
    pub min: T,
    /// Upper end.
    pub max: T,
}

impl<T> ValueRange<T> {
    /// Creates a range from its two ends.
    #[inline]
    #[must_use]
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: Copy> ValueRange<T> {
    /// A degenerate range holding a single value.
    #[inline]
    #[must_use]
    pub const fn constant(value: T) -> Self {
        Self { min: value, max: value }
    }
}

impl<T: Lerp> ValueRange<T> {
    /// Value at `t` in `[0, 1]` between `min` and `max`.
    #[inline]
    #[must_use]
    pub fn lerp(&self, t: f32) -> T {
        self.min.lerp_to(self.max, t)
    }

    /// Draws a uniformly distributed value from the range.
    #[inline]
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        self.lerp(rng.gen::<f32>())
    }
}

impl ValueRange<f32> {
    /// Returns `true` if `min == max`.
    #[inline]
    #[must_use]
    pub fn is_constant(&self) -> bool {
        (self.max - self.min).abs() <= f32::EPSILON
    }
}

impl<T: Copy> From<T> for ValueRange<T> {
    fn from(value: T) -> Self {
        Self::constant(value)
    }
}
