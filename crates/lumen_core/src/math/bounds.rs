//! Axis-aligned bounding boxes.

use glam::{Mat4, Vec3};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl BoundingBox {
    /// Creates a box from its two corners.
    #[inline]
    #[must_use]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// A zero-sized box at `point`.
    #[inline]
    #[must_use]
    pub const fn from_point(point: Vec3) -> Self {
        Self { min: point, max: point }
    }

    /// A box centered at `center` extending `half_extents` each way.
    #[inline]
    #[must_use]
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Center point.
    #[inline]
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Full size along each axis.
    #[inline]
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Grows the box by `amount` on every side.
    #[inline]
    #[must_use]
    pub fn inflate(&self, amount: f32) -> Self {
        self.pad(Vec3::splat(amount))
    }

    /// Grows the box by `padding` per axis on both sides.
    #[inline]
    #[must_use]
    pub fn pad(&self, padding: Vec3) -> Self {
        Self {
            min: self.min - padding,
            max: self.max + padding,
        }
    }

    /// Smallest box containing both.
    #[inline]
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns `true` if `point` lies inside or on the box.
    #[inline]
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Bounds of this box after transforming its eight corners.
    #[must_use]
    pub fn transform(&self, matrix: &Mat4) -> Self {
        let mut out = Self::from_point(matrix.transform_point3(self.min));
        for i in 1..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            let p = matrix.transform_point3(corner);
            out.min = out.min.min(p);
            out.max = out.max.max(p);
        }
        out
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::from_point(Vec3::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inflate_and_contains() {
        let bounds = BoundingBox::from_point(Vec3::ZERO).inflate(1.0);
        assert!(bounds.contains(Vec3::new(0.5, -1.0, 1.0)));
        assert!(!bounds.contains(Vec3::new(1.5, 0.0, 0.0)));
    }

    #[test]
    fn test_pad_is_per_axis() {
        let bounds = BoundingBox::from_point(Vec3::ZERO).pad(Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(bounds.size(), Vec3::new(2.0, 4.0, 0.0));
    }

    #[test]
    fn test_transform_translates() {
        let bounds = BoundingBox::from_center(Vec3::ZERO, Vec3::ONE);
        let moved = bounds.transform(&Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)));
        assert_eq!(moved.center(), Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(moved.size(), Vec3::splat(2.0));
    }
}
