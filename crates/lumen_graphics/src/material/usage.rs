//! Rendering purposes a material can be resolved for.

/// A rendering purpose requiring its own shader composition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MaterialUsage {
    /// Regular color pass. Served by the material itself.
    #[default]
    Default,
    /// Depth-only pass (shadow casters, depth prepass).
    Depth,
    /// View-space normals only.
    Normal,
    /// Depth and normals in one pass (deferred lighting G-buffer).
    DepthAndNormal,
    /// Additive per-light pass.
    Light,
}

impl MaterialUsage {
    /// Number of usages.
    pub const COUNT: usize = 5;

    /// Every usage, in index order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Default,
        Self::Depth,
        Self::Normal,
        Self::DepthAndNormal,
        Self::Light,
    ];

    /// Dense index, suitable for per-usage arrays.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns `true` for usages that output depth.
    #[inline]
    #[must_use]
    pub const fn writes_depth(self) -> bool {
        matches!(self, Self::Depth | Self::DepthAndNormal)
    }

    /// Returns `true` for usages that output normals.
    #[inline]
    #[must_use]
    pub const fn writes_normal(self) -> bool {
        matches!(self, Self::Normal | Self::DepthAndNormal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_are_dense() {
        for (i, usage) in MaterialUsage::ALL.iter().enumerate() {
            assert_eq!(usage.index(), i);
        }
    }
}
