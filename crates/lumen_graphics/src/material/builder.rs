//! # Usage Variant Builder
//!
//! Derives the part list of a usage variant (depth, normal, light) from
//! a base group and builds its program.
//!
//! ```text
//!   base:     [VertexTransform, Texture, Specular]
//!                    │ keep parts with code for Depth
//!                    ▼
//!             [VertexTransform]
//!                    │ expand dependencies
//!                    ▼
//!   variant:  [VertexTransform, Depth]
//! ```

use crate::error::{GraphicsError, GraphicsResult};
use std::sync::Arc;

use super::parts::{TexturePart, VertexTransformPart};
use super::{MaterialGroup, MaterialPart, MaterialUsage, PartType};

/// Builds the variant of a group for one usage.
#[derive(Debug, Clone, Copy)]
pub struct VariantBuilder {
    usage: MaterialUsage,
}

impl VariantBuilder {
    /// Builder for `usage`.
    #[must_use]
    pub fn new(usage: MaterialUsage) -> Self {
        Self { usage }
    }

    /// Part list of the variant, before any program is built.
    ///
    /// 1. Clone the parts that contribute code for the usage.
    /// 2. Fall back to a plain untextured [`TexturePart`] if none do.
    /// 3. Expand dependencies (see [`expand_dependencies`]).
    /// 4. Append a [`VertexTransformPart`] if there is none.
    #[must_use]
    pub fn variant_parts(&self, source: &MaterialGroup) -> Vec<Box<dyn MaterialPart>> {
        let mut parts: Vec<Box<dyn MaterialPart>> = source
            .parts()
            .iter()
            .filter(|part| part.shader_code(self.usage).is_some())
            .map(|part| part.clone_part())
            .collect();

        if parts.is_empty() {
            parts.push(Box::new(TexturePart::untextured()));
        }

        expand_dependencies(self.usage, &mut parts);

        let vertex_transform = PartType::of::<VertexTransformPart>();
        if !parts.iter().any(|part| vertex_transform.matches(&**part)) {
            parts.push(Box::new(VertexTransformPart::default()));
        }
        parts
    }

    /// Builds the variant group with the source's shader builder.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::ProgramNotBuilt`] when the source has no
    /// shader builder, or the builder's own error.
    pub fn build(&self, source: &MaterialGroup) -> GraphicsResult<MaterialGroup> {
        let builder = source
            .shader_builder()
            .map(Arc::clone)
            .ok_or(GraphicsError::ProgramNotBuilt)?;

        let mut variant = MaterialGroup::for_usage(self.usage, Some(builder));
        variant.base = source.base.clone();
        variant.install_parts(self.variant_parts(source));
        variant.rebuild()?;
        Ok(variant)
    }
}

/// Inserts the parts each part depends on right after it.
///
/// A missing dependency is created with its default value and its own
/// dependencies are queued behind it. A dependency that already exists
/// elsewhere in the list is moved to just after the declaring part.
/// Parts inserted or moved this way are not themselves scanned again.
pub fn expand_dependencies(usage: MaterialUsage, parts: &mut Vec<Box<dyn MaterialPart>>) {
    let mut dependencies = Vec::new();
    let mut p = 0;
    while p < parts.len() {
        let mut current = p;
        parts[current].dependent_parts(usage, &mut dependencies);

        let mut i = 0;
        while i < dependencies.len() {
            let dependency: PartType = dependencies[i];
            if parts.iter().any(|part| dependency.matches(&**part)) {
                let mut kept = Vec::with_capacity(parts.len());
                let mut moved = Vec::new();
                for (index, part) in parts.drain(..).enumerate() {
                    if index == current {
                        current = kept.len();
                        kept.push(part);
                    } else if dependency.matches(&*part) {
                        moved.push(part);
                    } else {
                        kept.push(part);
                    }
                }
                *parts = kept;
                p = current;
                for part in moved {
                    p += 1;
                    parts.insert(p, part);
                }
            } else {
                let part = dependency.create();
                part.dependent_parts(usage, &mut dependencies);
                p += 1;
                parts.insert(p, part);
            }
            i += 1;
        }

        dependencies.clear();
        p += 1;
    }
}
