//! Object to clip space transform, with optional skinning.

use crate::context::DrawingContext;
use glam::Mat4;
use std::borrow::Cow;

use crate::material::{
    MaterialBase, MaterialPart, MaterialUsage, ParameterHandle, PartBinder, PartType,
    SemanticBindings,
};

use super::{DepthPart, NormalPart};

const SHADER_CODE: &str = "\
param float4x4 World : WORLD;
param float4x4 ViewProjection : VIEWPROJECTION;
param float4x4[] Bones;
void VertexTransform(inout float4 position, inout float3 normal, float4 weights, int4 indices)
{
    position = mul(mul(position, Skin(Bones, weights, indices)), World);
    normal = normalize(mul(normal, (float3x3)World));
    position = mul(position, ViewProjection);
}
";

/// Transforms vertices by the world and view-projection matrices.
///
/// Contributes to every usage; depth and normal variants additionally
/// pull in [`DepthPart`] and [`NormalPart`].
#[derive(Debug, Clone, Default)]
pub struct VertexTransformPart {
    /// Skinning palette. Empty for rigid meshes.
    pub bone_transforms: Vec<Mat4>,
    semantics: SemanticBindings,
    bones: Option<ParameterHandle>,
}

impl VertexTransformPart {
    /// Number of bound semantic parameters, local and global.
    #[must_use]
    pub fn bound_semantics(&self) -> usize {
        self.semantics.global_count() + self.semantics.local_count()
    }
}

impl MaterialPart for VertexTransformPart {
    fn on_bind(&mut self, binder: &PartBinder<'_>) {
        let handles: Vec<ParameterHandle> = ["World", "ViewProjection"]
            .into_iter()
            .filter_map(|name| binder.optional("VertexTransformPart", name))
            .collect();
        self.semantics = SemanticBindings::bind(&handles);
        self.bones = binder.parameter("Bones");
    }

    fn shader_code(&self, _usage: MaterialUsage) -> Option<Cow<'static, str>> {
        Some(Cow::Borrowed(SHADER_CODE))
    }

    fn dependent_parts(&self, usage: MaterialUsage, result: &mut Vec<PartType>) {
        if usage.writes_depth() {
            result.push(PartType::of::<DepthPart>());
        }
        if usage.writes_normal() {
            result.push(PartType::of::<NormalPart>());
        }
    }

    fn apply_global_parameters(&mut self, context: &DrawingContext) {
        self.semantics.apply_global(context, &MaterialBase::DEFAULT);
    }

    fn begin_apply_local_parameters(&mut self, context: &DrawingContext, material: &MaterialBase) {
        self.semantics.apply_local(context, material);
        if let Some(bones) = &self.bones {
            if !self.bone_transforms.is_empty() {
                bones.set(self.bone_transforms.clone());
            }
        }
    }

    fn resolve_material_part(&self, _usage: MaterialUsage, existing: &mut dyn MaterialPart) {
        if let Some(target) = crate::material::part::downcast_mut::<Self>(existing) {
            target.bone_transforms.clone_from(&self.bone_transforms);
        }
    }

    fn clone_part(&self) -> Box<dyn MaterialPart> {
        Box::new(Self {
            bone_transforms: self.bone_transforms.clone(),
            ..Self::default()
        })
    }
}
