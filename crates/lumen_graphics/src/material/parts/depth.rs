//! Depth and normal outputs for the geometry-only usages.

use crate::context::DrawingContext;
use crate::texture::{Texture, TextureUsage};
use std::borrow::Cow;

use crate::material::part::downcast_mut;
use crate::material::{MaterialBase, MaterialPart, MaterialUsage, ParameterHandle, PartBinder};

const DEPTH_CODE: &str = "\
param float DepthBias;
void Depth(float4 position, out float depth)
{
    depth = position.z / position.w + DepthBias;
}
";

const NORMAL_CODE: &str = "\
param texture NormalMap;
void Normal(float2 uv, float3x3 tangentFrame, inout float3 normal)
{
    normal = normalize(mul(tex2D(NormalMap, uv).xyz * 2 - 1, tangentFrame));
}
";

/// Writes post-projection depth. Used by the depth usages.
#[derive(Debug, Clone, Default)]
pub struct DepthPart {
    /// Constant offset added to the written depth.
    pub depth_bias: f32,
    bias_param: Option<ParameterHandle>,
}

impl MaterialPart for DepthPart {
    fn on_bind(&mut self, binder: &PartBinder<'_>) {
        self.bias_param = binder.parameter("DepthBias");
    }

    fn shader_code(&self, usage: MaterialUsage) -> Option<Cow<'static, str>> {
        usage.writes_depth().then_some(Cow::Borrowed(DEPTH_CODE))
    }

    fn begin_apply_local_parameters(&mut self, _context: &DrawingContext, _material: &MaterialBase) {
        if let Some(param) = &self.bias_param {
            param.set(self.depth_bias);
        }
    }

    fn resolve_material_part(&self, _usage: MaterialUsage, existing: &mut dyn MaterialPart) {
        if let Some(target) = downcast_mut::<Self>(existing) {
            target.depth_bias = self.depth_bias;
        }
    }

    fn clone_part(&self) -> Box<dyn MaterialPart> {
        Box::new(Self {
            depth_bias: self.depth_bias,
            bias_param: None,
        })
    }
}

/// Writes view-space normals, optionally perturbed by a normal map.
#[derive(Debug, Clone, Default)]
pub struct NormalPart {
    /// Tangent-space normal map.
    pub normal_map: Option<Texture>,
    map_param: Option<ParameterHandle>,
}

impl MaterialPart for NormalPart {
    fn on_bind(&mut self, binder: &PartBinder<'_>) {
        self.map_param = binder.parameter("NormalMap");
    }

    fn shader_code(&self, usage: MaterialUsage) -> Option<Cow<'static, str>> {
        usage.writes_normal().then_some(Cow::Borrowed(NORMAL_CODE))
    }

    fn begin_apply_local_parameters(&mut self, _context: &DrawingContext, _material: &MaterialBase) {
        if let Some(param) = &self.map_param {
            param.set(self.normal_map);
        }
    }

    fn resolve_material_part(&self, _usage: MaterialUsage, existing: &mut dyn MaterialPart) {
        if let Some(target) = downcast_mut::<Self>(existing) {
            target.normal_map = self.normal_map;
        }
    }

    fn clone_part(&self) -> Box<dyn MaterialPart> {
        Box::new(Self {
            normal_map: self.normal_map,
            map_param: None,
        })
    }

    fn set_texture(&mut self, usage: TextureUsage, texture: Option<Texture>) {
        if usage == TextureUsage::NormalMap {
            self.normal_map = texture;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_gating() {
        assert!(DepthPart::default().shader_code(MaterialUsage::Depth).is_some());
        assert!(DepthPart::default().shader_code(MaterialUsage::Normal).is_none());
        assert!(NormalPart::default().shader_code(MaterialUsage::DepthAndNormal).is_some());
        assert!(NormalPart::default().shader_code(MaterialUsage::Default).is_none());
    }
}
