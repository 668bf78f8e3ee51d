//! Blinn-Phong specular term.

use crate::context::DrawingContext;
use crate::texture::{Texture, TextureUsage};
use glam::Vec3;
use std::borrow::Cow;

use crate::material::part::downcast_mut;
use crate::material::{MaterialBase, MaterialPart, MaterialUsage, ParameterHandle, PartBinder};

const SHADER_CODE: &str = "\
param float3 SpecularColor;
param float SpecularPower;
param texture SpecularMap;
void Specular(float2 uv, inout float3 specularColor, inout float specularPower)
{
    specularColor = SpecularColor * tex2D(SpecularMap, uv).rgb;
    specularPower = SpecularPower;
}
";

/// Specular color, power and an optional intensity map.
#[derive(Debug, Clone)]
pub struct SpecularPart {
    /// Highlight color.
    pub color: Vec3,
    /// Highlight exponent.
    pub power: f32,
    /// Intensity map, if any.
    pub specular_map: Option<Texture>,
    pub(super) color_param: Option<ParameterHandle>,
    pub(super) power_param: Option<ParameterHandle>,
    pub(super) map_param: Option<ParameterHandle>,
}

impl Default for SpecularPart {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            power: 16.0,
            specular_map: None,
            color_param: None,
            power_param: None,
            map_param: None,
        }
    }
}

impl MaterialPart for SpecularPart {
    fn on_bind(&mut self, binder: &PartBinder<'_>) {
        self.color_param = binder.optional("SpecularPart", "SpecularColor");
        self.power_param = binder.optional("SpecularPart", "SpecularPower");
        self.map_param = binder.parameter("SpecularMap");
    }

    fn shader_code(&self, usage: MaterialUsage) -> Option<Cow<'static, str>> {
        (usage == MaterialUsage::Default).then_some(Cow::Borrowed(SHADER_CODE))
    }

    fn begin_apply_local_parameters(&mut self, _context: &DrawingContext, _material: &MaterialBase) {
        if let Some(param) = &self.color_param {
            param.set(self.color);
        }
        if let Some(param) = &self.power_param {
            param.set(self.power);
        }
        if let Some(param) = &self.map_param {
            param.set(self.specular_map);
        }
    }

    fn resolve_material_part(&self, _usage: MaterialUsage, existing: &mut dyn MaterialPart) {
        if let Some(target) = downcast_mut::<Self>(existing) {
            target.color = self.color;
            target.power = self.power;
            target.specular_map = self.specular_map;
        }
    }

    fn clone_part(&self) -> Box<dyn MaterialPart> {
        Box::new(Self {
            color: self.color,
            power: self.power,
            specular_map: self.specular_map,
            ..Self::default()
        })
    }

    fn set_texture(&mut self, usage: TextureUsage, texture: Option<Texture>) {
        if usage == TextureUsage::Specular {
            self.specular_map = texture;
        }
    }
}
