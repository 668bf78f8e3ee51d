//! Shadow sampling and lighting finalization.

use crate::context::DrawingContext;
use crate::texture::{Texture, TextureUsage};
use glam::{Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::borrow::Cow;
use std::f64::consts::TAU;
use std::fmt::Write as _;

use crate::material::part::downcast_mut;
use crate::material::{
    MaterialBase, MaterialPart, MaterialUsage, ParameterHandle, PartBinder, PartType,
    SemanticBindings,
};

const END_LIGHT_CODE: &str = "\
param float3 AmbientLightColor;
param float3 DirectionalLightDirection;
param float3 DirectionalLightDiffuse;
param float3 DirectionalLightSpecular;
param float3 EyePosition : EYEPOSITION;
void EndLight(float3 diffuse, float3 specular, inout float4 color)
{
    color.rgb = color.rgb * (AmbientLightColor + diffuse) + specular;
}
";

/// Sums ambient and directional light into the final color.
#[derive(Debug, Clone, Default)]
pub struct EndLightPart {
    ambient: Option<ParameterHandle>,
    direction: Option<ParameterHandle>,
    diffuse: Option<ParameterHandle>,
    specular: Option<ParameterHandle>,
    semantics: SemanticBindings,
}

impl MaterialPart for EndLightPart {
    fn on_bind(&mut self, binder: &PartBinder<'_>) {
        self.ambient = binder.optional("EndLightPart", "AmbientLightColor");
        self.direction = binder.parameter("DirectionalLightDirection");
        self.diffuse = binder.parameter("DirectionalLightDiffuse");
        self.specular = binder.parameter("DirectionalLightSpecular");
        let eye: Vec<ParameterHandle> = binder.parameter("EyePosition").into_iter().collect();
        self.semantics = SemanticBindings::bind(&eye);
    }

    fn shader_code(&self, usage: MaterialUsage) -> Option<Cow<'static, str>> {
        (usage == MaterialUsage::Default).then_some(Cow::Borrowed(END_LIGHT_CODE))
    }

    fn apply_global_parameters(&mut self, context: &DrawingContext) {
        let light = &context.directional_light;
        if let Some(param) = &self.ambient {
            param.set(context.ambient_light);
        }
        if let Some(param) = &self.direction {
            param.set(light.direction);
        }
        if let Some(param) = &self.diffuse {
            param.set(light.diffuse);
        }
        if let Some(param) = &self.specular {
            param.set(light.specular);
        }
        self.semantics.apply_global(context, &MaterialBase::DEFAULT);
    }

    fn clone_part(&self) -> Box<dyn MaterialPart> {
        Box::new(Self::default())
    }
}

/// Default number of filter taps per side.
pub const DEFAULT_FILTER_SIZE: u32 = 3;

/// Default tap jitter seed.
pub const DEFAULT_SHADOW_SEED: u64 = 20_090_817;

/// Percentage-closer filtered shadow from the main directional light.
///
/// The filter kernel is a jittered disc of `filter_size²` taps baked into
/// the fragment, so changing the size or seed changes the shader.
#[derive(Debug, Clone)]
pub struct ShadowMapPart {
    /// Color multiplied into shadowed areas.
    pub shadow_color: Vec3,
    /// Overrides the light's shadow map when set.
    pub shadow_map: Option<Texture>,
    filter_size: u32,
    seed: u64,
    shader_changed: bool,
    shadow_color_param: Option<ParameterHandle>,
    light_view_projection_param: Option<ParameterHandle>,
    texel_size_param: Option<ParameterHandle>,
    shadow_map_param: Option<ParameterHandle>,
}

impl Default for ShadowMapPart {
    fn default() -> Self {
        Self {
            shadow_color: Vec3::splat(0.5),
            shadow_map: None,
            filter_size: DEFAULT_FILTER_SIZE,
            seed: DEFAULT_SHADOW_SEED,
            shader_changed: false,
            shadow_color_param: None,
            light_view_projection_param: None,
            texel_size_param: None,
            shadow_map_param: None,
        }
    }
}

impl ShadowMapPart {
    /// Taps per side of the filter kernel.
    #[inline]
    #[must_use]
    pub fn filter_size(&self) -> u32 {
        self.filter_size
    }

    /// Sets the kernel size. Raises shader-changed when it differs.
    pub fn set_filter_size(&mut self, filter_size: u32) {
        if self.filter_size != filter_size {
            self.filter_size = filter_size;
            self.shader_changed = true;
        }
    }

    /// Tap jitter seed.
    #[inline]
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Sets the jitter seed. Raises shader-changed when it differs.
    pub fn set_seed(&mut self, seed: u64) {
        if self.seed != seed {
            self.seed = seed;
            self.shader_changed = true;
        }
    }

    /// Jittered disc offsets, one per tap, in row-major cell order.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn filter_taps(&self) -> Vec<Vec2> {
        let size = self.filter_size.max(1);
        let inv = 1.0 / f64::from(size);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut taps = Vec::with_capacity((size * size) as usize);
        for x in 0..size {
            for y in 0..size {
                let u = (f64::from(x) + rng.gen::<f64>()) * inv * TAU;
                let v = ((f64::from(y) + rng.gen::<f64>()) * inv).sqrt();
                taps.push(Vec2::new((v * u.cos()) as f32, (v * u.sin()) as f32));
            }
        }
        taps
    }

    fn code(&self) -> String {
        let taps = self.filter_taps();
        let mut code = String::from(
            "param float3 ShadowColor;\n\
             param float4x4 LightViewProjection;\n\
             param float2 ShadowMapTexelSize;\n\
             param texture ShadowMap;\n",
        );
        let _ = writeln!(code, "#define SAMPLE_COUNT {}", taps.len());
        code.push_str("static const float2 FilterTaps[SAMPLE_COUNT] =\n{\n");
        for tap in &taps {
            let _ = writeln!(code, "    {{{}, {}}},", tap.x, tap.y);
        }
        code.push_str("};\n");
        code
    }
}

impl MaterialPart for ShadowMapPart {
    fn on_bind(&mut self, binder: &PartBinder<'_>) {
        self.shadow_map_param = binder.optional("ShadowMapPart", "ShadowMap");
        self.shadow_color_param = binder.parameter("ShadowColor");
        self.light_view_projection_param = binder.parameter("LightViewProjection");
        self.texel_size_param = binder.parameter("ShadowMapTexelSize");
    }

    fn shader_code(&self, usage: MaterialUsage) -> Option<Cow<'static, str>> {
        (usage == MaterialUsage::Default).then(|| Cow::Owned(self.code()))
    }

    fn dependent_parts(&self, _usage: MaterialUsage, result: &mut Vec<PartType>) {
        result.push(PartType::of::<EndLightPart>());
    }

    #[allow(clippy::cast_precision_loss)]
    fn begin_apply_local_parameters(&mut self, context: &DrawingContext, _material: &MaterialBase) {
        let Some(param) = &self.shadow_map_param else {
            return;
        };
        let Some(shadow) = context.directional_light.shadow else {
            return;
        };
        let texture = self.shadow_map.unwrap_or(shadow.texture);
        param.set(texture);
        if let Some(texel) = &self.texel_size_param {
            texel.set(Vec2::new(
                1.0 / texture.width().max(1) as f32,
                1.0 / texture.height().max(1) as f32,
            ));
        }
        if let Some(matrix) = &self.light_view_projection_param {
            matrix.set(shadow.light_view_projection);
        }
        if let Some(color) = &self.shadow_color_param {
            color.set(self.shadow_color);
        }
    }

    fn resolve_material_part(&self, _usage: MaterialUsage, existing: &mut dyn MaterialPart) {
        if let Some(target) = downcast_mut::<Self>(existing) {
            target.shadow_color = self.shadow_color;
            target.shadow_map = self.shadow_map;
        }
    }

    fn clone_part(&self) -> Box<dyn MaterialPart> {
        Box::new(Self {
            shadow_color: self.shadow_color,
            shadow_map: self.shadow_map,
            filter_size: self.filter_size,
            seed: self.seed,
            ..Self::default()
        })
    }

    fn set_texture(&mut self, usage: TextureUsage, texture: Option<Texture>) {
        if usage == TextureUsage::ShadowMap {
            self.shadow_map = texture;
        }
    }

    fn take_shader_changed(&mut self) -> bool {
        std::mem::take(&mut self.shader_changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taps_are_deterministic_per_seed() {
        let a = ShadowMapPart::default();
        let b = ShadowMapPart::default();
        assert_eq!(a.filter_taps(), b.filter_taps());

        let mut c = ShadowMapPart::default();
        c.set_seed(7);
        assert_ne!(a.filter_taps(), c.filter_taps());
    }

    #[test]
    fn test_taps_lie_in_unit_disc() {
        let mut part = ShadowMapPart::default();
        part.set_filter_size(5);
        let taps = part.filter_taps();
        assert_eq!(taps.len(), 25);
        assert!(taps.iter().all(|t| t.length() <= 1.0 + 1e-5));
    }

    #[test]
    fn test_filter_size_change_raises_shader_changed() {
        let mut part = ShadowMapPart::default();
        part.set_filter_size(DEFAULT_FILTER_SIZE);
        assert!(!part.take_shader_changed());
        part.set_filter_size(4);
        assert!(part.take_shader_changed());
        assert!(part
            .shader_code(MaterialUsage::Default)
            .unwrap()
            .contains("#define SAMPLE_COUNT 16"));
    }
}
