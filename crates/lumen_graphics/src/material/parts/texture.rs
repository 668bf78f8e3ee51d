//! Diffuse texture, color, alpha and vertex color.

use crate::context::DrawingContext;
use crate::texture::{Texture, TextureUsage};
use glam::Vec3;
use std::borrow::Cow;

use crate::material::part::downcast_mut;
use crate::material::{
    MaterialBase, MaterialPart, MaterialUsage, ParameterHandle, PartBinder, SemanticBindings,
};

/// Samples the diffuse texture and tints it.
///
/// The three feature flags change the generated fragment; toggling one
/// raises the shader-changed flag.
#[derive(Debug, Clone)]
pub struct TexturePart {
    /// Texture sampled when texturing is enabled. Falls back to the
    /// material's texture.
    pub texture: Option<Texture>,
    /// Tint applied when diffuse color is enabled.
    pub diffuse_color: Vec3,
    pub(super) texture_enabled: bool,
    pub(super) diffuse_color_enabled: bool,
    pub(super) vertex_color_enabled: bool,
    pub(super) shader_changed: bool,
    pub(super) texture_param: Option<ParameterHandle>,
    pub(super) diffuse_param: Option<ParameterHandle>,
    pub(super) semantics: SemanticBindings,
}

impl Default for TexturePart {
    fn default() -> Self {
        Self {
            texture: None,
            diffuse_color: Vec3::ONE,
            texture_enabled: true,
            diffuse_color_enabled: true,
            vertex_color_enabled: false,
            shader_changed: false,
            texture_param: None,
            diffuse_param: None,
            semantics: SemanticBindings::default(),
        }
    }
}

macro_rules! shader_flag {
    ($get:ident, $set:ident, $field:ident, $doc:literal) => {
        #[doc = concat!("Whether ", $doc, " is enabled.")]
        #[inline]
        #[must_use]
        pub fn $get(&self) -> bool {
            self.$field
        }

        #[doc = concat!("Enables or disables ", $doc, ".")]
        pub fn $set(&mut self, enabled: bool) {
            if self.$field != enabled {
                self.$field = enabled;
                self.shader_changed = true;
            }
        }
    };
}

impl TexturePart {
    /// A part that neither samples a texture nor tints.
    #[must_use]
    pub fn untextured() -> Self {
        Self {
            texture_enabled: false,
            diffuse_color_enabled: false,
            ..Self::default()
        }
    }

    shader_flag!(texture_enabled, set_texture_enabled, texture_enabled, "texture sampling");
    shader_flag!(
        diffuse_color_enabled,
        set_diffuse_color_enabled,
        diffuse_color_enabled,
        "the diffuse tint"
    );
    shader_flag!(
        vertex_color_enabled,
        set_vertex_color_enabled,
        vertex_color_enabled,
        "per-vertex color"
    );
}

impl MaterialPart for TexturePart {
    fn on_bind(&mut self, binder: &PartBinder<'_>) {
        self.texture_param = if self.texture_enabled {
            binder.optional("TexturePart", "Texture")
        } else {
            None
        };
        self.diffuse_param = if self.diffuse_color_enabled {
            binder.optional("TexturePart", "DiffuseColor")
        } else {
            None
        };
        let alpha: Vec<ParameterHandle> = binder.parameter("Alpha").into_iter().collect();
        self.semantics = SemanticBindings::bind(&alpha);
    }

    fn shader_code(&self, usage: MaterialUsage) -> Option<Cow<'static, str>> {
        if usage != MaterialUsage::Default {
            return None;
        }
        let mut code = String::from("param float Alpha : ALPHA;\n");
        if self.texture_enabled {
            code.push_str("param texture Texture;\n");
        }
        if self.diffuse_color_enabled {
            code.push_str("param float3 DiffuseColor;\n");
        }
        if self.vertex_color_enabled {
            code.push_str("#define VERTEX_COLOR\n");
        }
        code.push_str("void Diffuse(float2 uv, float4 vertexColor, inout float4 color)\n{\n");
        if self.texture_enabled {
            code.push_str("    color *= tex2D(Texture, uv);\n");
        }
        if self.diffuse_color_enabled {
            code.push_str("    color.rgb *= DiffuseColor;\n");
        }
        if self.vertex_color_enabled {
            code.push_str("    color *= vertexColor;\n");
        }
        code.push_str("    color.a *= Alpha;\n}\n");
        Some(Cow::Owned(code))
    }

    fn begin_apply_local_parameters(&mut self, context: &DrawingContext, material: &MaterialBase) {
        if let Some(param) = &self.texture_param {
            param.set(self.texture.or(material.texture));
        }
        if let Some(param) = &self.diffuse_param {
            param.set(self.diffuse_color);
        }
        self.semantics.apply_local(context, material);
    }

    fn resolve_material_part(&self, _usage: MaterialUsage, existing: &mut dyn MaterialPart) {
        if let Some(target) = downcast_mut::<Self>(existing) {
            target.texture = self.texture;
            target.diffuse_color = self.diffuse_color;
        }
    }

    fn clone_part(&self) -> Box<dyn MaterialPart> {
        Box::new(Self {
            texture: self.texture,
            diffuse_color: self.diffuse_color,
            texture_enabled: self.texture_enabled,
            diffuse_color_enabled: self.diffuse_color_enabled,
            vertex_color_enabled: self.vertex_color_enabled,
            ..Self::default()
        })
    }

    fn set_texture(&mut self, usage: TextureUsage, texture: Option<Texture>) {
        if usage == TextureUsage::Diffuse {
            self.texture = texture;
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
    fn test_flags_shape_the_fragment() {
        let part = TexturePart::untextured();
        let code = part.shader_code(MaterialUsage::Default).unwrap();
        assert!(!code.contains("param texture Texture;"));
        assert!(!code.contains("DiffuseColor"));
        assert!(part.shader_code(MaterialUsage::Depth).is_none());
    }

    #[test]
    fn test_flag_change_raises_shader_changed_once() {
        let mut part = TexturePart::default();
        part.set_texture_enabled(true);
        assert!(!part.take_shader_changed());
        part.set_texture_enabled(false);
        assert!(part.take_shader_changed());
        assert!(!part.take_shader_changed());
    }

    #[test]
    fn test_set_texture_only_takes_diffuse() {
        let mut part = TexturePart::default();
        part.set_texture(TextureUsage::NormalMap, Some(Texture::new(1, 4, 4)));
        assert_eq!(part.texture, None);
        part.set_texture(TextureUsage::Diffuse, Some(Texture::new(2, 4, 4)));
        assert_eq!(part.texture.map(|t| t.id()), Some(2));
    }
}
