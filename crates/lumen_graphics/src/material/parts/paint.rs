//! # Paint Groups
//!
//! Terrain-style layering: a [`PaintGroupPart`] holds its own nested part
//! list whose output is blended into the surface by one channel of a mask
//! texture. The mask textures themselves belong to the material
//! ([`MaterialBase::mask_textures`]) and are bound once by
//! [`BeginPaintGroupPart`].
//!
//! Nested parts carry a two-level suffix: `_<inner><outer>`, e.g. the
//! second part of the group at index 3 binds `Texture_1_3`.

use crate::context::DrawingContext;
use crate::material::group::{resolve_parts, PartSlot};
use crate::material::part::downcast_mut;
use crate::material::shader::suffix_declarations;
use crate::material::{
    MaterialBase, MaterialPart, MaterialUsage, ParameterHandle, PartBinder, PartType,
};
use crate::texture::{Texture, TextureUsage};
use std::borrow::Cow;

/// Number of mask textures a material can bind.
pub const MAX_MASK_TEXTURES: usize = 2;

/// Mask channels per mask texture (RGBA).
pub const CHANNELS_PER_MASK: u32 = 4;

const BEGIN_CODE: &str = "\
param texture MaskTexture0;
param texture MaskTexture1;
param float2 MaskTextureScale;
void BeginPaintGroup(float2 uv, out float4 mask0, out float4 mask1)
{
    mask0 = tex2D(MaskTexture0, uv * MaskTextureScale);
    mask1 = tex2D(MaskTexture1, uv * MaskTextureScale);
}
";

const END_CODE: &str = "\
void EndPaintGroup(float4 layered, inout float4 color)
{
    color = layered;
}
";

/// Samples the material's mask textures for the paint groups that follow.
#[derive(Debug, Clone, Default)]
pub struct BeginPaintGroupPart {
    masks: [Option<ParameterHandle>; MAX_MASK_TEXTURES],
    scale: Option<ParameterHandle>,
}

impl MaterialPart for BeginPaintGroupPart {
    fn on_bind(&mut self, binder: &PartBinder<'_>) {
        for (i, mask) in self.masks.iter_mut().enumerate() {
            *mask = binder.parameter(&format!("MaskTexture{i}"));
        }
        self.scale = binder.parameter("MaskTextureScale");
    }

    fn shader_code(&self, usage: MaterialUsage) -> Option<Cow<'static, str>> {
        (usage == MaterialUsage::Default).then_some(Cow::Borrowed(BEGIN_CODE))
    }

    fn begin_apply_local_parameters(&mut self, _context: &DrawingContext, material: &MaterialBase) {
        for (i, mask) in self.masks.iter().enumerate() {
            if let Some(param) = mask {
                param.set(material.mask_textures.get(i).copied());
            }
        }
        if let Some(param) = &self.scale {
            param.set(material.mask_texture_scale);
        }
    }

    fn clone_part(&self) -> Box<dyn MaterialPart> {
        Box::new(Self::default())
    }
}

/// Writes the blended layers back into the surface color.
#[derive(Debug, Clone, Default)]
pub struct EndPaintGroupPart;

impl MaterialPart for EndPaintGroupPart {
    fn on_bind(&mut self, _binder: &PartBinder<'_>) {}

    fn shader_code(&self, usage: MaterialUsage) -> Option<Cow<'static, str>> {
        (usage == MaterialUsage::Default).then_some(Cow::Borrowed(END_CODE))
    }

    fn clone_part(&self) -> Box<dyn MaterialPart> {
        Box::new(Self)
    }
}

/// A nested part list blended by one mask channel.
#[derive(Debug, Clone, Default)]
pub struct PaintGroupPart {
    mask_channel: u32,
    slots: Vec<PartSlot>,
    shader_changed: bool,
}

impl PaintGroupPart {
    /// Empty layer blended by `mask_channel` (0 = first texture, red).
    #[must_use]
    pub fn new(mask_channel: u32) -> Self {
        Self {
            mask_channel,
            ..Self::default()
        }
    }

    /// Adds a nested part. Raises shader-changed.
    #[must_use]
    pub fn with_part(mut self, part: Box<dyn MaterialPart>) -> Self {
        self.push(part);
        self
    }

    /// Appends a nested part. Raises shader-changed.
    pub fn push(&mut self, part: Box<dyn MaterialPart>) {
        self.slots.push(PartSlot::new(part));
        self.shader_changed = true;
    }

    /// Removes the nested part at `index`. Raises shader-changed.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn remove(&mut self, index: usize) -> Box<dyn MaterialPart> {
        self.shader_changed = true;
        self.slots.remove(index).part
    }

    /// Number of nested parts.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if there are no nested parts.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Nested parts in order.
    pub fn parts(&self) -> impl Iterator<Item = &dyn MaterialPart> + '_ {
        self.slots.iter().map(|slot| &*slot.part)
    }

    /// Nested parameter suffix of the part at `index`, once bound.
    #[must_use]
    pub fn suffix(&self, index: usize) -> Option<&str> {
        self.slots.get(index).map(|slot| slot.suffix.as_str())
    }

    /// Mask channel blending this layer.
    #[inline]
    #[must_use]
    pub fn mask_channel(&self) -> u32 {
        self.mask_channel
    }

    /// Changes the mask channel. Raises shader-changed when it differs.
    pub fn set_mask_channel(&mut self, mask_channel: u32) {
        if self.mask_channel != mask_channel {
            self.mask_channel = mask_channel;
            self.shader_changed = true;
        }
    }
}

impl MaterialPart for PaintGroupPart {
    fn on_bind(&mut self, binder: &PartBinder<'_>) {
        let outer = binder.suffix();
        for (j, slot) in self.slots.iter_mut().enumerate() {
            slot.suffix = format!("_{j}{outer}");
            slot.part
                .on_bind(&PartBinder::new(binder.program(), &slot.suffix));
        }
    }

    fn shader_code(&self, usage: MaterialUsage) -> Option<Cow<'static, str>> {
        let mut code = String::new();
        let mut contributes = false;
        for (j, slot) in self.slots.iter().enumerate() {
            let Some(fragment) = slot.part.shader_code(usage) else {
                continue;
            };
            match suffix_declarations(&fragment, &format!("_{j}")) {
                Ok(suffixed) => {
                    code.push_str(&suffixed);
                    contributes = true;
                }
                Err(err) => {
                    tracing::warn!(layer = j, %err, "nested paint layer skipped");
                }
            }
        }
        if !contributes {
            return None;
        }
        let texture = self.mask_channel / CHANNELS_PER_MASK;
        let channel = ["r", "g", "b", "a"][(self.mask_channel % CHANNELS_PER_MASK) as usize];
        code.push_str(&format!("#define PAINT_MASK mask{texture}.{channel}\n"));
        Some(Cow::Owned(code))
    }

    fn dependent_parts(&self, usage: MaterialUsage, result: &mut Vec<PartType>) {
        result.push(PartType::of::<BeginPaintGroupPart>());
        result.push(PartType::of::<EndPaintGroupPart>());
        for slot in &self.slots {
            slot.part.dependent_parts(usage, result);
        }
    }

    fn apply_global_parameters(&mut self, context: &DrawingContext) {
        for slot in &mut self.slots {
            slot.part.apply_global_parameters(context);
        }
    }

    fn begin_apply_local_parameters(&mut self, context: &DrawingContext, material: &MaterialBase) {
        for slot in &mut self.slots {
            slot.part.begin_apply_local_parameters(context, material);
        }
    }

    fn end_apply_local_parameters(&mut self, context: &DrawingContext) {
        for slot in &mut self.slots {
            slot.part.end_apply_local_parameters(context);
        }
    }

    fn resolve_material_part(&self, usage: MaterialUsage, existing: &mut dyn MaterialPart) {
        if let Some(target) = downcast_mut::<Self>(existing) {
            resolve_parts(usage, &self.slots, &mut target.slots);
        }
    }

    fn clone_part(&self) -> Box<dyn MaterialPart> {
        Box::new(Self {
            mask_channel: self.mask_channel,
            slots: self.slots.clone(),
            shader_changed: false,
        })
    }

    fn set_texture(&mut self, usage: TextureUsage, texture: Option<Texture>) {
        for slot in &mut self.slots {
            slot.part.set_texture(usage, texture);
        }
    }

    fn take_shader_changed(&mut self) -> bool {
        let mut changed = std::mem::take(&mut self.shader_changed);
        for slot in &mut self.slots {
            changed |= slot.part.take_shader_changed();
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::parts::{SpecularPart, TexturePart};
    use crate::material::{DeclarationShaderBuilder, MaterialGroup};
    use std::sync::Arc;

    fn layered() -> MaterialGroup {
        MaterialGroup::with_parts(
            Arc::new(DeclarationShaderBuilder::new()),
            [
                Box::new(BeginPaintGroupPart::default()) as Box<dyn MaterialPart>,
                Box::new(
                    PaintGroupPart::new(1)
                        .with_part(Box::new(TexturePart::default()))
                        .with_part(Box::new(SpecularPart::default())),
                ),
                Box::new(EndPaintGroupPart),
            ],
        )
    }

    #[test]
    fn test_nested_parts_bind_with_two_level_suffix() {
        let group = layered();
        let program = group.program().unwrap();
        assert!(program.parameter("Texture_0_1").is_some());
        assert!(program.parameter("SpecularPower_1_1").is_some());
        assert!(program.source().contains("#define PAINT_MASK mask0.g"));

        let paint = group.find::<PaintGroupPart>().unwrap();
        assert_eq!(paint.suffix(0), Some("_0_1"));
        assert_eq!(paint.suffix(1), Some("_1_1"));
    }

    #[test]
    fn test_dependencies_include_brackets() {
        let mut deps = Vec::new();
        PaintGroupPart::new(0).dependent_parts(MaterialUsage::Default, &mut deps);
        assert_eq!(
            deps,
            vec![
                PartType::of::<BeginPaintGroupPart>(),
                PartType::of::<EndPaintGroupPart>(),
            ]
        );
    }

    #[test]
    fn test_nested_resolve_is_forward_only() {
        let source = PaintGroupPart::new(0)
            .with_part(Box::new(SpecularPart {
                power: 2.0,
                ..SpecularPart::default()
            }))
            .with_part(Box::new(TexturePart {
                diffuse_color: glam::Vec3::ZERO,
                ..TexturePart::default()
            }));
        let mut target: Box<dyn MaterialPart> = Box::new(
            PaintGroupPart::new(0)
                .with_part(Box::new(TexturePart::default()))
                .with_part(Box::new(SpecularPart::default())),
        );

        source.resolve_material_part(MaterialUsage::Default, &mut *target);

        let target = crate::material::part::downcast_ref::<PaintGroupPart>(&*target).unwrap();
        let texture = crate::material::part::downcast_ref::<TexturePart>(
            target.parts().next().unwrap(),
        )
        .unwrap();
        let specular =
            crate::material::part::downcast_ref::<SpecularPart>(target.parts().nth(1).unwrap())
                .unwrap();
        assert_eq!(texture.diffuse_color, glam::Vec3::ZERO);
        assert!((specular.power - 16.0).abs() < f32::EPSILON);
    }
}
