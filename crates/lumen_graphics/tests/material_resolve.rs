//! # Material Resolve Tests
//!
//! Usage variants built from a standard material and runtime value
//! transfer between a group and its variants.
//!
//! Run with: cargo test -p lumen_graphics --test material_resolve

use glam::{Mat4, Vec3};
use lumen_graphics::material::parts::{DepthPart, SpecularPart, TexturePart, VertexTransformPart};
use lumen_graphics::material::DeclarationShaderBuilder;
use lumen_graphics::{
    DrawingContext, Material, MaterialBatch, MaterialGroup, MaterialPart, MaterialUsage,
};
use std::sync::Arc;

fn standard_group(builder: &Arc<DeclarationShaderBuilder>) -> MaterialGroup {
    MaterialGroup::with_parts(
        Arc::clone(builder) as Arc<dyn lumen_graphics::ShaderBuilder>,
        [
            Box::new(VertexTransformPart::default()) as Box<dyn MaterialPart>,
            Box::new(TexturePart::default()),
            Box::new(SpecularPart::default()),
        ],
    )
}

// ============================================================================
// VARIANT CONSTRUCTION
// ============================================================================

#[test]
fn verify_depth_variant_keeps_only_contributing_parts() {
    let builder = Arc::new(DeclarationShaderBuilder::new());
    let mut group = standard_group(&builder);

    let variant = group
        .resolve(MaterialUsage::Depth, None)
        .expect("depth variant should be built");

    assert_eq!(variant.usage(), MaterialUsage::Depth);
    assert_eq!(variant.parts().len(), 2);
    assert!(variant.parts().is::<VertexTransformPart>(0));
    assert!(variant.parts().is::<DepthPart>(1));
    assert!(variant.program().is_some());
}

#[test]
fn verify_variant_is_built_once() {
    let builder = Arc::new(DeclarationShaderBuilder::new());
    let mut group = standard_group(&builder);
    assert_eq!(builder.build_count(), 1);

    let first = group.resolve(MaterialUsage::Depth, None).map(|v| v.id());
    let second = group.resolve(MaterialUsage::Depth, None).map(|v| v.id());

    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(builder.build_count(), 2);
    assert!(group.extended_material(MaterialUsage::Depth).is_some());
}

#[test]
fn verify_default_usage_has_no_variant() {
    let builder = Arc::new(DeclarationShaderBuilder::new());
    let mut group = standard_group(&builder);
    assert!(group.resolve(MaterialUsage::Default, None).is_none());
}

// ============================================================================
// VALUE TRANSFER
// ============================================================================

#[test]
fn verify_runtime_values_reach_the_variant() {
    let builder = Arc::new(DeclarationShaderBuilder::new());
    let mut group = standard_group(&builder);
    let bones = vec![Mat4::from_translation(Vec3::X), Mat4::IDENTITY];
    group.find_mut::<VertexTransformPart>().unwrap().bone_transforms = bones.clone();

    let variant = group.resolve(MaterialUsage::Depth, None).unwrap();

    let transform = variant.find::<VertexTransformPart>().unwrap();
    assert_eq!(transform.bone_transforms, bones);
}

#[test]
fn verify_resolve_updates_an_existing_variant() {
    let builder = Arc::new(DeclarationShaderBuilder::new());
    let mut group = standard_group(&builder);

    {
        let variant = group.resolve(MaterialUsage::Depth, None).unwrap();
        variant.find_mut::<DepthPart>().unwrap().depth_bias = 0.25;
    }

    let bones = vec![Mat4::from_scale(Vec3::splat(2.0))];
    group.find_mut::<VertexTransformPart>().unwrap().bone_transforms = bones.clone();

    let variant = group.resolve(MaterialUsage::Depth, None).unwrap();
    assert_eq!(variant.find::<VertexTransformPart>().unwrap().bone_transforms, bones);
    // The source has no DepthPart, so the variant keeps its own value.
    assert!((variant.find::<DepthPart>().unwrap().depth_bias - 0.25).abs() < f32::EPSILON);
}

#[test]
fn verify_transfer_is_forward_only() {
    let builder = Arc::new(DeclarationShaderBuilder::new());
    let mut source = standard_group(&builder);
    source.find_mut::<TexturePart>().unwrap().diffuse_color = Vec3::ZERO;
    source.find_mut::<SpecularPart>().unwrap().power = 2.0;

    // Reversed order: Specular matches the source's last part, so the
    // later Texture has nothing left to match.
    let mut existing = MaterialGroup::with_parts(
        Arc::clone(&builder) as Arc<dyn lumen_graphics::ShaderBuilder>,
        [
            Box::new(SpecularPart::default()) as Box<dyn MaterialPart>,
            Box::new(TexturePart::default()),
        ],
    );

    let target = source
        .resolve(MaterialUsage::Default, Some(&mut existing))
        .unwrap();
    assert!((target.find::<SpecularPart>().unwrap().power - 2.0).abs() < f32::EPSILON);
    assert_eq!(target.find::<TexturePart>().unwrap().diffuse_color, Vec3::ONE);
}

// ============================================================================
// REBUILD AND DRAW
// ============================================================================

#[test]
fn verify_init_bracket_rebuilds_once() {
    let builder = Arc::new(DeclarationShaderBuilder::new());
    let mut group = MaterialGroup::with_shader_builder(
        Arc::clone(&builder) as Arc<dyn lumen_graphics::ShaderBuilder>
    );

    group.begin_init();
    group.push(Box::new(VertexTransformPart::default()));
    group.push(Box::new(TexturePart::default()));
    group.push(Box::new(SpecularPart::default()));
    assert_eq!(group.rebuild_count(), 0);
    group.end_init();

    assert_eq!(group.rebuild_count(), 1);
    assert_eq!(builder.build_count(), 1);
    assert!(!group.needs_rebuild());
}

#[test]
fn verify_batch_counts_program_switches() {
    let builder = Arc::new(DeclarationShaderBuilder::new());
    let mut first = standard_group(&builder);
    let mut second = first.clone();
    let context = DrawingContext::default();
    let mut batch = MaterialBatch::new();

    batch.draw(&mut first, &context, || ()).unwrap();
    batch.draw(&mut second, &context, || ()).unwrap();
    assert_eq!(first.program_id(), second.program_id());
    assert_eq!(batch.program_switches(), 1);
    assert_eq!(batch.draws(), 2);

    let depth = first.resolve(MaterialUsage::Depth, None).unwrap();
    batch.draw(depth, &context, || ()).unwrap();
    assert_eq!(batch.program_switches(), 2);
}
