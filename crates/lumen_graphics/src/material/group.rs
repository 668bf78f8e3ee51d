//! # Material Groups
//!
//! An ordered composition of [`MaterialPart`]s forming one renderable
//! material.
//!
//! ```text
//!   MaterialGroup
//!   ├── parts:    [VertexTransform, Texture, Specular]   (order = shader order)
//!   ├── program:  Arc<ShaderProgram>                     (rebuilt when dirty)
//!   └── extended: [ -, Depth, Normal, -, - ]              (per-usage variants)
//!                      │
//!                      └── MaterialGroup [VertexTransform, Depth]
//! ```
//!
//! ## Dirty Tracking
//!
//! Every structural edit (push, insert, remove, replace, clear) marks the
//! group dirty and rebuilds immediately, unless a
//! [`begin_init`](MaterialGroup::begin_init) bracket is open. Closing the
//! outermost bracket rebuilds once for the whole batch.
//!
//! ## Resolve
//!
//! [`resolve`](MaterialGroup::resolve) copies runtime values from this
//! group's parts onto the variant's parts. The walk is a single forward
//! pass over both lists: for each destination part the source cursor
//! advances until a part of the same type is found. The cursor never
//! rewinds, so a destination type that only appears earlier in the source
//! receives nothing.

use crate::context::DrawingContext;
use crate::error::{GraphicsError, GraphicsResult};
use crate::texture::{Texture, TextureUsage};
use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::part::{downcast_mut, downcast_ref, type_of};
use super::{
    Material, MaterialBase, MaterialPart, MaterialUsage, PartBinder, ProgramId, ShaderBuilder,
    ShaderFragment, ShaderProgram, VariantBuilder,
};

/// Process-unique identity of a group, used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(u64);

impl GroupId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// A part plus the suffix its parameter names carry in the program.
#[derive(Debug)]
pub(crate) struct PartSlot {
    pub(crate) part: Box<dyn MaterialPart>,
    pub(crate) suffix: String,
}

impl PartSlot {
    pub(crate) fn new(part: Box<dyn MaterialPart>) -> Self {
        Self {
            part,
            suffix: String::new(),
        }
    }

    pub(crate) fn bind(&mut self, program: &ShaderProgram) {
        self.part.on_bind(&PartBinder::new(program, &self.suffix));
    }
}

impl Clone for PartSlot {
    fn clone(&self) -> Self {
        Self {
            part: self.part.clone_part(),
            suffix: self.suffix.clone(),
        }
    }
}

/// Copies runtime values from `source` onto the type-matched parts of
/// `dest` in one forward pass.
pub(crate) fn resolve_parts(usage: MaterialUsage, source: &[PartSlot], dest: &mut [PartSlot]) {
    let mut s = 0;
    for target in dest.iter_mut() {
        let target_type = type_of(&*target.part);
        while s < source.len() {
            let candidate = &source[s];
            s += 1;
            if type_of(&*candidate.part) == target_type {
                candidate.part.resolve_material_part(usage, &mut *target.part);
                break;
            }
        }
    }
}

/// Read access to the ordered parts of a group.
#[derive(Debug, Clone, Default)]
pub struct MaterialPartCollection {
    slots: Vec<PartSlot>,
}

impl MaterialPartCollection {
    /// Number of parts.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if there are no parts.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Part at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&dyn MaterialPart> {
        self.slots.get(index).map(|slot| &*slot.part)
    }

    /// Part at `index`, downcast to `P`.
    #[must_use]
    pub fn get_as<P: MaterialPart>(&self, index: usize) -> Option<&P> {
        self.get(index).and_then(downcast_ref::<P>)
    }

    /// Returns `true` if the part at `index` is a `P`.
    #[must_use]
    pub fn is<P: MaterialPart>(&self, index: usize) -> bool {
        self.get(index)
            .is_some_and(|part| type_of(part) == TypeId::of::<P>())
    }

    /// Parameter suffix of the part at `index`.
    #[must_use]
    pub fn suffix(&self, index: usize) -> Option<&str> {
        self.slots.get(index).map(|slot| slot.suffix.as_str())
    }

    /// Parts in order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn MaterialPart> + '_ {
        self.slots.iter().map(|slot| &*slot.part)
    }

    pub(crate) fn slots(&self) -> &[PartSlot] {
        &self.slots
    }

    pub(crate) fn from_parts(parts: Vec<Box<dyn MaterialPart>>) -> Self {
        Self {
            slots: parts.into_iter().map(PartSlot::new).collect(),
        }
    }
}

/// An ordered composition of parts forming one renderable material.
pub struct MaterialGroup {
    id: GroupId,
    /// Per-instance values read by semantic bindings.
    pub base: MaterialBase,
    parts: MaterialPartCollection,
    program: Option<Arc<ShaderProgram>>,
    precompiled: bool,
    usage: MaterialUsage,
    extended: [Option<Box<MaterialGroup>>; MaterialUsage::COUNT],
    shader_builder: Option<Arc<dyn ShaderBuilder>>,
    init_depth: u32,
    needs_rebuild: bool,
    rebuild_count: u64,
    find_cache: RefCell<HashMap<TypeId, Option<usize>>>,
}

impl MaterialGroup {
    /// Creates an empty group with no shader builder.
    #[must_use]
    pub fn new() -> Self {
        Self::for_usage(MaterialUsage::Default, None)
    }

    /// Creates an empty group that builds its program with `builder`.
    #[must_use]
    pub fn with_shader_builder(builder: Arc<dyn ShaderBuilder>) -> Self {
        Self::for_usage(MaterialUsage::Default, Some(builder))
    }

    /// Creates a group from `parts`, building the program once.
    #[must_use]
    pub fn with_parts(
        builder: Arc<dyn ShaderBuilder>,
        parts: impl IntoIterator<Item = Box<dyn MaterialPart>>,
    ) -> Self {
        let mut group = Self::with_shader_builder(builder);
        group.begin_init();
        for part in parts {
            group.push(part);
        }
        group.end_init();
        group
    }

    pub(crate) fn for_usage(usage: MaterialUsage, builder: Option<Arc<dyn ShaderBuilder>>) -> Self {
        Self {
            id: GroupId::next(),
            base: MaterialBase::default(),
            parts: MaterialPartCollection::default(),
            program: None,
            precompiled: false,
            usage,
            extended: Default::default(),
            shader_builder: builder,
            init_depth: 0,
            needs_rebuild: false,
            rebuild_count: 0,
            find_cache: RefCell::default(),
        }
    }

    /// Group identity.
    #[inline]
    #[must_use]
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Usage this group's program is built for.
    #[inline]
    #[must_use]
    pub fn usage(&self) -> MaterialUsage {
        self.usage
    }

    /// The ordered parts.
    #[inline]
    #[must_use]
    pub fn parts(&self) -> &MaterialPartCollection {
        &self.parts
    }

    /// The current program.
    #[inline]
    #[must_use]
    pub fn program(&self) -> Option<&Arc<ShaderProgram>> {
        self.program.as_ref()
    }

    /// The shader builder, if attached.
    #[must_use]
    pub fn shader_builder(&self) -> Option<&Arc<dyn ShaderBuilder>> {
        self.shader_builder.as_ref()
    }

    /// Whether a structural change is waiting for a rebuild.
    #[inline]
    #[must_use]
    pub fn needs_rebuild(&self) -> bool {
        self.needs_rebuild
    }

    /// Number of successful program builds.
    #[inline]
    #[must_use]
    pub fn rebuild_count(&self) -> u64 {
        self.rebuild_count
    }

    /// Whether a `begin_init` bracket is open.
    #[inline]
    #[must_use]
    pub fn is_initializing(&self) -> bool {
        self.init_depth > 0
    }

    /// Installs a precompiled program. The group never rebuilds it.
    ///
    /// Parts bind to its parameters by their plain names, whether they
    /// were added before or after the program.
    pub fn set_program(&mut self, program: Arc<ShaderProgram>) {
        self.program = Some(program);
        self.precompiled = true;
        self.rebind_all();
    }

    // =========================================================================
    // Initialization brackets
    // =========================================================================

    /// Defers rebuilds until the matching [`end_init`](Self::end_init).
    pub fn begin_init(&mut self) {
        self.init_depth += 1;
    }

    /// Closes a bracket; the outermost one rebuilds if anything changed.
    ///
    /// # Panics
    ///
    /// Panics if no bracket is open.
    pub fn end_init(&mut self) {
        assert!(
            self.init_depth > 0,
            "end_init called without a matching begin_init"
        );
        self.init_depth -= 1;
        if self.init_depth == 0 && self.needs_rebuild {
            self.try_rebuild();
        }
    }

    // =========================================================================
    // Structural edits
    // =========================================================================

    /// Appends a part.
    pub fn push(&mut self, part: Box<dyn MaterialPart>) {
        let index = self.parts.len();
        self.insert(index, part);
    }

    /// Inserts a part at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, part: Box<dyn MaterialPart>) {
        self.parts.slots.insert(index, PartSlot::new(part));
        self.bind_slot(index);
        self.structure_changed();
    }

    /// Removes and returns the part at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn remove(&mut self, index: usize) -> Box<dyn MaterialPart> {
        let slot = self.parts.slots.remove(index);
        self.structure_changed();
        slot.part
    }

    /// Replaces the part at `index`, returning the old one.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn replace(&mut self, index: usize, part: Box<dyn MaterialPart>) -> Box<dyn MaterialPart> {
        let old = std::mem::replace(&mut self.parts.slots[index].part, part);
        self.bind_slot(index);
        self.structure_changed();
        old
    }

    /// Removes every part.
    pub fn clear(&mut self) {
        self.parts.slots.clear();
        self.structure_changed();
    }

    fn bind_slot(&mut self, index: usize) {
        let suffix = self.suffix_for(index);
        if let Some(program) = &self.program {
            let slot = &mut self.parts.slots[index];
            slot.suffix = suffix;
            slot.bind(program);
        }
    }

    /// Parameter name suffix of the part at `index`. Precompiled programs
    /// declare plain names, built ones `_<index>`.
    fn suffix_for(&self, index: usize) -> String {
        if self.precompiled {
            String::new()
        } else {
            format!("_{index}")
        }
    }

    fn structure_changed(&mut self) {
        self.find_cache.get_mut().clear();
        self.on_shader_changed();
    }

    // =========================================================================
    // Program building
    // =========================================================================

    /// Marks the group dirty and rebuilds unless initializing.
    pub(crate) fn on_shader_changed(&mut self) {
        self.needs_rebuild = true;
        if self.init_depth == 0 {
            self.try_rebuild();
        }
    }

    fn try_rebuild(&mut self) {
        if self.precompiled || self.shader_builder.is_none() {
            return;
        }
        if let Err(err) = self.rebuild() {
            tracing::warn!(group = self.id.raw(), usage = ?self.usage, %err, "shader rebuild failed");
        }
    }

    /// Builds the program from the current parts.
    ///
    /// Fragments are taken in part order; each part's parameters carry the
    /// suffix `_<index>`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::ProgramNotBuilt`] when no shader builder is
    /// attached, or the builder's error. The group stays dirty on failure.
    pub fn rebuild(&mut self) -> GraphicsResult<()> {
        let builder = self
            .shader_builder
            .clone()
            .ok_or(GraphicsError::ProgramNotBuilt)?;

        let mut fragments = Vec::with_capacity(self.parts.len());
        for (index, slot) in self.parts.slots.iter_mut().enumerate() {
            slot.suffix = format!("_{index}");
            if let Some(code) = slot.part.shader_code(self.usage) {
                fragments.push(ShaderFragment {
                    part_index: index,
                    suffix: slot.suffix.clone(),
                    code: code.into_owned(),
                });
            }
        }

        let program = builder.build(self.usage, &fragments)?;
        tracing::debug!(
            group = self.id.raw(),
            usage = ?self.usage,
            fragments = fragments.len(),
            program = program.id().raw(),
            "material program rebuilt"
        );

        self.program = Some(Arc::new(program));
        self.precompiled = false;
        self.needs_rebuild = false;
        self.rebuild_count += 1;
        self.rebind_all();
        Ok(())
    }

    fn rebind_all(&mut self) {
        let suffixes: Vec<String> = (0..self.parts.len()).map(|i| self.suffix_for(i)).collect();
        if let Some(program) = &self.program {
            for (slot, suffix) in self.parts.slots.iter_mut().zip(suffixes) {
                slot.suffix = suffix;
                slot.bind(program);
            }
        }
    }

    fn absorb_part_changes(&mut self) {
        let mut changed = false;
        for slot in &mut self.parts.slots {
            changed |= slot.part.take_shader_changed();
        }
        if changed {
            self.on_shader_changed();
        }
    }

    // =========================================================================
    // Capability queries
    // =========================================================================

    fn index_of<P: MaterialPart>(&self) -> Option<usize> {
        let id = TypeId::of::<P>();
        if let Some(&cached) = self.find_cache.borrow().get(&id) {
            return cached;
        }
        let found = self
            .parts
            .slots
            .iter()
            .position(|slot| type_of(&*slot.part) == id);
        self.find_cache.borrow_mut().insert(id, found);
        found
    }

    /// First part of type `P`.
    #[must_use]
    pub fn find<P: MaterialPart>(&self) -> Option<&P> {
        let index = self.index_of::<P>()?;
        self.parts.get_as::<P>(index)
    }

    /// First part of type `P`, mutably.
    ///
    /// When the guard drops, a shader-changed flag raised by the part
    /// triggers a rebuild.
    pub fn find_mut<P: MaterialPart>(&mut self) -> Option<PartMut<'_, P>> {
        let index = self.index_of::<P>()?;
        Some(PartMut {
            group: self,
            index,
            marker: PhantomData,
        })
    }

    /// Every part of type `P`, in order.
    pub fn find_all<P: MaterialPart>(&self) -> impl Iterator<Item = &P> + '_ {
        self.parts.iter().filter_map(downcast_ref::<P>)
    }

    // =========================================================================
    // Textures and variants
    // =========================================================================

    /// Assigns a texture to every part and every built variant.
    pub fn set_texture(&mut self, usage: TextureUsage, texture: Option<Texture>) {
        for slot in &mut self.parts.slots {
            slot.part.set_texture(usage, texture);
        }
        for variant in self.extended.iter_mut().flatten() {
            variant.set_texture(usage, texture);
        }
        self.absorb_part_changes();
    }

    /// Installs a content-provided variant for `usage`.
    ///
    /// # Panics
    ///
    /// Panics for [`MaterialUsage::Default`], which the group serves itself.
    pub fn set_extended_material(&mut self, usage: MaterialUsage, group: MaterialGroup) {
        assert_ne!(
            usage,
            MaterialUsage::Default,
            "the default usage is served by the group itself"
        );
        self.extended[usage.index()] = Some(Box::new(group));
    }

    /// The variant for `usage`, if one exists.
    #[must_use]
    pub fn extended_material(&self, usage: MaterialUsage) -> Option<&MaterialGroup> {
        self.extended[usage.index()].as_deref()
    }

    /// Resolves the group for `usage` and copies runtime values onto it.
    ///
    /// With `existing`, values are copied onto that instance. Otherwise the
    /// installed variant is used, built on first request when a shader
    /// builder is attached. Returns `None` for [`MaterialUsage::Default`]
    /// or when no variant is available; callers then draw with `self`.
    pub fn resolve<'a>(
        &'a mut self,
        usage: MaterialUsage,
        existing: Option<&'a mut MaterialGroup>,
    ) -> Option<&'a mut MaterialGroup> {
        if let Some(target) = existing {
            self.transfer_to(usage, target);
            return Some(target);
        }
        if usage == MaterialUsage::Default {
            return None;
        }
        if self.extended[usage.index()].is_none() && self.shader_builder.is_some() {
            match VariantBuilder::new(usage).build(self) {
                Ok(variant) => {
                    tracing::debug!(
                        group = self.id.raw(),
                        variant = variant.id.raw(),
                        ?usage,
                        parts = variant.parts.len(),
                        "extended material created"
                    );
                    self.extended[usage.index()] = Some(Box::new(variant));
                }
                Err(err) => {
                    tracing::warn!(group = self.id.raw(), ?usage, %err, "extended material build failed");
                }
            }
        }

        let mut target = self.extended[usage.index()].take()?;
        self.transfer_to(usage, &mut target);
        let slot = &mut self.extended[usage.index()];
        Some(&mut **slot.insert(target))
    }

    fn transfer_to(&self, usage: MaterialUsage, target: &mut MaterialGroup) {
        target.base.world = self.base.world;
        target.base.alpha = self.base.alpha;
        resolve_parts(usage, &self.parts.slots, &mut target.parts.slots);
        target.absorb_part_changes();
    }

    pub(crate) fn install_parts(&mut self, parts: Vec<Box<dyn MaterialPart>>) {
        self.parts = MaterialPartCollection::from_parts(parts);
        self.find_cache.get_mut().clear();
        self.needs_rebuild = true;
    }
}

impl Default for MaterialGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MaterialGroup {
    fn clone(&self) -> Self {
        let mut result = Self {
            id: GroupId::next(),
            base: self.base.clone(),
            parts: self.parts.clone(),
            program: self.program.clone(),
            precompiled: self.precompiled,
            usage: self.usage,
            extended: self.extended.clone(),
            shader_builder: self.shader_builder.clone(),
            init_depth: 0,
            needs_rebuild: self.needs_rebuild,
            rebuild_count: 0,
            find_cache: RefCell::default(),
        };
        result.rebind_all();
        result
    }
}

impl fmt::Debug for MaterialGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaterialGroup")
            .field("id", &self.id)
            .field("usage", &self.usage)
            .field("parts", &self.parts)
            .field("program", &self.program.as_ref().map(|p| p.id()))
            .field("needs_rebuild", &self.needs_rebuild)
            .finish_non_exhaustive()
    }
}

impl Material for MaterialGroup {
    fn program_id(&self) -> Option<ProgramId> {
        self.program.as_ref().map(|p| p.id())
    }

    fn begin_apply(
        &mut self,
        context: &DrawingContext,
        previous: Option<ProgramId>,
    ) -> GraphicsResult<()> {
        let current = self.program_id().ok_or(GraphicsError::ProgramNotBuilt)?;
        let Self { parts, base, .. } = self;
        if previous != Some(current) {
            for slot in &mut parts.slots {
                slot.part.apply_global_parameters(context);
            }
        }
        for slot in &mut parts.slots {
            slot.part.begin_apply_local_parameters(context, base);
        }
        Ok(())
    }

    fn end_apply(&mut self, context: &DrawingContext) {
        for slot in &mut self.parts.slots {
            slot.part.end_apply_local_parameters(context);
        }
    }
}

/// Mutable access to one part of a group.
///
/// Dropping the guard lets the group react to a shader-changed flag.
pub struct PartMut<'a, P: MaterialPart> {
    group: &'a mut MaterialGroup,
    index: usize,
    marker: PhantomData<fn() -> P>,
}

impl<P: MaterialPart> Deref for PartMut<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        match self.group.parts.get_as::<P>(self.index) {
            Some(part) => part,
            None => unreachable!("part type changed while borrowed"),
        }
    }
}

impl<P: MaterialPart> DerefMut for PartMut<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        match downcast_mut::<P>(&mut *self.group.parts.slots[self.index].part) {
            Some(part) => part,
            None => unreachable!("part type changed while borrowed"),
        }
    }
}

impl<P: MaterialPart> Drop for PartMut<'_, P> {
    fn drop(&mut self) {
        if self.group.parts.slots[self.index].part.take_shader_changed() {
            self.group.on_shader_changed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::parts::{DepthPart, SpecularPart, TexturePart, VertexTransformPart};
    use crate::material::{DeclarationShaderBuilder, MaterialBatch, ParameterHandle, ParameterKind};
    use glam::Vec3;

    fn builder() -> Arc<DeclarationShaderBuilder> {
        Arc::new(DeclarationShaderBuilder::new())
    }

    fn standard(builder: Arc<DeclarationShaderBuilder>) -> MaterialGroup {
        MaterialGroup::with_parts(
            builder,
            [
                Box::new(VertexTransformPart::default()) as Box<dyn MaterialPart>,
                Box::new(TexturePart::default()),
                Box::new(SpecularPart::default()),
            ],
        )
    }

    #[test]
    fn test_init_bracket_rebuilds_once() {
        let builder = builder();
        let group = standard(Arc::clone(&builder));
        assert_eq!(group.rebuild_count(), 1);
        assert_eq!(builder.build_count(), 1);
        assert!(!group.needs_rebuild());
        assert!(group.program().is_some());
    }

    #[test]
    fn test_edits_outside_bracket_rebuild_each_time() {
        let mut group = MaterialGroup::with_shader_builder(builder());
        group.push(Box::new(VertexTransformPart::default()));
        group.push(Box::new(TexturePart::default()));
        group.remove(1);
        group.clear();
        assert_eq!(group.rebuild_count(), 4);
        assert!(group.parts().is_empty());
    }

    #[test]
    fn test_without_builder_stays_dirty() {
        let mut group = MaterialGroup::new();
        group.push(Box::new(TexturePart::default()));
        assert!(group.needs_rebuild());
        assert!(group.program().is_none());
        assert_eq!(group.rebuild(), Err(GraphicsError::ProgramNotBuilt));
    }

    #[test]
    fn test_precompiled_program_is_kept() {
        let mut group = MaterialGroup::with_shader_builder(builder());
        let program = Arc::new(ShaderProgram::new(MaterialUsage::Default, String::new(), Vec::new()));
        group.set_program(Arc::clone(&program));
        group.push(Box::new(TexturePart::default()));
        assert!(group.needs_rebuild());
        assert_eq!(group.program_id(), Some(program.id()));
    }

    fn specular_power_writes(push_before_program: bool) -> u64 {
        let power = ParameterHandle::new("SpecularPower", ParameterKind::Float, None);
        let program = Arc::new(ShaderProgram::new(
            MaterialUsage::Default,
            String::new(),
            vec![power.clone()],
        ));
        let mut group = MaterialGroup::new();
        group.push(Box::new(TexturePart::default()));
        if push_before_program {
            group.push(Box::new(SpecularPart::default()));
            group.set_program(program);
        } else {
            group.set_program(program);
            group.push(Box::new(SpecularPart::default()));
        }
        MaterialBatch::new()
            .draw(&mut group, &DrawingContext::default(), || ())
            .unwrap();
        power.write_count()
    }

    #[test]
    fn test_precompiled_binding_ignores_push_order() {
        assert_eq!(specular_power_writes(true), 1);
        assert_eq!(specular_power_writes(false), 1);
    }

    #[test]
    #[should_panic(expected = "end_init called without a matching begin_init")]
    fn test_unbalanced_end_init_panics() {
        MaterialGroup::new().end_init();
    }

    #[test]
    fn test_find_cache_invalidated_by_edits() {
        let mut group = standard(builder());
        assert!(group.find::<DepthPart>().is_none());
        group.push(Box::new(DepthPart::default()));
        assert!(group.find::<DepthPart>().is_some());
        group.remove(0);
        assert!(group.find::<VertexTransformPart>().is_none());
        assert!(group.find::<TexturePart>().is_some());
    }

    #[test]
    fn test_part_guard_rebuilds_on_shader_change() {
        let mut group = standard(builder());
        {
            let mut texture = group.find_mut::<TexturePart>().unwrap();
            texture.set_vertex_color_enabled(true);
        }
        assert_eq!(group.rebuild_count(), 2);
        {
            let mut texture = group.find_mut::<TexturePart>().unwrap();
            texture.diffuse_color = Vec3::new(1.0, 0.0, 0.0);
        }
        assert_eq!(group.rebuild_count(), 2);
    }

    #[test]
    fn test_clone_is_deep() {
        let mut group = standard(builder());
        let copy = group.clone();
        group.find_mut::<SpecularPart>().unwrap().power = 64.0;
        assert_ne!(copy.id(), group.id());
        assert_eq!(copy.parts().len(), 3);
        assert!((copy.find::<SpecularPart>().unwrap().power - 16.0).abs() < f32::EPSILON);
        assert_eq!(copy.program_id(), group.program_id());
    }

    #[test]
    fn test_apply_requires_program() {
        let mut group = MaterialGroup::new();
        let mut batch = MaterialBatch::new();
        let result = batch.draw(&mut group, &DrawingContext::default(), || ());
        assert_eq!(result, Err(GraphicsError::ProgramNotBuilt));
    }

    #[test]
    fn test_default_usage_resolves_to_self() {
        let mut group = standard(builder());
        assert!(group.resolve(MaterialUsage::Default, None).is_none());
    }
}
