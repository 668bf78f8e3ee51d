//! # Material Parts
//!
//! A part is one reusable unit of shader behavior: a texture slot, a
//! lighting term, shadow sampling, skinning. A [`MaterialGroup`] owns an
//! ordered list of parts and drives them through this lifecycle:
//!
//! ```text
//!   insert ──► on_bind ──► [ apply_global ] ──► begin_local ──► draw ──► end_local
//!                 ▲              (program switch only)      (every draw)
//!                 └── rebuild (structural change, shader_changed)
//! ```
//!
//! ## ARCHITECT'S NOTE
//!
//! Parts are owned by value. A part cannot sit in two groups because
//! moving it into one group moves it out of everywhere else, so there is
//! no runtime "already bound" check to get wrong.
//!
//! [`MaterialGroup`]: super::MaterialGroup

use crate::context::DrawingContext;
use crate::texture::{Texture, TextureUsage};
use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;

use super::{MaterialBase, MaterialUsage, ParameterHandle, ShaderProgram};

/// Upcast to [`Any`] for capability queries on trait objects.
pub trait AsAny: Any {
    /// Borrows `self` as [`Any`].
    fn as_any(&self) -> &dyn Any;
    /// Mutably borrows `self` as [`Any`].
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A composable unit of shader behavior.
///
/// Every method but [`shader_code`](Self::shader_code),
/// [`on_bind`](Self::on_bind) and [`clone_part`](Self::clone_part) has a
/// no-op default, so simple parts stay small.
pub trait MaterialPart: AsAny + Send + fmt::Debug {
    /// Resolves cached parameter handles against the group's program.
    ///
    /// Called after every rebuild and whenever the part is inserted into
    /// a group that already has a program. Missing parameters are left
    /// unbound and the matching feature becomes a no-op.
    fn on_bind(&mut self, binder: &PartBinder<'_>);

    /// Source fragment for `usage`, or `None` if the part contributes
    /// nothing to that variant.
    fn shader_code(&self, usage: MaterialUsage) -> Option<Cow<'static, str>>;

    /// Appends part types this part requires when building the `usage`
    /// variant.
    fn dependent_parts(&self, _usage: MaterialUsage, _result: &mut Vec<PartType>) {}

    /// Writes values shared by every material using the current program.
    fn apply_global_parameters(&mut self, _context: &DrawingContext) {}

    /// Writes per-draw values.
    fn begin_apply_local_parameters(&mut self, _context: &DrawingContext, _material: &MaterialBase) {}

    /// Restores anything changed by
    /// [`begin_apply_local_parameters`](Self::begin_apply_local_parameters).
    fn end_apply_local_parameters(&mut self, _context: &DrawingContext) {}

    /// Copies runtime values onto the matching part of a variant.
    ///
    /// `existing` always has the same concrete type as `self`.
    fn resolve_material_part(&self, _usage: MaterialUsage, _existing: &mut dyn MaterialPart) {}

    /// Deep copy with no shared mutable state.
    fn clone_part(&self) -> Box<dyn MaterialPart>;

    /// Receives a texture assigned to the whole group.
    fn set_texture(&mut self, _usage: TextureUsage, _texture: Option<Texture>) {}

    /// Returns and clears the "shader source changed" flag.
    ///
    /// Parts whose fragment depends on their own settings raise it when
    /// such a setting changes; the owning group rebuilds in response.
    fn take_shader_changed(&mut self) -> bool {
        false
    }
}

/// Concrete type of a part trait object.
#[inline]
#[must_use]
pub fn type_of(part: &dyn MaterialPart) -> TypeId {
    part.as_any().type_id()
}

/// Downcasts a part trait object.
#[inline]
#[must_use]
pub fn downcast_ref<P: MaterialPart>(part: &dyn MaterialPart) -> Option<&P> {
    part.as_any().downcast_ref::<P>()
}

/// Mutably downcasts a part trait object.
#[inline]
#[must_use]
pub fn downcast_mut<P: MaterialPart>(part: &mut dyn MaterialPart) -> Option<&mut P> {
    part.as_any_mut().downcast_mut::<P>()
}

/// Runtime descriptor of a part type: identity plus default factory.
///
/// Used to declare dependencies without instances.
#[derive(Clone, Copy)]
pub struct PartType {
    id: TypeId,
    name: &'static str,
    create: fn() -> Box<dyn MaterialPart>,
}

fn create_default<P: MaterialPart + Default>() -> Box<dyn MaterialPart> {
    Box::new(P::default())
}

impl PartType {
    /// Descriptor of `P`.
    #[must_use]
    pub fn of<P: MaterialPart + Default>() -> Self {
        Self {
            id: TypeId::of::<P>(),
            name: std::any::type_name::<P>(),
            create: create_default::<P>,
        }
    }

    /// Type identity.
    #[inline]
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Short type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }

    /// Creates a default instance.
    #[must_use]
    pub fn create(&self) -> Box<dyn MaterialPart> {
        (self.create)()
    }

    /// Returns `true` if `part` is of this type.
    #[inline]
    #[must_use]
    pub fn matches(&self, part: &dyn MaterialPart) -> bool {
        type_of(part) == self.id
    }
}

impl PartialEq for PartType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PartType {}

impl fmt::Debug for PartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolves a part's parameter names against a program.
///
/// Names are looked up with the part's suffix appended, which is how the
/// shader builder made them unique.
#[derive(Debug, Clone, Copy)]
pub struct PartBinder<'a> {
    program: &'a ShaderProgram,
    suffix: &'a str,
}

impl<'a> PartBinder<'a> {
    /// Binder for a part whose declarations carry `suffix`.
    #[must_use]
    pub fn new(program: &'a ShaderProgram, suffix: &'a str) -> Self {
        Self { program, suffix }
    }

    /// Handle for the suffixed `name`, if the program declares it.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<ParameterHandle> {
        let mut full = String::with_capacity(name.len() + self.suffix.len());
        full.push_str(name);
        full.push_str(self.suffix);
        self.program.parameter(&full).cloned()
    }

    /// Like [`parameter`](Self::parameter), logging when the handle is missing.
    #[must_use]
    pub fn optional(&self, part: &str, name: &str) -> Option<ParameterHandle> {
        let handle = self.parameter(name);
        if handle.is_none() {
            tracing::warn!(
                part,
                parameter = name,
                suffix = self.suffix,
                "shader parameter missing, feature disabled"
            );
        }
        handle
    }

    /// The program being bound.
    #[inline]
    #[must_use]
    pub fn program(&self) -> &'a ShaderProgram {
        self.program
    }

    /// Suffix appended to every name.
    #[inline]
    #[must_use]
    pub fn suffix(&self) -> &'a str {
        self.suffix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::ParameterKind;

    #[derive(Debug, Default, Clone)]
    struct MarkerPart {
        bound: bool,
    }

    impl MaterialPart for MarkerPart {
        fn on_bind(&mut self, _binder: &PartBinder<'_>) {
            self.bound = true;
        }

        fn shader_code(&self, _usage: MaterialUsage) -> Option<Cow<'static, str>> {
            None
        }

        fn clone_part(&self) -> Box<dyn MaterialPart> {
            Box::new(self.clone())
        }
    }

    #[test]
    fn test_part_type_matches_boxed_part() {
        let part: Box<dyn MaterialPart> = Box::new(MarkerPart::default());
        let ty = PartType::of::<MarkerPart>();
        assert!(ty.matches(&*part));
        assert_eq!(type_of(&*part), TypeId::of::<MarkerPart>());
        assert_eq!(ty.name(), "MarkerPart");
        assert!(downcast_ref::<MarkerPart>(&*ty.create()).is_some());
    }

    #[test]
    fn test_binder_appends_suffix() {
        let program = ShaderProgram::new(
            MaterialUsage::Default,
            String::new(),
            vec![ParameterHandle::new("Texture_2", ParameterKind::Texture, None)],
        );
        let binder = PartBinder::new(&program, "_2");
        assert!(binder.parameter("Texture").is_some());
        assert!(PartBinder::new(&program, "_3").parameter("Texture").is_none());
    }
}
