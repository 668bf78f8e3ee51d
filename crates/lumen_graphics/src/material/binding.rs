//! # Semantic Parameter Bindings
//!
//! A static table from semantic names to functions that compute a
//! parameter's value from the drawing context and the material instance.
//!
//! ```text
//!   semantic            scope    value
//!   ──────────────────  ───────  ─────────────────────────────────
//!   WORLD*              local    material.world (+ inverse/transpose)
//!   WORLDVIEW*          local    view * world
//!   WORLDVIEWPROJECTION* local   view_projection * world
//!   ALPHA / OPACITY     local    material.alpha
//!   DIFFUSE             local    material.diffuse_color
//!   VIEW*               global   context.view
//!   PROJECTION*         global   context.projection
//!   VIEWPROJECTION*     global   context.view_projection
//!   HALFPIXEL           global   0.5 / viewport
//!   EYEPOSITION         global   camera position
//!   TIME / ELAPSEDTIME  global   total / frame seconds
//! ```
//!
//! Global bindings are written once per program switch; local bindings
//! once per draw call.

use crate::context::DrawingContext;

use super::{MaterialBase, ParameterHandle};

/// Writes a resolved value into a parameter.
pub type BindingFn = fn(&ParameterHandle, &DrawingContext, &MaterialBase);

/// One entry of the binding table.
#[derive(Clone, Copy)]
pub struct ParameterBinding {
    /// Semantic name, upper case.
    pub semantic: &'static str,
    /// Whether the value is shared by every material using the program.
    pub is_global: bool,
    /// Value writer.
    pub apply: BindingFn,
}

impl std::fmt::Debug for ParameterBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterBinding")
            .field("semantic", &self.semantic)
            .field("is_global", &self.is_global)
            .finish_non_exhaustive()
    }
}

macro_rules! matrix_family {
    ($plain:ident, $inverse:ident, $transpose:ident, $inverse_transpose:ident,
     |$c:ident, $m:ident| $base:expr) => {
        fn $plain(p: &ParameterHandle, $c: &DrawingContext, $m: &MaterialBase) {
            p.set($base);
        }
        fn $inverse(p: &ParameterHandle, $c: &DrawingContext, $m: &MaterialBase) {
            p.set(($base).inverse());
        }
        fn $transpose(p: &ParameterHandle, $c: &DrawingContext, $m: &MaterialBase) {
            p.set_transpose($base);
        }
        fn $inverse_transpose(p: &ParameterHandle, $c: &DrawingContext, $m: &MaterialBase) {
            p.set_transpose(($base).inverse());
        }
    };
}

matrix_family!(world, world_inverse, world_transpose, world_inverse_transpose,
    |_c, m| m.world);
matrix_family!(world_view, world_view_inverse, world_view_transpose, world_view_inverse_transpose,
    |c, m| c.view() * m.world);
matrix_family!(wvp, wvp_inverse, wvp_transpose, wvp_inverse_transpose,
    |c, m| c.view_projection() * m.world);
matrix_family!(view, view_inverse, view_transpose, view_inverse_transpose,
    |c, _m| c.view());
matrix_family!(projection, projection_inverse, projection_transpose, projection_inverse_transpose,
    |c, _m| c.projection());
matrix_family!(view_projection, view_projection_inverse, view_projection_transpose,
    view_projection_inverse_transpose, |c, _m| c.view_projection());

fn alpha(p: &ParameterHandle, _c: &DrawingContext, m: &MaterialBase) {
    p.set(m.alpha);
}

fn diffuse(p: &ParameterHandle, _c: &DrawingContext, m: &MaterialBase) {
    p.set(m.diffuse_color);
}

fn half_pixel(p: &ParameterHandle, c: &DrawingContext, _m: &MaterialBase) {
    p.set(c.half_pixel());
}

fn eye_position(p: &ParameterHandle, c: &DrawingContext, _m: &MaterialBase) {
    p.set(c.eye_position());
}

fn time(p: &ParameterHandle, c: &DrawingContext, _m: &MaterialBase) {
    p.set(c.total_seconds);
}

fn elapsed_time(p: &ParameterHandle, c: &DrawingContext, _m: &MaterialBase) {
    p.set(c.elapsed_seconds);
}

const fn local(semantic: &'static str, apply: BindingFn) -> ParameterBinding {
    ParameterBinding {
        semantic,
        is_global: false,
        apply,
    }
}

const fn global(semantic: &'static str, apply: BindingFn) -> ParameterBinding {
    ParameterBinding {
        semantic,
        is_global: true,
        apply,
    }
}

static BINDINGS: &[ParameterBinding] = &[
    local("WORLD", world),
    local("WORLDINVERSE", world_inverse),
    local("WORLDTRANSPOSE", world_transpose),
    local("WORLDINVERSETRANSPOSE", world_inverse_transpose),
    local("WORLDVIEW", world_view),
    local("WORLDVIEWINVERSE", world_view_inverse),
    local("WORLDVIEWTRANSPOSE", world_view_transpose),
    local("WORLDVIEWINVERSETRANSPOSE", world_view_inverse_transpose),
    local("WORLDVIEWPROJECTION", wvp),
    local("WORLDVIEWPROJECTIONINVERSE", wvp_inverse),
    local("WORLDVIEWPROJECTIONTRANSPOSE", wvp_transpose),
    local("WORLDVIEWPROJECTIONINVERSETRANSPOSE", wvp_inverse_transpose),
    local("ALPHA", alpha),
    local("OPACITY", alpha),
    local("DIFFUSE", diffuse),
    global("VIEW", view),
    global("VIEWINVERSE", view_inverse),
    global("VIEWTRANSPOSE", view_transpose),
    global("VIEWINVERSETRANSPOSE", view_inverse_transpose),
    global("PROJECTION", projection),
    global("PROJECTIONINVERSE", projection_inverse),
    global("PROJECTIONTRANSPOSE", projection_transpose),
    global("PROJECTIONINVERSETRANSPOSE", projection_inverse_transpose),
    global("VIEWPROJECTION", view_projection),
    global("VIEWPROJECTIONINVERSE", view_projection_inverse),
    global("VIEWPROJECTIONTRANSPOSE", view_projection_transpose),
    global("VIEWPROJECTIONINVERSETRANSPOSE", view_projection_inverse_transpose),
    global("HALFPIXEL", half_pixel),
    global("EYEPOSITION", eye_position),
    global("TIME", time),
    global("ELAPSEDTIME", elapsed_time),
];

/// Every registered binding.
#[must_use]
pub fn bindings() -> &'static [ParameterBinding] {
    BINDINGS
}

/// Looks a binding up by semantic, ignoring ASCII case.
#[must_use]
pub fn find_binding(semantic: &str) -> Option<&'static ParameterBinding> {
    BINDINGS
        .iter()
        .find(|b| b.semantic.eq_ignore_ascii_case(semantic))
}

/// Parameters of one program paired with their semantic bindings.
///
/// Built once per bind; applying walks the two lists in the order the
/// parameters were discovered.
#[derive(Debug, Clone, Default)]
pub struct SemanticBindings {
    globals: Vec<(ParameterHandle, &'static ParameterBinding)>,
    locals: Vec<(ParameterHandle, &'static ParameterBinding)>,
}

impl SemanticBindings {
    /// Partitions `parameters` by the scope of their semantic.
    ///
    /// Parameters without a semantic, or with an unknown one, are skipped.
    #[must_use]
    pub fn bind<'a>(parameters: impl IntoIterator<Item = &'a ParameterHandle>) -> Self {
        let mut bound = Self::default();
        for parameter in parameters {
            let Some(binding) = parameter.semantic().and_then(find_binding) else {
                continue;
            };
            let entry = (parameter.clone(), binding);
            if binding.is_global {
                bound.globals.push(entry);
            } else {
                bound.locals.push(entry);
            }
        }
        bound
    }

    /// Writes every global binding.
    pub fn apply_global(&self, context: &DrawingContext, material: &MaterialBase) {
        for (parameter, binding) in &self.globals {
            (binding.apply)(parameter, context, material);
        }
    }

    /// Writes every local binding.
    pub fn apply_local(&self, context: &DrawingContext, material: &MaterialBase) {
        for (parameter, binding) in &self.locals {
            (binding.apply)(parameter, context, material);
        }
    }

    /// Number of bound global parameters.
    #[inline]
    #[must_use]
    pub fn global_count(&self) -> usize {
        self.globals.len()
    }

    /// Number of bound local parameters.
    #[inline]
    #[must_use]
    pub fn local_count(&self) -> usize {
        self.locals.len()
    }

    /// Drops every binding.
    pub fn clear(&mut self) {
        self.globals.clear();
        self.locals.clear();
    }
}
