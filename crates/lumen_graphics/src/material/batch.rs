//! # Material Application
//!
//! The [`Material`] trait is the draw-time contract shared by
//! [`MaterialGroup`](super::MaterialGroup) and
//! [`CustomMaterial`](super::CustomMaterial). [`MaterialBatch`] remembers
//! which program was applied last so global parameters are only written
//! on a program switch.

use crate::context::DrawingContext;
use crate::error::GraphicsResult;

use super::ProgramId;

/// Something that can be applied around a draw call.
pub trait Material {
    /// Identity of the program the material draws with, if built.
    fn program_id(&self) -> Option<ProgramId>;

    /// Writes parameters before drawing.
    ///
    /// Global parameters are written only when `previous` differs from
    /// [`program_id`](Self::program_id).
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::ProgramNotBuilt`](crate::GraphicsError::ProgramNotBuilt)
    /// when there is no program to apply.
    fn begin_apply(
        &mut self,
        context: &DrawingContext,
        previous: Option<ProgramId>,
    ) -> GraphicsResult<()>;

    /// Restores per-draw state after drawing.
    fn end_apply(&mut self, context: &DrawingContext);
}

/// Draw-order state for a sequence of materials within one pass.
#[derive(Debug, Default)]
pub struct MaterialBatch {
    previous: Option<ProgramId>,
    program_switches: u64,
    draws: u64,
}

impl MaterialBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `material`, runs `draw`, then ends the application.
    ///
    /// # Errors
    ///
    /// Propagates [`Material::begin_apply`] failures; `draw` is not called
    /// in that case.
    pub fn draw<M, R>(
        &mut self,
        material: &mut M,
        context: &DrawingContext,
        draw: impl FnOnce() -> R,
    ) -> GraphicsResult<R>
    where
        M: Material + ?Sized,
    {
        material.begin_apply(context, self.previous)?;
        let current = material.program_id();
        if current != self.previous {
            self.program_switches += 1;
            self.previous = current;
        }
        let result = draw();
        material.end_apply(context);
        self.draws += 1;
        Ok(result)
    }

    /// Forgets the last program, e.g. at the start of a pass.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Program applied by the last draw.
    #[inline]
    #[must_use]
    pub fn previous(&self) -> Option<ProgramId> {
        self.previous
    }

    /// Number of times the program changed between draws.
    #[inline]
    #[must_use]
    pub fn program_switches(&self) -> u64 {
        self.program_switches
    }

    /// Number of completed draws.
    #[inline]
    #[must_use]
    pub fn draws(&self) -> u64 {
        self.draws
    }
}
