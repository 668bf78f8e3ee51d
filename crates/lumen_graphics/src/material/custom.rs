//! # Custom Materials
//!
//! A material built around one precompiled program rather than a part
//! list. Semantic parameters are bound through the binding table; any
//! other parameter can be set by name as an ad-hoc value.
//!
//! Ad-hoc values follow a save/restore discipline: the parameter's value
//! at bind time is recorded, the ad-hoc value is written before the draw
//! and the recorded value is written back after it. Several materials can
//! therefore share one program without leaking values into each other.

use crate::context::DrawingContext;
use crate::error::{GraphicsError, GraphicsResult};
use std::sync::Arc;

use super::{
    Material, MaterialBase, ParameterHandle, ParameterValue, ProgramId, SemanticBindings,
    ShaderProgram,
};

#[derive(Debug, Clone)]
struct NamedValue {
    name: String,
    value: ParameterValue,
    handle: Option<ParameterHandle>,
    default: Option<ParameterValue>,
}

impl NamedValue {
    fn resolve(&mut self, program: &ShaderProgram) {
        self.handle = program.parameter(&self.name).cloned();
        self.default = self.handle.as_ref().map(ParameterHandle::get);
        if self.handle.is_none() {
            tracing::warn!(parameter = %self.name, "ad-hoc parameter not found in program");
        }
    }
}

/// Semantic bindings plus ad-hoc named values for one program.
#[derive(Debug, Clone, Default)]
pub struct CustomMaterialParameters {
    program: Option<Arc<ShaderProgram>>,
    semantics: SemanticBindings,
    values: Vec<NamedValue>,
}

impl CustomMaterialParameters {
    /// Creates an unbound collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds to `program`: partitions its semantic parameters and
    /// resolves every stored ad-hoc value.
    ///
    /// Values the program does not declare stay in the collection but
    /// are not applied.
    pub fn bind(&mut self, program: Arc<ShaderProgram>) {
        self.semantics = SemanticBindings::bind(program.parameters());
        for value in &mut self.values {
            value.resolve(&program);
        }
        tracing::debug!(
            program = program.id().raw(),
            globals = self.semantics.global_count(),
            locals = self.semantics.local_count(),
            values = self.values.len(),
            "custom material parameters bound"
        );
        self.program = Some(program);
    }

    /// Sets an ad-hoc value, replacing any earlier value of the same name.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::UnknownParameter`] when a program is bound
    /// and does not declare `name`.
    pub fn set(&mut self, name: &str, value: impl Into<ParameterValue>) -> GraphicsResult<()> {
        let value = value.into();
        if let Some(program) = &self.program {
            if program.parameter(name).is_none() {
                return Err(GraphicsError::UnknownParameter {
                    name: name.to_owned(),
                });
            }
        }

        if let Some(existing) = self.values.iter_mut().find(|v| v.name == name) {
            existing.value = value;
            return Ok(());
        }

        let mut entry = NamedValue {
            name: name.to_owned(),
            value,
            handle: None,
            default: None,
        };
        if let Some(program) = &self.program {
            entry.resolve(program);
        }
        self.values.push(entry);
        Ok(())
    }

    /// The stored ad-hoc value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.values.iter().find(|v| v.name == name).map(|v| &v.value)
    }

    /// Removes an ad-hoc value. Returns `true` if it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.values.len();
        self.values.retain(|v| v.name != name);
        self.values.len() != before
    }

    /// Number of ad-hoc values.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no ad-hoc values.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The bound program.
    #[must_use]
    pub fn program(&self) -> Option<&Arc<ShaderProgram>> {
        self.program.as_ref()
    }

    /// Semantic bindings of the bound program.
    #[must_use]
    pub fn semantics(&self) -> &SemanticBindings {
        &self.semantics
    }

    /// Writes global semantic parameters.
    pub fn apply_global(&self, context: &DrawingContext) {
        self.semantics.apply_global(context, &MaterialBase::DEFAULT);
    }

    /// Writes local semantic parameters, then every resolved ad-hoc value.
    pub fn begin_apply_local(&self, context: &DrawingContext, material: &MaterialBase) {
        self.semantics.apply_local(context, material);
        for value in &self.values {
            if let Some(handle) = &value.handle {
                handle.set(value.value.clone());
            }
        }
    }

    /// Restores every ad-hoc parameter to the value recorded at bind time.
    pub fn end_apply_local(&self) {
        for value in &self.values {
            if let (Some(handle), Some(default)) = (&value.handle, &value.default) {
                handle.set(default.clone());
            }
        }
    }
}

/// A material drawing with one fixed program.
#[derive(Debug, Clone)]
pub struct CustomMaterial {
    /// Per-instance values.
    pub base: MaterialBase,
    parameters: CustomMaterialParameters,
}

impl CustomMaterial {
    /// Creates a material bound to `program`.
    #[must_use]
    pub fn new(program: Arc<ShaderProgram>) -> Self {
        let mut parameters = CustomMaterialParameters::new();
        parameters.bind(program);
        Self {
            base: MaterialBase::default(),
            parameters,
        }
    }

    /// Ad-hoc parameters.
    #[must_use]
    pub fn parameters(&self) -> &CustomMaterialParameters {
        &self.parameters
    }

    /// Mutable ad-hoc parameters.
    pub fn parameters_mut(&mut self) -> &mut CustomMaterialParameters {
        &mut self.parameters
    }
}

impl Material for CustomMaterial {
    fn program_id(&self) -> Option<ProgramId> {
        self.parameters.program().map(|p| p.id())
    }

    fn begin_apply(
        &mut self,
        context: &DrawingContext,
        previous: Option<ProgramId>,
    ) -> GraphicsResult<()> {
        let current = self.program_id().ok_or(GraphicsError::ProgramNotBuilt)?;
        if previous != Some(current) {
            self.parameters.apply_global(context);
        }
        self.parameters.begin_apply_local(context, &self.base);
        Ok(())
    }

    fn end_apply(&mut self, _context: &DrawingContext) {
        self.parameters.end_apply_local();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{MaterialBatch, MaterialUsage, ParameterKind};
    use glam::Mat4;

    fn program() -> Arc<ShaderProgram> {
        Arc::new(ShaderProgram::new(
            MaterialUsage::Default,
            String::new(),
            vec![
                ParameterHandle::new("World", ParameterKind::Matrix, Some("WORLD")),
                ParameterHandle::new("View", ParameterKind::Matrix, Some("VIEW")),
                ParameterHandle::new("Glow", ParameterKind::Float, None),
            ],
        ))
    }

    #[test]
    fn test_unknown_parameter_is_rejected() {
        let mut material = CustomMaterial::new(program());
        let err = material.parameters_mut().set("Missing", 1.0).unwrap_err();
        assert_eq!(
            err,
            GraphicsError::UnknownParameter {
                name: "Missing".to_owned()
            }
        );
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut parameters = CustomMaterialParameters::new();
        parameters.set("Glow", 1.0).unwrap();
        parameters.set("Glow", 2.0).unwrap();
        assert_eq!(parameters.len(), 1);
        assert_eq!(parameters.get("Glow"), Some(&ParameterValue::Float(2.0)));
    }

    #[test]
    fn test_ad_hoc_value_is_restored_after_draw() {
        let program = program();
        let glow = program.parameter("Glow").unwrap().clone();
        let mut material = CustomMaterial::new(Arc::clone(&program));
        material.parameters_mut().set("Glow", 5.0).unwrap();

        let context = DrawingContext::default();
        let mut batch = MaterialBatch::new();
        let seen = batch
            .draw(&mut material, &context, || glow.get())
            .unwrap();
        assert_eq!(seen, ParameterValue::Float(5.0));
        assert_eq!(glow.get(), ParameterValue::Float(0.0));
    }

    #[test]
    fn test_globals_only_on_program_switch() {
        let program = program();
        let view = program.parameter("View").unwrap().clone();
        let world = program.parameter("World").unwrap().clone();
        let mut a = CustomMaterial::new(Arc::clone(&program));
        let mut b = CustomMaterial::new(Arc::clone(&program));
        b.base.world = Mat4::from_translation(glam::Vec3::X);

        let context = DrawingContext::default();
        let mut batch = MaterialBatch::new();
        batch.draw(&mut a, &context, || ()).unwrap();
        batch.draw(&mut b, &context, || ()).unwrap();

        assert_eq!(view.write_count(), 1);
        assert_eq!(world.write_count(), 2);
        assert_eq!(batch.program_switches(), 1);
    }
}
