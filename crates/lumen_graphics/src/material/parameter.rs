//! # Shader Parameters and Programs
//!
//! A [`ShaderProgram`] is what the shader collaborator hands back: an
//! identity plus a table of named parameters. Each parameter is a shared
//! [`ParameterHandle`]; parts cache handles at bind time and write
//! through them when applied.

use crate::texture::Texture;
use glam::{Mat4, Vec2, Vec3, Vec4};
use lumen_core::Color;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::MaterialUsage;

/// Declared type of a shader parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// `float`
    Float,
    /// `float2`
    Float2,
    /// `float3`
    Float3,
    /// `float4`
    Float4,
    /// `float4x4`
    Matrix,
    /// `float4x4[]`
    MatrixArray,
    /// `int`
    Int,
    /// `bool`
    Bool,
    /// `texture`
    Texture,
}

impl ParameterKind {
    /// Parses a declaration type name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "float" => Self::Float,
            "float2" => Self::Float2,
            "float3" => Self::Float3,
            "float4" => Self::Float4,
            "float4x4" => Self::Matrix,
            "float4x4[]" => Self::MatrixArray,
            "int" => Self::Int,
            "bool" => Self::Bool,
            "texture" => Self::Texture,
            _ => return None,
        })
    }
}

/// A value stored in a shader parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    /// Scalar.
    Float(f32),
    /// Two-component vector.
    Float2(Vec2),
    /// Three-component vector.
    Float3(Vec3),
    /// Four-component vector.
    Float4(Vec4),
    /// 4x4 matrix.
    Matrix(Mat4),
    /// Matrix palette, e.g. skinning bones.
    MatrixArray(Vec<Mat4>),
    /// Integer.
    Int(i32),
    /// Boolean.
    Bool(bool),
    /// Texture slot, possibly empty.
    Texture(Option<Texture>),
}

impl ParameterValue {
    /// Kind of this value.
    #[must_use]
    pub fn kind(&self) -> ParameterKind {
        match self {
            Self::Float(_) => ParameterKind::Float,
            Self::Float2(_) => ParameterKind::Float2,
            Self::Float3(_) => ParameterKind::Float3,
            Self::Float4(_) => ParameterKind::Float4,
            Self::Matrix(_) => ParameterKind::Matrix,
            Self::MatrixArray(_) => ParameterKind::MatrixArray,
            Self::Int(_) => ParameterKind::Int,
            Self::Bool(_) => ParameterKind::Bool,
            Self::Texture(_) => ParameterKind::Texture,
        }
    }

    /// The zero value of `kind`.
    #[must_use]
    pub fn zero(kind: ParameterKind) -> Self {
        match kind {
            ParameterKind::Float => Self::Float(0.0),
            ParameterKind::Float2 => Self::Float2(Vec2::ZERO),
            ParameterKind::Float3 => Self::Float3(Vec3::ZERO),
            ParameterKind::Float4 => Self::Float4(Vec4::ZERO),
            ParameterKind::Matrix => Self::Matrix(Mat4::IDENTITY),
            ParameterKind::MatrixArray => Self::MatrixArray(Vec::new()),
            ParameterKind::Int => Self::Int(0),
            ParameterKind::Bool => Self::Bool(false),
            ParameterKind::Texture => Self::Texture(None),
        }
    }
}

impl From<f32> for ParameterValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<Vec2> for ParameterValue {
    fn from(v: Vec2) -> Self {
        Self::Float2(v)
    }
}

impl From<Vec3> for ParameterValue {
    fn from(v: Vec3) -> Self {
        Self::Float3(v)
    }
}

impl From<Vec4> for ParameterValue {
    fn from(v: Vec4) -> Self {
        Self::Float4(v)
    }
}

impl From<Color> for ParameterValue {
    fn from(v: Color) -> Self {
        Self::Float4(v.to_vec4())
    }
}

impl From<Mat4> for ParameterValue {
    fn from(v: Mat4) -> Self {
        Self::Matrix(v)
    }
}

impl From<Vec<Mat4>> for ParameterValue {
    fn from(v: Vec<Mat4>) -> Self {
        Self::MatrixArray(v)
    }
}

impl From<i32> for ParameterValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for ParameterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Texture> for ParameterValue {
    fn from(v: Texture) -> Self {
        Self::Texture(Some(v))
    }
}

impl From<Option<Texture>> for ParameterValue {
    fn from(v: Option<Texture>) -> Self {
        Self::Texture(v)
    }
}

struct ParameterSlot {
    name: String,
    semantic: Option<String>,
    kind: ParameterKind,
    value: Mutex<ParameterValue>,
    writes: AtomicU64,
}

/// Shared handle to one parameter of a compiled program.
///
/// Cloning the handle is cheap; every clone writes the same slot.
#[derive(Clone)]
pub struct ParameterHandle(Arc<ParameterSlot>);

impl ParameterHandle {
    /// Declares a parameter holding the zero value of `kind`.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ParameterKind, semantic: Option<&str>) -> Self {
        Self(Arc::new(ParameterSlot {
            name: name.into(),
            semantic: semantic.map(str::to_owned),
            kind,
            value: Mutex::new(ParameterValue::zero(kind)),
            writes: AtomicU64::new(0),
        }))
    }

    /// Parameter name, including any part suffix.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Semantic annotation, if declared.
    #[inline]
    #[must_use]
    pub fn semantic(&self) -> Option<&str> {
        self.0.semantic.as_deref()
    }

    /// Declared kind.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ParameterKind {
        self.0.kind
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> ParameterValue {
        self.0.value.lock().clone()
    }

    /// Writes a value. Values of the wrong kind are dropped with a warning.
    pub fn set(&self, value: impl Into<ParameterValue>) {
        let value = value.into();
        if value.kind() != self.0.kind {
            tracing::warn!(
                parameter = %self.0.name,
                expected = ?self.0.kind,
                actual = ?value.kind(),
                "parameter kind mismatch, write ignored"
            );
            return;
        }
        *self.0.value.lock() = value;
        self.0.writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Writes the transpose of `matrix`.
    pub fn set_transpose(&self, matrix: Mat4) {
        self.set(matrix.transpose());
    }

    /// Number of accepted writes since creation.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.0.writes.load(Ordering::Relaxed)
    }

    /// Returns `true` if both handles refer to the same slot.
    #[must_use]
    pub fn same_slot(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ParameterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterHandle")
            .field("name", &self.0.name)
            .field("semantic", &self.0.semantic)
            .field("kind", &self.0.kind)
            .finish_non_exhaustive()
    }
}

/// Process-unique identity of a compiled program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(u64);

impl ProgramId {
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

/// A compiled shader program and its parameter table.
pub struct ShaderProgram {
    id: ProgramId,
    usage: MaterialUsage,
    source: String,
    parameters: Vec<ParameterHandle>,
    by_name: HashMap<String, usize>,
}

impl ShaderProgram {
    /// Wraps a compiled program. Later duplicates of a name are ignored.
    #[must_use]
    pub fn new(usage: MaterialUsage, source: String, parameters: Vec<ParameterHandle>) -> Self {
        let mut by_name = HashMap::with_capacity(parameters.len());
        for (i, parameter) in parameters.iter().enumerate() {
            by_name.entry(parameter.name().to_owned()).or_insert(i);
        }
        Self {
            id: ProgramId::next(),
            usage,
            source,
            parameters,
            by_name,
        }
    }

    /// Program identity.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ProgramId {
        self.id
    }

    /// Usage the program was built for.
    #[inline]
    #[must_use]
    pub fn usage(&self) -> MaterialUsage {
        self.usage
    }

    /// Source the program was assembled from.
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// All parameters in declaration order.
    #[inline]
    #[must_use]
    pub fn parameters(&self) -> &[ParameterHandle] {
        &self.parameters
    }

    /// Looks a parameter up by exact name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParameterHandle> {
        self.by_name.get(name).map(|&i| &self.parameters[i])
    }

    /// First parameter carrying `semantic`, compared case-insensitively.
    #[must_use]
    pub fn parameter_by_semantic(&self, semantic: &str) -> Option<&ParameterHandle> {
        self.parameters
            .iter()
            .find(|p| p.semantic().is_some_and(|s| s.eq_ignore_ascii_case(semantic)))
    }
}

impl fmt::Debug for ShaderProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("id", &self.id)
            .field("usage", &self.usage)
            .field("parameters", &self.parameters.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mismatch_is_ignored() {
        let handle = ParameterHandle::new("Alpha", ParameterKind::Float, Some("ALPHA"));
        handle.set(Vec3::ONE);
        assert_eq!(handle.get(), ParameterValue::Float(0.0));
        assert_eq!(handle.write_count(), 0);
        handle.set(0.5);
        assert_eq!(handle.get(), ParameterValue::Float(0.5));
        assert_eq!(handle.write_count(), 1);
    }

    #[test]
    fn test_program_lookup() {
        let program = ShaderProgram::new(
            MaterialUsage::Default,
            String::new(),
            vec![
                ParameterHandle::new("World_0", ParameterKind::Matrix, Some("WORLD")),
                ParameterHandle::new("Texture_1", ParameterKind::Texture, None),
            ],
        );
        assert!(program.parameter("World_0").is_some());
        assert!(program.parameter("World").is_none());
        assert_eq!(
            program.parameter_by_semantic("world").map(ParameterHandle::name),
            Some("World_0")
        );
    }

    #[test]
    fn test_program_ids_are_unique() {
        let a = ShaderProgram::new(MaterialUsage::Default, String::new(), Vec::new());
        let b = ShaderProgram::new(MaterialUsage::Default, String::new(), Vec::new());
        assert_ne!(a.id(), b.id());
    }
}
