//! # Shader Assembly
//!
//! Materials never compile shaders themselves. They hand an ordered list
//! of [`ShaderFragment`]s to a [`ShaderBuilder`] and receive a
//! [`ShaderProgram`] back.
//!
//! Fragments declare their parameters with one line each:
//!
//! ```text
//! param float4x4 World : WORLD;
//! param texture Texture;
//! ```
//!
//! Every declared name is made unique by appending the fragment suffix
//! (`_0`, `_1`, ...), which is how two parts of the same type can coexist
//! in one program.

use crate::error::{GraphicsError, GraphicsResult};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{MaterialUsage, ParameterHandle, ParameterKind, ShaderProgram};

/// Keyword opening a parameter declaration line.
const PARAM_KEYWORD: &str = "param";

/// One part's contribution to a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderFragment {
    /// Position of the contributing part in its group.
    pub part_index: usize,
    /// Suffix appended to every parameter the fragment declares.
    pub suffix: String,
    /// Fragment source.
    pub code: String,
}

/// The external collaborator turning fragments into a program.
pub trait ShaderBuilder: Send + Sync {
    /// Builds a program for `usage` from fragments in part order.
    ///
    /// # Errors
    ///
    /// Implementations report compilation failures as
    /// [`GraphicsError::ShaderBuild`].
    fn build(&self, usage: MaterialUsage, fragments: &[ShaderFragment])
        -> GraphicsResult<ShaderProgram>;
}

/// A parsed `param` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Declaration<'a> {
    /// Declared type.
    pub kind: ParameterKind,
    /// Declared name, without suffix.
    pub name: &'a str,
    /// Optional semantic after the colon.
    pub semantic: Option<&'a str>,
}

/// Parses one line. Returns `Ok(None)` for lines that are not declarations.
///
/// # Errors
///
/// Returns [`GraphicsError::InvalidShaderDeclaration`] for a `param` line
/// with an unknown type or a missing name.
pub fn parse_declaration(line: &str) -> GraphicsResult<Option<Declaration<'_>>> {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix(PARAM_KEYWORD) else {
        return Ok(None);
    };
    if !rest.starts_with(char::is_whitespace) {
        return Ok(None);
    }

    let invalid = || GraphicsError::InvalidShaderDeclaration {
        line: trimmed.to_owned(),
    };

    let body = rest.trim().trim_end_matches(';');
    let (head, semantic) = match body.split_once(':') {
        Some((head, semantic)) => (head, Some(semantic.trim()).filter(|s| !s.is_empty())),
        None => (body, None),
    };

    let mut tokens = head.split_whitespace();
    let kind = tokens.next().and_then(ParameterKind::parse).ok_or_else(invalid)?;
    let name = tokens.next().ok_or_else(invalid)?;
    if tokens.next().is_some() {
        return Err(invalid());
    }

    Ok(Some(Declaration {
        kind,
        name,
        semantic,
    }))
}

/// Rewrites every declaration in `code` so its name carries `suffix`.
///
/// # Errors
///
/// Propagates declaration parse errors.
pub fn suffix_declarations(code: &str, suffix: &str) -> GraphicsResult<String> {
    let mut out = String::with_capacity(code.len() + 16);
    for line in code.lines() {
        match parse_declaration(line)? {
            Some(decl) => {
                let kind = type_name(decl.kind);
                match decl.semantic {
                    Some(semantic) => out.push_str(&format!(
                        "{PARAM_KEYWORD} {kind} {}{suffix} : {semantic};",
                        decl.name
                    )),
                    None => out.push_str(&format!("{PARAM_KEYWORD} {kind} {}{suffix};", decl.name)),
                }
            }
            None => out.push_str(line),
        }
        out.push('\n');
    }
    Ok(out)
}

fn type_name(kind: ParameterKind) -> &'static str {
    match kind {
        ParameterKind::Float => "float",
        ParameterKind::Float2 => "float2",
        ParameterKind::Float3 => "float3",
        ParameterKind::Float4 => "float4",
        ParameterKind::Matrix => "float4x4",
        ParameterKind::MatrixArray => "float4x4[]",
        ParameterKind::Int => "int",
        ParameterKind::Bool => "bool",
        ParameterKind::Texture => "texture",
    }
}

/// Reference [`ShaderBuilder`] that only collects parameter declarations.
///
/// It produces a program whose parameter table matches what a real
/// compiler would expose, which is everything materials need. The source
/// is the suffixed concatenation of all fragments.
#[derive(Debug, Default)]
pub struct DeclarationShaderBuilder {
    builds: AtomicUsize,
}

impl DeclarationShaderBuilder {
    /// Creates a builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of programs built so far.
    #[must_use]
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }
}

impl ShaderBuilder for DeclarationShaderBuilder {
    fn build(
        &self,
        usage: MaterialUsage,
        fragments: &[ShaderFragment],
    ) -> GraphicsResult<ShaderProgram> {
        let mut source = String::new();
        let mut parameters = Vec::new();

        for fragment in fragments {
            for line in fragment.code.lines() {
                if let Some(decl) = parse_declaration(line)? {
                    parameters.push(ParameterHandle::new(
                        format!("{}{}", decl.name, fragment.suffix),
                        decl.kind,
                        decl.semantic,
                    ));
                }
            }
            source.push_str(&suffix_declarations(&fragment.code, &fragment.suffix)?);
        }

        self.builds.fetch_add(1, Ordering::Relaxed);
        Ok(ShaderProgram::new(usage, source, parameters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_semantic() {
        let decl = parse_declaration("  param float4x4 World : WORLD;")
            .unwrap()
            .unwrap();
        assert_eq!(decl.kind, ParameterKind::Matrix);
        assert_eq!(decl.name, "World");
        assert_eq!(decl.semantic, Some("WORLD"));
    }

    #[test]
    fn test_non_declarations_are_skipped() {
        assert_eq!(parse_declaration("float4 x = 0;").unwrap(), None);
        assert_eq!(parse_declaration("parameters();").unwrap(), None);
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        let err = parse_declaration("param half Alpha;").unwrap_err();
        assert!(matches!(err, GraphicsError::InvalidShaderDeclaration { .. }));
    }

    #[test]
    fn test_builder_suffixes_names() {
        let builder = DeclarationShaderBuilder::new();
        let fragments = [
            ShaderFragment {
                part_index: 0,
                suffix: "_0".to_owned(),
                code: "param float4x4 World : WORLD;\n".to_owned(),
            },
            ShaderFragment {
                part_index: 2,
                suffix: "_1".to_owned(),
                code: "param texture Texture;\nparam float3 DiffuseColor;\n".to_owned(),
            },
        ];
        let program = builder.build(MaterialUsage::Default, &fragments).unwrap();
        assert_eq!(program.parameters().len(), 3);
        assert!(program.parameter("World_0").is_some());
        assert!(program.parameter("Texture_1").is_some());
        assert!(program.source().contains("param float3 DiffuseColor_1;"));
        assert_eq!(builder.build_count(), 1);
    }
}
