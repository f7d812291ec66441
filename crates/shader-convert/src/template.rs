//! Rendering shader sources as templates to produce their variants.
//!
//! A shader source may reference two placeholders, `{{ FetchColorExpr }}` and
//! `{{ Header }}`. The Go template spelling, `{{.FetchColorExpr}}` and
//! `{{.Header}}`, is accepted as well. Every shader is rendered once per entry
//! of [`VARIANTS`].

use std::{
    borrow::Cow,
    fs, io,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use regex::Regex;

/// Parameters substituted into a shader template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "PascalCase")]
#[non_exhaustive]
pub struct ShaderArgs {
    /// Expression evaluating to the color to shade with.
    pub fetch_color_expr: &'static str,
    /// Declarations the expression depends on.
    pub header: &'static str,
}

/// The solid color variant followed by the textured variant.
pub const VARIANTS: [ShaderArgs; 2] = [
    ShaderArgs {
        fetch_color_expr: "_color",
        header: "layout(binding=0) uniform Color { vec4 _color; };",
    },
    ShaderArgs {
        fetch_color_expr: "texture(tex, vUV)",
        header: "layout(binding=0) uniform sampler2D tex;",
    },
];

/// An error indicating a shader template could not be rendered.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TemplateError {
    /// The shader source could not be read.
    #[error("could not read shader template '{}': {source}", .path.display())]
    Read {
        /// Path of the template.
        path: PathBuf,
        /// Source of the error.
        source: io::Error,
    },
    /// The template is malformed or references an unknown placeholder.
    #[error("could not render shader template '{}': {source}", .path.display())]
    Render {
        /// Path of the template.
        path: PathBuf,
        /// Source of the error.
        source: tera::Error,
    },
    /// The rendered shader could not be written to the scratch directory.
    #[error("could not write rendered shader '{}': {source}", .path.display())]
    Scratch {
        /// Path of the scratch file.
        path: PathBuf,
        /// Source of the error.
        source: io::Error,
    },
}

/// Renders the shader at `path` with the given arguments.
///
/// # Errors
///
/// Fails if the file is unreadable, malformed, or uses an undeclared placeholder.
#[inline]
pub fn render_template(path: &Path, args: &ShaderArgs) -> Result<String, TemplateError> {
    let source = fs::read_to_string(path).map_err(|source| TemplateError::Read {
        path: path.to_owned(),
        source,
    })?;
    let render_error = |source| TemplateError::Render {
        path: path.to_owned(),
        source,
    };
    let context = tera::Context::from_serialize(args).map_err(render_error)?;
    tera::Tera::one_off(&from_go_placeholders(&source), &context, false).map_err(render_error)
}

/// Rewrites Go template field references such as `{{ .Header }}` into `{{ Header }}`.
fn from_go_placeholders(source: &str) -> Cow<'_, str> {
    static GO_FIELD: OnceLock<Regex> = OnceLock::new();
    #[expect(clippy::unwrap_used, reason = "the pattern is a valid literal")]
    let go_field = GO_FIELD.get_or_init(|| Regex::new(r"\{\{(-?)\s*\.(\w+)\s*(-?)\}\}").unwrap());
    go_field.replace_all(source, "{{${1} ${2} ${3}}}")
}

/// A rendered shader written to the scratch directory.
///
/// The file is removed when this is dropped, whatever happened in between.
#[derive(Debug)]
pub struct RenderedShader {
    /// Location of the scratch file.
    path: PathBuf,
    /// The rendered source.
    source: String,
}

impl RenderedShader {
    /// Renders `shader` with `args` and writes the result into `scratch_dir`
    /// under the shader's own file name.
    ///
    /// # Errors
    ///
    /// Fails if rendering fails or the scratch file cannot be written.
    #[inline]
    pub fn new(shader: &Path, args: &ShaderArgs, scratch_dir: &Path) -> Result<Self, TemplateError> {
        let source = render_template(shader, args)?;
        let file_name = shader.file_name().unwrap_or(shader.as_os_str());
        let path = scratch_dir.join(file_name);
        log::debug!("writing rendered shader to '{}'", path.display());
        fs::write(&path, &source).map_err(|source| TemplateError::Scratch {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, source })
    }

    /// Location of the scratch file.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The rendered source.
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl Drop for RenderedShader {
    #[inline]
    fn drop(&mut self) {
        remove_scratch_file(&self.path);
    }
}

/// Removes a scratch file, only logging when that is not possible.
pub(crate) fn remove_scratch_file(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => log::debug!("removed scratch file '{}'", path.display()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => log::warn!("could not remove scratch file '{}': {err}", path.display()),
    }
}
