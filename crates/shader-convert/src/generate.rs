//! The conversion run: every shader of a directory into one Go module.

use std::{
    fs, io,
    path::{Path, PathBuf},
    process::Command,
};

use tempfile::TempDir;

use crate::{
    assemble::{Module, ShaderRecord, ShaderVariant},
    bytecode::{compile_with_fallback, BytecodeCompileError, BytecodeCompiler, FxcError},
    command::{execute_command, CommandExecError},
    glslcc::{Glslcc, Target, ToolInvocationError},
    reflection::{parse_reflection, ReflectionParseError},
    stage::{find_shaders, ShaderStage, UnrecognizedStageError},
    template::{RenderedShader, ShaderArgs, TemplateError, VARIANTS},
    user_output,
};

/// Entry point of every shader.
const ENTRY_POINT: &str = "main";

/// An error aborting a conversion run.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GenerateError<E = FxcError> {
    /// The scratch directory could not be created.
    #[error("could not create scratch directory: {0}")]
    Scratch(#[source] io::Error),
    /// The shader directory could not be read.
    #[error("could not read shader directory '{}': {source}", .path.display())]
    ShaderDir {
        /// The shader directory.
        path: PathBuf,
        /// Source of the error.
        source: io::Error,
    },
    /// A file that is not a shader source was given.
    #[error(transparent)]
    Stage(#[from] UnrecognizedStageError),
    /// Rendering a variant failed.
    #[error(transparent)]
    Template(#[from] TemplateError),
    /// The cross-compiler failed.
    #[error(transparent)]
    Tool(#[from] ToolInvocationError),
    /// The reflection document could not be decoded.
    #[error("{}: {source}", .shader.display())]
    Reflection {
        /// The shader being converted.
        shader: PathBuf,
        /// Source of the error.
        source: ReflectionParseError,
    },
    /// The HLSL did not compile at any feature level.
    #[error("{}: {source}", .shader.display())]
    Bytecode {
        /// The shader being converted.
        shader: PathBuf,
        /// Source of the error.
        source: BytecodeCompileError<E>,
    },
    /// The module could not be written.
    #[error("could not write '{}': {source}", .path.display())]
    Write {
        /// The module path.
        path: PathBuf,
        /// Source of the error.
        source: io::Error,
    },
    /// The formatter rejected the written module.
    #[error("formatting '{}' failed: {source}", .path.display())]
    Format {
        /// The module path.
        path: PathBuf,
        /// Source of the error.
        source: CommandExecError,
    },
    /// Failed to write user output.
    #[error("failed to write user output: {0}")]
    IoWrite(#[source] io::Error),
}

/// Parameters for a [`Generator`].
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct GenerateParams<B, W = io::Sink> {
    /// Directory holding the shader sources, also searched for includes.
    pub shader_dir: PathBuf,
    /// Path to the `glslcc` executable.
    pub glslcc: PathBuf,
    /// Compiler of HLSL to bytecode.
    pub compiler: B,
    /// Whether `glslcc` flattens uniform blocks.
    pub flatten_ubos: bool,
    /// Package clause of the generated module.
    pub package: String,
    /// Path of the generated module.
    pub output: PathBuf,
    /// Formatter run on the written module as `<gofmt> -s -w <output>`, if any.
    pub gofmt: Option<PathBuf>,
    /// Writer of user output.
    pub writer: W,
}

impl<B> GenerateParams<B> {
    /// Parameters converting the shaders in `shader_dir` into `shaders.go`.
    #[inline]
    #[must_use]
    pub fn new(shader_dir: PathBuf, glslcc: PathBuf, compiler: B) -> Self {
        Self {
            shader_dir,
            glslcc,
            compiler,
            flatten_ubos: false,
            package: String::new(),
            output: PathBuf::from("shaders.go"),
            gofmt: None,
            writer: io::sink(),
        }
    }
}

impl<B, W> GenerateParams<B, W> {
    /// Sets whether `glslcc` flattens uniform blocks.
    #[inline]
    #[must_use]
    pub fn flatten_ubos(self, flatten_ubos: bool) -> Self {
        Self {
            flatten_ubos,
            ..self
        }
    }

    /// Sets the package clause of the generated module.
    #[inline]
    #[must_use]
    pub fn package(self, package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            ..self
        }
    }

    /// Sets the path of the generated module.
    #[inline]
    #[must_use]
    pub fn output(self, output: PathBuf) -> Self {
        Self { output, ..self }
    }

    /// Sets the formatter run on the written module.
    #[inline]
    #[must_use]
    pub fn gofmt(self, gofmt: Option<PathBuf>) -> Self {
        Self { gofmt, ..self }
    }

    /// Replaces the writer of user output.
    #[inline]
    #[must_use]
    pub fn writer<NW>(self, writer: NW) -> GenerateParams<B, NW> {
        GenerateParams {
            shader_dir: self.shader_dir,
            glslcc: self.glslcc,
            compiler: self.compiler,
            flatten_ubos: self.flatten_ubos,
            package: self.package,
            output: self.output,
            gofmt: self.gofmt,
            writer,
        }
    }
}

/// Converts shaders, one at a time, sharing a scratch directory that is
/// removed when the generator is dropped.
#[derive(Debug)]
#[non_exhaustive]
pub struct Generator<B, W = io::Sink> {
    /// The canonical shader directory.
    shader_dir: PathBuf,
    /// Cross-compiler invoker.
    glslcc: Glslcc,
    /// Bytecode compiler.
    compiler: B,
    /// Package clause of the generated module.
    package: String,
    /// Path of the generated module.
    output: PathBuf,
    /// Formatter of the generated module.
    gofmt: Option<PathBuf>,
    /// Writer of user output.
    writer: W,
    /// Holds the rendered variants and the cross-compiler outputs.
    scratch: TempDir,
}

impl<B, W> Generator<B, W>
where
    B: BytecodeCompiler,
    W: io::Write,
{
    /// Creates a generator from `params`.
    ///
    /// # Errors
    ///
    /// Fails if the shader directory does not exist or the scratch directory
    /// cannot be created.
    #[inline]
    pub fn new(params: GenerateParams<B, W>) -> Result<Self, GenerateError<B::Error>> {
        let shader_dir =
            dunce::canonicalize(&params.shader_dir).map_err(|source| GenerateError::ShaderDir {
                path: params.shader_dir.clone(),
                source,
            })?;
        let scratch = tempfile::Builder::new()
            .prefix("shader-convert")
            .tempdir()
            .map_err(GenerateError::Scratch)?;
        log::debug!("using scratch directory '{}'", scratch.path().display());
        let glslcc = Glslcc::new(params.glslcc, shader_dir.clone(), scratch.path())
            .flatten_ubos(params.flatten_ubos);
        Ok(Self {
            shader_dir,
            glslcc,
            compiler: params.compiler,
            package: params.package,
            output: params.output,
            gofmt: params.gofmt,
            writer: params.writer,
            scratch,
        })
    }

    /// Converts every shader of the shader directory, writes the module
    /// and formats it.
    ///
    /// Nothing is written unless every shader converts.
    ///
    /// # Errors
    ///
    /// Fails on the first shader that does not convert, or if the module
    /// cannot be written or formatted.
    #[inline]
    pub fn run(mut self) -> Result<PathBuf, GenerateError<B::Error>> {
        user_output!(
            self.writer,
            "Converting shaders in '{}'\n",
            self.shader_dir.display()
        )
        .map_err(GenerateError::IoWrite)?;

        let records = self.convert_all()?;
        let module = Module::new(&self.package, &records).to_string();
        fs::write(&self.output, module).map_err(|source| GenerateError::Write {
            path: self.output.clone(),
            source,
        })?;
        log::info!(
            "wrote {} shaders to '{}'",
            records.len(),
            self.output.display()
        );

        if let Some(gofmt) = &self.gofmt {
            let mut command = Command::new(gofmt);
            command.args(["-s", "-w"]).arg(&self.output);
            execute_command(command).map_err(|source| GenerateError::Format {
                path: self.output.clone(),
                source,
            })?;
        }

        user_output!(self.writer, "Wrote '{}'\n", self.output.display())
            .map_err(GenerateError::IoWrite)?;
        Ok(self.output)
    }

    /// Converts every shader of the shader directory, in file name order.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be read or any shader does not convert.
    #[inline]
    pub fn convert_all(&mut self) -> Result<Vec<ShaderRecord>, GenerateError<B::Error>> {
        let shaders =
            find_shaders(&self.shader_dir).map_err(|source| GenerateError::ShaderDir {
                path: self.shader_dir.clone(),
                source,
            })?;
        shaders
            .iter()
            .map(|shader| self.convert_shader(shader))
            .collect()
    }

    /// Converts both variants of the shader at `shader`.
    ///
    /// # Errors
    ///
    /// Fails if the file is not a `.vert` or `.frag` source, or any step of
    /// either variant fails.
    #[inline]
    pub fn convert_shader(&mut self, shader: &Path) -> Result<ShaderRecord, GenerateError<B::Error>> {
        let stage = ShaderStage::from_path(shader)?;
        let name = shader
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        log::debug!("converting '{}' as {stage:?} shader", shader.display());

        let [solid, textured] = &VARIANTS;
        let variants = [
            self.convert_variant(shader, stage, solid)?,
            self.convert_variant(shader, stage, textured)?,
        ];
        let record = ShaderRecord::new(name, variants);
        if record.is_multi_variant() {
            log::debug!("'{}' has distinct solid and textured variants", shader.display());
        } else {
            log::debug!("'{}' renders the same for both variants", shader.display());
        }
        Ok(record)
    }

    /// Converts one variant of a shader to every target.
    fn convert_variant(
        &mut self,
        shader: &Path,
        stage: ShaderStage,
        args: &ShaderArgs,
    ) -> Result<ShaderVariant, GenerateError<B::Error>> {
        let rendered = RenderedShader::new(shader, args, self.scratch.path())?;
        let convert = |target| self.glslcc.convert(shader, rendered.path(), stage, target);

        let glsl100es = convert(Target::Glsl100Es)?;
        let reflection =
            parse_reflection(&glsl100es.reflection).map_err(|source| GenerateError::Reflection {
                shader: shader.to_owned(),
                source,
            })?;
        let glsl300es = convert(Target::Glsl300Es)?.source;
        let glsl130 = convert(Target::Glsl130)?.source;
        let hlsl_source = convert(Target::Hlsl)?.source;

        let hlsl = compile_with_fallback(&mut self.compiler, &hlsl_source, ENTRY_POINT, stage)
            .map_err(|source| GenerateError::Bytecode {
                shader: shader.to_owned(),
                source,
            })?;
        Ok(ShaderVariant::new(
            reflection,
            glsl100es.source,
            glsl300es,
            glsl130,
            hlsl_source,
            hlsl,
        ))
    }
}
