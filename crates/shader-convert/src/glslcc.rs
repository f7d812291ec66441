//! Invocation of the `glslcc` shader cross-compiler.
//!
//! Each call translates one rendered shader into one (language, profile)
//! target and returns the translated source together with the reflection
//! document the tool writes next to it.

use core::fmt;
use std::string::FromUtf8Error;
use std::{
    fs, io,
    path::{Path, PathBuf},
    process::Command,
};

use crate::{
    command::{execute_command, CommandExecError},
    stage::ShaderStage,
    template::remove_scratch_file,
};

/// A (language, profile) pair the cross-compiler can translate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[expect(clippy::exhaustive_enums, reason = "one variant per backend representation")]
pub enum Target {
    /// OpenGL ES 2.0 / WebGL.
    Glsl100Es,
    /// OpenGL ES 3.0.
    Glsl300Es,
    /// Desktop OpenGL 3.0.
    Glsl130,
    /// Direct3D 11, shader model 4.0.
    Hlsl,
}

impl Target {
    /// Value of the `--lang` flag.
    #[inline]
    #[must_use]
    pub const fn lang(self) -> &'static str {
        match self {
            Self::Glsl100Es | Self::Glsl300Es => "gles",
            Self::Glsl130 => "glsl",
            Self::Hlsl => "hlsl",
        }
    }

    /// Value of the `--profile` flag.
    #[inline]
    #[must_use]
    pub const fn profile(self) -> &'static str {
        match self {
            Self::Glsl100Es => "100",
            Self::Glsl300Es => "300",
            Self::Glsl130 => "130",
            Self::Hlsl => "40",
        }
    }
}

impl fmt::Display for Target {
    #[expect(
        clippy::min_ident_chars,
        reason = "It's a core library trait implementation"
    )]
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.lang(), self.profile())
    }
}

/// Output of one cross-compiler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Converted {
    /// Translated shader source.
    pub source: String,
    /// Raw JSON reflection document.
    pub reflection: Vec<u8>,
}

/// An error indicating the cross-compiler could not produce its outputs.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ToolInvocationError {
    /// The cross-compiler failed to run or exited unsuccessfully.
    #[error("{}: converting to {target} failed: {source}", .shader.display())]
    Exec {
        /// The shader being converted.
        shader: PathBuf,
        /// The requested target.
        target: Target,
        /// Source of the error.
        source: CommandExecError,
    },
    /// The cross-compiler succeeded but an expected output file is absent.
    #[error(
        "{}: converting to {target} did not produce '{}': {source}",
        .shader.display(),
        .output.display()
    )]
    MissingOutput {
        /// The shader being converted.
        shader: PathBuf,
        /// The requested target.
        target: Target,
        /// The output that could not be read.
        output: PathBuf,
        /// Source of the error.
        source: io::Error,
    },
    /// The translated source is not valid UTF-8.
    #[error(
        "{}: converting to {target} produced non UTF-8 source '{}': {source}",
        .shader.display(),
        .output.display()
    )]
    InvalidSource {
        /// The shader being converted.
        shader: PathBuf,
        /// The requested target.
        target: Target,
        /// The translated source file.
        output: PathBuf,
        /// Source of the error.
        source: FromUtf8Error,
    },
}

/// Removes the cross-compiler's output files when dropped.
struct OutputFiles {
    /// Translated source file.
    source: PathBuf,
    /// Reflection document file.
    reflection: PathBuf,
}

impl OutputFiles {
    /// Output files for `stage` under `base`, with any leftovers from earlier calls removed.
    fn new(base: &Path, stage: ShaderStage) -> Self {
        let mut name = base.as_os_str().to_owned();
        name.push("_");
        name.push(stage.output_suffix());
        let source = PathBuf::from(name);
        let mut reflection = source.clone().into_os_string();
        reflection.push(".json");
        let files = Self {
            source,
            reflection: PathBuf::from(reflection),
        };
        files.remove();
        files
    }

    /// Best-effort removal of both files.
    fn remove(&self) {
        remove_scratch_file(&self.source);
        remove_scratch_file(&self.reflection);
    }
}

impl Drop for OutputFiles {
    fn drop(&mut self) {
        self.remove();
    }
}

/// Runs `glslcc` with a fixed set of options.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Glslcc {
    /// Path to the `glslcc` executable.
    pub executable: PathBuf,
    /// Directory searched for `#include`d files, normally the shader directory.
    pub include_dir: PathBuf,
    /// Base path of the output files, inside a scratch directory.
    pub output_base: PathBuf,
    /// Whether to ask for uniform blocks to be flattened into arrays.
    pub flatten_ubos: bool,
}

impl Glslcc {
    /// Creates an invoker writing its outputs into `scratch_dir`.
    #[inline]
    #[must_use]
    pub fn new(executable: PathBuf, include_dir: PathBuf, scratch_dir: &Path) -> Self {
        Self {
            executable,
            include_dir,
            output_base: scratch_dir.join("shader"),
            flatten_ubos: false,
        }
    }

    /// Sets whether uniform blocks are flattened.
    #[inline]
    #[must_use]
    pub fn flatten_ubos(self, flatten_ubos: bool) -> Self {
        Self {
            flatten_ubos,
            ..self
        }
    }

    /// Builds the command converting `input` to `target`.
    fn command(&self, input: &Path, stage: ShaderStage, target: Target) -> Command {
        let mut command = Command::new(&self.executable);
        command
            .args(["--silent", "--optimize", "--include-dirs"])
            .arg(&self.include_dir)
            .arg("--reflect")
            .arg("--output")
            .arg(&self.output_base)
            .args(["--lang", target.lang(), "--profile", target.profile()])
            .arg(stage.flag())
            .arg(input);
        if target == Target::Hlsl {
            command.arg("--defines=HLSL");
        }
        if self.flatten_ubos {
            command.arg("--flatten-ubos");
        }
        command
    }

    /// Converts the rendered shader at `input` to `target`.
    ///
    /// `shader` names the unrendered shader file in diagnostics.
    ///
    /// # Errors
    ///
    /// Fails if the tool cannot be run, exits unsuccessfully,
    /// does not leave both of its output files behind or writes
    /// a source that is not UTF-8.
    #[inline]
    pub fn convert(
        &self,
        shader: &Path,
        input: &Path,
        stage: ShaderStage,
        target: Target,
    ) -> Result<Converted, ToolInvocationError> {
        let outputs = OutputFiles::new(&self.output_base, stage);
        let command = self.command(input, stage, target);
        execute_command(command).map_err(|source| ToolInvocationError::Exec {
            shader: shader.to_owned(),
            target,
            source,
        })?;

        let missing = |output: &Path, source| ToolInvocationError::MissingOutput {
            shader: shader.to_owned(),
            target,
            output: output.to_owned(),
            source,
        };
        let source_bytes =
            fs::read(&outputs.source).map_err(|err| missing(&outputs.source, err))?;
        let source =
            String::from_utf8(source_bytes).map_err(|err| ToolInvocationError::InvalidSource {
                shader: shader.to_owned(),
                target,
                output: outputs.source.clone(),
                source: err,
            })?;
        let reflection =
            fs::read(&outputs.reflection).map_err(|err| missing(&outputs.reflection, err))?;
        log::debug!(
            "converted '{}' to {target}: {} bytes of source, {} bytes of reflection",
            shader.display(),
            source.len(),
            reflection.len()
        );
        Ok(Converted { source, reflection })
    }
}
