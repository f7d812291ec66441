//! Compilation of HLSL to Direct3D bytecode.
//!
//! Shaders are compiled at the `_4_0_level_9_1` feature level when possible
//! so they run on the widest range of hardware. A shader that needs more is
//! retried once at plain `_4_0`.

use std::{
    error::Error,
    fs, io,
    path::{Path, PathBuf},
    process::Command,
};

use tempfile::TempDir;

use crate::{
    command::{execute_command, CommandExecError},
    stage::ShaderStage,
    template::remove_scratch_file,
};

/// Feature level suffixes, in the order they are tried.
pub const FEATURE_LEVELS: [&str; 2] = ["_4_0_level_9_1", "_4_0"];

/// Something able to turn HLSL source into bytecode.
pub trait BytecodeCompiler {
    /// Error reported for a failed compilation.
    type Error: Error + Send + Sync + 'static;

    /// Compiles `hlsl` with the given entry point and target profile, such as `ps_4_0`.
    ///
    /// # Errors
    ///
    /// Fails if the source does not compile for the profile.
    fn compile(
        &mut self,
        hlsl: &str,
        entry_point: &str,
        profile: &str,
    ) -> Result<Vec<u8>, Self::Error>;
}

/// An error indicating HLSL source did not compile at any feature level.
#[derive(Debug, thiserror::Error)]
#[error("compiling HLSL for {profile} failed: {source}")]
#[non_exhaustive]
pub struct BytecodeCompileError<E> {
    /// The last profile attempted.
    pub profile: String,
    /// Error of the last attempt.
    pub source: E,
}

/// Compiles `hlsl` for `stage`, first at the 9.1 feature level and then,
/// if that fails, once more at 4.0.
///
/// # Errors
///
/// Returns the second attempt's error if both attempts fail.
#[inline]
pub fn compile_with_fallback<B>(
    compiler: &mut B,
    hlsl: &str,
    entry_point: &str,
    stage: ShaderStage,
) -> Result<Vec<u8>, BytecodeCompileError<B::Error>>
where
    B: BytecodeCompiler + ?Sized,
{
    let [compatible, fallback] =
        FEATURE_LEVELS.map(|level| format!("{}{level}", stage.hlsl_profile_prefix()));
    match compiler.compile(hlsl, entry_point, &compatible) {
        Ok(bytecode) => Ok(bytecode),
        Err(err) => {
            log::warn!("compiling for {compatible} failed, retrying with {fallback}: {err}");
            compiler
                .compile(hlsl, entry_point, &fallback)
                .map_err(|source| BytecodeCompileError {
                    profile: fallback,
                    source,
                })
        }
    }
}

/// An error indicating `fxc` failed to compile a shader.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FxcError {
    /// The HLSL source could not be handed to `fxc`.
    #[error("could not write HLSL input '{}': {source}", .path.display())]
    Input {
        /// Path of the input file.
        path: PathBuf,
        /// Source of the error.
        source: io::Error,
    },
    /// `fxc` failed to run or rejected the source.
    #[error(transparent)]
    Exec(#[from] CommandExecError),
    /// `fxc` succeeded without writing the object file.
    #[error("fxc did not produce '{}': {source}", .path.display())]
    MissingOutput {
        /// Path of the expected object file.
        path: PathBuf,
        /// Source of the error.
        source: io::Error,
    },
}

/// The `fxc` command line compiler of the Windows SDK.
///
/// On other hosts a `.exe` compiler is run through `wine`.
#[derive(Debug)]
#[non_exhaustive]
pub struct Fxc {
    /// Program to run, `fxc` itself or `wine`.
    program: PathBuf,
    /// Arguments preceding the compiler's own, the `fxc.exe` path under `wine`.
    prefix: Vec<PathBuf>,
    /// Holds the input and object files.
    scratch: TempDir,
}

impl Fxc {
    /// Creates a compiler running the executable at `executable`.
    ///
    /// # Errors
    ///
    /// Fails if the scratch directory cannot be created or `wine` is needed but not found.
    #[inline]
    pub fn new(executable: PathBuf) -> io::Result<Self> {
        let (program, prefix) = wine_wrap(executable)?;
        let scratch = tempfile::Builder::new().prefix("shader-convert-fxc").tempdir()?;
        Ok(Self {
            program,
            prefix,
            scratch,
        })
    }

    /// Builds the command compiling `input` into `output`.
    fn command(&self, input: &Path, output: &Path, entry_point: &str, profile: &str) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.prefix)
            .args(["/nologo", "/E", entry_point, "/T", profile, "/Fo"])
            .arg(output)
            .arg(input);
        command
    }
}

/// Decides how to run `executable`: directly, or through `wine` for
/// Windows executables on other hosts.
fn wine_wrap(executable: PathBuf) -> io::Result<(PathBuf, Vec<PathBuf>)> {
    let is_exe = executable
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("exe"));
    if cfg!(windows) || !is_exe {
        return Ok((executable, Vec::new()));
    }
    let wine =
        which::which("wine").map_err(|err| io::Error::new(io::ErrorKind::NotFound, err))?;
    log::debug!("running '{}' through '{}'", executable.display(), wine.display());
    Ok((wine, vec![executable]))
}

impl BytecodeCompiler for Fxc {
    type Error = FxcError;

    #[inline]
    fn compile(
        &mut self,
        hlsl: &str,
        entry_point: &str,
        profile: &str,
    ) -> Result<Vec<u8>, FxcError> {
        let input = ScratchFile(self.scratch.path().join("shader.hlsl"));
        let output = ScratchFile(self.scratch.path().join("shader.dxbc"));
        remove_scratch_file(&output.0);
        fs::write(&input.0, hlsl).map_err(|source| FxcError::Input {
            path: input.0.clone(),
            source,
        })?;
        execute_command(self.command(&input.0, &output.0, entry_point, profile))?;
        fs::read(&output.0).map_err(|source| FxcError::MissingOutput {
            path: output.0.clone(),
            source,
        })
    }
}

/// A file removed on drop.
struct ScratchFile(PathBuf);

impl Drop for ScratchFile {
    fn drop(&mut self) {
        remove_scratch_file(&self.0);
    }
}
