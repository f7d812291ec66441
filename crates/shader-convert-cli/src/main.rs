//! Generates the Go shader module of the gio GPU backends.
//!
//! Every `.vert` and `.frag` file of the shader directory is converted to
//! GLSL ES, desktop GLSL and Direct3D bytecode, and all of them are written
//! together with their reflection data into a single Go source file.

use std::{io, path::PathBuf, process::ExitCode};

use anyhow::Context as _;
use shader_convert::{Fxc, GenerateParams, Generator};

/// The struct representing the main CLI.
#[derive(Debug, clap::Parser)]
#[clap(author, version, about)]
#[non_exhaustive]
pub struct Cli {
    /// Package clause of the generated module.
    #[clap(long, default_value = "")]
    pub package: String,

    /// Directory holding the shader sources.
    #[clap(long, default_value = "shaders")]
    pub dir: PathBuf,

    /// Path of the generated module.
    #[clap(long, default_value = "shaders.go")]
    pub output: PathBuf,

    /// The `glslcc` cross-compiler. Searched for on `PATH` when not given.
    #[clap(long, env = "GLSLCC")]
    pub glslcc: Option<PathBuf>,

    /// The `fxc` HLSL compiler. A Windows executable is run through `wine`
    /// on other hosts. Searched for on `PATH` when not given.
    #[clap(long, env = "FXC")]
    pub fxc: Option<PathBuf>,

    /// The Go formatter run on the generated module. Searched for on `PATH`
    /// when not given.
    #[clap(long, env = "GOFMT")]
    pub gofmt: Option<PathBuf>,

    /// Flatten uniform blocks into arrays.
    #[clap(long)]
    pub flatten_ubos: bool,
}

impl Cli {
    /// Runs the conversion.
    ///
    /// # Errors
    /// Any error of the conversion, or a tool that cannot be found.
    fn run(self) -> anyhow::Result<()> {
        let glslcc = tool(self.glslcc, "glslcc")?;
        let fxc = tool(self.fxc, "fxc")?;
        let gofmt = tool(self.gofmt, "gofmt")?;
        log::debug!(
            "using glslcc '{}', fxc '{}' and gofmt '{}'",
            glslcc.display(),
            fxc.display(),
            gofmt.display()
        );

        let fxc = Fxc::new(fxc).context("setting up fxc")?;
        let params = GenerateParams::new(self.dir, glslcc, fxc)
            .package(self.package)
            .output(self.output)
            .gofmt(Some(gofmt))
            .flatten_ubos(self.flatten_ubos)
            .writer(io::stdout());
        Generator::new(params)?.run()?;
        Ok(())
    }
}

/// Returns `explicit`, or else looks `name` up on `PATH`.
fn tool(explicit: Option<PathBuf>, name: &str) -> anyhow::Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => which::which(name).with_context(|| format!("could not find `{name}` on PATH")),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = <Cli as clap::Parser>::parse();
    log::debug!("running with {cli:#?}");
    match cli.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            #[expect(clippy::print_stderr, reason = "the error is reported to the user")]
            {
                eprintln!("generate: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod test {
    use clap::Parser as _;

    use super::*;

    #[test_log::test]
    fn defaults() {
        let cli = Cli::try_parse_from(["shader-convert"]).unwrap();
        assert_eq!(cli.package, "");
        assert_eq!(cli.dir, PathBuf::from("shaders"));
        assert_eq!(cli.output, PathBuf::from("shaders.go"));
        assert!(!cli.flatten_ubos);
    }

    #[test_log::test]
    fn all_flags() {
        let cli = Cli::try_parse_from([
            "shader-convert",
            "--package",
            "gpu",
            "--dir",
            "internal/shaders",
            "--output",
            "gen.go",
            "--glslcc",
            "/opt/glslcc",
            "--fxc",
            "C:/sdk/fxc.exe",
            "--gofmt",
            "/usr/lib/go/bin/gofmt",
            "--flatten-ubos",
        ])
        .unwrap();
        assert_eq!(cli.package, "gpu");
        assert_eq!(cli.dir, PathBuf::from("internal/shaders"));
        assert_eq!(cli.output, PathBuf::from("gen.go"));
        assert_eq!(cli.glslcc, Some(PathBuf::from("/opt/glslcc")));
        assert_eq!(cli.fxc, Some(PathBuf::from("C:/sdk/fxc.exe")));
        assert_eq!(cli.gofmt, Some(PathBuf::from("/usr/lib/go/bin/gofmt")));
        assert!(cli.flatten_ubos);
    }

    #[test_log::test]
    fn unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["shader-convert", "--lang", "hlsl"]).is_err());
    }

    #[test_log::test]
    fn explicit_tool_wins() {
        let path = PathBuf::from("/nonexistent/glslcc");
        assert_eq!(tool(Some(path.clone()), "glslcc").unwrap(), path);
        assert!(tool(None, "shader-convert-no-such-tool").is_err());
    }
}
