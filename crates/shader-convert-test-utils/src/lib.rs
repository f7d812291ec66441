//! Utilities for tests of `shader-convert` crates.
//!
//! [`TestEnv`] provides a scratch directory with a `shaders/` directory and
//! fake `glslcc`, `fxc` and `gofmt` executables, so the conversion pipeline
//! runs without the real toolchains.

#![expect(clippy::missing_errors_doc, reason = "test utilities")]

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use tempfile::TempDir;

/// Stand-in for `glslcc`.
///
/// Writes `#version <profile>` (`// hlsl <profile>` for HLSL) followed by the
/// input to `<output>_<vs|fs>`, and copies `<include dir>/<input name>.json`,
/// or `{}` when there is none, to `<output>_<vs|fs>.json`.
/// Fails for inputs containing `GLSLCC_FAIL` and skips the reflection for
/// inputs containing `GLSLCC_NO_REFLECT`.
const FAKE_GLSLCC: &str = r##"#!/bin/sh
while [ $# -gt 0 ]; do
  case "$1" in
    --include-dirs) include="$2"; shift 2;;
    --output) base="$2"; shift 2;;
    --lang) lang="$2"; shift 2;;
    --profile) profile="$2"; shift 2;;
    --vert) suffix=vs; shift;;
    --frag) suffix=fs; shift;;
    --*) shift;;
    *) input="$1"; shift;;
  esac
done
if grep -q GLSLCC_FAIL "$input"; then
  echo "$input: syntax error" >&2
  exit 1
fi
out="${base}_${suffix}"
if [ "$lang" = hlsl ]; then
  echo "// hlsl $profile" > "$out"
else
  echo "#version $profile" > "$out"
fi
cat "$input" >> "$out"
if grep -q GLSLCC_NO_REFLECT "$input"; then
  exit 0
fi
reflection="$include/$(basename "$input").json"
if [ -f "$reflection" ]; then
  cp "$reflection" "$out.json"
else
  echo '{}' > "$out.json"
fi
"##;

/// Stand-in for `fxc`, writing `DXBC<profile>` as the object file.
/// Inputs containing `REQUIRES_SM4` fail at the 9.1 feature level.
const FAKE_FXC: &str = r##"#!/bin/sh
while [ $# -gt 0 ]; do
  case "$1" in
    /E) shift 2;;
    /T) profile="$2"; shift 2;;
    /Fo) out="$2"; shift 2;;
    /nologo) shift;;
    *) input="$1"; shift;;
  esac
done
case "$profile" in
  *_level_9_1)
    if grep -q REQUIRES_SM4 "$input"; then
      echo "$input: error X3000: requires shader model 4" >&2
      exit 1
    fi;;
esac
printf 'DXBC%s' "$profile" > "$out"
"##;

/// `TestEnv` sets up a temp dir holding a `shaders/` directory and the fake tools.
/// Dropping `TestEnv` will clean up the dir, except when panic unwinding, so you can debug failures.
#[must_use]
pub struct TestEnv(TempDir);

impl TestEnv {
    /// Create a new [`TestEnv`]
    pub fn new() -> anyhow::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("shader-convert-test")
            .tempdir()
            .context("creating test directory")?;
        let env = Self(dir);
        fs::create_dir(env.shader_dir())?;
        env.write_tool("glslcc", FAKE_GLSLCC)?;
        env.write_tool("fxc", FAKE_FXC)?;
        env.write_tool(
            "gofmt",
            &format!("#!/bin/sh\necho \"$@\" >> '{}'\n", env.gofmt_log().display()),
        )?;
        Ok(env)
    }

    /// Root of the test directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.0.path()
    }

    /// The directory shaders are written to.
    #[must_use]
    pub fn shader_dir(&self) -> PathBuf {
        self.path().join("shaders")
    }

    /// The fake `glslcc`.
    #[must_use]
    pub fn glslcc(&self) -> PathBuf {
        self.path().join("glslcc")
    }

    /// The fake `fxc`.
    #[must_use]
    pub fn fxc(&self) -> PathBuf {
        self.path().join("fxc")
    }

    /// The fake `gofmt`, which appends its arguments to [`Self::gofmt_log`].
    #[must_use]
    pub fn gofmt(&self) -> PathBuf {
        self.path().join("gofmt")
    }

    /// Arguments of every fake `gofmt` call, one line each.
    #[must_use]
    pub fn gofmt_log(&self) -> PathBuf {
        self.path().join("gofmt.log")
    }

    /// Writes a shader source named `name` and returns its path.
    pub fn write_shader(&self, name: &str, source: &str) -> anyhow::Result<PathBuf> {
        let path = self.shader_dir().join(name);
        fs::write(&path, source).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }

    /// Writes the reflection document the fake `glslcc` reports for the shader `name`.
    pub fn write_reflection(&self, name: &str, json: &str) -> anyhow::Result<PathBuf> {
        self.write_shader(&format!("{name}.json"), json)
    }

    /// Writes a tool that always fails and returns its path.
    pub fn failing_tool(&self, name: &str) -> anyhow::Result<PathBuf> {
        self.write_tool(name, "#!/bin/sh\necho \"$0: failed\" >&2\nexit 2\n")
    }

    /// Writes an executable shell script.
    fn write_tool(&self, name: &str, script: &str) -> anyhow::Result<PathBuf> {
        let path = self.path().join(name);
        fs::write(&path, script).with_context(|| format!("writing {}", path.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt as _;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        }
        Ok(path)
    }
}

impl Drop for TestEnv {
    fn drop(&mut self) {
        // when a test fails, keep directory
        if std::thread::panicking() {
            self.0.disable_cleanup(true);
        }
    }
}

#[cfg(test)]
#[cfg(unix)]
mod test {
    use std::process::Command;

    use super::*;

    #[test]
    fn fake_glslcc_contract() {
        let env = TestEnv::new().unwrap();
        let input = env.write_shader("a.frag", "void main() {}\n").unwrap();
        env.write_reflection("a.frag", "{\"fs\": {}}").unwrap();
        let base = env.path().join("out");

        let status = Command::new(env.glslcc())
            .args(["--silent", "--include-dirs"])
            .arg(env.shader_dir())
            .arg("--output")
            .arg(&base)
            .args(["--lang", "hlsl", "--profile", "40", "--frag"])
            .arg(&input)
            .arg("--defines=HLSL")
            .status()
            .unwrap();
        assert!(status.success());
        assert_eq!(
            fs::read_to_string(env.path().join("out_fs")).unwrap(),
            "// hlsl 40\nvoid main() {}\n"
        );
        assert_eq!(
            fs::read_to_string(env.path().join("out_fs.json")).unwrap(),
            "{\"fs\": {}}"
        );
    }

    #[test]
    fn fake_fxc_contract() {
        let env = TestEnv::new().unwrap();
        let input = env.write_shader("in.hlsl", "REQUIRES_SM4").unwrap();
        let out = env.path().join("out.dxbc");
        let run = |profile: &str| {
            Command::new(env.fxc())
                .args(["/nologo", "/E", "main", "/T", profile, "/Fo"])
                .arg(&out)
                .arg(&input)
                .status()
                .unwrap()
        };
        assert!(!run("ps_4_0_level_9_1").success());
        assert!(run("ps_4_0").success());
        assert_eq!(fs::read(&out).unwrap(), b"DXBCps_4_0");
    }
}
