//! Shader stages and discovery of shader sources.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Pipeline stage of a shader source, derived from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[expect(clippy::exhaustive_enums, reason = "only vertex and fragment shaders exist here")]
pub enum ShaderStage {
    /// `.vert` sources.
    Vertex,
    /// `.frag` sources.
    Fragment,
}

/// The file is neither a `.vert` nor a `.frag` source.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unrecognized shader type: {}", .0.display())]
pub struct UnrecognizedStageError(pub PathBuf);

impl ShaderStage {
    /// Determines the stage from the extension of `path`.
    ///
    /// # Errors
    ///
    /// Fails for any extension other than `vert` or `frag`.
    #[inline]
    pub fn from_path(path: &Path) -> Result<Self, UnrecognizedStageError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("vert") => Ok(Self::Vertex),
            Some("frag") => Ok(Self::Fragment),
            _ => Err(UnrecognizedStageError(path.to_owned())),
        }
    }

    /// Cross-compiler flag selecting this stage.
    #[inline]
    #[must_use]
    pub const fn flag(self) -> &'static str {
        match self {
            Self::Vertex => "--vert",
            Self::Fragment => "--frag",
        }
    }

    /// Suffix of the cross-compiler's output files for this stage.
    #[inline]
    #[must_use]
    pub const fn output_suffix(self) -> &'static str {
        match self {
            Self::Vertex => "vs",
            Self::Fragment => "fs",
        }
    }

    /// Prefix of the HLSL target profile for this stage.
    #[inline]
    #[must_use]
    pub const fn hlsl_profile_prefix(self) -> &'static str {
        match self {
            Self::Vertex => "vs",
            Self::Fragment => "ps",
        }
    }
}

/// Lists the `.vert` and `.frag` files directly inside `dir`, sorted by name.
/// Everything else is ignored.
///
/// # Errors
///
/// Fails if the directory cannot be read.
#[inline]
pub fn find_shaders(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut shaders = Vec::new();
    for maybe_entry in fs::read_dir(dir)? {
        let entry = maybe_entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if ShaderStage::from_path(&path).is_ok() {
            shaders.push(path);
        } else {
            log::debug!("ignoring '{}'", path.display());
        }
    }
    shaders.sort();
    Ok(shaders)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test_log::test]
    fn stage_from_extension() {
        assert_eq!(
            ShaderStage::from_path(Path::new("shaders/blit.vert")).unwrap(),
            ShaderStage::Vertex
        );
        assert_eq!(
            ShaderStage::from_path(Path::new("copy.frag")).unwrap(),
            ShaderStage::Fragment
        );
        for bad in ["common.h", "blit", "blit.vert.json", "blit.comp"] {
            assert!(ShaderStage::from_path(Path::new(bad)).is_err(), "{bad}");
        }
    }

    #[test_log::test]
    fn stage_spellings() {
        assert_eq!(ShaderStage::Vertex.flag(), "--vert");
        assert_eq!(ShaderStage::Fragment.flag(), "--frag");
        assert_eq!(ShaderStage::Vertex.output_suffix(), "vs");
        assert_eq!(ShaderStage::Fragment.output_suffix(), "fs");
        assert_eq!(ShaderStage::Vertex.hlsl_profile_prefix(), "vs");
        assert_eq!(ShaderStage::Fragment.hlsl_profile_prefix(), "ps");
    }

    #[test_log::test]
    fn finds_only_shaders_sorted_and_not_recursive() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["z.frag", "a.vert", "common.h", "a.frag", "notes.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("nested.vert")).unwrap();
        fs::write(dir.path().join("nested.vert").join("deep.frag"), "").unwrap();

        let found: Vec<_> = find_shaders(dir.path())
            .unwrap()
            .into_iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(found, ["a.frag", "a.vert", "z.frag"]);
    }

    #[test_log::test]
    fn missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_shaders(&dir.path().join("missing")).is_err());
    }
}
