//! Source patching through the system `patch` tool.
//!
//! Patches are looked up by name: `<patches_dir>/<name>.patch` wins, and the
//! patches compiled into the binary are the fallback.

use std::io::Write;
use std::path::{Path, PathBuf};

use depforge_schema::Platform;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::process::{CommandError, CommandRunner, Invocation};

const BUILTIN_PATCHES: &[(&str, &str)] = &[("llvm", include_str!("../patches/llvm.patch"))];

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("Patch '{0}' not found")]
    NotFound(String),

    #[error("The patch executable could not be found (on Windows, install Git for Windows)")]
    MissingTool,

    #[error("Target file does not exist: {}", .0.display())]
    MissingTarget(PathBuf),

    #[error("Failed to stage built-in patch '{name}': {source}")]
    Stage {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Where a patch came from.
#[derive(Debug)]
pub enum PatchSource {
    /// A file in the user's patch directory.
    File(PathBuf),
    /// A built-in patch staged into a scratch file for the duration of the run.
    Builtin(NamedTempFile),
}

impl PatchSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::File(path) => path,
            Self::Builtin(file) => file.path(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Patcher {
    patches_dir: Option<PathBuf>,
    temp_dir: PathBuf,
    platform: Platform,
    executable: Option<PathBuf>,
}

impl Patcher {
    pub fn new(
        patches_dir: Option<PathBuf>,
        temp_dir: impl Into<PathBuf>,
        platform: Platform,
    ) -> Self {
        Self {
            patches_dir,
            temp_dir: temp_dir.into(),
            platform,
            executable: None,
        }
    }

    /// Use a specific `patch` binary instead of searching for one.
    #[cfg(test)]
    pub(crate) fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = Some(executable.into());
        self
    }

    /// Find the patch named `name`.
    pub fn resolve(&self, name: &str) -> Result<PatchSource, PatchError> {
        if let Some(dir) = &self.patches_dir {
            let candidate = dir.join(format!("{name}.patch"));
            if candidate.is_file() {
                return Ok(PatchSource::File(candidate));
            }
            tracing::debug!("{} not found, trying built-in patches", candidate.display());
        }

        let (_, contents) = BUILTIN_PATCHES
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .ok_or_else(|| PatchError::NotFound(name.to_string()))?;

        let stage_error = |source| PatchError::Stage {
            name: name.to_string(),
            source,
        };
        std::fs::create_dir_all(&self.temp_dir).map_err(stage_error)?;
        let mut staged = tempfile::Builder::new()
            .prefix(name)
            .suffix(".patch")
            .tempfile_in(&self.temp_dir)
            .map_err(stage_error)?;
        staged.write_all(contents.as_bytes()).map_err(stage_error)?;
        staged.flush().map_err(stage_error)?;

        Ok(PatchSource::Builtin(staged))
    }

    /// Locate the `patch` executable.
    pub fn executable(&self) -> Result<PathBuf, PatchError> {
        if let Some(exe) = &self.executable {
            return Ok(exe.clone());
        }
        if let Ok(exe) = which::which("patch") {
            return Ok(exe);
        }

        if self.platform == Platform::Windows {
            if let Some(program_files) = std::env::var_os("ProgramFiles") {
                let git_patch = PathBuf::from(program_files)
                    .join("Git")
                    .join("usr")
                    .join("bin")
                    .join("patch.exe");
                if git_patch.is_file() {
                    return Ok(git_patch);
                }
            }
        }

        Err(PatchError::MissingTool)
    }

    /// Apply patch `name` to `target`.
    pub fn apply(
        &self,
        runner: &dyn CommandRunner,
        target: &Path,
        name: &str,
    ) -> Result<(), PatchError> {
        if !target.is_file() {
            return Err(PatchError::MissingTarget(target.to_path_buf()));
        }

        let executable = self.executable()?;
        let patch = self.resolve(name)?;

        let invocation = Invocation::new(format!("Patching {}", target.display()), executable)
            .arg(target)
            .arg(patch.path());
        runner.run(&invocation)?;
        Ok(())
    }
}
