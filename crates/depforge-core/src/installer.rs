//! The installer contract and the environment each installer runs in.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use depforge_schema::{BuildConfig, HostPlatform, PackageName, Platform};
use thiserror::Error;

use crate::exports::{Export, ExportError, Exports};
use crate::io::{ExtractError, FetchError, Fetcher};
use crate::paths::WorkDirs;
use crate::patch::{PatchError, Patcher};
use crate::process::{CommandError, CommandRunner, Invocation};
use crate::reporter::Reporter;
use crate::source::{self, SourceRequest, SourceTree};

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Download failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Patch failed: {0}")]
    Patch(#[from] PatchError),

    #[error("Invalid export: {0}")]
    Export(#[from] ExportError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Required tool not found: {0}")]
    MissingTool(String),

    #[error("{context}: {message}")]
    Context {
        context: &'static str,
        message: String,
    },
}

impl InstallError {
    /// Create an error with context for better debugging.
    pub fn context(ctx: &'static str, msg: impl std::fmt::Display) -> Self {
        Self::Context {
            context: ctx,
            message: msg.to_string(),
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Buffered output of the subprocess that caused this error, if any.
    pub fn captured_log(&self) -> Option<&str> {
        match self {
            Self::Command(e) | Self::Patch(PatchError::Command(e)) => e.captured_log(),
            _ => None,
        }
    }
}

/// A procedure that acquires, builds and installs one package.
pub trait Installer: Send + Sync {
    fn install(&self, env: &InstallEnv<'_>) -> Result<Exports, InstallError>;
}

impl<F> Installer for F
where
    F: Fn(&InstallEnv<'_>) -> Result<Exports, InstallError> + Send + Sync,
{
    fn install(&self, env: &InstallEnv<'_>) -> Result<Exports, InstallError> {
        self(env)
    }
}

/// Everything an installer may read or use. Nothing in here is mutable.
pub struct InstallEnv<'a> {
    pub config: &'a BuildConfig,
    pub host: &'a HostPlatform,
    pub package: &'a PackageName,
    pub dirs: &'a WorkDirs,
    /// Exports published by the packages that already ran.
    pub exports: &'a Exports,
    pub fetcher: &'a Fetcher,
    pub runner: &'a dyn CommandRunner,
    pub patcher: &'a Patcher,
    pub reporter: &'a dyn Reporter,
}

impl std::fmt::Debug for InstallEnv<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallEnv")
            .field("package", self.package)
            .field("host", self.host)
            .field("dirs", self.dirs)
            .field("exports", self.exports)
            .finish_non_exhaustive()
    }
}

impl InstallEnv<'_> {
    pub fn platform(&self) -> Platform {
        self.host.platform
    }

    /// Install prefix of the current package.
    pub fn prefix(&self) -> PathBuf {
        self.config.package_prefix(self.package)
    }

    /// Install prefix of another package under the same root.
    pub fn prefix_of(&self, name: &str) -> PathBuf {
        self.config.repository_path().join(name)
    }

    /// Create `dir` (and parents), naming it in the error.
    pub fn ensure_dir(&self, dir: &Path) -> Result<(), InstallError> {
        std::fs::create_dir_all(dir)
            .map_err(|e| InstallError::io(format!("Failed to create {}", dir.display()), e))
    }

    /// Report a step that does not spawn a process.
    pub fn step(&self, description: &str) {
        tracing::info!(package = %self.package, "{description}");
        self.reporter.step(description);
    }

    /// C compiler to use: the override, else a freshly built one.
    pub fn c_compiler(&self) -> Option<PathBuf> {
        self.config
            .c_compiler()
            .or_else(|| self.exports.get(Export::CCompiler))
            .map(Path::to_path_buf)
    }

    /// C++ compiler to use: the override, else a freshly built one.
    pub fn cxx_compiler(&self) -> Option<PathBuf> {
        self.config
            .cxx_compiler()
            .or_else(|| self.exports.get(Export::CxxCompiler))
            .map(Path::to_path_buf)
    }

    /// The exported `cmake` when one was built this run, else `cmake` from `PATH`.
    pub fn cmake_program(&self) -> OsString {
        self.exports
            .get(Export::CMake)
            .map_or_else(|| OsString::from("cmake"), |p| p.as_os_str().to_os_string())
    }

    /// Whether the Ninja generator can be used. Best effort.
    pub fn ninja_available(&self) -> bool {
        which::which("ninja").is_ok()
    }

    /// Locate `tool` on the subprocess `PATH`.
    pub fn require_tool(&self, tool: &str) -> Result<PathBuf, InstallError> {
        let path = self.search_path().or_else(|| std::env::var_os("PATH"));
        which::which_in(tool, path, &self.dirs.build)
            .map_err(|_| InstallError::MissingTool(tool.to_string()))
    }

    /// `PATH` for subprocesses: additional paths, exported tool dirs, then
    /// the inherited `PATH`.
    pub fn search_path(&self) -> Option<OsString> {
        let mut entries: Vec<PathBuf> = self.config.additional_paths().to_vec();
        entries.extend(self.exports.tool_dirs());
        if entries.is_empty() {
            return None;
        }
        if let Some(inherited) = std::env::var_os("PATH") {
            entries.extend(std::env::split_paths(&inherited));
        }

        match std::env::join_paths(entries) {
            Ok(joined) => Some(joined),
            Err(e) => {
                tracing::warn!("cannot build PATH for subprocesses: {e}");
                None
            }
        }
    }

    /// A new invocation carrying the run's `PATH` and compiler settings.
    pub fn command(
        &self,
        description: impl Into<String>,
        program: impl AsRef<std::ffi::OsStr>,
    ) -> Invocation {
        let mut invocation = Invocation::new(description, program);
        if let Some(path) = self.search_path() {
            invocation = invocation.env("PATH", path);
        }
        if let Some(cc) = self.c_compiler() {
            invocation = invocation.env("CC", cc);
        }
        if let Some(cxx) = self.cxx_compiler() {
            invocation = invocation.env("CXX", cxx);
        }
        invocation
    }

    /// Report and run an invocation.
    pub fn run(&self, invocation: &Invocation) -> Result<(), InstallError> {
        self.step(&invocation.description);
        self.runner.run(invocation)?;
        Ok(())
    }

    /// Download into `sources/`.
    pub fn fetch(&self, url: &str, file_name: Option<&str>) -> Result<PathBuf, InstallError> {
        self.step(&format!("Downloading {url}"));
        Ok(self.fetcher.fetch(url, &self.dirs.sources, file_name)?)
    }

    /// Fetch and unpack a source archive unless its folder already exists.
    pub fn acquire(&self, request: &SourceRequest<'_>) -> Result<SourceTree, InstallError> {
        source::acquire(self, request)
    }

    /// `master` of a GitHub repository, unpacked as `sources/<repo>`.
    pub fn acquire_github(&self, org: &str, repo: &str) -> Result<SourceTree, InstallError> {
        source::acquire(self, &SourceRequest::github(self.dirs, org, repo, "master"))
    }

    /// Apply a named patch to `target` inside source tree `tree`, once.
    ///
    /// `<tree>/.depforge-patched-<name>` is written only after the patch
    /// applied, so a tree left behind by a failed run is still patched.
    pub fn apply_patch(&self, tree: &Path, target: &Path, name: &str) -> Result<(), InstallError> {
        let marker = tree.join(format!(".depforge-patched-{name}"));
        if marker.is_file() {
            tracing::debug!("{} already carries patch {name}", tree.display());
            return Ok(());
        }

        self.step(&format!("Applying patch {name}"));
        self.patcher.apply(self.runner, target, name)?;
        std::fs::write(&marker, name)
            .map_err(|e| InstallError::io(format!("Failed to write {}", marker.display()), e))
    }

    /// Warn through both the reporter and the log.
    pub fn warn(&self, msg: &str) {
        tracing::warn!(package = %self.package, "{msg}");
        self.reporter.warning(msg);
    }

    /// Inform through both the reporter and the log.
    pub fn notice(&self, msg: &str) {
        tracing::info!(package = %self.package, "{msg}");
        self.reporter.info(msg);
    }
}

#[cfg(test)]
pub(crate) mod test_env {
    use super::*;
    use crate::reporter::NullReporter;

    /// Owned pieces of an [`InstallEnv`] rooted in a scratch directory.
    pub(crate) struct Fixture {
        pub(crate) tmp: tempfile::TempDir,
        pub(crate) config: BuildConfig,
        pub(crate) host: HostPlatform,
        pub(crate) dirs: WorkDirs,
        pub(crate) exports: Exports,
        pub(crate) fetcher: Fetcher,
        pub(crate) patcher: Patcher,
    }

    impl Fixture {
        pub(crate) fn new(platform: Platform) -> Self {
            let tmp = tempfile::tempdir().unwrap();
            let config =
                BuildConfig::new(tmp.path().join("root"), tmp.path().join("work")).with_jobs(4);
            let dirs = WorkDirs::new(config.work_dir());
            for dir in dirs.all() {
                std::fs::create_dir_all(dir).unwrap();
            }
            let fetcher = Fetcher::new(&dirs.temp);
            let patcher = Patcher::new(None, &dirs.temp, platform).with_executable("patch");
            Self {
                tmp,
                config,
                host: HostPlatform::new(platform),
                dirs,
                exports: Exports::new(),
                fetcher,
                patcher,
            }
        }

        pub(crate) fn with_config(mut self, f: impl FnOnce(BuildConfig) -> BuildConfig) -> Self {
            self.config = f(self.config);
            self
        }

        /// Pre-create a folder so acquisition is skipped.
        pub(crate) fn seed(&self, relative: &str) -> PathBuf {
            let dir = self.config.work_dir().join(relative);
            std::fs::create_dir_all(&dir).unwrap();
            dir
        }

        pub(crate) fn env<'a>(
            &'a self,
            package: &'a PackageName,
            runner: &'a dyn CommandRunner,
        ) -> InstallEnv<'a> {
            InstallEnv {
                config: &self.config,
                host: &self.host,
                package,
                dirs: &self.dirs,
                exports: &self.exports,
                fetcher: &self.fetcher,
                runner,
                patcher: &self.patcher,
                reporter: &NullReporter,
            }
        }
    }
}
