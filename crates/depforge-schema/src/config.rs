//! Build configuration shared by every installer in a run.
//!
//! A [`BuildConfig`] is assembled once from the command line and then only
//! handed out by shared reference. There are no setters after construction:
//! the `with_*` methods consume the value, so an installer holding `&BuildConfig`
//! can never change what the next installer sees.

use std::path::{Path, PathBuf};

use crate::{LlvmVersion, PackageName, Platform};

/// Default install root for a platform.
pub fn default_repository_path(platform: Platform) -> PathBuf {
    match platform {
        Platform::Windows => PathBuf::from(r"C:\TrailOfBits\libraries"),
        _ => PathBuf::from("/opt/trailofbits/libraries"),
    }
}

/// Immutable per-run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    repository_path: PathBuf,
    work_dir: PathBuf,
    patches_dir: Option<PathBuf>,
    cmake_modules_dir: Option<PathBuf>,
    llvm_version: LlvmVersion,
    verbose: bool,
    debug: bool,
    c_compiler: Option<PathBuf>,
    cxx_compiler: Option<PathBuf>,
    include_libcxx: bool,
    additional_paths: Vec<PathBuf>,
    jobs: usize,
}

impl BuildConfig {
    /// Release build of the default LLVM version, buffered output, one job.
    pub fn new(repository_path: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            repository_path: repository_path.into(),
            work_dir: work_dir.into(),
            patches_dir: None,
            cmake_modules_dir: None,
            llvm_version: LlvmVersion::default(),
            verbose: false,
            debug: false,
            c_compiler: None,
            cxx_compiler: None,
            include_libcxx: true,
            additional_paths: Vec::new(),
            jobs: 1,
        }
    }

    /// Select the LLVM release.
    pub fn with_llvm_version(mut self, version: LlvmVersion) -> Self {
        self.llvm_version = version;
        self
    }

    /// Stream subprocess output instead of buffering it.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Request debug variants where installers support them.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Override the C compiler.
    pub fn with_c_compiler(mut self, compiler: Option<PathBuf>) -> Self {
        self.c_compiler = compiler;
        self
    }

    /// Override the C++ compiler.
    pub fn with_cxx_compiler(mut self, compiler: Option<PathBuf>) -> Self {
        self.cxx_compiler = compiler;
        self
    }

    /// Keep or drop libc++/libc++abi from the LLVM build.
    pub fn with_libcxx(mut self, include: bool) -> Self {
        self.include_libcxx = include;
        self
    }

    /// Directories prepended to `PATH` for every subprocess.
    pub fn with_additional_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.additional_paths = paths;
        self
    }

    /// Directory searched for `<name>.patch` before the built-in patches.
    pub fn with_patches_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.patches_dir = dir;
        self
    }

    /// CMake modules copied into `<root>/cmake` after a successful run.
    pub fn with_cmake_modules_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.cmake_modules_dir = dir;
        self
    }

    /// Parallelism handed to build tools (clamped to at least one).
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Install root.
    pub fn repository_path(&self) -> &Path {
        &self.repository_path
    }

    /// Install prefix of a single package: `<root>/<package>`.
    pub fn package_prefix(&self, package: &PackageName) -> PathBuf {
        self.repository_path.join(package)
    }

    /// Root of the staging directories.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Explicit patch directory, if any.
    pub fn patches_dir(&self) -> Option<&Path> {
        self.patches_dir.as_deref()
    }

    /// Source of the CMake modules, if any.
    pub fn cmake_modules_dir(&self) -> Option<&Path> {
        self.cmake_modules_dir.as_deref()
    }

    /// Selected LLVM release.
    pub fn llvm_version(&self) -> &LlvmVersion {
        &self.llvm_version
    }

    /// Whether subprocess output streams live.
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Whether debug variants were requested.
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// C compiler override.
    pub fn c_compiler(&self) -> Option<&Path> {
        self.c_compiler.as_deref()
    }

    /// C++ compiler override.
    pub fn cxx_compiler(&self) -> Option<&Path> {
        self.cxx_compiler.as_deref()
    }

    /// Whether libc++ is part of the LLVM build.
    pub fn include_libcxx(&self) -> bool {
        self.include_libcxx
    }

    /// Extra tool directories.
    pub fn additional_paths(&self) -> &[PathBuf] {
        &self.additional_paths
    }

    /// Parallel job count.
    pub fn jobs(&self) -> usize {
        self.jobs
    }
}
