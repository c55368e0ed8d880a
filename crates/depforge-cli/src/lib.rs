//! depforge - native dependency builder
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Downloads, patches, builds and installs a fixed catalog of C/C++
//! libraries and toolchains into one install root.
//!
//! # Directory Layout
//!
//! ```text
//! <repository-path>/      # one prefix per package
//! ├── cmake/
//! ├── llvm/
//! └── capstone/
//!
//! <work-dir>/
//! ├── sources/   # downloaded archives and unpacked source trees
//! ├── build/     # out-of-source build folders
//! └── temp/      # in-flight downloads
//! ```

pub mod cmd;
pub mod ui;

use std::path::{Path, PathBuf};

use clap::Parser;
use depforge_schema::{
    BuildConfig, LlvmVersion, LlvmVersionError, Platform, default_repository_path,
};
use thiserror::Error;

pub use depforge_core::USER_AGENT;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    LlvmVersion(#[from] LlvmVersionError),

    #[error("Cannot resolve {}: {source}", path.display())]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Parser)]
#[command(name = "depforge")]
#[command(author, version, about = "depforge - build native library dependencies from source")]
pub struct Cli {
    /// Packages to install, comma separated (e.g. cmake,llvm,clang)
    #[arg(long, value_delimiter = ',', required_unless_present = "list_packages")]
    pub packages: Vec<String>,

    /// Install root; every package goes into its own folder below it
    #[arg(long, env = "DEPFORGE_REPOSITORY_PATH")]
    pub repository_path: Option<PathBuf>,

    /// LLVM release as two or three digits (40 = 4.0.0, 391 = 3.9.1)
    #[arg(long, default_value = LlvmVersion::DEFAULT_TOKEN)]
    pub llvm_version: String,

    /// Build debug variants where supported
    #[arg(long)]
    pub debug: bool,

    /// Stream subprocess output instead of buffering it
    #[arg(long)]
    pub verbose: bool,

    /// C compiler override
    #[arg(long)]
    pub c_compiler: Option<PathBuf>,

    /// C++ compiler override
    #[arg(long)]
    pub cxx_compiler: Option<PathBuf>,

    /// Build LLVM without libc++ and libc++abi
    #[arg(long)]
    pub exclude_libcxx: bool,

    /// Directories prepended to PATH for every build step, comma separated
    #[arg(long, value_delimiter = ',')]
    pub additional_paths: Vec<PathBuf>,

    /// Root of the sources/, build/ and temp/ folders (defaults to the current directory)
    #[arg(long, env = "DEPFORGE_WORK_DIR")]
    pub work_dir: Option<PathBuf>,

    /// Directory searched for <name>.patch before the built-in patches
    #[arg(long)]
    pub patches_dir: Option<PathBuf>,

    /// CMake modules copied into <repository-path>/cmake after a successful run
    /// (defaults to <work-dir>/cmake when that folder exists)
    #[arg(long, env = "DEPFORGE_CMAKE_MODULES_DIR")]
    pub cmake_modules_dir: Option<PathBuf>,

    /// Parallel build jobs (defaults to the number of CPUs)
    #[arg(long)]
    pub jobs: Option<usize>,

    /// Print the packages available on this platform and exit
    #[arg(long)]
    pub list_packages: bool,
}

fn absolute(path: &Path) -> Result<PathBuf, ConfigError> {
    std::path::absolute(path).map_err(|source| ConfigError::Path {
        path: path.to_path_buf(),
        source,
    })
}

impl Cli {
    /// Validate the options and freeze them into a [`BuildConfig`].
    pub fn build_config(&self, platform: Platform) -> Result<BuildConfig, ConfigError> {
        let llvm_version = LlvmVersion::parse(&self.llvm_version)?;

        let repository_path = match &self.repository_path {
            Some(path) => absolute(path)?,
            None => default_repository_path(platform),
        };
        let work_dir = absolute(self.work_dir.as_deref().unwrap_or(Path::new(".")))?;

        let patches_dir = self.patches_dir.as_deref().map(absolute).transpose()?;
        let cmake_modules_dir = match &self.cmake_modules_dir {
            Some(dir) => Some(absolute(dir)?),
            None => Some(work_dir.join("cmake")).filter(|dir| dir.is_dir()),
        };
        let additional_paths = self
            .additional_paths
            .iter()
            .map(|p| absolute(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BuildConfig::new(repository_path, work_dir)
            .with_llvm_version(llvm_version)
            .with_debug(self.debug)
            .with_verbose(self.verbose)
            .with_c_compiler(self.c_compiler.clone())
            .with_cxx_compiler(self.cxx_compiler.clone())
            .with_libcxx(!self.exclude_libcxx)
            .with_additional_paths(additional_paths)
            .with_patches_dir(patches_dir)
            .with_cmake_modules_dir(cmake_modules_dir)
            .with_jobs(self.jobs.unwrap_or_else(num_cpus::get)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("depforge").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_packages_are_comma_separated() {
        let cli = parse(&["--packages", "cmake,llvm,clang"]);
        assert_eq!(cli.packages, ["cmake", "llvm", "clang"]);
        assert_eq!(cli.llvm_version, "40");
    }

    #[test]
    fn test_packages_required_unless_listing() {
        assert!(Cli::try_parse_from(["depforge"]).is_err());
        let cli = parse(&["--list-packages"]);
        assert!(cli.list_packages);
        assert!(cli.packages.is_empty());
    }

    #[test]
    fn test_build_config_from_flags() {
        let cli = parse(&[
            "--packages",
            "boost",
            "--repository-path",
            "/opt/deps",
            "--llvm-version",
            "391",
            "--debug",
            "--exclude-libcxx",
            "--additional-paths",
            "/opt/a/bin,/opt/b/bin",
            "--jobs",
            "3",
        ]);
        let config = cli.build_config(Platform::Linux).unwrap();
        assert_eq!(config.repository_path(), Path::new("/opt/deps"));
        assert_eq!(config.llvm_version().long(), "3.9.1");
        assert!(config.debug());
        assert!(!config.include_libcxx());
        assert_eq!(config.additional_paths().len(), 2);
        assert_eq!(config.jobs(), 3);
        assert!(config.work_dir().is_absolute());
    }

    #[test]
    fn test_default_repository_path_follows_platform() {
        let cli = parse(&["--packages", "cmake"]);
        let config = cli.build_config(Platform::Linux).unwrap();
        assert_eq!(config.repository_path(), default_repository_path(Platform::Linux));
        assert!(config.jobs() >= 1);
    }

    #[test]
    fn test_cmake_modules_default_to_work_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let work = tmp.path().to_str().unwrap();

        let cli = parse(&["--packages", "cmake", "--work-dir", work]);
        assert_eq!(cli.build_config(Platform::Linux).unwrap().cmake_modules_dir(), None);

        std::fs::create_dir(tmp.path().join("cmake")).unwrap();
        let config = cli.build_config(Platform::Linux).unwrap();
        assert_eq!(config.cmake_modules_dir(), Some(tmp.path().join("cmake").as_path()));

        let cli = parse(&["--packages", "cmake", "--cmake-modules-dir", "/opt/modules"]);
        let config = cli.build_config(Platform::Linux).unwrap();
        assert_eq!(config.cmake_modules_dir(), Some(Path::new("/opt/modules")));
    }

    #[test]
    fn test_malformed_llvm_version_is_rejected() {
        let cli = parse(&["--packages", "llvm", "--llvm-version", "4"]);
        assert!(matches!(
            cli.build_config(Platform::Linux),
            Err(ConfigError::LlvmVersion(_))
        ));
    }
}
