//! CMake argument derivation and the configure/build/install sequence most
//! installers share.

use std::ffi::OsString;
use std::fmt::Display;
use std::path::{Path, PathBuf};

use depforge_schema::Platform;

use crate::installer::{InstallEnv, InstallError};

const VISUAL_STUDIO_GENERATOR: &str = "Visual Studio 15 2017 Win64";
const LLVM_TOOLSET: &str = "LLVM-vs2014";

fn build_config_name(debug: bool) -> &'static str {
    if debug { "Debug" } else { "Release" }
}

/// `-DCMAKE_BUILD_TYPE=Debug|Release`
pub fn build_type_arg(debug: bool) -> String {
    format!("-DCMAKE_BUILD_TYPE={}", build_config_name(debug))
}

/// `--config Debug|Release` for `cmake --build`.
pub fn build_configuration(debug: bool) -> [&'static str; 2] {
    ["--config", build_config_name(debug)]
}

/// Generator selection.
///
/// Windows always uses Visual Studio, with the LLVM toolset when clang is
/// wanted. Linux uses Ninja when it is installed. Everything else keeps the
/// CMake default.
pub fn generator_args(platform: Platform, use_clang: bool, ninja_available: bool) -> Vec<String> {
    match platform {
        Platform::Windows => {
            let mut args = vec!["-G".to_string(), VISUAL_STUDIO_GENERATOR.to_string()];
            if use_clang {
                args.extend(["-T".to_string(), LLVM_TOOLSET.to_string()]);
            }
            args
        }
        Platform::Linux if ninja_available => vec!["-G".to_string(), "Ninja".to_string()],
        _ => Vec::new(),
    }
}

/// Native build tool parallelism flag.
pub fn parallel_arg(platform: Platform, jobs: usize) -> String {
    match platform {
        Platform::Windows => format!("/m:{jobs}"),
        _ => format!("-j{jobs}"),
    }
}

/// `-DCMAKE_C_COMPILER=..` / `-DCMAKE_CXX_COMPILER=..` for whichever compilers are known.
pub fn compiler_args(c: Option<&Path>, cxx: Option<&Path>) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(cxx) = cxx {
        args.push(format!("-DCMAKE_CXX_COMPILER={}", cxx.display()));
    }
    if let Some(c) = c {
        args.push(format!("-DCMAKE_C_COMPILER={}", c.display()));
    }
    args
}

/// An out-of-source CMake project: configure, build, install.
#[derive(Debug, Clone)]
pub struct CMakeBuild {
    name: String,
    source_dir: PathBuf,
    build_dir: PathBuf,
    prefix: PathBuf,
    defines: Vec<String>,
    use_clang_toolset: bool,
}

impl CMakeBuild {
    /// Build `source_dir` in `build/<package>` and install into the package prefix.
    pub fn new(env: &InstallEnv<'_>, source_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: env.package.to_string(),
            source_dir: source_dir.into(),
            build_dir: env.dirs.build_dir(env.package),
            prefix: env.prefix(),
            defines: Vec::new(),
            use_clang_toolset: true,
        }
    }

    /// Name used in step descriptions (defaults to the package).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn build_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.build_dir = dir.into();
        self
    }

    pub fn prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Add `-D<key>=<value>`.
    pub fn define(mut self, key: &str, value: impl Display) -> Self {
        self.defines.push(format!("-D{key}={value}"));
        self
    }

    /// Skip the LLVM toolset on the Visual Studio generator.
    pub fn without_clang_toolset(mut self) -> Self {
        self.use_clang_toolset = false;
        self
    }

    pub fn configure_args(&self, env: &InstallEnv<'_>) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        let c = env.c_compiler();
        let cxx = env.cxx_compiler();
        args.extend(compiler_args(c.as_deref(), cxx.as_deref()).into_iter().map(OsString::from));
        args.push(build_type_arg(env.config.debug()).into());
        args.extend(
            generator_args(env.platform(), self.use_clang_toolset, env.ninja_available())
                .into_iter()
                .map(OsString::from),
        );
        args.extend(self.defines.iter().map(OsString::from));

        let mut prefix = OsString::from("-DCMAKE_INSTALL_PREFIX=");
        prefix.push(&self.prefix);
        args.push(prefix);
        args.push(self.source_dir.clone().into_os_string());
        args
    }

    pub fn run(&self, env: &InstallEnv<'_>) -> Result<(), InstallError> {
        env.ensure_dir(&self.build_dir)?;
        env.ensure_dir(&self.prefix)?;

        let configuration = build_configuration(env.config.debug());
        let cmake = env.cmake_program();

        let configure = env
            .command(format!("Configuring {}", self.name), &cmake)
            .args(self.configure_args(env))
            .current_dir(&self.build_dir);
        env.run(&configure)?;

        let build = env
            .command(format!("Building {}", self.name), &cmake)
            .args(["--build", "."])
            .args(configuration)
            .arg("--")
            .arg(parallel_arg(env.platform(), env.config.jobs()))
            .current_dir(&self.build_dir);
        env.run(&build)?;

        let install = env
            .command(format!("Installing {}", self.name), &cmake)
            .args(["--build", "."])
            .args(configuration)
            .args(["--target", "install"])
            .current_dir(&self.build_dir);
        env.run(&install)
    }
}
