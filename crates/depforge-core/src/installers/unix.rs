//! Linux and macOS installers.

use std::ffi::OsString;
use std::path::Path;

use depforge_schema::Platform;

use crate::exports::{Export, Exports};
use crate::installer::{InstallEnv, InstallError};
use crate::source::SourceRequest;

const CMAKE_VERSION: &str = "3.16.0-rc3";
const CMAKE_RELEASES: &str = "https://github.com/Kitware/CMake/releases/download";
const BOOST_VERSION: &str = "1.66.0";

fn prefix_arg(prefix: &Path) -> OsString {
    let mut arg = OsString::from("--prefix=");
    arg.push(prefix);
    arg
}

/// CMake from source: `bootstrap`, `make`, `make install`.
pub(crate) fn cmake(env: &InstallEnv<'_>) -> Result<Exports, InstallError> {
    if env.config.debug() {
        env.warn("Debug mode is not supported, building release");
    }
    let make = env.require_tool("make")?;

    let url = format!("{CMAKE_RELEASES}/v{CMAKE_VERSION}/cmake-{CMAKE_VERSION}.tar.gz");
    let folder = format!("cmake-{CMAKE_VERSION}");
    let tree = env.acquire(&SourceRequest::archive(url, &env.dirs.build, folder))?;

    let prefix = env.prefix();
    env.ensure_dir(&prefix)?;
    let jobs = env.config.jobs();

    let bootstrap = env
        .command("Running the bootstrap script", tree.dir.join("bootstrap"))
        .arg(format!("--parallel={jobs}"))
        .arg(prefix_arg(&prefix))
        .current_dir(&tree.dir);
    env.run(&bootstrap)?;

    let build = env
        .command("Building cmake", &make)
        .arg(format!("-j{jobs}"))
        .current_dir(&tree.dir);
    env.run(&build)?;

    let install = env.command("Installing cmake", &make).arg("install").current_dir(&tree.dir);
    env.run(&install)?;

    Ok(Exports::new().with(Export::CMake, prefix.join("bin").join("cmake")))
}

/// b2 toolset for a compiler override, else `cc`.
pub fn boost_toolset(compiler: Option<&Path>, platform: Platform) -> &'static str {
    let name = compiler
        .and_then(Path::file_name)
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    if name.contains("clang") {
        "clang"
    } else if name.contains("gcc") || name.contains("g++") {
        "gcc"
    } else if compiler.is_none() && platform == Platform::Macos {
        "darwin"
    } else {
        "cc"
    }
}

/// Boost through its own build system: `bootstrap.sh`, then `b2 install`.
pub(crate) fn boost(env: &InstallEnv<'_>) -> Result<Exports, InstallError> {
    let folder = format!("boost_{}", BOOST_VERSION.replace('.', "_"));
    let url = format!("https://archives.boost.io/release/{BOOST_VERSION}/source/{folder}.tar.gz");
    let tree = env.acquire(&SourceRequest::archive(url, &env.dirs.build, folder))?;

    let prefix = env.prefix();
    env.ensure_dir(&prefix)?;
    let toolset = boost_toolset(env.c_compiler().as_deref(), env.platform());

    let bootstrap = env
        .command("Running the bootstrap script", tree.dir.join("bootstrap.sh"))
        .arg(prefix_arg(&prefix))
        .arg(format!("--with-toolset={toolset}"))
        .current_dir(&tree.dir);
    env.run(&bootstrap)?;

    let variant = if env.config.debug() { "--variant=debug" } else { "--variant=release" };
    let b2 = env
        .command("Building and installing boost", tree.dir.join("b2"))
        .args(["install", "-d2"])
        .arg(format!("-j{}", env.config.jobs()))
        .args([
            "--layout=tagged",
            "--disable-icu",
            "threading=multi",
            "link=static",
            "optimization=space",
        ])
        .arg(format!("toolset={toolset}"))
        .arg(variant)
        .current_dir(&tree.dir);
    env.run(&b2)?;

    Ok(Exports::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installer::test_env::Fixture;
    use crate::testing::RecordingRunner;
    use depforge_schema::PackageName;

    #[test]
    fn test_boost_toolset_from_compiler() {
        assert_eq!(
            boost_toolset(Some(Path::new("/opt/clang/bin/clang")), Platform::Linux),
            "clang"
        );
        assert_eq!(boost_toolset(Some(Path::new("/usr/bin/gcc-7")), Platform::Macos), "gcc");
        assert_eq!(boost_toolset(Some(Path::new("/usr/bin/icc")), Platform::Linux), "cc");
        assert_eq!(boost_toolset(None, Platform::Linux), "cc");
        assert_eq!(boost_toolset(None, Platform::Macos), "darwin");
    }

    #[test]
    fn test_boost_invocations() {
        let fixture = Fixture::new(Platform::Linux)
            .with_config(|c| c.with_debug(true).with_c_compiler(Some("/usr/bin/clang-6.0".into())));
        let source = fixture.seed("build/boost_1_66_0");
        let runner = RecordingRunner::simulating_install(&["lib/"]);
        let package = PackageName::new("boost");

        boost(&fixture.env(&package, &runner)).unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        let prefix = fixture.config.repository_path().join("boost");
        assert_eq!(calls[0].program, source.join("bootstrap.sh").into_os_string());
        assert_eq!(
            calls[0].args_lossy(),
            [format!("--prefix={}", prefix.display()), "--with-toolset=clang".to_string()]
        );
        let b2 = calls[1].args_lossy();
        assert_eq!(b2[..3], ["install", "-d2", "-j4"]);
        assert!(b2.contains(&"toolset=clang".to_string()));
        assert_eq!(b2.last().unwrap(), "--variant=debug");
        assert_eq!(calls[1].env_value("CC"), Some(std::ffi::OsStr::new("/usr/bin/clang-6.0")));
        assert!(prefix.join("lib").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_cmake_bootstrap_make_install() {
        let tools = tempfile::tempdir().unwrap();
        let make = crate::testing::fake_tool(tools.path(), "make");
        let fixture = Fixture::new(Platform::Linux).with_config(|c| {
            c.with_debug(true)
                .with_additional_paths(vec![tools.path().to_path_buf()])
        });
        let source = fixture.seed("build/cmake-3.16.0-rc3");
        let runner = RecordingRunner::simulating_install(&["bin/cmake"]);
        let package = PackageName::new("cmake");

        let exports = cmake(&fixture.env(&package, &runner)).unwrap();

        let calls = runner.calls();
        assert_eq!(
            runner.descriptions(),
            ["Running the bootstrap script", "Building cmake", "Installing cmake"]
        );
        assert!(calls.iter().all(|c| c.cwd.as_deref() == Some(source.as_path())));
        assert_eq!(Path::new(&calls[1].program).file_name(), make.file_name());
        assert_eq!(calls[1].args_lossy(), ["-j4"]);
        assert_eq!(calls[2].args_lossy(), ["install"]);

        let cmake_bin = fixture.config.repository_path().join("cmake/bin/cmake");
        assert_eq!(exports.get(Export::CMake), Some(cmake_bin.as_path()));
        assert!(cmake_bin.is_file());
    }
}
