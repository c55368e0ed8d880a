//! Windows installers.

use std::path::Path;

use crate::exports::{Export, Exports};
use crate::installer::{InstallEnv, InstallError};
use crate::source::SourceRequest;

const CMAKE_VERSION: &str = "3.10.2";

/// `https://cmake.org/files/v<major>.<minor>/cmake-<version>-win64-x64.zip`
fn cmake_url(version: &str) -> String {
    let short: Vec<&str> = version.split('.').take(2).collect();
    format!(
        "https://cmake.org/files/v{}/cmake-{version}-win64-x64.zip",
        short.join(".")
    )
}

/// Copy the contents of `from` into `to`, overwriting existing files.
fn install_folder(from: &Path, to: &Path) -> Result<(), InstallError> {
    fs_extra::dir::copy(
        from,
        to,
        &fs_extra::dir::CopyOptions::new()
            .content_only(true)
            .overwrite(true),
    )
    .map_err(|e| InstallError::context("Failed to install folder", e))?;
    Ok(())
}

/// Prebuilt CMake: unpack the release zip and copy it into the prefix.
pub(crate) fn cmake(env: &InstallEnv<'_>) -> Result<Exports, InstallError> {
    if env.config.debug() {
        env.warn("Debug build not supported on Windows, installing release");
    }

    let folder = format!("cmake-{CMAKE_VERSION}-win64-x64");
    let request = SourceRequest::archive(cmake_url(CMAKE_VERSION), &env.dirs.build, folder);
    let tree = env.acquire(&request)?;

    let prefix = env.prefix();
    env.ensure_dir(&prefix)?;
    env.step(&format!("Installing folder {}", tree.dir.display()));
    install_folder(&tree.dir, &prefix)?;

    Ok(Exports::new().with(Export::CMake, prefix.join("bin").join("cmake.exe")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installer::test_env::Fixture;
    use crate::testing::RecordingRunner;
    use depforge_schema::{PackageName, Platform};

    #[test]
    fn test_cmake_url() {
        assert_eq!(
            cmake_url("3.10.2"),
            "https://cmake.org/files/v3.10/cmake-3.10.2-win64-x64.zip"
        );
    }

    #[test]
    fn test_prebuilt_cmake_is_copied_into_prefix() {
        let fixture = Fixture::new(Platform::Windows);
        let unpacked = fixture.seed("build/cmake-3.10.2-win64-x64/bin");
        std::fs::write(unpacked.join("cmake.exe"), "MZ").unwrap();
        let runner = RecordingRunner::default();
        let package = PackageName::new("cmake");

        let exports = cmake(&fixture.env(&package, &runner)).unwrap();

        let installed = fixture.config.repository_path().join("cmake/bin/cmake.exe");
        assert_eq!(std::fs::read(&installed).unwrap(), b"MZ");
        assert_eq!(exports.get(Export::CMake), Some(installed.as_path()));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_reinstall_overwrites() {
        let fixture = Fixture::new(Platform::Windows);
        let unpacked = fixture.seed("build/cmake-3.10.2-win64-x64/bin");
        std::fs::write(unpacked.join("cmake.exe"), "new").unwrap();
        let old = fixture.config.repository_path().join("cmake/bin");
        std::fs::create_dir_all(&old).unwrap();
        std::fs::write(old.join("cmake.exe"), "old").unwrap();
        let runner = RecordingRunner::default();
        let package = PackageName::new("cmake");

        cmake(&fixture.env(&package, &runner)).unwrap();
        assert_eq!(std::fs::read(old.join("cmake.exe")).unwrap(), b"new");
    }
}
