//! The installer catalog.
//!
//! Every installer is listed once in [`CATALOG`] under a qualified
//! `<namespace>_installer_<package>` name. Platform entries shadow common
//! ones at resolution time.

mod common;
mod unix;
mod windows;

pub use common::{llvm_cmake_dir, llvm_release_url, llvm_targets};
pub use unix::boost_toolset;

use crate::exports::Exports;
use crate::installer::{InstallEnv, InstallError};
use crate::registry::{Registration, Registry, RegistryError};

type InstallFn = fn(&InstallEnv<'_>) -> Result<Exports, InstallError>;

pub const CATALOG: &[(&str, InstallFn)] = &[
    ("linux_installer_cmake", unix::cmake),
    ("macos_installer_cmake", unix::cmake),
    ("windows_installer_cmake", windows::cmake),
    ("linux_installer_boost", unix::boost),
    ("macos_installer_boost", unix::boost),
    ("common_installer_llvm", common::llvm),
    ("common_installer_clang", common::clang),
    ("common_installer_capstone", common::capstone),
    ("common_installer_gflags", common::gflags),
    ("common_installer_glog", common::glog),
    ("common_installer_googletest", common::googletest),
    ("common_installer_protobuf", common::protobuf),
    ("common_installer_capnproto", common::capnproto),
    ("common_installer_google", common::google),
];

/// Registrations for every entry in [`CATALOG`].
pub fn catalog() -> Result<Vec<Registration>, RegistryError> {
    CATALOG
        .iter()
        .map(|(name, install)| Registration::from_qualified(name, *install))
        .collect()
}

/// A registry holding the full catalog.
pub fn registry() -> Result<Registry, RegistryError> {
    Registry::new(catalog()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use depforge_schema::{PackageName, Platform};

    #[test]
    fn test_catalog_builds() {
        let registry = registry().unwrap();
        assert_eq!(registry.len(), CATALOG.len());
    }

    #[test]
    fn test_packages_per_platform() {
        let registry = registry().unwrap();
        let linux = registry.list_packages(Platform::Linux);
        let windows = registry.list_packages(Platform::Windows);

        assert!(linux.contains("boost"));
        assert!(!windows.contains("boost"));
        for package in ["cmake", "llvm", "clang", "capstone", "google", "protobuf"] {
            assert!(linux.contains(package), "{package} missing on linux");
            assert!(windows.contains(package), "{package} missing on windows");
        }
        assert!(!registry.list_packages(Platform::Unknown).contains("cmake"));
    }

    #[test]
    fn test_every_listed_package_resolves() {
        let registry = registry().unwrap();
        for platform in [Platform::Linux, Platform::Macos, Platform::Windows, Platform::Unknown] {
            for package in registry.list_packages(platform) {
                assert!(registry.resolve(&package, platform).is_some());
            }
        }
        assert!(registry.resolve(&PackageName::new("xed"), Platform::Linux).is_none());
    }

    /// End-to-end runs of the real catalog against a recording runner.
    mod runs {
        use super::*;
        use crate::dispatch::{Dispatcher, Outcome};
        use crate::io::Fetcher;
        use crate::reporter::Reporter;
        use crate::testing::RecordingRunner;
        use depforge_schema::{BuildConfig, HostPlatform};
        use std::sync::Mutex;

        #[derive(Default)]
        struct Notes(Mutex<Vec<String>>);

        impl Reporter for Notes {
            fn section(&self, package: &PackageName) {
                self.0.lock().unwrap().push(format!("section {package}"));
            }
            fn step(&self, _: &str) {}
            fn info(&self, msg: &str) {
                self.0.lock().unwrap().push(format!("info {msg}"));
            }
            fn warning(&self, _: &str) {}
            fn error(&self, _: &str) {}
            fn done(&self, _: &PackageName) {}
            fn failed(&self, _: &PackageName, _: &str) {}
            fn captured_output(&self, _: &str) {}
            fn summary(&self, _: usize, _: usize, _: usize, _: f64) {}
        }

        fn seed(work: &std::path::Path, dirs: &[&str]) {
            for dir in dirs {
                std::fs::create_dir_all(work.join(dir)).unwrap();
            }
        }

        #[cfg(unix)]
        #[test]
        fn test_cmake_then_capstone_on_linux() {
            let tmp = tempfile::tempdir().unwrap();
            let tools = tmp.path().join("tools");
            crate::testing::fake_tool(&tools, "make");
            let work = tmp.path().join("work");
            seed(&work, &["build/cmake-3.16.0-rc3", "sources/capstone"]);

            let config =
                BuildConfig::new(tmp.path().join("root"), &work).with_additional_paths(vec![tools]);
            let registry = registry().unwrap();
            let fetcher = Fetcher::new(work.join("temp"));
            let runner = RecordingRunner::simulating_install(&["bin/cmake"]);
            let notes = Notes::default();
            let dispatcher = Dispatcher::new(
                &registry,
                HostPlatform::new(Platform::Linux),
                &config,
                &fetcher,
                &runner,
                &notes,
            );

            let report = dispatcher.run(&["cmake".to_string(), "capstone".to_string()]).unwrap();

            assert_eq!(
                report.outcomes,
                [
                    (PackageName::new("cmake"), Outcome::Installed),
                    (PackageName::new("capstone"), Outcome::Installed)
                ]
            );
            assert!(tmp.path().join("root/cmake").is_dir());
            assert!(tmp.path().join("root/capstone").is_dir());

            // capstone is configured with the cmake built just before it.
            let configure = runner
                .calls()
                .into_iter()
                .find(|c| c.description == "Configuring capstone")
                .unwrap();
            assert_eq!(
                configure.program,
                tmp.path().join("root/cmake/bin/cmake").into_os_string()
            );
        }

        #[test]
        fn test_google_bundle_and_protobuf_in_one_run() {
            let tmp = tempfile::tempdir().unwrap();
            let work = tmp.path().join("work");
            seed(
                &work,
                &[
                    "sources/gflags",
                    "sources/glog",
                    "sources/googletest",
                    "sources/protobuf-3.6.1",
                ],
            );

            let config = BuildConfig::new(tmp.path().join("root"), &work);
            let registry = registry().unwrap();
            let fetcher = Fetcher::new(work.join("temp"));
            let runner = RecordingRunner::simulating_install(&["bin/protoc"]);
            let notes = Notes::default();
            let dispatcher = Dispatcher::new(
                &registry,
                HostPlatform::new(Platform::Linux),
                &config,
                &fetcher,
                &runner,
                &notes,
            );

            for order in [["google", "protobuf"], ["protobuf", "google"]] {
                let request: Vec<String> = order.iter().map(ToString::to_string).collect();
                let report = dispatcher.run(&request).unwrap();
                assert_eq!(report.installed(), 2, "{order:?}: {:?}", report.outcomes);
            }
            assert!(tmp.path().join("root/protobuf/bin/protoc").is_file());
        }

        #[test]
        fn test_clang_runs_after_llvm_with_notice() {
            let tmp = tempfile::tempdir().unwrap();
            let work = tmp.path().join("work");
            seed(
                &work,
                &[
                    "sources/llvm-4.0.0.src/projects/libcxx",
                    "sources/llvm-4.0.0.src/projects/libcxxabi",
                    "sources/cfe-4.0.0.src",
                ],
            );
            let marker = work.join("sources/llvm-4.0.0.src/.depforge-patched-llvm");
            std::fs::write(marker, "llvm").unwrap();

            let config = BuildConfig::new(tmp.path().join("root"), &work);
            let registry = registry().unwrap();
            let fetcher = Fetcher::new(work.join("temp"));
            let installed = ["bin/clang", "bin/clang++", "lib/cmake/llvm/"];
            let runner = RecordingRunner::simulating_install(&installed);
            let notes = Notes::default();
            let dispatcher = Dispatcher::new(
                &registry,
                HostPlatform::new(Platform::Linux),
                &config,
                &fetcher,
                &runner,
                &notes,
            );

            let report = dispatcher.run(&["clang".to_string()]).unwrap();

            let order: Vec<&str> = report.outcomes.iter().map(|(p, _)| p.as_str()).collect();
            assert_eq!(order, ["llvm", "clang"]);
            assert_eq!(report.installed(), 2);

            let notes = notes.0.lock().unwrap();
            assert_eq!(
                notes.first().map(String::as_str),
                Some("info clang requires llvm, which has been added to the package list")
            );
            let sections: Vec<&String> =
                notes.iter().filter(|n| n.starts_with("section")).collect();
            assert_eq!(sections, ["section llvm", "section clang"]);
        }
    }
}
