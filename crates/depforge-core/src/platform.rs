//! Host platform resolution.

use std::path::Path;

use depforge_schema::platform::parse_os_release_id;
use depforge_schema::{HostPlatform, Platform};

const OS_RELEASE: &str = "/etc/os-release";

/// Resolve the platform of the running host.
///
/// On Linux the result is refined with the distribution id from
/// `/etc/os-release` when that file is readable. Detection failures only
/// cost the refinement.
pub fn resolve_platform() -> HostPlatform {
    resolve_with(Platform::current(), Path::new(OS_RELEASE))
}

fn resolve_with(platform: Platform, os_release: &Path) -> HostPlatform {
    let host = HostPlatform::new(platform);
    if platform != Platform::Linux {
        return host;
    }

    match std::fs::read_to_string(os_release) {
        Ok(contents) => match parse_os_release_id(&contents) {
            Some(id) => host.with_distribution(id),
            None => {
                tracing::debug!("no ID= entry in {}", os_release.display());
                host
            }
        },
        Err(e) => {
            tracing::warn!("could not read {}: {e}; using plain linux", os_release.display());
            host
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linux_distribution_refinement() {
        let dir = tempfile::tempdir().unwrap();
        let os_release = dir.path().join("os-release");
        std::fs::write(&os_release, "NAME=\"Ubuntu\"\nID=ubuntu\n").unwrap();

        let host = resolve_with(Platform::Linux, &os_release);
        assert_eq!(host.platform, Platform::Linux);
        assert_eq!(host.distribution.as_deref(), Some("ubuntu"));
    }

    #[test]
    fn test_missing_os_release_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let host = resolve_with(Platform::Linux, &dir.path().join("nope"));
        assert_eq!(host, HostPlatform::new(Platform::Linux));
    }

    #[test]
    fn test_non_linux_ignores_os_release() {
        let dir = tempfile::tempdir().unwrap();
        let os_release = dir.path().join("os-release");
        std::fs::write(&os_release, "ID=ubuntu\n").unwrap();

        let host = resolve_with(Platform::Macos, &os_release);
        assert_eq!(host.distribution, None);
    }

    #[test]
    fn test_resolve_platform_matches_build_target() {
        assert_eq!(resolve_platform().platform, Platform::current());
    }
}
