//! Host platform identification.

/// Operating system family of the host.
///
/// The platform is only ever used as a lookup key: installers are registered
/// under a platform (or under the common namespace) and the registry picks
/// the right one at resolution time.
///
/// # Example
///
/// ```
/// use depforge_schema::Platform;
///
/// assert_eq!(Platform::from_os_id("linux2"), Platform::Linux);
/// assert_eq!(Platform::from_os_id("darwin"), Platform::Macos);
/// assert_eq!(Platform::from_os_id("cygwin"), Platform::Windows);
/// assert_eq!(Platform::from_os_id("sunos5"), Platform::Unknown);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Platform {
    /// Any Linux distribution.
    Linux,
    /// macOS (`darwin`).
    Macos,
    /// Windows, including Cygwin hosts.
    Windows,
    /// A host we have no platform-specific installers for.
    Unknown,
}

impl Platform {
    /// Every platform that can carry its own installers.
    pub const KNOWN: [Self; 3] = [Self::Linux, Self::Macos, Self::Windows];

    /// Platform of the running binary.
    pub fn current() -> Self {
        Self::from_os_id(std::env::consts::OS)
    }

    /// Map a host OS identifier (`sys.platform`-style or
    /// `std::env::consts::OS`-style) to a platform.
    ///
    /// Linux is checked first and `darwin` before the Windows markers, since
    /// `darwin` itself contains `win`.
    pub fn from_os_id(id: &str) -> Self {
        let id = id.to_ascii_lowercase();

        if id.contains("linux") {
            Self::Linux
        } else if id.contains("darwin") || id.contains("mac") {
            Self::Macos
        } else if id.contains("win32") || id.contains("windows") || id.contains("cygwin") {
            Self::Windows
        } else {
            Self::Unknown
        }
    }

    /// Canonical lowercase name, also used as the registration prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Macos => "macos",
            Self::Windows => "windows",
            Self::Unknown => "unknown",
        }
    }

    /// File extension of executables on this platform (empty on unix).
    pub fn exe_suffix(&self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            _ => "",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Ok(Self::Linux),
            "macos" => Ok(Self::Macos),
            "windows" => Ok(Self::Windows),
            "unknown" => Ok(Self::Unknown),
            _ => Err(format!("Unknown platform: {s}")),
        }
    }
}

/// The resolved host: platform key plus an optional distribution refinement.
///
/// The distribution is informational only; lookups always use
/// [`HostPlatform::platform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPlatform {
    /// Namespace key for installer lookup.
    pub platform: Platform,
    /// Linux distribution id (e.g. `ubuntu`) when it could be detected.
    pub distribution: Option<String>,
}

impl HostPlatform {
    /// A host without distribution information.
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            distribution: None,
        }
    }

    /// Attach a distribution id.
    pub fn with_distribution(mut self, distribution: impl Into<String>) -> Self {
        self.distribution = Some(distribution.into());
        self
    }
}

impl std::fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.distribution {
            Some(distro) => write!(f, "{}-{distro}", self.platform),
            None => write!(f, "{}", self.platform),
        }
    }
}

/// Extract the `ID=` value from the contents of an `os-release` file.
///
/// Quotes are stripped and the result is lowercased. Returns `None` when the
/// key is missing or empty.
///
/// # Example
///
/// ```
/// use depforge_schema::platform::parse_os_release_id;
///
/// let contents = "NAME=\"Ubuntu\"\nID=ubuntu\nID_LIKE=debian\n";
/// assert_eq!(parse_os_release_id(contents).as_deref(), Some("ubuntu"));
/// ```
pub fn parse_os_release_id(contents: &str) -> Option<String> {
    contents
        .lines()
        .filter_map(|line| line.trim().strip_prefix("ID="))
        .map(|value| value.trim().trim_matches(|c| c == '"' || c == '\'').to_ascii_lowercase())
        .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_os_id_mapping() {
        assert_eq!(Platform::from_os_id("linux"), Platform::Linux);
        assert_eq!(Platform::from_os_id("Linux2"), Platform::Linux);
        assert_eq!(Platform::from_os_id("macos"), Platform::Macos);
        assert_eq!(Platform::from_os_id("darwin"), Platform::Macos);
        assert_eq!(Platform::from_os_id("win32"), Platform::Windows);
        assert_eq!(Platform::from_os_id("windows"), Platform::Windows);
        assert_eq!(Platform::from_os_id("freebsd"), Platform::Unknown);
        assert_eq!(Platform::from_os_id(""), Platform::Unknown);
    }

    #[test]
    fn test_round_trip_names() {
        for platform in Platform::KNOWN {
            assert_eq!(platform.as_str().parse::<Platform>(), Ok(platform));
        }
        assert!("beos".parse::<Platform>().is_err());
    }

    #[test]
    fn test_host_display_includes_distribution() {
        let host = HostPlatform::new(Platform::Linux).with_distribution("arch");
        assert_eq!(host.to_string(), "linux-arch");
        assert_eq!(HostPlatform::new(Platform::Macos).to_string(), "macos");
    }

    #[test]
    fn test_parse_os_release_quoted_and_missing() {
        assert_eq!(
            parse_os_release_id("ID=\"fedora\"\nVERSION_ID=39").as_deref(),
            Some("fedora")
        );
        assert_eq!(parse_os_release_id("ID_LIKE=debian\n"), None);
        assert_eq!(parse_os_release_id("ID=\n"), None);
    }
}
