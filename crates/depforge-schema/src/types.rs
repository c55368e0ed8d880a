//! Package names and registry namespaces.

use std::borrow::Borrow;

use crate::Platform;

/// A normalized package token (`llvm`, `capstone`, ...).
///
/// Names are trimmed and lowercased on construction so that `--packages LLVM`
/// and `--packages llvm` name the same package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageName(String);

impl PackageName {
    /// Create a new package name, normalizing the input.
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    /// Return the normalized name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` when the token is non-empty and only uses `[a-z0-9_+-]`.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
            && self.0.chars().all(|c| {
                c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-' | '+')
            })
    }
}

impl AsRef<std::path::Path> for PackageName {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for PackageName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq<str> for PackageName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.to_lowercase()
    }
}

impl PartialEq<&str> for PackageName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.to_lowercase()
    }
}

impl Borrow<str> for PackageName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PackageName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PackageName {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

/// Scope an installer is registered under.
///
/// Platform-specific registrations shadow common ones for the same package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    /// Available on one platform only.
    Platform(Platform),
    /// Available everywhere, used when no platform-specific installer exists.
    Common,
}

impl Namespace {
    /// Registration prefix (`linux`, `macos`, `windows`, `common`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Platform(platform) => platform.as_str(),
            Self::Common => "common",
        }
    }

    /// Split a qualified registration name such as `linux_installer_cmake`
    /// into its namespace and package token.
    ///
    /// Returns `None` when the prefix is not a known namespace or the
    /// package part is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use depforge_schema::{Namespace, Platform};
    ///
    /// let (ns, package) = Namespace::split_qualified("windows_installer_cmake").unwrap();
    /// assert_eq!(ns, Namespace::Platform(Platform::Windows));
    /// assert_eq!(package, "cmake");
    /// assert!(Namespace::split_qualified("google_installer_glog").is_none());
    /// ```
    pub fn split_qualified(name: &str) -> Option<(Self, &str)> {
        let (prefix, package) = name.split_once("_installer_")?;
        if package.is_empty() {
            return None;
        }

        let namespace = if prefix == "common" {
            Self::Common
        } else {
            match prefix.parse::<Platform>() {
                Ok(Platform::Unknown) | Err(_) => return None,
                Ok(platform) => Self::Platform(platform),
            }
        };

        Some((namespace, package))
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
