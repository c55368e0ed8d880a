//! LLVM version tokens.
//!
//! Users select the toolchain with a compact numeric token: two digits for a
//! `major.minor` release (`40` is 4.0.0) or three digits when the patch level
//! matters (`391` is 3.9.1).

use semver::Version;
use thiserror::Error;

/// Errors produced while parsing an LLVM version token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlvmVersionError {
    /// The token is not two or three ASCII digits.
    #[error("Invalid LLVM version: {0} (expected two or three digits, e.g. 40 or 391)")]
    Malformed(String),
}

/// A validated LLVM version token.
///
/// # Example
///
/// ```
/// use depforge_schema::LlvmVersion;
///
/// let v: LlvmVersion = "391".parse().unwrap();
/// assert_eq!(v.long(), "3.9.1");
/// assert_eq!(v.token(), "391");
/// assert!(v.is_supported());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlvmVersion {
    token: String,
    version: Version,
}

impl LlvmVersion {
    /// Token used when none is given on the command line.
    pub const DEFAULT_TOKEN: &'static str = "40";

    /// Parse a version token.
    ///
    /// # Errors
    ///
    /// Returns [`LlvmVersionError::Malformed`] when the token is not made of
    /// exactly two or three ASCII digits.
    pub fn parse(token: &str) -> Result<Self, LlvmVersionError> {
        let token = token.trim();
        if !(2..=3).contains(&token.len()) || !token.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LlvmVersionError::Malformed(token.to_string()));
        }

        let digits: Vec<u64> = token.bytes().map(|b| u64::from(b - b'0')).collect();
        let patch = digits.get(2).copied().unwrap_or(0);

        Ok(Self {
            token: token.to_string(),
            version: Version::new(digits[0], digits[1], patch),
        })
    }

    /// The token as given (`40`, `391`).
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Full semantic version.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Dotted release string used in release archive names (`4.0.0`).
    pub fn long(&self) -> String {
        self.version.to_string()
    }

    /// `true` when this release is older than `major.minor.patch`.
    pub fn is_older_than(&self, major: u64, minor: u64, patch: u64) -> bool {
        self.version < Version::new(major, minor, patch)
    }

    /// Releases in `[3.6, 5.0)` are the ones the installers were written for.
    /// Others are attempted but flagged as unsupported.
    pub fn is_supported(&self) -> bool {
        !self.is_older_than(3, 6, 0) && self.is_older_than(5, 0, 0)
    }
}

impl Default for LlvmVersion {
    fn default() -> Self {
        Self {
            token: Self::DEFAULT_TOKEN.to_string(),
            version: Version::new(4, 0, 0),
        }
    }
}

impl std::str::FromStr for LlvmVersion {
    type Err = LlvmVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for LlvmVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_digit_token() {
        let v = LlvmVersion::parse("40").unwrap();
        assert_eq!(v.long(), "4.0.0");
        assert_eq!(v, LlvmVersion::default());
    }

    #[test]
    fn test_three_digit_token() {
        let v = LlvmVersion::parse("501").unwrap();
        assert_eq!(v.long(), "5.0.1");
        assert!(!v.is_supported());
    }

    #[test]
    fn test_malformed_tokens() {
        for bad in ["4", "4000", "4.0", "ab", ""] {
            assert_eq!(
                LlvmVersion::parse(bad),
                Err(LlvmVersionError::Malformed(bad.to_string()))
            );
        }
    }

    #[test]
    fn test_version_comparisons() {
        let v = LlvmVersion::parse("40").unwrap();
        assert!(v.is_older_than(4, 0, 1));
        assert!(!v.is_older_than(3, 7, 1));
        assert!(LlvmVersion::parse("35").unwrap().is_older_than(3, 6, 0));
        assert!(LlvmVersion::parse("36").unwrap().is_supported());
    }
}
