//! Shared value types for depforge.
//!
//! Everything here is plain data: the host [`Platform`], normalized
//! [`PackageName`]s and registry [`Namespace`]s, the [`LlvmVersion`] token,
//! and the immutable [`BuildConfig`] handed to every installer.

pub mod config;
pub mod llvm;
pub mod platform;
pub mod types;

// Re-exports
pub use config::{BuildConfig, default_repository_path};
pub use llvm::{LlvmVersion, LlvmVersionError};
pub use platform::{HostPlatform, Platform};
pub use types::{Namespace, PackageName};
