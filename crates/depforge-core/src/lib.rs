pub mod cmake;
pub mod dispatch;
pub mod exports;
pub mod installer;
pub mod installers;
pub mod io;
pub mod patch;
pub mod paths;
pub mod platform;
pub mod process;
pub mod registry;
pub mod source;

pub mod reporter;

#[cfg(test)]
mod testing;

pub use dispatch::{Dispatcher, Notice, Outcome, Plan, RunError, RunReport, expand_request};
pub use exports::{Export, ExportError, Exports};
pub use installer::{InstallEnv, InstallError, Installer};
pub use paths::*;
pub use process::{CommandError, CommandRunner, Invocation, ProcessRunner};
pub use registry::{Registration, Registry, RegistryError};
pub use reporter::{NullReporter, Reporter};

/// User Agent string for downloads
pub const USER_AGENT: &str = concat!("depforge/", env!("CARGO_PKG_VERSION"));
