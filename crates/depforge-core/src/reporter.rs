//! Reporter trait for dependency injection
//!
//! Lets the dispatcher and the installers report progress without being
//! coupled to a terminal. The CLI renders these calls; tests pass a
//! [`NullReporter`] or a recording double.

use depforge_schema::PackageName;

pub trait Reporter: Send + Sync {
    /// A package is about to be installed.
    fn section(&self, package: &PackageName);

    /// A step inside the current package started (e.g. "Configuring llvm").
    fn step(&self, description: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Log an error message.
    fn error(&self, msg: &str);

    /// Marks a package as successfully installed.
    fn done(&self, package: &PackageName);

    /// Marks a package as failed with a specific reason.
    fn failed(&self, package: &PackageName, reason: &str);

    /// Dump buffered subprocess output after a failure.
    fn captured_output(&self, log: &str);

    /// Display the final run summary.
    fn summary(&self, installed: usize, failed: usize, not_attempted: usize, elapsed_secs: f64);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, package: &PackageName) {
        (**self).section(package);
    }
    fn step(&self, description: &str) {
        (**self).step(description);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn error(&self, msg: &str) {
        (**self).error(msg);
    }
    fn done(&self, package: &PackageName) {
        (**self).done(package);
    }
    fn failed(&self, package: &PackageName, reason: &str) {
        (**self).failed(package, reason);
    }
    fn captured_output(&self, log: &str) {
        (**self).captured_output(log);
    }
    fn summary(&self, installed: usize, failed: usize, not_attempted: usize, elapsed_secs: f64) {
        (**self).summary(installed, failed, not_attempted, elapsed_secs);
    }
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &PackageName) {}
    fn step(&self, _: &str) {}
    fn info(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn error(&self, _: &str) {}
    fn done(&self, _: &PackageName) {}
    fn failed(&self, _: &PackageName, _: &str) {}
    fn captured_output(&self, _: &str) {}
    fn summary(&self, _: usize, _: usize, _: usize, _: f64) {}
}
