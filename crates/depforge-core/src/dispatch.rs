//! Request validation, dependency expansion and sequential execution.
//!
//! The dispatcher is the only place that decides what a failure means for a
//! run: the first installer error stops everything, and the packages after
//! it are reported as not attempted.

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use depforge_schema::{BuildConfig, HostPlatform, Namespace, PackageName};
use thiserror::Error;

use crate::exports::Exports;
use crate::installer::{InstallEnv, InstallError};
use crate::io::Fetcher;
use crate::paths::WorkDirs;
use crate::patch::Patcher;
use crate::process::CommandRunner;
use crate::registry::{Registry, Resolved};
use crate::reporter::Reporter;

/// `(dependent, dependency)`: requesting the first implies the second, installed before it.
pub const IMPLIED_DEPENDENCIES: &[(&str, &str)] = &[("clang", "llvm")];

#[derive(Error, Debug)]
pub enum RunError {
    #[error("No packages requested")]
    NoPackages,

    #[error(
        "Invalid package(s): {}. Available packages: {}",
        names.join(", "),
        available.join(", ")
    )]
    UnknownPackages {
        names: Vec<String>,
        available: Vec<String>,
    },

    #[error("Failed to create {}: {source}", path.display())]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to install the CMake modules into {}: {source}", path.display())]
    CMakeModules {
        path: PathBuf,
        #[source]
        source: fs_extra::error::Error,
    },

    #[error("Failed to install {package}: {error}")]
    PackageFailed {
        package: PackageName,
        #[source]
        error: InstallError,
        not_attempted: Vec<PackageName>,
    },
}

/// Adjustments made to a request before it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A repeated name was dropped.
    Duplicate(PackageName),
    /// `dependency` was added in front of `dependent`.
    Added {
        dependency: PackageName,
        dependent: PackageName,
    },
    /// `dependency` was requested after `dependent` and moved in front of it.
    Moved {
        dependency: PackageName,
        dependent: PackageName,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate(name) => {
                write!(f, "{name} was requested more than once; installing it once")
            }
            Self::Added {
                dependency,
                dependent,
            } => write!(
                f,
                "{dependent} requires {dependency}, which has been added to the package list"
            ),
            Self::Moved {
                dependency,
                dependent,
            } => write!(f, "{dependent} requires {dependency}, which will be installed first"),
        }
    }
}

/// Collapse duplicates and apply [`IMPLIED_DEPENDENCIES`].
///
/// Not transitive, and idempotent: expanding an already expanded list
/// changes nothing and yields no notices.
pub fn expand_request(requested: &[PackageName]) -> (Vec<PackageName>, Vec<Notice>) {
    let mut notices = Vec::new();
    let mut order: Vec<PackageName> = Vec::with_capacity(requested.len());

    for name in requested {
        if order.contains(name) {
            notices.push(Notice::Duplicate(name.clone()));
        } else {
            order.push(name.clone());
        }
    }

    for (dependent, dependency) in IMPLIED_DEPENDENCIES {
        let Some(dependent_pos) = order.iter().position(|n| n == dependent) else {
            continue;
        };
        let dependency = PackageName::new(dependency);
        let dependent = order[dependent_pos].clone();

        match order.iter().position(|n| *n == dependency) {
            Some(pos) if pos < dependent_pos => {}
            Some(pos) => {
                order.remove(pos);
                order.insert(dependent_pos, dependency.clone());
                notices.push(Notice::Moved {
                    dependency,
                    dependent,
                });
            }
            None => {
                order.insert(dependent_pos, dependency.clone());
                notices.push(Notice::Added {
                    dependency,
                    dependent,
                });
            }
        }
    }

    (order, notices)
}

/// A validated, expanded request with every installer already resolved.
#[derive(Debug)]
pub struct Plan<'r> {
    pub steps: Vec<PlannedPackage<'r>>,
    pub notices: Vec<Notice>,
}

#[derive(Debug)]
pub struct PlannedPackage<'r> {
    pub package: PackageName,
    pub resolved: Resolved<'r>,
}

impl PlannedPackage<'_> {
    pub fn namespace(&self) -> Namespace {
        self.resolved.namespace
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Installed,
    Failed,
    NotAttempted,
}

/// Per-package outcomes of a run, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcomes: Vec<(PackageName, Outcome)>,
    pub elapsed: Duration,
}

impl RunReport {
    fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.iter().filter(|(_, o)| *o == outcome).count()
    }

    pub fn installed(&self) -> usize {
        self.count(Outcome::Installed)
    }

    pub fn failed(&self) -> usize {
        self.count(Outcome::Failed)
    }

    pub fn not_attempted(&self) -> usize {
        self.count(Outcome::NotAttempted)
    }
}

/// Runs requested packages against a registry for one host.
pub struct Dispatcher<'a> {
    registry: &'a Registry,
    host: HostPlatform,
    config: &'a BuildConfig,
    fetcher: &'a Fetcher,
    runner: &'a dyn CommandRunner,
    reporter: &'a dyn Reporter,
}

impl fmt::Debug for Dispatcher<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("host", &self.host)
            .field("registry", self.registry)
            .finish_non_exhaustive()
    }
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        registry: &'a Registry,
        host: HostPlatform,
        config: &'a BuildConfig,
        fetcher: &'a Fetcher,
        runner: &'a dyn CommandRunner,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            registry,
            host,
            config,
            fetcher,
            runner,
            reporter,
        }
    }

    /// Validate, expand and resolve a request. Has no side effects.
    pub fn plan(&self, requested: &[String]) -> Result<Plan<'a>, RunError> {
        if requested.is_empty() {
            return Err(RunError::NoPackages);
        }

        let platform = self.host.platform;
        let available = self.registry.list_packages(platform);

        let names: Vec<PackageName> = requested.iter().map(|r| PackageName::new(r)).collect();
        let mut unknown: Vec<String> = Vec::new();
        for (raw, name) in requested.iter().zip(&names) {
            if !name.is_valid() || !available.contains(name) {
                let raw = raw.trim().to_string();
                if !unknown.contains(&raw) {
                    unknown.push(raw);
                }
            }
        }
        let unknown_packages = |names: Vec<String>| RunError::UnknownPackages {
            names,
            available: available.iter().map(ToString::to_string).collect(),
        };
        if !unknown.is_empty() {
            return Err(unknown_packages(unknown));
        }

        let (expanded, notices) = expand_request(&names);

        let mut steps = Vec::with_capacity(expanded.len());
        for package in expanded {
            match self.registry.resolve(&package, platform) {
                Some(resolved) => steps.push(PlannedPackage { package, resolved }),
                // An implied dependency with no installer on this platform.
                None => unknown.push(package.to_string()),
            }
        }

        if !unknown.is_empty() {
            return Err(unknown_packages(unknown));
        }

        Ok(Plan { steps, notices })
    }

    /// Validate, prepare the working directories, then install every package in order.
    pub fn run(&self, requested: &[String]) -> Result<RunReport, RunError> {
        let plan = self.plan(requested)?;
        for notice in &plan.notices {
            match notice {
                Notice::Duplicate(_) => {
                    tracing::warn!("{notice}");
                    self.reporter.warning(&notice.to_string());
                }
                Notice::Added { .. } | Notice::Moved { .. } => {
                    tracing::info!("{notice}");
                    self.reporter.info(&notice.to_string());
                }
            }
        }

        let dirs = WorkDirs::new(self.config.work_dir());
        self.prepare_dirs(&dirs)?;

        let patcher = Patcher::new(
            self.config.patches_dir().map(PathBuf::from),
            &dirs.temp,
            self.host.platform,
        );

        self.execute(&plan, &dirs, &patcher)
    }

    fn prepare_dirs(&self, dirs: &WorkDirs) -> Result<(), RunError> {
        let root = self.config.repository_path();
        for dir in dirs.all().into_iter().chain([root]) {
            std::fs::create_dir_all(dir).map_err(|source| RunError::WorkDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }

    fn execute(
        &self,
        plan: &Plan<'_>,
        dirs: &WorkDirs,
        patcher: &Patcher,
    ) -> Result<RunReport, RunError> {
        let started = Instant::now();
        let mut exports = Exports::new();
        let mut outcomes: Vec<(PackageName, Outcome)> = Vec::with_capacity(plan.steps.len());

        for (index, step) in plan.steps.iter().enumerate() {
            let package = &step.package;
            tracing::info!(%package, namespace = %step.namespace(), "installing");
            self.reporter.section(package);

            let result = {
                let env = InstallEnv {
                    config: self.config,
                    host: &self.host,
                    package,
                    dirs,
                    exports: &exports,
                    fetcher: self.fetcher,
                    runner: self.runner,
                    patcher,
                    reporter: self.reporter,
                };
                step.resolved.installer.install(&env)
            };
            let result = result.and_then(|published| {
                exports
                    .merge(package, published)
                    .map_err(InstallError::from)
            });

            match result {
                Ok(()) => {
                    self.reporter.done(package);
                    outcomes.push((package.clone(), Outcome::Installed));
                }
                Err(error) => {
                    tracing::error!(%package, "{error}");
                    self.reporter.failed(package, &error.to_string());
                    if let Some(log) = error.captured_log() {
                        self.reporter.captured_output(log);
                    }

                    outcomes.push((package.clone(), Outcome::Failed));
                    let not_attempted: Vec<PackageName> =
                        plan.steps[index + 1..].iter().map(|s| s.package.clone()).collect();
                    outcomes.extend(
                        not_attempted
                            .iter()
                            .map(|p| (p.clone(), Outcome::NotAttempted)),
                    );

                    let report = RunReport {
                        outcomes,
                        elapsed: started.elapsed(),
                    };
                    self.summarize(&report);

                    return Err(RunError::PackageFailed {
                        package: package.clone(),
                        error,
                        not_attempted,
                    });
                }
            }
        }

        let modules = self.install_cmake_modules();
        let report = RunReport {
            outcomes,
            elapsed: started.elapsed(),
        };
        self.summarize(&report);
        modules?;
        Ok(report)
    }

    /// Copy the configured CMake modules into `<root>/cmake` unless it exists.
    fn install_cmake_modules(&self) -> Result<(), RunError> {
        let Some(modules) = self.config.cmake_modules_dir() else {
            return Ok(());
        };
        let dest = self.config.repository_path().join("cmake");
        if dest.is_dir() {
            tracing::debug!("{} already exists, not installing the CMake modules", dest.display());
            return Ok(());
        }

        self.reporter.step("Installing the CMake modules");
        let options = fs_extra::dir::CopyOptions::new()
            .content_only(true)
            .copy_inside(true);
        match fs_extra::dir::copy(modules, &dest, &options) {
            Ok(_) => Ok(()),
            Err(source) => {
                let error = RunError::CMakeModules { path: dest, source };
                tracing::error!("{error}");
                self.reporter.error(&error.to_string());
                Err(error)
            }
        }
    }

    fn summarize(&self, report: &RunReport) {
        self.reporter.summary(
            report.installed(),
            report.failed(),
            report.not_attempted(),
            report.elapsed.as_secs_f64(),
        );
    }
}
