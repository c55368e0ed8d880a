//! External command execution.
//!
//! Every configure, build and install step goes through a [`CommandRunner`].
//! The default [`ProcessRunner`] either streams the child's output to the
//! terminal or buffers it into a scratch log that is attached to the error
//! when the command fails.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{description}: could not start `{program}`: {source}")]
    Spawn {
        description: String,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "{description} failed with exit code {}",
        code.map_or_else(|| "none".to_string(), |c| c.to_string())
    )]
    Failed {
        description: String,
        code: Option<i32>,
        /// Buffered stdout/stderr; `None` when output was streamed.
        log: Option<String>,
    },

    #[error("Failed to create output log: {0}")]
    Log(#[source] std::io::Error),
}

impl CommandError {
    /// Captured output of a failed command, if it was buffered.
    pub fn captured_log(&self) -> Option<&str> {
        match self {
            Self::Failed { log, .. } => log.as_deref(),
            _ => None,
        }
    }
}

/// A fully described subprocess call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Human-readable step name shown in progress and error reports.
    pub description: String,
    pub program: OsString,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
    /// Variables set on the child only. The parent environment is never touched.
    pub env: Vec<(OsString, OsString)>,
}

impl Invocation {
    pub fn new(description: impl Into<String>, program: impl AsRef<OsStr>) -> Self {
        Self {
            description: description.into(),
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        let key = key.as_ref().to_os_string();
        self.env.retain(|(k, _)| *k != key);
        self.env.push((key, value.as_ref().to_os_string()));
        self
    }

    /// Value this invocation sets for `key`, if any.
    #[cfg(test)]
    pub(crate) fn env_value(&self, key: &str) -> Option<&OsStr> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_os_str())
    }

    #[cfg(test)]
    pub(crate) fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Runs external commands to completion.
pub trait CommandRunner: Send + Sync {
    fn run(&self, invocation: &Invocation) -> Result<(), CommandError>;
}

/// Runs commands as real child processes, blocking until they exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner {
    verbose: bool,
}

impl ProcessRunner {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), CommandError> {
        tracing::debug!(cwd = ?invocation.cwd, "running {invocation}");

        let mut cmd = invocation.to_command();
        let spawn_error = |source| CommandError::Spawn {
            description: invocation.description.clone(),
            program: invocation.program.to_string_lossy().into_owned(),
            source,
        };

        if self.verbose {
            let status = cmd.status().map_err(spawn_error)?;
            if status.success() {
                return Ok(());
            }
            return Err(CommandError::Failed {
                description: invocation.description.clone(),
                code: status.code(),
                log: None,
            });
        }

        // Redirect both streams into one scratch log
        let mut log_file = tempfile::tempfile().map_err(CommandError::Log)?;
        let stdout = log_file.try_clone().map_err(CommandError::Log)?;
        let stderr = log_file.try_clone().map_err(CommandError::Log)?;

        let status = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .status()
            .map_err(spawn_error)?;

        if status.success() {
            return Ok(());
        }

        let mut raw = Vec::new();
        log_file
            .seek(SeekFrom::Start(0))
            .and_then(|_| log_file.read_to_end(&mut raw))
            .map_err(CommandError::Log)?;

        Err(CommandError::Failed {
            description: invocation.description.clone(),
            code: status.code(),
            log: Some(String::from_utf8_lossy(&raw).into_owned()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_env_last_write_wins() {
        let inv = Invocation::new("x", "cc").env("CC", "gcc").env("CC", "clang");
        assert_eq!(inv.env.len(), 1);
        assert_eq!(inv.env_value("CC"), Some(OsStr::new("clang")));
        assert_eq!(inv.env_value("CXX"), None);
    }

    #[test]
    fn test_invocation_display() {
        let inv = Invocation::new("Building", "cmake").args(["--build", "."]);
        assert_eq!(inv.to_string(), "cmake --build .");
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let inv = Invocation::new("Running ghost", "depforge-definitely-missing-tool");
        let err = ProcessRunner::new(false).run(&inv).unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
        assert!(err.captured_log().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_buffered_failure_keeps_output_verbatim() {
        let inv = Invocation::new("Failing step", "sh")
            .args(["-c", "echo first line; echo oops >&2; exit 3"]);
        let err = ProcessRunner::new(false).run(&inv).unwrap_err();

        match &err {
            CommandError::Failed { code, log, .. } => {
                assert_eq!(*code, Some(3));
                let log = log.as_deref().unwrap();
                assert!(log.contains("first line\n"));
                assert!(log.contains("oops\n"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.to_string(), "Failing step failed with exit code 3");
    }

    #[cfg(unix)]
    #[test]
    fn test_verbose_failure_captures_nothing() {
        let inv = Invocation::new("Failing step", "sh").args(["-c", "exit 1"]);
        let err = ProcessRunner::new(true).run(&inv).unwrap_err();
        assert!(matches!(err, CommandError::Failed { log: None, .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_env_and_cwd_reach_child() {
        let dir = tempfile::tempdir().unwrap();
        let inv = Invocation::new("Write marker", "sh")
            .args(["-c", "echo \"$DEPFORGE_MARKER\" > marker.txt"])
            .current_dir(dir.path())
            .env("DEPFORGE_MARKER", "hello");
        ProcessRunner::new(false).run(&inv).unwrap();

        let written = std::fs::read_to_string(dir.path().join("marker.txt")).unwrap();
        assert_eq!(written.trim(), "hello");
    }
}
