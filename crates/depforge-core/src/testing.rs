//! Test doubles shared by the unit tests of this crate.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::process::{CommandError, CommandRunner, Invocation};

/// Records every invocation instead of running it.
///
/// It can be told to fail steps whose description contains a marker, and to
/// fake an install tree: after a configure step names a prefix
/// (`--prefix=` or `-DCMAKE_INSTALL_PREFIX=`), any later invocation with an
/// `install` argument creates the listed relative paths under it. Paths
/// ending in `/` become directories.
#[derive(Debug, Default)]
pub(crate) struct RecordingRunner {
    calls: Mutex<Vec<Invocation>>,
    fail_on: Option<(String, String)>,
    install_files: Vec<&'static str>,
    prefix: Mutex<Option<PathBuf>>,
}

impl RecordingRunner {
    pub(crate) fn failing_on(marker: &str, log: &str) -> Self {
        Self {
            fail_on: Some((marker.to_string(), log.to_string())),
            ..Self::default()
        }
    }

    pub(crate) fn simulating_install(files: &[&'static str]) -> Self {
        Self {
            install_files: files.to_vec(),
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn descriptions(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.description).collect()
    }

    fn fake_install(&self, prefix: &Path) {
        for file in &self.install_files {
            let path = prefix.join(file.trim_end_matches('/'));
            if file.ends_with('/') {
                std::fs::create_dir_all(&path).unwrap();
            } else {
                std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                std::fs::write(&path, "").unwrap();
            }
        }
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), CommandError> {
        self.calls.lock().unwrap().push(invocation.clone());

        if let Some((marker, log)) = &self.fail_on {
            if invocation.description.contains(marker.as_str()) {
                return Err(CommandError::Failed {
                    description: invocation.description.clone(),
                    code: Some(2),
                    log: Some(log.clone()),
                });
            }
        }

        let args = invocation.args_lossy();
        for arg in &args {
            if let Some(prefix) = arg
                .strip_prefix("--prefix=")
                .or_else(|| arg.strip_prefix("-DCMAKE_INSTALL_PREFIX="))
            {
                *self.prefix.lock().unwrap() = Some(PathBuf::from(prefix));
            }
        }

        if args.iter().any(|a| a == "install") {
            if let Some(prefix) = self.prefix.lock().unwrap().clone() {
                self.fake_install(&prefix);
            }
        }
        Ok(())
    }
}

/// An executable stub named `name` in `dir`.
#[cfg(unix)]
pub(crate) fn fake_tool(dir: &Path, name: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, "#!/bin/sh\n").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
