//! Source tree acquisition: download, unpack, rename.
//!
//! Acquisition is keyed on the final folder. When it already exists neither
//! the download nor the extraction runs, so a second run reuses everything
//! the first one left in `sources/` and `build/`.

use std::path::{Path, PathBuf};

use crate::installer::{InstallEnv, InstallError};
use crate::io::extract;
use crate::paths::WorkDirs;

/// One archive and where its contents should end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRequest<'a> {
    pub url: String,
    /// Name to store the archive under in `sources/`. Defaults to the URL's last segment.
    pub file_name: Option<String>,
    /// Directory the archive is unpacked into.
    pub unpack_dir: &'a Path,
    /// Top-level folder the archive creates inside `unpack_dir`.
    pub unpacked_name: String,
    /// Final location of the tree.
    pub target: PathBuf,
}

impl<'a> SourceRequest<'a> {
    /// An archive unpacked into `unpack_dir`, kept under the folder name it ships with.
    pub fn archive(
        url: impl Into<String>,
        unpack_dir: &'a Path,
        unpacked_name: impl Into<String>,
    ) -> Self {
        let unpacked_name = unpacked_name.into();
        Self {
            url: url.into(),
            file_name: None,
            unpack_dir,
            target: unpack_dir.join(&unpacked_name),
            unpacked_name,
        }
    }

    /// A GitHub source archive for `reference`, unpacked as `sources/<repo>`.
    pub fn github(dirs: &'a WorkDirs, org: &str, repo: &str, reference: &str) -> Self {
        Self {
            url: github_archive_url(org, repo, reference),
            file_name: Some(format!("{repo}-{reference}.tar.gz")),
            unpack_dir: &dirs.sources,
            unpacked_name: format!("{repo}-{reference}"),
            target: dirs.sources.join(repo),
        }
    }

    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn target(mut self, target: impl Into<PathBuf>) -> Self {
        self.target = target.into();
        self
    }
}

/// An acquired source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTree {
    pub dir: PathBuf,
}

/// `https://codeload.github.com/<org>/<repo>/tar.gz/<reference>`
pub fn github_archive_url(org: &str, repo: &str, reference: &str) -> String {
    format!("https://codeload.github.com/{org}/{repo}/tar.gz/{reference}")
}

pub(crate) fn acquire(
    env: &InstallEnv<'_>,
    request: &SourceRequest<'_>,
) -> Result<SourceTree, InstallError> {
    if request.target.is_dir() {
        tracing::debug!("{} already exists, skipping download", request.target.display());
        env.reporter.info(&format!(
            "The source folder {} already exists",
            request.target.display()
        ));
        return Ok(SourceTree {
            dir: request.target.clone(),
        });
    }

    let archive = env.fetch(&request.url, request.file_name.as_deref())?;

    env.step(&format!("Extracting {}", archive.display()));
    extract(&archive, request.unpack_dir)?;

    let unpacked = request.unpack_dir.join(&request.unpacked_name);
    if !unpacked.is_dir() {
        return Err(InstallError::context(
            "Unexpected archive layout",
            format!("{} did not contain {}", archive.display(), request.unpacked_name),
        ));
    }

    if unpacked != request.target {
        if let Some(parent) = request.target.parent() {
            env.ensure_dir(parent)?;
        }
        std::fs::rename(&unpacked, &request.target).map_err(|e| {
            InstallError::io(
                format!(
                    "Failed to rename {} to {}",
                    unpacked.display(),
                    request.target.display()
                ),
                e,
            )
        })?;
    }

    Ok(SourceTree {
        dir: request.target.clone(),
    })
}
