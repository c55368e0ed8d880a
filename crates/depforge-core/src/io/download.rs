//! Blocking archive download with transport fallback.
//!
//! A [`Fetcher`] owns an ordered list of [`Transport`]s. Each download lands in
//! a scratch file under the temp dir and is only moved to its final name once
//! complete, so an interrupted transfer never looks like a finished archive.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::paths::filename_from_url;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("`{tool}` exited with code {code:?}")]
    Tool { tool: String, code: Option<i32> },
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Cannot derive a file name from URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to set up HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Download of {url} failed with every transport: {}", attempts.join("; "))]
    AllTransportsFailed { url: String, attempts: Vec<String> },
}

/// One way of moving bytes from a URL to a local file.
pub trait Transport: Send + Sync {
    /// Short name used in logs and error reports.
    fn name(&self) -> &str;

    /// Download `url` into `dest`, overwriting it.
    fn download(&self, url: &str, dest: &Path) -> Result<(), TransportError>;
}

/// Native HTTP(S) transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(crate::USER_AGENT)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    fn download(&self, url: &str, dest: &Path) -> Result<(), TransportError> {
        let mut response = self.client.get(url).send()?.error_for_status()?;
        let mut file = File::create(dest)?;
        response.copy_to(&mut file)?;
        Ok(())
    }
}

/// Falls back to a `curl` or `wget` binary found on `PATH`.
#[derive(Debug, Clone)]
pub struct ExternalTransport {
    tool: PathBuf,
    kind: ExternalTool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExternalTool {
    Curl,
    Wget,
}

impl ExternalTransport {
    /// Locate `curl`, then `wget`. Returns `None` when neither is installed.
    pub fn detect() -> Option<Self> {
        if let Ok(tool) = which::which("curl") {
            return Some(Self {
                tool,
                kind: ExternalTool::Curl,
            });
        }
        which::which("wget").ok().map(|tool| Self {
            tool,
            kind: ExternalTool::Wget,
        })
    }
}

impl Transport for ExternalTransport {
    fn name(&self) -> &str {
        match self.kind {
            ExternalTool::Curl => "curl",
            ExternalTool::Wget => "wget",
        }
    }

    fn download(&self, url: &str, dest: &Path) -> Result<(), TransportError> {
        let mut cmd = Command::new(&self.tool);
        match self.kind {
            ExternalTool::Curl => cmd.args(["-f", "-s", "-S", "-L", "-o"]).arg(dest).arg(url),
            ExternalTool::Wget => cmd.args(["-q", "-O"]).arg(dest).arg(url),
        };

        let status = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(TransportError::Tool {
                tool: self.name().to_string(),
                code: status.code(),
            })
        }
    }
}

/// Idempotent downloader over an ordered transport list.
pub struct Fetcher {
    transports: Vec<Box<dyn Transport>>,
    temp_dir: PathBuf,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.transports.iter().map(|t| t.name()).collect();
        f.debug_struct("Fetcher")
            .field("transports", &names)
            .field("temp_dir", &self.temp_dir)
            .finish()
    }
}

impl Fetcher {
    /// A fetcher with no transports. Add them with [`Fetcher::with_transport`].
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            transports: Vec::new(),
            temp_dir: temp_dir.into(),
        }
    }

    /// Native HTTP first, then `curl`/`wget` when one is installed.
    pub fn with_default_transports(temp_dir: impl Into<PathBuf>) -> Result<Self, FetchError> {
        let mut fetcher = Self::new(temp_dir).with_transport(HttpTransport::new()?);
        if let Some(external) = ExternalTransport::detect() {
            fetcher = fetcher.with_transport(external);
        }
        Ok(fetcher)
    }

    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transports.push(Box::new(transport));
        self
    }

    /// Download `url` into `dest_dir`, named `file_name` or the URL's last segment.
    ///
    /// Returns the final path. An existing file at that path is treated as
    /// already downloaded and no transport is contacted.
    pub fn fetch(
        &self,
        url: &str,
        dest_dir: &Path,
        file_name: Option<&str>,
    ) -> Result<PathBuf, FetchError> {
        let name = file_name.unwrap_or_else(|| filename_from_url(url));
        if name.is_empty() {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        let dest = dest_dir.join(name);
        if dest.exists() {
            tracing::debug!("{} already downloaded, skipping", dest.display());
            return Ok(dest);
        }

        std::fs::create_dir_all(dest_dir)?;
        std::fs::create_dir_all(&self.temp_dir)?;

        let mut attempts = Vec::new();
        for transport in &self.transports {
            let partial = NamedTempFile::new_in(&self.temp_dir)?;
            tracing::info!(transport = transport.name(), "downloading {url}");

            match transport.download(url, partial.path()) {
                Ok(()) => {
                    partial.persist(&dest).map_err(|e| e.error)?;
                    return Ok(dest);
                }
                Err(e) => {
                    tracing::warn!(transport = transport.name(), "download failed: {e}");
                    attempts.push(format!("{}: {e}", transport.name()));
                }
            }
        }

        Err(FetchError::AllTransportsFailed {
            url: url.to_string(),
            attempts,
        })
    }
}
