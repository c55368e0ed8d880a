//! Typed results one installer hands to the ones that run after it.
//!
//! Installers never talk through the process environment. A successful
//! installer returns [`Exports`]; the dispatcher validates them and merges
//! them into the run-wide set that later installers read.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use depforge_schema::PackageName;
use thiserror::Error;

/// Well-known export keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Export {
    /// A freshly built `cmake` executable.
    CMake,
    /// Directory holding `LLVMConfig.cmake`.
    LlvmDir,
    /// A freshly built C compiler.
    CCompiler,
    /// A freshly built C++ compiler.
    CxxCompiler,
    /// The `protoc` compiler.
    Protoc,
}

impl Export {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CMake => "cmake",
            Self::LlvmDir => "llvm-dir",
            Self::CCompiler => "c-compiler",
            Self::CxxCompiler => "cxx-compiler",
            Self::Protoc => "protoc",
        }
    }

    /// `true` for exports whose parent directory belongs on `PATH`.
    pub fn is_tool(&self) -> bool {
        !matches!(self, Self::LlvmDir)
    }
}

impl fmt::Display for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("Exported {key} path does not exist: {}", path.display())]
    MissingPath { key: Export, path: PathBuf },

    #[error("Export {key} was already published by {owner}")]
    AlreadyPublished { key: Export, owner: PackageName },
}

/// An ordered set of exports, optionally remembering who published each key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exports {
    entries: BTreeMap<Export, PathBuf>,
    owners: BTreeMap<Export, PackageName>,
}

impl Exports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: Export, path: impl Into<PathBuf>) -> Self {
        self.entries.insert(key, path.into());
        self
    }

    pub fn get(&self, key: Export) -> Option<&Path> {
        self.entries.get(&key).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Export, &Path)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_path()))
    }

    /// Directories of exported tools, in key order.
    pub fn tool_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::new();
        for (key, path) in self.iter() {
            if !key.is_tool() {
                continue;
            }
            if let Some(parent) = path.parent() {
                if !dirs.iter().any(|d| d == parent) {
                    dirs.push(parent.to_path_buf());
                }
            }
        }
        dirs
    }

    /// Validate `published` and fold it in, recording `package` as the owner.
    ///
    /// A key may be published again only with the path it already has; the
    /// first publisher stays the owner. Nothing is merged unless every entry
    /// is valid.
    pub fn merge(&mut self, package: &PackageName, published: Exports) -> Result<(), ExportError> {
        for (key, path) in published.iter() {
            let moved = self.get(key).is_some_and(|current| current != path);
            if let Some(owner) = self.owners.get(&key).filter(|_| moved) {
                return Err(ExportError::AlreadyPublished {
                    key,
                    owner: owner.clone(),
                });
            }
            if !path.exists() {
                return Err(ExportError::MissingPath {
                    key,
                    path: path.to_path_buf(),
                });
            }
        }

        for (key, path) in published.entries {
            if let Some(owner) = self.owners.get(&key) {
                tracing::debug!(%package, %key, %owner, "export unchanged");
                continue;
            }
            tracing::debug!(%package, %key, "export {}", path.display());
            self.owners.insert(key, package.clone());
            self.entries.insert(key, path);
        }
        Ok(())
    }
}
