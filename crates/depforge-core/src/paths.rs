use std::path::{Path, PathBuf};

/// Staging directories below the work dir: `sources/`, `build/`, `temp/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkDirs {
    pub sources: PathBuf,
    pub build: PathBuf,
    pub temp: PathBuf,
}

impl WorkDirs {
    pub fn new(work_dir: &Path) -> Self {
        Self {
            sources: work_dir.join("sources"),
            build: work_dir.join("build"),
            temp: work_dir.join("temp"),
        }
    }

    /// Build folder for a package: `build/<name>`.
    pub fn build_dir(&self, name: &str) -> PathBuf {
        self.build.join(name)
    }

    /// `sources/`, `build/` and `temp/`, in creation order.
    pub fn all(&self) -> [&Path; 3] {
        [&self.sources, &self.build, &self.temp]
    }
}

/// Extract the filename from a URL.
pub fn filename_from_url(url: &str) -> &str {
    url.split('/').next_back().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_from_url() {
        assert_eq!(
            filename_from_url("https://releases.llvm.org/4.0.0/llvm-4.0.0.src.tar.xz"),
            "llvm-4.0.0.src.tar.xz"
        );
        assert_eq!(filename_from_url(""), "");
    }

    #[test]
    fn test_work_dirs_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = WorkDirs::new(tmp.path());
        assert!(!tmp.path().join("sources").exists());

        for dir in dirs.all() {
            std::fs::create_dir_all(dir).unwrap();
        }
        assert!(tmp.path().join("sources").is_dir());
        assert!(tmp.path().join("build").is_dir());
        assert!(tmp.path().join("temp").is_dir());
        assert_eq!(dirs.build_dir("llvm-40"), tmp.path().join("build/llvm-40"));
    }
}
