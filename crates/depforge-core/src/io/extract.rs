//! Archive extraction module
//!
//! Handles tar.gz, tar.xz and zip source archives.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::ZipArchive;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Unsupported archive format: {0}")]
    UnsupportedFormat(String),

    #[error("Archive error in {}: {message}", archive.display())]
    Archive { archive: PathBuf, message: String },
}

/// Container formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    TarXz,
    Zip,
}

impl ArchiveFormat {
    /// Detect archive format from file extension
    pub fn detect(path: &Path) -> Option<Self> {
        let path_str = path.to_string_lossy().to_lowercase();

        if path_str.ends_with(".tar.gz") || path_str.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if path_str.ends_with(".tar.xz") || path_str.ends_with(".txz") {
            Some(Self::TarXz)
        } else if path_str.ends_with(".zip") {
            Some(Self::Zip)
        } else {
            None
        }
    }
}

/// Extract an archive into `dest_dir`, auto-detecting its format.
///
/// A failed extraction deletes the archive.
pub fn extract(archive_path: &Path, dest_dir: &Path) -> Result<(), ExtractError> {
    let format = ArchiveFormat::detect(archive_path)
        .ok_or_else(|| ExtractError::UnsupportedFormat(archive_path.display().to_string()))?;

    tracing::info!("extracting {}", archive_path.display());
    let result = match format {
        ArchiveFormat::TarGz => extract_tar_gz(archive_path, dest_dir),
        ArchiveFormat::TarXz => extract_tar_xz(archive_path, dest_dir),
        ArchiveFormat::Zip => extract_zip(archive_path, dest_dir),
    };

    if let Err(e) = &result {
        tracing::error!("extraction of {} failed: {e}", archive_path.display());
        if let Err(rm) = fs::remove_file(archive_path) {
            tracing::warn!("could not remove {}: {rm}", archive_path.display());
        }
    }
    result
}

/// Extract a tar.gz archive to a destination directory
pub fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<(), ExtractError> {
    let file = File::open(archive_path)?;
    let reader = BufReader::new(file);
    let gz_decoder = flate2::read::GzDecoder::new(reader);

    extract_tar(gz_decoder, archive_path, dest_dir)
}

/// Extract a tar.xz archive to a destination directory
pub fn extract_tar_xz(archive_path: &Path, dest_dir: &Path) -> Result<(), ExtractError> {
    let file = File::open(archive_path)?;
    let reader = BufReader::new(file);
    let xz_decoder = xz2::read::XzDecoder::new(reader);

    extract_tar(xz_decoder, archive_path, dest_dir)
}

/// Extract a tar archive from a reader
fn extract_tar<R: Read>(
    reader: R,
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<(), ExtractError> {
    fs::create_dir_all(dest_dir)?;

    let archive_error = |message: String| ExtractError::Archive {
        archive: archive_path.to_path_buf(),
        message,
    };

    let mut archive = tar::Archive::new(reader);
    for entry in archive.entries().map_err(|e| archive_error(e.to_string()))? {
        let mut entry = entry.map_err(|e| archive_error(e.to_string()))?;

        // GitHub tarballs lead with a pax global header carrying the commit id
        if entry.header().entry_type().is_pax_global_extensions() {
            continue;
        }

        // Sanitize path to prevent Zip Slip
        let unpacked = entry
            .unpack_in(dest_dir)
            .map_err(|e| archive_error(e.to_string()))?;
        if !unpacked {
            let path = entry.path().map(|p| p.display().to_string()).unwrap_or_default();
            return Err(archive_error(format!("Invalid path in archive: {path}")));
        }
    }

    Ok(())
}

/// Extract a zip archive
pub fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<(), ExtractError> {
    let archive_error = |message: String| ExtractError::Archive {
        archive: archive_path.to_path_buf(),
        message,
    };

    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| archive_error(e.to_string()))?;

    fs::create_dir_all(dest_dir)?;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| archive_error(e.to_string()))?;
        let Some(relative_path) = file.enclosed_name() else {
            return Err(archive_error(format!("Invalid path in archive: {}", file.name())));
        };

        let absolute_path = dest_dir.join(&relative_path);
        if file.is_dir() {
            fs::create_dir_all(&absolute_path)?;
            continue;
        }

        if let Some(p) = absolute_path.parent() {
            fs::create_dir_all(p)?;
        }

        let mut outfile = File::create(&absolute_path)?;
        io::copy(&mut file, &mut outfile)?;

        #[cfg(unix)]
        if let Some(mode) = file.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&absolute_path, fs::Permissions::from_mode(mode))?;
        }
    }

    Ok(())
}
