//! Source archive extraction.
//!
//! Extracts `.tar.gz`, `.tar.zst`, and `.zip` archives to a target
//! directory with path traversal protection to prevent zip-slip attacks,
//! and resolves the directory that install paths are relative to.

use super::archive_format::ArchiveFormat;
use super::error::ArtefactError;
use log::trace;
use std::fs;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

/// Trait for extracting source archives, enabling test mocking.
///
/// # Examples
///
/// ```no_run
/// use formula_installer::artefact::extraction::{ArchiveExtractor, FormatExtractor};
/// use std::path::Path;
///
/// let files = FormatExtractor.extract(Path::new("v1.0.0.tar.gz"), Path::new("src"))?;
/// assert!(!files.is_empty());
/// # Ok::<(), formula_installer::artefact::extraction::ExtractionError>(())
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor {
    /// Extract the archive at `archive_path` into `dest_dir`.
    ///
    /// Returns the relative paths of the regular files that were extracted.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::PathTraversal`] if any entry or symlink
    /// target attempts to escape the destination directory.
    /// Returns [`ExtractionError::EmptyArchive`] if no files are found.
    /// Returns [`ExtractionError::Io`] on I/O failures.
    fn extract(&self, archive_path: &Path, dest_dir: &Path)
    -> Result<Vec<PathBuf>, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The zip container could not be read.
    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The archive file name does not identify a supported format.
    #[error(transparent)]
    UnsupportedFormat(#[from] ArtefactError),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive contains no files.
    #[error("archive contains no files")]
    EmptyArchive,
}

/// Default extractor choosing a decoder from the archive file name.
///
/// Validates each entry path before extraction to guard against
/// path traversal attacks (zip-slip). Tar symlink entries must point inside
/// the destination, and no entry is written through a link that leaves it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatExtractor;

impl ArchiveExtractor for FormatExtractor {
    fn extract(
        &self,
        archive_path: &Path,
        dest_dir: &Path,
    ) -> Result<Vec<PathBuf>, ExtractionError> {
        let filename = archive_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let format = ArchiveFormat::from_filename(&filename)?;
        let file = fs::File::open(archive_path)?;

        let extracted = match format {
            ArchiveFormat::TarGz => {
                extract_tar(tar::Archive::new(flate2::read::GzDecoder::new(file)), dest_dir)?
            }
            ArchiveFormat::TarZst => {
                extract_tar(tar::Archive::new(zstd::Decoder::new(file)?), dest_dir)?
            }
            ArchiveFormat::Zip => extract_zip(file, dest_dir)?,
        };

        if extracted.is_empty() {
            return Err(ExtractionError::EmptyArchive);
        }
        Ok(extracted)
    }
}

fn extract_tar<R: Read>(
    mut archive: tar::Archive<R>,
    dest_dir: &Path,
) -> Result<Vec<PathBuf>, ExtractionError> {
    let mut extracted = Vec::new();

    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let kind = entry.header().entry_type();
        if !(kind.is_file() || kind.is_dir() || kind.is_symlink()) {
            trace!("skipping tar entry of type {kind:?}");
            continue;
        }

        let entry_path = entry.path()?.into_owned();
        validate_entry_path(&entry_path)?;
        if kind.is_symlink() {
            if let Some(target) = entry.link_name()? {
                validate_link_target(&entry_path, &target)?;
            }
        }

        // `unpack_in` refuses to write through a symlinked parent that
        // resolves outside `dest_dir`.
        if !entry.unpack_in(dest_dir)? {
            return Err(ExtractionError::PathTraversal {
                path: entry_path.display().to_string(),
            });
        }

        if kind.is_file() {
            extracted.push(entry_path);
        }
    }

    Ok(extracted)
}

fn extract_zip(file: fs::File, dest_dir: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
    let mut archive = zip::ZipArchive::new(file)?;
    let mut extracted = Vec::new();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let entry_path = PathBuf::from(entry.name());
        validate_entry_path(&entry_path)?;

        let dest_path = dest_dir.join(&entry_path);
        if entry.is_dir() {
            fs::create_dir_all(&dest_path)?;
            continue;
        }
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut output = fs::File::create(&dest_path)?;
        std::io::copy(&mut entry, &mut output)?;
        apply_zip_mode(&dest_path, entry.unix_mode())?;

        extracted.push(entry_path);
    }

    Ok(extracted)
}

#[cfg(unix)]
fn apply_zip_mode(path: &Path, mode: Option<u32>) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if let Some(bits) = mode {
        fs::set_permissions(path, fs::Permissions::from_mode(bits & 0o777))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn apply_zip_mode(_path: &Path, _mode: Option<u32>) -> std::io::Result<()> {
    Ok(())
}

/// Validate that an archive entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    if path.is_absolute() || path.has_root() {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    for component in path.components() {
        if matches!(component, Component::ParentDir | Component::Prefix(_)) {
            return Err(ExtractionError::PathTraversal {
                path: path.display().to_string(),
            });
        }
    }
    Ok(())
}

/// Validate that a symlink entry points inside the destination directory.
///
/// Absolute targets and targets climbing out of the link's own directory
/// are rejected.
fn validate_link_target(link: &Path, target: &Path) -> Result<(), ExtractionError> {
    let escape = || ExtractionError::PathTraversal {
        path: format!("{} -> {}", link.display(), target.display()),
    };
    if target.is_absolute() || target.has_root() {
        return Err(escape());
    }

    let mut depth = link.components().count().saturating_sub(1);
    for component in target.components() {
        match component {
            Component::ParentDir => depth = depth.checked_sub(1).ok_or_else(escape)?,
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => return Err(escape()),
        }
    }
    Ok(())
}

/// Return the directory that install paths resolve against.
///
/// Release tarballs usually wrap their content in a single top-level
/// directory such as `homebrew-ghclone-1.0.0/`. When `extracted_dir`
/// holds exactly one entry and that entry is a directory, that directory
/// is the root; otherwise `extracted_dir` itself is.
///
/// # Errors
///
/// Returns an I/O error if `extracted_dir` cannot be listed.
pub fn archive_root(extracted_dir: &Path) -> std::io::Result<PathBuf> {
    let mut entries = fs::read_dir(extracted_dir)?.collect::<std::io::Result<Vec<_>>>()?;
    if entries.len() == 1 {
        if let Some(only) = entries.pop() {
            if only.file_type()?.is_dir() {
                return Ok(only.path());
            }
        }
    }
    Ok(extracted_dir.to_path_buf())
}
