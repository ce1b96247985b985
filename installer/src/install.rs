//! Installing the mapped executable into `<prefix>/bin`.
//!
//! The installer copies one file out of the extracted archive, renames it
//! to the declared target name, and marks it executable. The copy is written
//! to a temporary file next to the destination and then renamed over it, so
//! the target directory never holds a partially written executable.

use crate::formula::InstallMapping;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::fs;
use std::io;
use tempfile::NamedTempFile;

/// Mode applied to installed executables on Unix.
#[cfg(unix)]
const EXECUTABLE_MODE: u32 = 0o755;

/// Errors arising from the install step.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    /// The mapped source path does not exist in the extracted archive.
    #[error("install source {path} not found in archive")]
    SourceMissing {
        /// Absolute path that was looked up.
        path: Utf8PathBuf,
    },

    /// The destination directory cannot be created or written.
    #[error("target directory {path} is not writable: {reason}")]
    TargetNotWritable {
        /// The destination directory.
        path: Utf8PathBuf,
        /// Description of the underlying I/O error.
        reason: String,
    },

    /// Copying the file into place failed.
    #[error("failed to install {source_path} as {dest}: {reason}")]
    CopyFailed {
        /// The file being installed.
        source_path: Utf8PathBuf,
        /// The intended destination.
        dest: Utf8PathBuf,
        /// Description of the failure.
        reason: String,
    },
}

/// Whether an install created a new file or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// No file existed at the destination.
    Created,
    /// An existing file was overwritten.
    Replaced,
}

/// The result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledFile {
    /// Absolute path of the installed executable.
    pub path: Utf8PathBuf,
    /// Whether the file was created or replaced.
    pub outcome: InstallOutcome,
    /// Number of bytes written.
    pub bytes: u64,
}

/// Copies mapped files into a `bin` directory.
#[derive(Debug, Clone)]
pub struct BinInstaller {
    bin_dir: Utf8PathBuf,
}

impl BinInstaller {
    /// Create an installer targeting `<prefix>/bin`.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use formula_installer::install::BinInstaller;
    ///
    /// let installer = BinInstaller::for_prefix(Utf8Path::new("/opt/formula"));
    /// assert_eq!(installer.bin_dir().as_str(), "/opt/formula/bin");
    /// ```
    #[must_use]
    pub fn for_prefix(prefix: &Utf8Path) -> Self {
        Self {
            bin_dir: prefix.join("bin"),
        }
    }

    /// The directory executables are installed into.
    #[must_use]
    pub fn bin_dir(&self) -> &Utf8Path {
        &self.bin_dir
    }

    /// Destination path for `mapping`.
    #[must_use]
    pub fn target_path(&self, mapping: &InstallMapping) -> Utf8PathBuf {
        self.bin_dir.join(mapping.target())
    }

    /// Ensure the bin directory exists and is writable.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::TargetNotWritable`] if the directory cannot be
    /// created or a file cannot be created inside it.
    pub fn prepare(&self) -> Result<(), InstallError> {
        fs::create_dir_all(&self.bin_dir).map_err(|e| self.not_writable(&e))?;
        NamedTempFile::new_in(&self.bin_dir).map_err(|e| self.not_writable(&e))?;
        Ok(())
    }

    /// Install the file named by `mapping` from `archive_root`.
    ///
    /// The source is checked before anything is written. An existing file at
    /// the destination is replaced atomically and the outcome reports
    /// [`InstallOutcome::Replaced`].
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::SourceMissing`] when the source is absent, is
    /// not a regular file, or is a symlink or resolves outside `archive_root`; [`InstallError::TargetNotWritable`] when the bin
    /// directory cannot be written, and [`InstallError::CopyFailed`] when the
    /// copy itself fails.
    pub fn install(
        &self,
        archive_root: &Utf8Path,
        mapping: &InstallMapping,
    ) -> Result<InstalledFile, InstallError> {
        let source = archive_root.join(mapping.source());
        if !is_contained_file(archive_root, &source) {
            return Err(InstallError::SourceMissing { path: source });
        }

        self.prepare()?;

        let dest = self.target_path(mapping);
        let copy_failed = |reason: String| InstallError::CopyFailed {
            source_path: source.clone(),
            dest: dest.clone(),
            reason,
        };

        let mut staged = NamedTempFile::new_in(&self.bin_dir).map_err(|e| self.not_writable(&e))?;
        let mut reader = fs::File::open(&source).map_err(|e| copy_failed(e.to_string()))?;
        let bytes =
            io::copy(&mut reader, staged.as_file_mut()).map_err(|e| copy_failed(e.to_string()))?;
        make_executable(staged.path()).map_err(|e| copy_failed(e.to_string()))?;

        let outcome = if dest.exists() {
            InstallOutcome::Replaced
        } else {
            InstallOutcome::Created
        };
        staged
            .persist(&dest)
            .map_err(|e| copy_failed(e.error.to_string()))?;

        debug!("installed {source} as {dest} ({bytes} bytes, {outcome:?})");
        Ok(InstalledFile {
            path: dest,
            outcome,
            bytes,
        })
    }

    fn not_writable(&self, error: &io::Error) -> InstallError {
        InstallError::TargetNotWritable {
            path: self.bin_dir.clone(),
            reason: error.to_string(),
        }
    }
}

/// Whether `source` is a regular file (not a symlink) that really lives
/// under `archive_root` once every directory link is resolved.
fn is_contained_file(archive_root: &Utf8Path, source: &Utf8Path) -> bool {
    let Ok(metadata) = fs::symlink_metadata(source) else {
        return false;
    };
    if !metadata.file_type().is_file() {
        return false;
    }
    match (archive_root.canonicalize(), source.canonicalize()) {
        (Ok(root), Ok(resolved)) => resolved.starts_with(root),
        _ => false,
    }
}

#[cfg(unix)]
fn make_executable(path: &std::path::Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(EXECUTABLE_MODE))
}

#[cfg(not(unix))]
fn make_executable(_path: &std::path::Path) -> io::Result<()> {
    Ok(())
}
