//! Archive format detection from file names.
//!
//! Formula source URLs end in the archive file name, and the extension is
//! the only signal used to pick a decoder.

use super::error::{ArtefactError, Result};
use std::fmt;

/// Supported archive extensions, longest first so `.tar.gz` wins over `.gz`.
const SUFFIXES: &[(&str, ArchiveFormat)] = &[
    (".tar.gz", ArchiveFormat::TarGz),
    (".tgz", ArchiveFormat::TarGz),
    (".tar.zst", ArchiveFormat::TarZst),
    (".tzst", ArchiveFormat::TarZst),
    (".zip", ArchiveFormat::Zip),
];

/// The container format of a source archive.
///
/// # Examples
///
/// ```
/// use formula_installer::artefact::archive_format::ArchiveFormat;
///
/// let format = ArchiveFormat::from_filename("v1.0.0.tar.gz").expect("known format");
/// assert_eq!(format, ArchiveFormat::TarGz);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// Gzip-compressed tarball.
    TarGz,
    /// Zstandard-compressed tarball.
    TarZst,
    /// Zip archive.
    Zip,
}

impl ArchiveFormat {
    /// Detect the format from an archive file name.
    ///
    /// Matching is case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [`ArtefactError::UnsupportedArchiveFormat`] when the name does
    /// not end in a known extension.
    pub fn from_filename(filename: &str) -> Result<Self> {
        let lowered = filename.to_ascii_lowercase();
        SUFFIXES
            .iter()
            .find(|(suffix, _)| lowered.ends_with(suffix))
            .map(|(_, format)| *format)
            .ok_or_else(|| ArtefactError::UnsupportedArchiveFormat {
                filename: filename.to_owned(),
                expected: supported_suffixes(),
            })
    }

    /// Strip the archive extension from `filename`, if present.
    ///
    /// ```
    /// use formula_installer::artefact::archive_format::ArchiveFormat;
    ///
    /// assert_eq!(ArchiveFormat::strip_suffix("v1.0.0.tar.gz"), Some("v1.0.0"));
    /// assert_eq!(ArchiveFormat::strip_suffix("README"), None);
    /// ```
    #[must_use]
    pub fn strip_suffix(filename: &str) -> Option<&str> {
        let lowered = filename.to_ascii_lowercase();
        SUFFIXES
            .iter()
            .find(|(suffix, _)| lowered.ends_with(suffix))
            .and_then(|(suffix, _)| filename.get(..filename.len() - suffix.len()))
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TarGz => write!(f, "tar.gz"),
            Self::TarZst => write!(f, "tar.zst"),
            Self::Zip => write!(f, "zip"),
        }
    }
}

fn supported_suffixes() -> String {
    SUFFIXES
        .iter()
        .map(|(suffix, _)| *suffix)
        .collect::<Vec<_>>()
        .join(", ")
}
