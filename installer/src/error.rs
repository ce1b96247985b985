//! Error types for the formula installer.
//!
//! Each pipeline stage has its own error enum; [`InstallerError`] wraps them
//! so the CLI can report any failure with a single exit path. The
//! [`ErrorKind`] classification lets callers tell an integrity failure
//! (nothing installed) from a verification failure (file installed, test
//! failed) without matching on every variant.

use crate::artefact::download::DownloadError;
use crate::artefact::extraction::ExtractionError;
use crate::artefact::integrity::IntegrityError;
use crate::formula::FormulaError;
use crate::install::InstallError;
use crate::smoke_test::VerificationError;
use thiserror::Error;

/// Errors that can occur while installing a formula.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The formula could not be loaded or is invalid.
    #[error(transparent)]
    Formula(#[from] FormulaError),

    /// The source archive could not be downloaded.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// The downloaded archive does not match the declared digest.
    #[error("integrity check failed: {0}")]
    Integrity(#[from] IntegrityError),

    /// The archive could not be extracted.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The mapped file could not be installed.
    #[error("install failed: {0}")]
    Install(#[from] InstallError),

    /// The installed executable failed its smoke test.
    #[error(transparent)]
    Verification(#[from] VerificationError),

    /// No install prefix could be determined.
    #[error("could not determine install prefix: {reason}")]
    PrefixUnresolved {
        /// Description of why resolution failed.
        reason: String,
    },

    /// A path produced during installation is not valid UTF-8.
    #[error("path is not valid UTF-8: {path}")]
    NonUtf8Path {
        /// Lossy rendering of the path.
        path: String,
    },

    /// A command-line requirement was not met.
    #[error("{0}")]
    Usage(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to write output.
    #[error("failed to write output")]
    WriteFailed {
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },
}

/// Coarse classification of an [`InstallerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The formula descriptor was unreadable or invalid.
    Formula,
    /// Downloading or unpacking the archive failed.
    Fetch,
    /// The archive digest did not match.
    Integrity,
    /// Copying the executable into place failed.
    Install,
    /// The post-install smoke test failed.
    Verification,
    /// Anything else.
    Other,
}

impl InstallerError {
    /// Classify this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use formula_installer::error::{ErrorKind, InstallerError};
    ///
    /// let err = InstallerError::Usage("--formula is required".to_owned());
    /// assert_eq!(err.kind(), ErrorKind::Other);
    /// ```
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Formula(_) => ErrorKind::Formula,
            Self::Download(_) | Self::Extraction(_) => ErrorKind::Fetch,
            Self::Integrity(_) => ErrorKind::Integrity,
            Self::Install(_) => ErrorKind::Install,
            Self::Verification(_) => ErrorKind::Verification,
            Self::PrefixUnresolved { .. }
            | Self::NonUtf8Path { .. }
            | Self::Usage(_)
            | Self::Io(_)
            | Self::WriteFailed { .. } => ErrorKind::Other,
        }
    }
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;
