//! Error types for artefact values: digests and archive formats.
//!
//! Each variant provides a descriptive message identifying the invalid input
//! and the constraint that was violated.

use thiserror::Error;

/// Errors arising from invalid artefact-related values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtefactError {
    /// A SHA-256 digest is not a valid 64-character hex string.
    #[error("invalid SHA-256 digest: {reason}")]
    InvalidSha256Digest {
        /// Description of the validation failure.
        reason: String,
    },

    /// The archive file name does not end in a supported extension.
    #[error("unsupported archive format \"{filename}\"; expected one of: {expected}")]
    UnsupportedArchiveFormat {
        /// The rejected file name.
        filename: String,
        /// Comma-separated list of accepted extensions.
        expected: String,
    },
}

/// Result type alias using [`ArtefactError`].
pub type Result<T> = std::result::Result<T, ArtefactError>;
