//! Archive integrity verification.
//!
//! Computes the SHA-256 digest of a downloaded archive and compares it with
//! the digest declared by the formula. A mismatch is fatal and must be
//! reported before anything is extracted or installed.

use super::sha256_digest::Sha256Digest;
use log::debug;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Read buffer size for streaming hashes.
const CHUNK_SIZE: usize = 8192;

/// Errors arising from integrity verification.
#[derive(Debug, thiserror::Error)]
pub enum IntegrityError {
    /// The archive digest does not match the declared digest.
    #[error("SHA-256 mismatch: expected {expected}, actual {actual}")]
    Mismatch {
        /// Digest declared by the formula.
        expected: Sha256Digest,
        /// Digest computed from the downloaded archive.
        actual: Sha256Digest,
    },

    /// The archive could not be read.
    #[error("failed to read archive for hashing: {0}")]
    Io(#[from] std::io::Error),
}

/// Compute the SHA-256 digest of a file.
///
/// Reads the file at `path` in chunks and returns the lowercase hex
/// digest as a validated [`Sha256Digest`].
///
/// # Errors
///
/// Returns [`IntegrityError::Io`] if the file cannot be read.
pub fn compute_sha256(path: &Path) -> Result<Sha256Digest, IntegrityError> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        let Some(chunk) = buffer.get(..bytes_read) else {
            break;
        };
        if chunk.is_empty() {
            break;
        }
        hasher.update(chunk);
    }
    Ok(Sha256Digest::from_digest_bytes(&hasher.finalize()))
}

/// Verify that the file at `path` hashes to `expected`.
///
/// Returns the computed digest on success so callers can report it.
///
/// # Errors
///
/// Returns [`IntegrityError::Mismatch`] when the digests differ, or
/// [`IntegrityError::Io`] when the file cannot be read.
///
/// # Examples
///
/// ```no_run
/// use formula_installer::artefact::integrity::verify_digest;
/// use formula_installer::artefact::sha256_digest::Sha256Digest;
/// use std::path::Path;
///
/// let expected = Sha256Digest::try_from("a".repeat(64))?;
/// let result = verify_digest(Path::new("v1.0.0.tar.gz"), &expected);
/// assert!(result.is_err());
/// # Ok::<(), formula_installer::artefact::error::ArtefactError>(())
/// ```
pub fn verify_digest(path: &Path, expected: &Sha256Digest) -> Result<Sha256Digest, IntegrityError> {
    let actual = compute_sha256(path)?;
    debug!("computed sha256 {actual} for {}", path.display());
    if &actual != expected {
        return Err(IntegrityError::Mismatch {
            expected: expected.clone(),
            actual,
        });
    }
    Ok(actual)
}
