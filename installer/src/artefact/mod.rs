//! Source archive handling: digests, download, integrity, and extraction.
//!
//! Everything a formula needs between "here is a URL" and "here is an
//! extracted source tree" lives under this module.
//!
//! # Sub-modules
//!
//! - [`archive_format`]: Archive format detection (`ArchiveFormat`).
//! - [`download`]: Archive download trait and URL implementation.
//! - [`error`]: Semantic error types for invalid artefact values.
//! - [`extraction`]: Archive extraction with path traversal protection.
//! - [`integrity`]: SHA-256 computation and digest verification.
//! - [`sha256_digest`]: SHA-256 digest newtype (`Sha256Digest`).

pub mod archive_format;
pub mod download;
pub mod error;
pub mod extraction;
pub mod integrity;
pub mod sha256_digest;
