//! Formula installer library.
//!
//! This crate reads formula descriptors and carries out their install
//! contract: download the source archive, check its SHA-256 digest, unpack
//! it, copy one executable into `<prefix>/bin`, and run a smoke test. It is
//! used by the `formula-installer` and `ghclone-formula` binaries and can be
//! consumed programmatically for testing or custom installation workflows.
//!
//! # Modules
//!
//! - [`app`] - Command dispatch shared by the binaries
//! - [`artefact`] - Archive download, integrity checking, and extraction
//! - [`cli`] - Command-line argument definitions
//! - [`dirs`] - Install prefix resolution
//! - [`error`] - Error types and classification
//! - [`formula`] - Formula descriptor parsing and validation
//! - [`install`] - Copying the mapped executable into place
//! - [`output`] - Progress, dry-run, and info formatting
//! - [`pipeline`] - Fetch, verify, extract, install, and test orchestration
//! - [`process`] - Running commands with a deadline
//! - [`smoke_test`] - Post-install verification

pub mod app;
pub mod artefact;
pub mod cli;
pub mod dirs;
pub mod error;
pub mod formula;
pub mod install;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod smoke_test;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
