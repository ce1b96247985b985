//! Install pipeline orchestration.
//!
//! A formula install is a straight line: download the archive into a
//! scratch directory, verify its digest, extract it, copy the mapped file
//! into `<prefix>/bin`, then run the smoke test. Any failure stops the
//! line. Nothing under the prefix is touched until the digest has been
//! verified and the archive unpacked, so an integrity or extraction failure
//! leaves the prefix exactly as it was.
//!
//! A smoke-test failure is returned as an error, but the installed file is
//! left in place.

use crate::artefact::download::{ArchiveDownloader, UrlDownloader};
use crate::artefact::extraction::{ArchiveExtractor, FormatExtractor, archive_root};
use crate::artefact::integrity::verify_digest;
use crate::artefact::sha256_digest::Sha256Digest;
use crate::error::{InstallerError, Result};
use crate::formula::Formula;
use crate::install::{BinInstaller, InstalledFile};
use crate::output::{success_message, write_stderr_line};
use crate::process::CommandExecutor;
use crate::smoke_test::{SmokeTestReport, run_smoke_test};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

/// Name of the extraction directory inside the scratch directory.
const EXTRACT_DIR: &str = "src";

/// Settings for one install run.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig<'a> {
    /// Installation root; executables land in `<prefix>/bin`.
    pub prefix: &'a Utf8Path,
    /// Suppress progress output.
    pub quiet: bool,
    /// Skip the post-install smoke test.
    pub skip_test: bool,
}

/// What a successful install produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// The installed executable.
    pub installed: InstalledFile,
    /// The verified archive digest.
    pub digest: Sha256Digest,
    /// The smoke test result; `None` when the test was skipped.
    pub smoke_test: Option<SmokeTestReport>,
}

/// Install `formula` using the network downloader and format-detecting
/// extractor.
///
/// # Errors
///
/// Returns the first error raised by any stage; see [`run_install_with`].
pub fn run_install(
    formula: &Formula,
    config: &PipelineConfig<'_>,
    executor: &dyn CommandExecutor,
    stderr: &mut dyn Write,
) -> Result<InstallReport> {
    run_install_with(
        formula,
        config,
        &UrlDownloader,
        &FormatExtractor,
        executor,
        stderr,
    )
}

/// Install `formula` with injected collaborators.
///
/// # Errors
///
/// Returns [`InstallerError::Download`] or [`InstallerError::Integrity`]
/// before anything under the prefix is touched,
/// [`InstallerError::Extraction`] when the archive cannot be unpacked,
/// [`InstallerError::Install`] when the mapped file cannot be placed, and
/// [`InstallerError::Verification`] when the smoke test fails.
pub fn run_install_with(
    formula: &Formula,
    config: &PipelineConfig<'_>,
    downloader: &dyn ArchiveDownloader,
    extractor: &dyn ArchiveExtractor,
    executor: &dyn CommandExecutor,
    stderr: &mut dyn Write,
) -> Result<InstallReport> {
    let scratch = tempfile::tempdir()?;
    let (archive_path, digest) =
        download_and_verify(formula, scratch.path(), downloader, config.quiet, stderr)?;

    let root = unpack(&archive_path, scratch.path(), extractor, config.quiet, stderr)?;

    let installer = BinInstaller::for_prefix(config.prefix);
    if !config.quiet {
        write_stderr_line(
            stderr,
            format!(
                "Installing {} into {}...",
                formula.install().source(),
                installer.bin_dir()
            ),
        );
    }
    let installed = installer.install(&root, formula.install())?;
    if !config.quiet {
        write_stderr_line(stderr, success_message(formula.name().as_str(), &installed));
    }

    let smoke_test = if config.skip_test {
        debug!("smoke test skipped for {}", formula.name());
        None
    } else {
        Some(smoke_test_step(formula, &installed.path, executor, config.quiet, stderr)?)
    };

    close_scratch(scratch);
    Ok(InstallReport {
        installed,
        digest,
        smoke_test,
    })
}

/// Download and verify the archive, then copy it into `output_dir`.
///
/// The copy is staged next to the destination and renamed into place, so
/// `output_dir` never holds a truncated archive.
///
/// # Errors
///
/// Returns [`InstallerError::Download`] or [`InstallerError::Integrity`]
/// when the archive cannot be fetched or fails verification, in which case
/// nothing is written to `output_dir`, and [`InstallerError::Io`] when the
/// copy fails.
pub fn fetch_only(
    formula: &Formula,
    output_dir: &Utf8Path,
    quiet: bool,
    stderr: &mut dyn Write,
) -> Result<Utf8PathBuf> {
    fetch_only_with(formula, output_dir, &UrlDownloader, quiet, stderr)
}

/// [`fetch_only`] with an injected downloader.
///
/// # Errors
///
/// See [`fetch_only`].
pub fn fetch_only_with(
    formula: &Formula,
    output_dir: &Utf8Path,
    downloader: &dyn ArchiveDownloader,
    quiet: bool,
    stderr: &mut dyn Write,
) -> Result<Utf8PathBuf> {
    let scratch = tempfile::tempdir()?;
    let (archive_path, _digest) =
        download_and_verify(formula, scratch.path(), downloader, quiet, stderr)?;

    std::fs::create_dir_all(output_dir)?;
    let dest = output_dir.join(formula.archive_filename());
    let mut staged = NamedTempFile::new_in(output_dir)?;
    let mut reader = std::fs::File::open(&archive_path)?;
    std::io::copy(&mut reader, staged.as_file_mut())?;
    staged.persist(&dest).map_err(|e| e.error)?;
    if !quiet {
        write_stderr_line(stderr, format!("Saved {dest}"));
    }

    close_scratch(scratch);
    Ok(dest)
}

/// Run the smoke test against an already installed formula.
///
/// # Errors
///
/// Returns [`InstallerError::Verification`] when the executable is missing,
/// fails to start, or does not meet the expected exit code and output.
pub fn test_installed(
    formula: &Formula,
    prefix: &Utf8Path,
    executor: &dyn CommandExecutor,
) -> Result<SmokeTestReport> {
    let installer = BinInstaller::for_prefix(prefix);
    let executable = installer.target_path(formula.install());
    Ok(run_smoke_test(executor, &executable, formula.test())?)
}

fn download_and_verify(
    formula: &Formula,
    scratch: &Path,
    downloader: &dyn ArchiveDownloader,
    quiet: bool,
    stderr: &mut dyn Write,
) -> Result<(PathBuf, Sha256Digest)> {
    let archive_path = scratch.join(formula.archive_filename());
    if !quiet {
        write_stderr_line(stderr, format!("Downloading {}...", formula.url()));
    }
    downloader.fetch(formula.url(), &archive_path)?;

    let digest = verify_digest(&archive_path, formula.sha256())?;
    if !quiet {
        write_stderr_line(stderr, format!("Verified SHA-256 {digest}"));
    }
    Ok((archive_path, digest))
}

fn unpack(
    archive_path: &Path,
    scratch: &Path,
    extractor: &dyn ArchiveExtractor,
    quiet: bool,
    stderr: &mut dyn Write,
) -> Result<Utf8PathBuf> {
    let extract_dir = scratch.join(EXTRACT_DIR);
    std::fs::create_dir_all(&extract_dir)?;
    if !quiet {
        write_stderr_line(stderr, "Extracting archive...");
    }
    let entries = extractor.extract(archive_path, &extract_dir)?;
    debug!("extracted {} entries", entries.len());

    let root = archive_root(&extract_dir)?;
    Utf8PathBuf::try_from(root).map_err(|e| InstallerError::NonUtf8Path {
        path: e.as_path().display().to_string(),
    })
}

fn smoke_test_step(
    formula: &Formula,
    executable: &Utf8Path,
    executor: &dyn CommandExecutor,
    quiet: bool,
    stderr: &mut dyn Write,
) -> Result<SmokeTestReport> {
    if !quiet {
        write_stderr_line(
            stderr,
            format!(
                "Testing {} {}...",
                formula.install().target(),
                formula.test().args().join(" ")
            ),
        );
    }
    let report = run_smoke_test(executor, executable, formula.test())?;
    if !quiet {
        write_stderr_line(stderr, "Smoke test passed.");
    }
    Ok(report)
}

fn close_scratch(scratch: TempDir) {
    let path = scratch.path().display().to_string();
    if let Err(e) = scratch.close() {
        debug!("failed to remove scratch directory {path}: {e}");
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
