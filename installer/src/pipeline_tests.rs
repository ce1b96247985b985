//! Unit tests for install pipeline orchestration.
//!
//! The downloader and extractor are mocked so these tests exercise stage
//! ordering and failure handling without network access or real archives.

use super::*;
use crate::artefact::download::{DownloadError, MockArchiveDownloader};
use crate::artefact::extraction::{ExtractionError, MockArchiveExtractor};
use crate::formula::parse_formula;
use crate::install::{InstallError, InstallOutcome};
use crate::smoke_test::VerificationError;
use crate::test_utils::{CannedExecutor, output_with};
use rstest::{fixture, rstest};
use sha2::{Digest, Sha256};
use std::fs;

const FAKE_ARCHIVE: &[u8] = b"fake archive content";
const SCRIPT: &[u8] = b"#!/bin/sh\necho 'Usage: ghclone <repo>'\n";

// -------------------------------------------------------------------------
// Fixtures
// -------------------------------------------------------------------------

struct Prefix {
    _temp: tempfile::TempDir,
    path: Utf8PathBuf,
}

#[fixture]
fn prefix() -> Prefix {
    let temp = tempfile::tempdir().expect("temp dir");
    let path = Utf8PathBuf::try_from(temp.path().join("prefix")).expect("UTF-8 path");
    Prefix { _temp: temp, path }
}

fn digest_of(bytes: &[u8]) -> Sha256Digest {
    Sha256Digest::from_digest_bytes(&Sha256::digest(bytes))
}

fn formula_with_digest(digest: &Sha256Digest) -> Formula {
    parse_formula(&format!(
        concat!(
            "name = \"ghclone\"\n",
            "desc = \"Simple script for quickly cloning GitHub repositories\"\n",
            "url = \"https://example.com/archive/refs/tags/v1.0.0.tar.gz\"\n",
            "sha256 = \"{}\"\n",
            "license = \"MIT\"\n",
            "[install]\nsource = \"bin/ghclone\"\n",
            "[test]\nexpected_output = \"Usage\"\n",
        ),
        digest
    ))
    .expect("valid formula")
}

fn matching_formula() -> Formula {
    formula_with_digest(&digest_of(FAKE_ARCHIVE))
}

fn serving_downloader() -> MockArchiveDownloader {
    let mut downloader = MockArchiveDownloader::new();
    downloader
        .expect_fetch()
        .times(1)
        .returning(|_url, dest| fs::write(dest, FAKE_ARCHIVE).map_err(DownloadError::Io));
    downloader
}

/// Extractor that lays out a tag tarball with `bin/ghclone` under a
/// single top-level directory.
fn tarball_extractor() -> MockArchiveExtractor {
    let mut extractor = MockArchiveExtractor::new();
    extractor.expect_extract().times(1).returning(|_archive, dest| {
        let bin = dest.join("homebrew-ghclone-1.0.0").join("bin");
        fs::create_dir_all(&bin).expect("create archive tree");
        fs::write(bin.join("ghclone"), SCRIPT).expect("write script");
        Ok(vec![bin.join("ghclone")])
    });
    extractor
}

fn config(prefix: &Utf8Path, skip_test: bool) -> PipelineConfig<'_> {
    PipelineConfig {
        prefix,
        quiet: true,
        skip_test,
    }
}

// -------------------------------------------------------------------------
// Successful installs
// -------------------------------------------------------------------------

#[rstest]
fn installs_and_runs_smoke_test(prefix: Prefix) {
    let executor = CannedExecutor::new(output_with(0, "Usage: ghclone <repo>\n", ""));
    let mut stderr = Vec::new();

    let report = run_install_with(
        &matching_formula(),
        &config(&prefix.path, false),
        &serving_downloader(),
        &tarball_extractor(),
        &executor,
        &mut stderr,
    )
    .expect("install succeeds");

    let expected_path = prefix.path.join("bin/ghclone");
    assert_eq!(report.installed.path, expected_path);
    assert_eq!(report.installed.outcome, InstallOutcome::Created);
    assert_eq!(report.digest, digest_of(FAKE_ARCHIVE));
    assert_eq!(fs::read(&expected_path).expect("read installed"), SCRIPT);
    assert_eq!(executor.calls(), vec![format!("{expected_path} --help")]);
    assert!(report.smoke_test.is_some());
    assert!(stderr.is_empty(), "quiet mode writes nothing");
}

#[rstest]
fn skip_test_does_not_run_executable(prefix: Prefix) {
    let executor = CannedExecutor::new(output_with(0, "", ""));
    let mut stderr = Vec::new();

    let report = run_install_with(
        &matching_formula(),
        &config(&prefix.path, true),
        &serving_downloader(),
        &tarball_extractor(),
        &executor,
        &mut stderr,
    )
    .expect("install succeeds");

    assert!(report.smoke_test.is_none());
    assert!(executor.calls().is_empty());
}

#[rstest]
fn progress_is_reported_when_not_quiet(prefix: Prefix) {
    let executor = CannedExecutor::new(output_with(0, "Usage: ghclone <repo>\n", ""));
    let mut stderr = Vec::new();
    let config = PipelineConfig {
        prefix: &prefix.path,
        quiet: false,
        skip_test: false,
    };

    run_install_with(
        &matching_formula(),
        &config,
        &serving_downloader(),
        &tarball_extractor(),
        &executor,
        &mut stderr,
    )
    .expect("install succeeds");

    let output = String::from_utf8(stderr).expect("UTF-8 output");
    assert!(output.contains("Downloading https://example.com/"));
    assert!(output.contains("Verified SHA-256"));
    assert!(output.contains("Installed ghclone to"));
    assert!(output.contains("Smoke test passed."));
}

// -------------------------------------------------------------------------
// Failures
// -------------------------------------------------------------------------

#[rstest]
fn digest_mismatch_aborts_before_extraction(prefix: Prefix) {
    let formula = formula_with_digest(&digest_of(b"something else"));
    let mut extractor = MockArchiveExtractor::new();
    extractor.expect_extract().never();
    let executor = CannedExecutor::new(output_with(0, "", ""));
    let mut stderr = Vec::new();

    let err = run_install_with(
        &formula,
        &config(&prefix.path, false),
        &serving_downloader(),
        &extractor,
        &executor,
        &mut stderr,
    )
    .expect_err("mismatch must fail");

    assert!(matches!(err, InstallerError::Integrity(_)));
    assert!(!prefix.path.exists(), "prefix must not be created");
    assert!(executor.calls().is_empty());
}

#[rstest]
fn download_failure_is_propagated(prefix: Prefix) {
    let mut downloader = MockArchiveDownloader::new();
    downloader.expect_fetch().returning(|url, _dest| {
        Err(DownloadError::NotFound {
            url: url.to_owned(),
        })
    });
    let mut extractor = MockArchiveExtractor::new();
    extractor.expect_extract().never();
    let mut stderr = Vec::new();

    let err = run_install_with(
        &matching_formula(),
        &config(&prefix.path, true),
        &downloader,
        &extractor,
        &CannedExecutor::new(output_with(0, "", "")),
        &mut stderr,
    )
    .expect_err("download must fail");

    assert!(matches!(err, InstallerError::Download(DownloadError::NotFound { .. })));
    assert!(!prefix.path.exists());
}

#[rstest]
fn extraction_failure_leaves_prefix_untouched(prefix: Prefix) {
    let mut extractor = MockArchiveExtractor::new();
    extractor
        .expect_extract()
        .returning(|_archive, _dest| Err(ExtractionError::EmptyArchive));
    let mut stderr = Vec::new();

    let err = run_install_with(
        &matching_formula(),
        &config(&prefix.path, true),
        &serving_downloader(),
        &extractor,
        &CannedExecutor::new(output_with(0, "", "")),
        &mut stderr,
    )
    .expect_err("extraction must fail");

    assert!(matches!(err, InstallerError::Extraction(_)));
    assert!(!prefix.path.exists());
}

#[rstest]
fn missing_source_writes_nothing(prefix: Prefix) {
    let mut extractor = MockArchiveExtractor::new();
    extractor.expect_extract().returning(|_archive, dest| {
        let root = dest.join("homebrew-ghclone-1.0.0");
        fs::create_dir_all(&root).expect("create root");
        fs::write(root.join("README.md"), b"readme").expect("write readme");
        Ok(vec![root.join("README.md")])
    });
    let mut stderr = Vec::new();

    let err = run_install_with(
        &matching_formula(),
        &config(&prefix.path, false),
        &serving_downloader(),
        &extractor,
        &CannedExecutor::new(output_with(0, "Usage", "")),
        &mut stderr,
    )
    .expect_err("install must fail");

    assert!(matches!(
        err,
        InstallerError::Install(InstallError::SourceMissing { .. })
    ));
    assert!(!prefix.path.join("bin/ghclone").exists());
}

#[rstest]
#[case::wrong_output(0, "Help menu\n")]
#[case::nonzero_exit(1, "Usage: ghclone <repo>\n")]
fn verification_failure_keeps_installed_file(
    prefix: Prefix,
    #[case] code: i32,
    #[case] stdout: &str,
) {
    let executor = CannedExecutor::new(output_with(code, stdout, ""));
    let mut stderr = Vec::new();

    let err = run_install_with(
        &matching_formula(),
        &config(&prefix.path, false),
        &serving_downloader(),
        &tarball_extractor(),
        &executor,
        &mut stderr,
    )
    .expect_err("verification must fail");

    assert!(matches!(err, InstallerError::Verification(_)));
    assert!(prefix.path.join("bin/ghclone").is_file());
}

// -------------------------------------------------------------------------
// fetch_only and test_installed
// -------------------------------------------------------------------------

#[rstest]
fn fetch_only_saves_verified_archive(prefix: Prefix) {
    let output_dir = prefix.path.join("downloads");
    let mut stderr = Vec::new();

    let saved = fetch_only_with(
        &matching_formula(),
        &output_dir,
        &serving_downloader(),
        true,
        &mut stderr,
    )
    .expect("fetch succeeds");

    assert_eq!(saved, output_dir.join("v1.0.0.tar.gz"));
    assert_eq!(fs::read(&saved).expect("read archive"), FAKE_ARCHIVE);
}

#[rstest]
fn fetch_only_replaces_an_existing_archive(prefix: Prefix) {
    let output_dir = prefix.path.join("downloads");
    fs::create_dir_all(&output_dir).expect("create output dir");
    fs::write(output_dir.join("v1.0.0.tar.gz"), b"stale partial download").expect("write stale");
    let mut stderr = Vec::new();

    let saved = fetch_only_with(
        &matching_formula(),
        &output_dir,
        &serving_downloader(),
        true,
        &mut stderr,
    )
    .expect("fetch succeeds");

    assert_eq!(fs::read(&saved).expect("read archive"), FAKE_ARCHIVE);
    let entries: Vec<_> = fs::read_dir(&output_dir).expect("list output").collect();
    assert_eq!(entries.len(), 1, "no staging files may remain");
}

#[rstest]
fn failed_fetch_copy_leaves_no_partial_file(prefix: Prefix) {
    let output_dir = prefix.path.join("downloads");
    // A directory in the way makes the final rename fail.
    let blocker = output_dir.join("v1.0.0.tar.gz");
    fs::create_dir_all(blocker.join("occupied")).expect("create blocking dir");
    let mut stderr = Vec::new();

    let err = fetch_only_with(
        &matching_formula(),
        &output_dir,
        &serving_downloader(),
        true,
        &mut stderr,
    )
    .expect_err("copy must fail");

    assert!(matches!(err, InstallerError::Io(_)), "got {err:?}");
    assert!(blocker.is_dir());
    let entries: Vec<_> = fs::read_dir(&output_dir).expect("list output").collect();
    assert_eq!(entries.len(), 1, "no staging files may remain");
}

#[rstest]
fn fetch_only_rejects_mismatched_archive(prefix: Prefix) {
    let output_dir = prefix.path.join("downloads");
    let formula = formula_with_digest(&digest_of(b"other"));
    let mut stderr = Vec::new();

    let err = fetch_only_with(
        &formula,
        &output_dir,
        &serving_downloader(),
        true,
        &mut stderr,
    )
    .expect_err("mismatch must fail");

    assert!(matches!(err, InstallerError::Integrity(_)));
    assert!(!output_dir.exists());
}

#[rstest]
fn test_installed_runs_executable_under_prefix(prefix: Prefix) {
    let executor = CannedExecutor::new(output_with(0, "Usage: ghclone <repo>\n", ""));

    let report =
        test_installed(&matching_formula(), &prefix.path, &executor).expect("test passes");

    assert_eq!(report.exit_code, 0);
    assert_eq!(
        executor.calls(),
        vec![format!("{} --help", prefix.path.join("bin/ghclone"))]
    );
}

#[rstest]
fn test_installed_reports_verification_error(prefix: Prefix) {
    let executor = CannedExecutor::new(output_with(0, "Help menu\n", ""));

    let err = test_installed(&matching_formula(), &prefix.path, &executor)
        .expect_err("test fails");

    assert!(matches!(
        err,
        InstallerError::Verification(VerificationError::MissingOutput { .. })
    ));
}
