//! Shared fixtures for the installer's behaviour suites.
//!
//! Builds throwaway layouts holding a real `.tar.gz` archive, a formula
//! descriptor that points at it through a `file://` URL, and an empty
//! install prefix. Scenarios drive the real downloader and extractor
//! against these layouts, so no network access is needed.

use camino::{Utf8Path, Utf8PathBuf};
use formula_installer::artefact::integrity::compute_sha256;
use formula_installer::formula::{Formula, load_formula};
use formula_installer::test_utils::ArchiveBuilder;
use tempfile::TempDir;

/// Name of the top-level directory inside generated archives, matching
/// GitHub's tag tarball layout.
pub const ARCHIVE_ROOT: &str = "homebrew-ghclone-1.0.0";

/// A scratch directory for one scenario.
pub struct Layout {
    _temp: TempDir,
    /// Root of the scratch directory.
    pub root: Utf8PathBuf,
}

impl Layout {
    /// Create an empty scratch directory.
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("create temp dir");
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 temp path");
        Self { _temp: temp, root }
    }

    /// Path of the generated archive.
    pub fn archive(&self) -> Utf8PathBuf {
        self.root.join("v1.0.0.tar.gz")
    }

    /// Path of the generated formula file.
    pub fn formula_path(&self) -> Utf8PathBuf {
        self.root.join("ghclone.toml")
    }

    /// The install prefix, which does not exist until something installs.
    pub fn prefix(&self) -> Utf8PathBuf {
        self.root.join("prefix")
    }

    /// Where the formula installs `ghclone`.
    pub fn installed(&self) -> Utf8PathBuf {
        self.prefix().join("bin").join("ghclone")
    }

    /// Write an archive with one executable at `path` below the archive
    /// root.
    pub fn write_archive(&self, path: &str, contents: &[u8]) {
        ArchiveBuilder::new()
            .executable(&format!("{ARCHIVE_ROOT}/{path}"), contents)
            .file(&format!("{ARCHIVE_ROOT}/README.md"), b"# ghclone\n")
            .write_tar_gz(self.archive().as_std_path())
            .expect("write archive");
    }

    /// Write a formula pointing at the archive with its real digest.
    pub fn write_matching_formula(&self) -> Formula {
        let digest = compute_sha256(self.archive().as_std_path()).expect("hash archive");
        self.write_formula(digest.as_str())
    }

    /// Write a formula pointing at the archive with the given digest.
    pub fn write_formula(&self, digest: &str) -> Formula {
        std::fs::write(self.formula_path(), formula_toml(&self.archive(), digest))
            .expect("write formula");
        load_formula(&self.formula_path()).expect("load formula")
    }
}

/// Render a ghclone descriptor for a local archive.
pub fn formula_toml(archive: &Utf8Path, digest: &str) -> String {
    format!(
        concat!(
            "name = \"ghclone\"\n",
            "desc = \"Simple script for quickly cloning GitHub repositories\"\n",
            "homepage = \"https://github.com/uchkunrakhimow/homebrew-ghclone\"\n",
            "url = \"file://{archive}\"\n",
            "sha256 = \"{digest}\"\n",
            "license = \"MIT\"\n",
            "\n",
            "[install]\n",
            "source = \"bin/ghclone\"\n",
            "target = \"ghclone\"\n",
            "\n",
            "[test]\n",
            "args = [\"--help\"]\n",
            "expected_exit_code = 0\n",
            "expected_output = \"Usage\"\n",
        ),
        archive = archive,
        digest = digest,
    )
}

/// A `/bin/sh` script body printing `stdout` and exiting with `code`.
pub fn stub_script(stdout: &str, code: i32) -> String {
    format!("#!/bin/sh\necho '{stdout}'\nexit {code}\n")
}
