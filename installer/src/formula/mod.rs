//! Formula descriptors.
//!
//! A formula is a static record naming a downloadable archive, its
//! integrity digest, its license, a single install action (copy one file
//! from the archive into `<prefix>/bin` under a target name), and a single
//! verification action (run the installed executable and check its exit
//! code and output).
//!
//! Formulae are authored as TOML:
//!
//! ```toml
//! name = "ghclone"
//! desc = "Simple script for quickly cloning GitHub repositories"
//! homepage = "https://github.com/uchkunrakhimow/homebrew-ghclone"
//! url = "https://github.com/uchkunrakhimow/homebrew-ghclone/archive/refs/tags/v1.0.0.tar.gz"
//! sha256 = "6f5fe6852cedaf32652922061c823ea12d9e4039025cec7ad835adb0ad67312a"
//! license = "MIT"
//!
//! [install]
//! source = "bin/ghclone"
//! target = "ghclone"
//!
//! [test]
//! args = ["--help"]
//! expected_exit_code = 0
//! expected_output = "Usage"
//! ```
//!
//! Parsing runs every validation rule, so a [`Formula`] value is always
//! well formed.

mod error;
mod name;

pub use error::FormulaError;
pub use name::FormulaName;

use crate::artefact::archive_format::ArchiveFormat;
use crate::artefact::sha256_digest::Sha256Digest;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// URL schemes a formula may fetch from.
const SUPPORTED_SCHEMES: &[&str] = &["https://", "http://", "file://"];

/// Maps one file inside the extracted archive to an executable name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallMapping {
    source: Utf8PathBuf,
    target: String,
}

impl InstallMapping {
    /// Build a mapping, validating both sides.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::Invalid`] when `source` is absolute, empty,
    /// or contains `..`, or when `target` is not a plain file name.
    ///
    /// # Examples
    ///
    /// ```
    /// use formula_installer::formula::InstallMapping;
    ///
    /// let mapping = InstallMapping::new("bin/ghclone", "ghclone").expect("valid mapping");
    /// assert_eq!(mapping.source().as_str(), "bin/ghclone");
    /// assert!(InstallMapping::new("../ghclone", "ghclone").is_err());
    /// ```
    pub fn new(source: impl Into<Utf8PathBuf>, target: impl Into<String>) -> Result<Self, FormulaError> {
        let source = source.into();
        let target = target.into();
        validate_source(&source)?;
        validate_target(&target)?;
        Ok(Self { source, target })
    }

    /// Relative path of the file inside the archive root.
    #[must_use]
    pub fn source(&self) -> &Utf8Path {
        &self.source
    }

    /// File name the executable is installed under.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }
}

/// The post-install verification command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmokeTest {
    args: Vec<String>,
    expected_exit_code: i32,
    expected_output: String,
}

impl SmokeTest {
    /// Build a verification command.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::Invalid`] when `expected_output` is empty,
    /// since an empty substring would match any output.
    pub fn new(
        args: Vec<String>,
        expected_exit_code: i32,
        expected_output: impl Into<String>,
    ) -> Result<Self, FormulaError> {
        let expected_output = expected_output.into();
        if expected_output.is_empty() {
            return Err(FormulaError::Invalid {
                field: "test.expected_output",
                reason: "must not be empty".to_owned(),
            });
        }
        Ok(Self {
            args,
            expected_exit_code,
            expected_output,
        })
    }

    /// Arguments passed to the installed executable.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Exit code the executable must return.
    #[must_use]
    pub const fn expected_exit_code(&self) -> i32 {
        self.expected_exit_code
    }

    /// Substring standard output must contain.
    #[must_use]
    pub fn expected_output(&self) -> &str {
        &self.expected_output
    }
}

/// A validated formula descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Formula {
    name: FormulaName,
    desc: String,
    homepage: Option<String>,
    url: String,
    sha256: Sha256Digest,
    license: String,
    install: InstallMapping,
    test: SmokeTest,
}

impl Formula {
    /// The registry name.
    #[must_use]
    pub fn name(&self) -> &FormulaName {
        &self.name
    }

    /// Human-readable description.
    #[must_use]
    pub fn desc(&self) -> &str {
        &self.desc
    }

    /// Project homepage, when declared.
    #[must_use]
    pub fn homepage(&self) -> Option<&str> {
        self.homepage.as_deref()
    }

    /// Source archive URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Declared SHA-256 digest of the source archive.
    #[must_use]
    pub fn sha256(&self) -> &Sha256Digest {
        &self.sha256
    }

    /// License identifier (informational).
    #[must_use]
    pub fn license(&self) -> &str {
        &self.license
    }

    /// The install mapping.
    #[must_use]
    pub fn install(&self) -> &InstallMapping {
        &self.install
    }

    /// The verification command.
    #[must_use]
    pub fn test(&self) -> &SmokeTest {
        &self.test
    }

    /// The archive file name: the last path segment of the URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use formula_installer::formula::parse_formula;
    ///
    /// let formula = parse_formula(concat!(
    ///     "name = \"ghclone\"\n",
    ///     "desc = \"Clone GitHub repositories\"\n",
    ///     "url = \"https://example.com/archive/refs/tags/v1.0.0.tar.gz?raw=1\"\n",
    ///     "sha256 = \"6f5fe6852cedaf32652922061c823ea12d9e4039025cec7ad835adb0ad67312a\"\n",
    ///     "license = \"MIT\"\n",
    ///     "[install]\nsource = \"bin/ghclone\"\n",
    ///     "[test]\nexpected_output = \"Usage\"\n",
    /// ))
    /// .expect("valid formula");
    /// assert_eq!(formula.archive_filename(), "v1.0.0.tar.gz");
    /// assert_eq!(formula.version().as_deref(), Some("1.0.0"));
    /// ```
    #[must_use]
    pub fn archive_filename(&self) -> &str {
        archive_filename(&self.url)
    }

    /// The version inferred from the archive file name.
    ///
    /// `v1.0.0.tar.gz` and `ghclone-1.0.0.tar.gz` both yield `1.0.0`.
    /// Returns `None` when the file name carries no version.
    #[must_use]
    pub fn version(&self) -> Option<String> {
        let stem = ArchiveFormat::strip_suffix(self.archive_filename())?;
        let candidate = stem.rsplit('-').next().unwrap_or(stem);
        let candidate = candidate.strip_prefix('v').unwrap_or(candidate);
        candidate
            .chars()
            .next()
            .filter(char::is_ascii_digit)
            .map(|_| candidate.to_owned())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFormula {
    name: FormulaName,
    desc: String,
    #[serde(default)]
    homepage: Option<String>,
    url: String,
    sha256: Sha256Digest,
    license: String,
    install: RawInstall,
    test: RawTest,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawInstall {
    source: Utf8PathBuf,
    #[serde(default)]
    target: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTest {
    #[serde(default = "default_test_args")]
    args: Vec<String>,
    #[serde(default)]
    expected_exit_code: i32,
    expected_output: String,
}

fn default_test_args() -> Vec<String> {
    vec!["--help".to_owned()]
}

impl TryFrom<RawFormula> for Formula {
    type Error = FormulaError;

    fn try_from(raw: RawFormula) -> Result<Self, Self::Error> {
        let desc = non_empty("desc", raw.desc)?;
        let license = non_empty("license", raw.license)?;
        if let Some(homepage) = raw.homepage.as_deref() {
            validate_homepage(homepage)?;
        }
        validate_url(&raw.url)?;

        let target = match raw.install.target {
            Some(target) => target,
            None => raw
                .install
                .source
                .file_name()
                .map(str::to_owned)
                .unwrap_or_default(),
        };
        let install = InstallMapping::new(raw.install.source, target)?;
        let test = SmokeTest::new(
            raw.test.args,
            raw.test.expected_exit_code,
            raw.test.expected_output,
        )?;

        Ok(Self {
            name: raw.name,
            desc,
            homepage: raw.homepage,
            url: raw.url,
            sha256: raw.sha256,
            license,
            install,
            test,
        })
    }
}

/// Parse a TOML string into a validated [`Formula`].
///
/// # Errors
///
/// Returns [`FormulaError::Parse`] when the TOML is malformed, a required
/// field is missing, or an unknown key is present, and
/// [`FormulaError::Invalid`] when a field breaks its invariant.
pub fn parse_formula(toml_text: &str) -> Result<Formula, FormulaError> {
    let raw: RawFormula = toml::from_str(toml_text)?;
    Formula::try_from(raw)
}

/// Read and parse the formula file at `path`.
///
/// # Errors
///
/// Returns [`FormulaError::Read`] when the file cannot be read, otherwise
/// the errors of [`parse_formula`].
pub fn load_formula(path: &Utf8Path) -> Result<Formula, FormulaError> {
    let contents = std::fs::read_to_string(path).map_err(|source| FormulaError::Read {
        path: path.to_owned(),
        source,
    })?;
    parse_formula(&contents)
}

fn non_empty(field: &'static str, value: String) -> Result<String, FormulaError> {
    if value.trim().is_empty() {
        return Err(FormulaError::Invalid {
            field,
            reason: "must not be empty".to_owned(),
        });
    }
    Ok(value)
}

fn validate_homepage(homepage: &str) -> Result<(), FormulaError> {
    if homepage.starts_with("https://") || homepage.starts_with("http://") {
        return Ok(());
    }
    Err(FormulaError::Invalid {
        field: "homepage",
        reason: format!("expected an http(s) URL, got \"{homepage}\""),
    })
}

fn validate_url(url: &str) -> Result<(), FormulaError> {
    if !SUPPORTED_SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
        return Err(FormulaError::Invalid {
            field: "url",
            reason: format!(
                "unsupported scheme in \"{url}\"; expected one of: {}",
                SUPPORTED_SCHEMES.join(", ")
            ),
        });
    }
    ArchiveFormat::from_filename(archive_filename(url)).map_err(|e| FormulaError::Invalid {
        field: "url",
        reason: e.to_string(),
    })?;
    Ok(())
}

fn archive_filename(url: &str) -> &str {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query.rsplit('/').next().unwrap_or(without_query)
}

fn validate_source(source: &Utf8Path) -> Result<(), FormulaError> {
    let invalid = |reason: &str| FormulaError::Invalid {
        field: "install.source",
        reason: format!("{reason}: \"{source}\""),
    };
    if source.as_str().is_empty() {
        return Err(invalid("must not be empty"));
    }
    if source.has_root() || source.is_absolute() {
        return Err(invalid("must be relative to the archive root"));
    }
    if source
        .components()
        .any(|c| !matches!(c, Utf8Component::Normal(_) | Utf8Component::CurDir))
    {
        return Err(invalid("must not leave the archive root"));
    }
    Ok(())
}

fn validate_target(target: &str) -> Result<(), FormulaError> {
    let is_plain_name = !target.is_empty()
        && target != "."
        && target != ".."
        && !target.contains(['/', '\\']);
    if is_plain_name {
        return Ok(());
    }
    Err(FormulaError::Invalid {
        field: "install.target",
        reason: format!("expected a plain file name, got \"{target}\""),
    })
}
