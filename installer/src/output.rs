//! Output formatting for the installer CLI.
//!
//! Progress lines go to stderr through [`write_stderr_line`]; formula
//! details for the `info` subcommand are rendered either for humans or as
//! JSON for scripting.

use crate::formula::Formula;
use crate::install::{InstallOutcome, InstalledFile};
use camino::Utf8Path;
use serde::Serialize;
use std::io::Write;

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort progress output; ignore write failures.
    }
}

/// Format a success message after installation.
///
/// # Examples
///
/// ```
/// use camino::Utf8PathBuf;
/// use formula_installer::install::{InstallOutcome, InstalledFile};
/// use formula_installer::output::success_message;
///
/// let installed = InstalledFile {
///     path: Utf8PathBuf::from("/home/user/.local/bin/ghclone"),
///     outcome: InstallOutcome::Replaced,
///     bytes: 512,
/// };
/// let msg = success_message("ghclone", &installed);
/// assert_eq!(msg, "Reinstalled ghclone to /home/user/.local/bin/ghclone");
/// ```
#[must_use]
pub fn success_message(name: &str, installed: &InstalledFile) -> String {
    let verb = match installed.outcome {
        InstallOutcome::Created => "Installed",
        InstallOutcome::Replaced => "Reinstalled",
    };
    format!("{verb} {name} to {}", installed.path)
}

/// Configuration information for dry-run output.
#[derive(Debug)]
pub struct DryRunInfo<'a> {
    /// The formula that would be installed.
    pub formula: &'a Formula,
    /// Resolved install prefix.
    pub prefix: &'a Utf8Path,
    /// Whether the smoke test would be skipped.
    pub skip_test: bool,
}

impl DryRunInfo<'_> {
    /// Format the dry-run information for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        let formula = self.formula;
        let install = formula.install();
        let test = formula.test();
        let mut lines = vec![
            "Dry run - no files will be modified".to_owned(),
            String::new(),
            format!("Formula: {}", formula.name()),
            format!("Archive: {}", formula.url()),
            format!("SHA-256: {}", formula.sha256()),
            format!("Prefix: {}", self.prefix),
            format!(
                "Install: {} -> {}",
                install.source(),
                self.prefix.join("bin").join(install.target())
            ),
        ];

        if self.skip_test {
            lines.push("Smoke test: skipped".to_owned());
        } else {
            lines.push(format!(
                "Smoke test: {} {} (expect exit {}, output containing \"{}\")",
                install.target(),
                test.args().join(" "),
                test.expected_exit_code(),
                test.expected_output()
            ));
        }

        lines.join("\n")
    }
}

/// Format formula details for human-readable output.
#[must_use]
pub fn format_human(formula: &Formula) -> String {
    let mut lines = vec![format!("{}: {}", formula.name(), formula.desc())];
    if let Some(version) = formula.version() {
        lines.push(format!("Version:  {version}"));
    }
    if let Some(homepage) = formula.homepage() {
        lines.push(format!("Homepage: {homepage}"));
    }
    lines.push(format!("License:  {}", formula.license()));
    lines.push(format!("Source:   {}", formula.url()));
    lines.push(format!("SHA-256:  {}", formula.sha256()));
    lines.push(format!(
        "Installs: bin/{} (from {})",
        formula.install().target(),
        formula.install().source()
    ));
    lines.join("\n")
}

/// JSON-serializable view of a formula with derived fields.
#[derive(Debug, Serialize)]
pub struct FormulaJson<'a> {
    /// The descriptor fields.
    #[serde(flatten)]
    pub formula: &'a Formula,
    /// Version inferred from the archive file name.
    pub version: Option<String>,
    /// Archive file name taken from the URL.
    pub archive: &'a str,
}

/// Format formula details as pretty-printed JSON.
///
/// # Errors
///
/// Returns a [`serde_json::Error`] if serialization fails.
pub fn format_json(formula: &Formula) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&FormulaJson {
        formula,
        version: formula.version(),
        archive: formula.archive_filename(),
    })
}
