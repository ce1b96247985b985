//! The `ghclone` formula.
//!
//! The descriptor in `Formula/ghclone.toml` is compiled into this crate so
//! the `ghclone-formula` binary can install `ghclone` without being told
//! where the descriptor lives. It names the tagged source tarball, its
//! SHA-256 digest, and the two actions the installer carries out: copy
//! `bin/ghclone` into `<prefix>/bin`, then check that `ghclone --help` exits
//! successfully and prints `Usage`.

use formula_installer::formula::{Formula, FormulaError, parse_formula};

/// Raw TOML text of the ghclone descriptor.
pub const GHCLONE_TOML: &str = include_str!("../Formula/ghclone.toml");

/// Parse the built-in ghclone descriptor.
///
/// # Errors
///
/// Returns a [`FormulaError`] if the embedded descriptor is invalid.
///
/// # Examples
///
/// ```
/// let formula = ghclone_formula::ghclone()?;
/// assert_eq!(formula.name().as_str(), "ghclone");
/// assert_eq!(formula.install().target(), "ghclone");
/// # Ok::<(), formula_installer::formula::FormulaError>(())
/// ```
pub fn ghclone() -> Result<Formula, FormulaError> {
    parse_formula(GHCLONE_TOML)
}
