//! Error types for formula parsing and validation.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors arising while loading or validating a formula descriptor.
#[derive(Debug, Error)]
pub enum FormulaError {
    /// The formula file could not be read.
    #[error("failed to read formula {path}: {source}")]
    Read {
        /// Path of the formula file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The formula is not valid TOML or does not match the schema.
    #[error("invalid formula: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field parsed but violates its invariant.
    #[error("invalid formula field `{field}`: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the violated constraint.
        reason: String,
    },
}
