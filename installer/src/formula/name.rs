//! Semantic wrapper for formula names.
//!
//! This module provides the [`FormulaName`] newtype. Names double as the
//! registry key of a formula, so they are restricted to the characters a
//! package registry can use as a file name.

use super::error::FormulaError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated formula name such as `ghclone`.
///
/// Names are non-empty and consist of lowercase ASCII letters, digits, and
/// the punctuation `-`, `_`, `.`, `@`, and `+`.
///
/// # Examples
///
/// ```
/// use formula_installer::formula::FormulaName;
///
/// let name = FormulaName::try_from("ghclone").expect("valid name");
/// assert_eq!(name.as_str(), "ghclone");
/// assert!(FormulaName::try_from("GhClone").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FormulaName(String);

impl FormulaName {
    /// Get the formula name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.' | '@' | '+')
}

fn validate_name(value: &str) -> Result<(), FormulaError> {
    if value.is_empty() {
        return Err(FormulaError::Invalid {
            field: "name",
            reason: "must not be empty".to_owned(),
        });
    }
    if let Some(bad) = value.chars().find(|c| !is_name_char(*c)) {
        return Err(FormulaError::Invalid {
            field: "name",
            reason: format!("character '{bad}' is not allowed"),
        });
    }
    Ok(())
}

impl TryFrom<&str> for FormulaName {
    type Error = FormulaError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        validate_name(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for FormulaName {
    type Error = FormulaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_name(&value)?;
        Ok(Self(value))
    }
}

impl From<FormulaName> for String {
    fn from(value: FormulaName) -> Self {
        value.0
    }
}

impl AsRef<str> for FormulaName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormulaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
