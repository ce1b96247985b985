//! CLI argument definitions for the formula installer.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the binaries so that `formula-installer` and `ghclone-formula` share
//! one definition.

use crate::process::DEFAULT_TIMEOUT;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use std::time::Duration;

/// Default smoke-test deadline in seconds.
pub const DEFAULT_TEST_TIMEOUT_SECS: u64 = DEFAULT_TIMEOUT.as_secs();

/// Fetch, verify, install, and test a formula.
#[derive(Parser, Debug)]
#[command(name = "formula-installer")]
#[command(version, about)]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = concat!(
    "Fetch, verify, install, and test a formula.\n\n",
    "A formula is a TOML descriptor naming a source archive, its SHA-256 ",
    "digest, one file to install into <prefix>/bin, and a command that checks ",
    "the installed executable works.\n\n",
    "The archive is downloaded to a scratch directory and its digest checked ",
    "before anything is written under the prefix. After installing, the ",
    "executable is run with the formula's test arguments; it must exit with ",
    "the expected code and print the expected text.",
))]
#[command(after_help = concat!(
    "ENVIRONMENT:\n",
    "  FORMULA_PREFIX    Install prefix used when --prefix is not given\n",
    "                    [default: ~/.local]\n\n",
    "EXAMPLES:\n",
    "  Install a formula into ~/.local/bin:\n",
    "    $ formula-installer install --formula Formula/ghclone.toml\n\n",
    "  Install into a custom prefix without running the smoke test:\n",
    "    $ formula-installer install --formula Formula/ghclone.toml --prefix /opt/tools --skip-test\n\n",
    "  Download and verify the archive only:\n",
    "    $ formula-installer fetch --formula Formula/ghclone.toml --output .\n\n",
    "  Re-run the smoke test on an installed formula:\n",
    "    $ formula-installer test --formula Formula/ghclone.toml\n\n",
    "  Show formula details as JSON:\n",
    "    $ formula-installer info --formula Formula/ghclone.toml --json\n\n",
    "For more information, see: https://github.com/uchkunrakhimow/homebrew-ghclone",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Install arguments (used when no subcommand is given).
    ///
    /// These cannot be combined with a subcommand; pass flags after the
    /// subcommand name instead.
    #[command(flatten)]
    pub install: InstallArgs,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Install a formula (default when no subcommand given).
    Install(InstallArgs),

    /// Download and verify the source archive without installing.
    Fetch(FetchArgs),

    /// Run the smoke test against an installed formula.
    Test(TestArgs),

    /// Show formula details.
    Info(InfoArgs),
}

/// Arguments for the install command.
#[derive(Parser, Debug, Clone)]
pub struct InstallArgs {
    /// Formula descriptor to install.
    #[arg(short, long, value_name = "PATH")]
    pub formula: Option<Utf8PathBuf>,

    /// Installation root; executables go to <DIR>/bin.
    #[arg(short, long, value_name = "DIR")]
    pub prefix: Option<Utf8PathBuf>,

    /// Do not run the smoke test after installing.
    #[arg(long)]
    pub skip_test: bool,

    /// Show what would be done and exit without touching the filesystem.
    #[arg(long)]
    pub dry_run: bool,

    /// Seconds to wait for the smoke test before killing it.
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TEST_TIMEOUT_SECS)]
    pub test_timeout: u64,

    /// Suppress progress output (errors still shown).
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the fetch command.
#[derive(Parser, Debug, Clone)]
pub struct FetchArgs {
    /// Formula descriptor whose archive to fetch.
    #[arg(short, long, value_name = "PATH")]
    pub formula: Option<Utf8PathBuf>,

    /// Directory to save the verified archive into.
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output: Utf8PathBuf,

    /// Suppress progress output (errors still shown).
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the test command.
#[derive(Parser, Debug, Clone)]
pub struct TestArgs {
    /// Formula descriptor to test.
    #[arg(short, long, value_name = "PATH")]
    pub formula: Option<Utf8PathBuf>,

    /// Installation root the formula was installed into.
    #[arg(short, long, value_name = "DIR")]
    pub prefix: Option<Utf8PathBuf>,

    /// Seconds to wait for the smoke test before killing it.
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TEST_TIMEOUT_SECS)]
    pub test_timeout: u64,
}

/// Arguments for the info command.
#[derive(Parser, Debug, Clone)]
pub struct InfoArgs {
    /// Formula descriptor to describe.
    #[arg(short, long, value_name = "PATH")]
    pub formula: Option<Utf8PathBuf>,

    /// Output in JSON format for scripting.
    #[arg(long)]
    pub json: bool,
}

impl InstallArgs {
    /// The smoke-test deadline as a [`Duration`].
    ///
    /// # Examples
    ///
    /// ```
    /// use formula_installer::cli::InstallArgs;
    /// use std::time::Duration;
    ///
    /// let args = InstallArgs {
    ///     test_timeout: 5,
    ///     ..InstallArgs::default()
    /// };
    /// assert_eq!(args.test_timeout(), Duration::from_secs(5));
    /// ```
    #[must_use]
    pub const fn test_timeout(&self) -> Duration {
        Duration::from_secs(self.test_timeout)
    }
}

impl TestArgs {
    /// The smoke-test deadline as a [`Duration`].
    #[must_use]
    pub const fn test_timeout(&self) -> Duration {
        Duration::from_secs(self.test_timeout)
    }
}

impl Default for InstallArgs {
    /// Creates an `InstallArgs` instance with all flags disabled and no
    /// formula selected.
    ///
    /// # Examples
    ///
    /// ```
    /// use formula_installer::cli::InstallArgs;
    ///
    /// let args = InstallArgs::default();
    /// assert!(args.formula.is_none());
    /// assert!(!args.skip_test);
    /// assert_eq!(args.test_timeout, 30);
    /// ```
    fn default() -> Self {
        Self {
            formula: None,
            prefix: None,
            skip_test: false,
            dry_run: false,
            test_timeout: DEFAULT_TEST_TIMEOUT_SECS,
            quiet: false,
        }
    }
}

impl Default for FetchArgs {
    fn default() -> Self {
        Self {
            formula: None,
            output: Utf8PathBuf::from("."),
            quiet: false,
        }
    }
}

impl Default for TestArgs {
    fn default() -> Self {
        Self {
            formula: None,
            prefix: None,
            test_timeout: DEFAULT_TEST_TIMEOUT_SECS,
        }
    }
}

impl Default for InfoArgs {
    fn default() -> Self {
        Self {
            formula: None,
            json: false,
        }
    }
}

impl Cli {
    /// Returns the effective command.
    ///
    /// When no subcommand was given, the flattened install arguments are
    /// returned as an [`Command::Install`].
    #[must_use]
    pub fn effective_command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Install(self.install.clone()))
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
