//! Command dispatch shared by the installer binaries.
//!
//! `formula-installer` requires `--formula`; `ghclone-formula` passes its
//! built-in descriptor as the fallback. Both route through [`run`] and turn
//! the result into an exit code with [`exit_code_for_run_result`].

use crate::cli::{Cli, Command, FetchArgs, InfoArgs, InstallArgs, TestArgs};
use crate::dirs::{BaseDirs, SystemBaseDirs, resolve_prefix};
use crate::error::{InstallerError, Result};
use crate::formula::{Formula, load_formula};
use crate::output::{DryRunInfo, format_human, format_json, write_stderr_line};
use crate::pipeline::{PipelineConfig, fetch_only, run_install, test_installed};
use crate::process::SystemCommandExecutor;
use crate::smoke_test::VerificationError;
use camino::Utf8Path;
use log::debug;
use std::io::Write;

/// Entry point used by the binaries.
///
/// Runs `cli` against the process's stdout and stderr and returns the exit
/// code.
#[must_use]
pub fn run_main(cli: &Cli, builtin: Option<&Formula>) -> i32 {
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let result = run(cli, builtin, &SystemBaseDirs, &mut stdout, &mut stderr);
    exit_code_for_run_result(result, &mut stderr)
}

/// Execute the command selected by `cli`.
///
/// `builtin` is used when no `--formula` is given.
///
/// # Errors
///
/// Returns [`InstallerError::Usage`] when no formula is available, and any
/// error raised by the selected command.
pub fn run(
    cli: &Cli,
    builtin: Option<&Formula>,
    dirs: &dyn BaseDirs,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<()> {
    match cli.effective_command() {
        Command::Install(args) => run_install_command(&args, builtin, dirs, stderr),
        Command::Fetch(args) => run_fetch_command(&args, builtin, stdout, stderr),
        Command::Test(args) => run_test_command(&args, builtin, dirs, stderr),
        Command::Info(args) => run_info_command(&args, builtin, stdout),
    }
}

/// Load the formula named on the command line, or fall back to `builtin`.
///
/// # Errors
///
/// Returns [`InstallerError::Formula`] when the file cannot be loaded and
/// [`InstallerError::Usage`] when neither source is available.
pub fn select_formula(path: Option<&Utf8Path>, builtin: Option<&Formula>) -> Result<Formula> {
    match (path, builtin) {
        (Some(path), _) => {
            debug!("loading formula from {path}");
            Ok(load_formula(path)?)
        }
        (None, Some(formula)) => Ok(formula.clone()),
        (None, None) => Err(InstallerError::Usage(
            "no formula given; pass --formula <PATH>".to_owned(),
        )),
    }
}

fn run_install_command(
    args: &InstallArgs,
    builtin: Option<&Formula>,
    dirs: &dyn BaseDirs,
    stderr: &mut dyn Write,
) -> Result<()> {
    let formula = select_formula(args.formula.as_deref(), builtin)?;
    let prefix = resolve_prefix(args.prefix.as_deref(), dirs)?;

    if args.dry_run {
        let info = DryRunInfo {
            formula: &formula,
            prefix: &prefix,
            skip_test: args.skip_test,
        };
        write_stderr_line(stderr, info.display_text());
        return Ok(());
    }

    let config = PipelineConfig {
        prefix: &prefix,
        quiet: args.quiet,
        skip_test: args.skip_test,
    };
    let executor = SystemCommandExecutor::with_timeout(args.test_timeout());
    run_install(&formula, &config, &executor, stderr)?;
    Ok(())
}

fn run_fetch_command(
    args: &FetchArgs,
    builtin: Option<&Formula>,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<()> {
    let formula = select_formula(args.formula.as_deref(), builtin)?;
    let saved = fetch_only(&formula, &args.output, args.quiet, stderr)?;
    writeln!(stdout, "{saved}").map_err(|source| InstallerError::WriteFailed { source })
}

fn run_test_command(
    args: &TestArgs,
    builtin: Option<&Formula>,
    dirs: &dyn BaseDirs,
    stderr: &mut dyn Write,
) -> Result<()> {
    let formula = select_formula(args.formula.as_deref(), builtin)?;
    let prefix = resolve_prefix(args.prefix.as_deref(), dirs)?;
    let executor = SystemCommandExecutor::with_timeout(args.test_timeout());
    test_installed(&formula, &prefix, &executor)?;
    write_stderr_line(stderr, format!("{}: smoke test passed", formula.name()));
    Ok(())
}

fn run_info_command(
    args: &InfoArgs,
    builtin: Option<&Formula>,
    stdout: &mut dyn Write,
) -> Result<()> {
    let formula = select_formula(args.formula.as_deref(), builtin)?;
    let text = if args.json {
        format_json(&formula).map_err(std::io::Error::from)?
    } else {
        format_human(&formula)
    };
    writeln!(stdout, "{text}").map_err(|source| InstallerError::WriteFailed { source })
}

/// Report `result` on `stderr` and return the process exit code.
///
/// Errors produce exit code 1 and a one-line message. Smoke-test failures
/// also print the captured output of the executable.
pub fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            if let InstallerError::Verification(verification) = &err {
                report_captured_output(verification, stderr);
            }
            1
        }
    }
}

fn report_captured_output(err: &VerificationError, stderr: &mut dyn Write) {
    if let Some(output) = err.captured_output() {
        write_stderr_line(stderr, output);
    }
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
