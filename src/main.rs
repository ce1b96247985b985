//! ghclone installer entrypoint.
//!
//! Installs `ghclone` from its built-in formula. Every subcommand of
//! `formula-installer` is available; `--formula` is optional and overrides
//! the built-in descriptor.

use clap::{CommandFactory, FromArgMatches};
use formula_installer::app::{exit_code_for_run_result, run_main};
use formula_installer::cli::Cli;
use formula_installer::error::InstallerError;
use log::debug;

fn main() {
    let matches = Cli::command().name("ghclone-formula").get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());

    let exit_code = ghclone_formula::ghclone().map_or_else(
        |err| exit_code_for_run_result(Err(InstallerError::from(err)), &mut std::io::stderr()),
        |formula| {
            debug!("using built-in formula for {}", formula.name());
            run_main(&cli, Some(&formula))
        },
    );
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}
