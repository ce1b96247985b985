//! Formula installer CLI entrypoint.
//!
//! This binary installs any formula descriptor passed with `--formula`:
//! it fetches and verifies the source archive, installs the mapped
//! executable, and runs its smoke test.

use clap::Parser;
use formula_installer::app::run_main;
use formula_installer::cli::Cli;

fn main() {
    let cli = Cli::parse();
    let exit_code = run_main(&cli, None);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}
