use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use makepick::cli::{self, Cli};

fn main() -> ExitCode {
    env_logger::init();

    let args = Cli::parse();

    match cli::main(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::from(e.exit_code())
        }
    }
}
