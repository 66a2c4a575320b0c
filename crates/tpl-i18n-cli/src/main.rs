mod args;
mod catalog;
mod module;
mod run;

use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;

use crate::args::Arguments;

fn main() -> ExitCode {
    let args = Arguments::parse();
    init_logger(args.verbose);

    match run::run_cli(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(2)
        }
    }
}

/// `RUST_LOG` wins; otherwise warnings, or debug output with `-v`.
fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();
}
