mod cli;
mod commands;
mod config;
mod error;

use clap::Parser;

use crate::cli::Cli;
use crate::error::CliError;

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(error.exit_code());
    }
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    config::init_tracing();
    let config = config::Config::from_env();
    commands::run(&cli, &config)
}
