//! Aprendiz CLI
//!
//! # Usage
//!
//! ```bash
//! # Train from config
//! aprendiz train config.yaml
//!
//! # Train with overrides, two data-parallel workers
//! aprendiz train config.yaml --epochs 10 --lr 0.001 --workers 2
//!
//! # Validate config
//! aprendiz validate config.yaml --detailed
//! ```

use aprendiz::cli::{init_tracing, run_command, Cli, LogLevel};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(LogLevel::from_flags(cli.quiet, cli.verbose));

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
