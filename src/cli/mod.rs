//! Command handlers for the `aprendiz` binary

mod commands;
mod logging;

pub use commands::run_command;
pub use logging::{init_tracing, LogLevel};

pub use crate::config::Cli;
