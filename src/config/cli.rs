//! Command-line interface
//!
//! ```bash
//! aprendiz train config.yaml
//! aprendiz train config.yaml --epochs 5 --lr 0.01 --workers 2
//! aprendiz validate config.yaml --detailed
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::schema::TrainSpec;

/// Aprendiz: classification and segmentation training
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "aprendiz")]
#[command(version)]
#[command(about = "Train classification and segmentation policies from a YAML configuration")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Train a policy from YAML configuration
    Train(TrainArgs),

    /// Validate a configuration file without training
    Validate(ValidateArgs),
}

/// Arguments for the train command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct TrainArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Override number of epochs
    #[arg(short, long)]
    pub epochs: Option<usize>,

    /// Override batch size
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Override learning rate
    #[arg(short, long)]
    pub lr: Option<f32>,

    /// Override number of data-parallel workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Log step metrics every N steps
    #[arg(long)]
    pub log_every: Option<usize>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Validate config but don't train
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Show the resolved configuration
    #[arg(short, long)]
    pub detailed: bool,
}

/// Parse command-line arguments
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Apply command-line overrides to a TrainSpec
pub fn apply_overrides(spec: &mut TrainSpec, args: &TrainArgs) {
    if let Some(epochs) = args.epochs {
        spec.training.epochs = epochs;
    }
    if let Some(batch_size) = args.batch_size {
        spec.data.batch_size = batch_size;
    }
    if let Some(lr) = args.lr {
        spec.learning_rate = lr;
    }
    if let Some(workers) = args.workers {
        spec.training.workers = workers;
    }
    if let Some(log_every) = args.log_every {
        spec.training.log_every_n_steps = log_every;
    }
    if let Some(seed) = args.seed {
        spec.seed = seed;
    }
}
