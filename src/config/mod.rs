//! Configuration: YAML schema, validation, command-line arguments and the
//! end-to-end run that ties them to the trainer

mod cli;
mod run;
mod schema;
mod validate;

pub use cli::{apply_overrides, parse_args, Cli, Command, TrainArgs, ValidateArgs};
pub use run::{
    load_config, train_from_spec, train_from_yaml, train_with_logger, RunSummary,
};
pub use schema::{
    DataConfig, LoggerBackend, LoggingConfig, OverlapMetricSpec, SegmentationConfig, Task,
    TrainSpec, TrainingParams,
};
pub use validate::{validate_config, ValidationError};
