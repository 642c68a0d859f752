//! Validate command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{load_config, validate_config, LoggerBackend, Task, TrainSpec, ValidateArgs};

/// Format data configuration as a string
pub fn format_data_info(spec: &TrainSpec) -> String {
    let data = &spec.data;
    let shape = match spec.task {
        Task::Classification => {
            format!("  Features: {}\n  Classes: {}", data.features, data.classes)
        }
        Task::Segmentation => format!("  Pixels: {}", data.pixels),
    };
    format!(
        "  Samples: {} (val {}, test {})\n{shape}\n  Batch size: {}",
        data.samples, data.val_fraction, data.test_fraction, data.batch_size
    )
}

/// Format training configuration as a string
pub fn format_training_info(spec: &TrainSpec) -> String {
    let training = &spec.training;
    let mut lines = vec![
        format!("  Task: {:?}", spec.task),
        format!("  Optimizer: Adam (lr={})", spec.learning_rate),
        format!("  Epochs: {}", training.epochs),
        format!("  Validate every: {} epoch(s)", training.check_val_every_n_epoch),
        format!("  Log every: {} step(s)", training.log_every_n_steps),
    ];
    if training.workers > 1 {
        lines.push(format!("  Workers: {}", training.workers));
    }
    if spec.task == Task::Segmentation {
        lines.push(format!("  Overlap metric: {:?}", spec.segmentation.metric));
    }
    lines.join("\n")
}

/// Format logging configuration as a string
pub fn format_logging_info(spec: &TrainSpec) -> String {
    let logging = &spec.logging;
    match logging.backend {
        LoggerBackend::Json => format!(
            "  Logger: json ({}, experiment '{}')",
            logging.dir.display(),
            logging.experiment
        ),
        LoggerBackend::Memory => "  Logger: memory".to_string(),
        LoggerBackend::Tracing => "  Logger: tracing".to_string(),
    }
}

/// Print detailed configuration summary
pub fn print_detailed_summary(spec: &TrainSpec) {
    println!();
    println!("Configuration Summary:");
    println!("{}", format_training_info(spec));
    println!();
    println!("{}", format_data_info(spec));
    println!();
    println!("{}", format_logging_info(spec));
}

pub fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<(), String> {
    log(
        level,
        LogLevel::Normal,
        &format!("Validating config: {}", args.config.display()),
    );

    let spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;

    validate_config(&spec).map_err(|e| format!("Validation failed: {e}"))?;

    log(level, LogLevel::Normal, "Configuration is valid");

    if args.detailed && level != LogLevel::Quiet {
        print_detailed_summary(&spec);
    }

    Ok(())
}
