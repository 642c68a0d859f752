//! Train command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{
    apply_overrides, load_config, train_from_spec, validate_config, RunSummary, TrainArgs,
};
use crate::train::format_progress;

pub fn run_train(args: TrainArgs, level: LogLevel) -> Result<(), String> {
    log(
        level,
        LogLevel::Normal,
        &format!("Aprendiz: Training from {}", args.config.display()),
    );

    let mut spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;

    apply_overrides(&mut spec, &args);
    // overrides can make a valid file invalid
    validate_config(&spec).map_err(|e| format!("Validation failed: {e}"))?;
    if level == LogLevel::Quiet {
        spec.logging.progress = false;
    }

    if args.dry_run {
        log(level, LogLevel::Normal, "Dry run - config validated successfully");
        log(level, LogLevel::Verbose, &format!("  Task: {:?}", spec.task));
        log(
            level,
            LogLevel::Verbose,
            &format!("  Optimizer: Adam (lr={})", spec.learning_rate),
        );
        log(level, LogLevel::Verbose, &format!("  Epochs: {}", spec.training.epochs));
        log(level, LogLevel::Verbose, &format!("  Workers: {}", spec.training.workers));
        log(
            level,
            LogLevel::Verbose,
            &format!("  Batch size: {}", spec.data.batch_size),
        );
        return Ok(());
    }

    let summary = train_from_spec(&spec).map_err(|e| format!("Training error: {e}"))?;

    for line in summary_lines(&summary) {
        log(level, LogLevel::Normal, &line);
    }
    log(level, LogLevel::Normal, "Training complete!");
    Ok(())
}

/// Final progress line, test metrics and tracking run
pub fn summary_lines(summary: &RunSummary) -> Vec<String> {
    let fit = &summary.fit;
    let mut lines = vec![format_progress(
        fit.epochs_completed.saturating_sub(1),
        fit.epochs_completed,
        &fit.progress,
        fit.elapsed_secs,
    )];
    if let Some(test) = &summary.test {
        for (name, value) in &test.metrics {
            lines.push(format!("  {name}: {value:.4}"));
        }
    }
    if let Some(run_id) = &summary.run_id {
        lines.push(format!("  Run: {run_id}"));
    }
    lines
}
