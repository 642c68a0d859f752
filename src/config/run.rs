//! Loading a configuration and running it end to end

use super::schema::{LoggerBackend, Task, TrainSpec};
use super::validate::validate_config;
use crate::data::{classification_blobs, segmentation_images, Splits};
use crate::error::{Error, Result};
use crate::nn::Linear;
use crate::tracking::{ExperimentTracker, JsonFileBackend, RunStatus};
use crate::train::{
    ClassificationPolicy, CrossWorkerSync, FitResult, InMemoryLogger, LocalGroup, MetricsLogger,
    SegmentationPolicy, SingleWorker, TestResult, Trainer, TracingLogger, TrackingLogger,
    TrainingPolicy,
};
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::thread;

/// Load and validate a training specification from YAML
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<TrainSpec> {
    let path = config_path.as_ref();
    let yaml_content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

    let spec: TrainSpec = serde_yaml::from_str(&yaml_content)
        .map_err(|e| Error::ConfigError(format!("Failed to parse YAML config: {e}")))?;

    validate_config(&spec).map_err(|e| Error::ConfigError(format!("Invalid config: {e}")))?;

    Ok(spec)
}

/// Outcome of a run, as seen by worker 0
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub task: Task,
    pub workers: usize,
    pub fit: FitResult,
    /// `None` when the test partition was disabled
    pub test: Option<TestResult>,
    /// Tracking run id, for the JSON backend
    pub run_id: Option<String>,
}

/// What one worker hands back to the caller
#[derive(Debug)]
struct WorkerOutcome {
    fit: FitResult,
    test: Option<TestResult>,
}

/// Load, validate and train from a YAML file
pub fn train_from_yaml<P: AsRef<Path>>(config_path: P) -> Result<RunSummary> {
    let spec = load_config(config_path)?;
    train_from_spec(&spec)
}

/// Train with a fresh logger built from `spec.logging`
pub fn train_from_spec(spec: &TrainSpec) -> Result<RunSummary> {
    validate_config(spec).map_err(|e| Error::ConfigError(format!("Invalid config: {e}")))?;

    match spec.logging.backend {
        LoggerBackend::Memory => train_with_logger(spec, Arc::new(InMemoryLogger::new()), None),
        LoggerBackend::Tracing => train_with_logger(spec, Arc::new(TracingLogger), None),
        LoggerBackend::Json => {
            let tracker = ExperimentTracker::new(
                spec.logging.experiment.clone(),
                JsonFileBackend::new(&spec.logging.dir),
            )?;
            let logger = TrackingLogger::new(tracker, spec.logging.run_name.as_deref())?;
            let run_id = logger.run_id().to_string();
            tracing::info!(
                run_id = %run_id,
                dir = %spec.logging.dir.display(),
                "tracking run started"
            );
            train_with_logger(spec, Arc::new(logger), Some(run_id))
        }
    }
}

/// Train on synthetic data, reporting to `logger`
///
/// With more than one worker, each worker runs on its own thread with its
/// own shard of every partition, its own model and its own trainer. Only
/// worker 0 writes to the logger and closes its run.
pub fn train_with_logger(
    spec: &TrainSpec,
    logger: Arc<dyn MetricsLogger>,
    run_id: Option<String>,
) -> Result<RunSummary> {
    let splits = generate_splits(spec)?;
    let workers = spec.training.workers;

    tracing::info!(
        task = ?spec.task,
        workers,
        train = splits.train.len(),
        val = splits.val.len(),
        test = splits.test.len(),
        "starting run"
    );

    let outcome = if workers <= 1 {
        run_worker(spec, &splits, logger, Box::new(SingleWorker))?
    } else {
        run_group(spec, &splits, logger, workers)?
    };

    Ok(RunSummary {
        task: spec.task,
        workers,
        fit: outcome.fit,
        test: outcome.test,
        run_id,
    })
}

fn generate_splits(spec: &TrainSpec) -> Result<Splits> {
    let data = match spec.task {
        Task::Classification => classification_blobs(&spec.data, spec.seed)?,
        Task::Segmentation => segmentation_images(&spec.data, spec.seed)?,
    };
    Ok(data.split(spec.data.val_fraction, spec.data.test_fraction))
}

/// One thread per rank; returns rank 0's outcome
///
/// A worker that fails or panics aborts the group, so ranks blocked in a
/// reduction return instead of waiting for it. The error reported is the one
/// from the worker that tripped the abort.
fn run_group(
    spec: &TrainSpec,
    splits: &Splits,
    logger: Arc<dyn MetricsLogger>,
    workers: usize,
) -> Result<WorkerOutcome> {
    let group = LocalGroup::new(workers)?;

    let results: Vec<(Result<WorkerOutcome>, bool)> = thread::scope(|scope| {
        let handles: Vec<_> = group
            .into_iter()
            .map(|member| {
                let rank = member.rank();
                let shard = Splits {
                    train: splits.train.shard(rank, workers),
                    val: splits.val.shard(rank, workers),
                    test: splits.test.shard(rank, workers),
                };
                let logger = Arc::clone(&logger);
                let group = member.clone();
                scope.spawn(move || {
                    let result = panic::catch_unwind(AssertUnwindSafe(move || {
                        run_worker(spec, &shard, logger, Box::new(member))
                    }))
                    .unwrap_or_else(|_| Err(Error::Sync(format!("worker {rank} panicked"))));

                    let tripped = result.is_err() && group.abort();
                    if tripped {
                        tracing::warn!(rank, "worker failed, aborting group");
                    }
                    (result, tripped)
                })
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(rank, handle)| {
                handle.join().unwrap_or_else(|_| {
                    (Err(Error::Sync(format!("worker {rank} panicked"))), false)
                })
            })
            .collect()
    });

    let (root, rest): (Vec<_>, Vec<_>) = results.into_iter().partition(|(_, tripped)| *tripped);
    if let Some((cause, _)) = root.into_iter().next() {
        return cause;
    }

    let mut outcomes = rest.into_iter().map(|(result, _)| result);
    let first = outcomes
        .next()
        .ok_or_else(|| Error::Sync("worker group is empty".to_string()))?;
    for outcome in outcomes {
        outcome?;
    }
    first
}

/// Build the model and policy for `spec.task` and drive them
fn run_worker(
    spec: &TrainSpec,
    data: &Splits,
    logger: Arc<dyn MetricsLogger>,
    sync: Box<dyn CrossWorkerSync>,
) -> Result<WorkerOutcome> {
    let hparams = spec.hyperparameters()?;
    let mut trainer = Trainer::new(spec.trainer_config(), Arc::clone(&logger), sync);
    let batch_size = spec.data.batch_size;

    // same seed on every rank, so all workers start from the same weights
    let outcome = match spec.task {
        Task::Classification => {
            let model = Linear::new(spec.data.features, spec.data.classes, spec.seed);
            let mut policy =
                ClassificationPolicy::new(model, hparams, trainer.metrics_handle(), logger);
            drive(
                &mut trainer,
                &mut policy,
                [&data.train, &data.val, &data.test].map(|d| d.batches(batch_size)),
                spec.training.test,
            )
        }
        Task::Segmentation => {
            let model = Linear::new(spec.data.pixels, spec.data.pixels, spec.seed);
            let mut policy =
                SegmentationPolicy::new(model, hparams, trainer.metrics_handle(), logger)
                    .with_overlap_metric(spec.segmentation.metric.into());
            drive(
                &mut trainer,
                &mut policy,
                [&data.train, &data.val, &data.test].map(|d| d.named_batches(batch_size)),
                spec.training.test,
            )
        }
    };

    let status = if outcome.is_ok() {
        RunStatus::Completed
    } else {
        RunStatus::Failed
    };
    trainer.finalize(status)?;
    outcome
}

fn drive<P: TrainingPolicy>(
    trainer: &mut Trainer,
    policy: &mut P,
    [train, val, test]: [Vec<P::Batch>; 3],
    run_test: bool,
) -> Result<WorkerOutcome> {
    let fit = trainer.fit(policy, &train, Some(val.as_slice()))?;
    let test = if run_test {
        Some(trainer.test(policy, &test)?)
    } else {
        None
    };

    if trainer.is_global_zero() {
        tracing::info!(
            epochs = fit.epochs_completed,
            steps = fit.global_step,
            final_loss = ?fit.final_loss,
            "training finished"
        );
    }
    Ok(WorkerOutcome { fit, test })
}
