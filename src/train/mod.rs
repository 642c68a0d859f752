//! Training policies and the trainer that drives them
//!
//! - Policies: [`ClassificationPolicy`], [`SegmentationPolicy`]
//! - Driver: [`Trainer`] with [`TrainerConfig`]
//! - Per-step logging: [`StepLog`], [`LogOptions`]
//! - Reading aggregated values: [`MetricsReader`], [`CallbackMetrics`]
//! - Experiment loggers: [`InMemoryLogger`], [`TracingLogger`], [`TrackingLogger`]
//! - Worker groups: [`SingleWorker`], [`LocalGroup`]
//! - Losses: [`CrossEntropyLoss`], [`BCEWithLogitsLoss`]
//! - Metrics: [`Accuracy`], [`DiceCoefficient`]

mod batch;
mod log;
mod logger;
mod loss;
mod metrics;
mod policy;
mod progress;
mod reader;
mod sync;
mod trainer;

pub use batch::{Batch, NamedBatch, SizedBatch, IMAGE_KEY, MASK_KEY};
pub use log::{LogOptions, MetricMap, Observation, StepLog};
pub use logger::{
    InMemoryLogger, LoggedMetric, MetricsLogger, ParamMap, TracingLogger, TrackingLogger,
};
pub use loss::{BCEWithLogitsLoss, CrossEntropyLoss, LossFn};
pub use metrics::{Accuracy, DiceCoefficient, Metric};
pub use policy::{
    ClassificationPolicy, EvalOutput, Hyperparameters, OverlapMetric, SegmentationPolicy,
    StepOutput, TrainingPolicy, LOSS_EPOCH, LOSS_STEP, TEST_ACC, TEST_MIOU, VAL_ACC, VAL_MIOU,
};
pub use progress::{format_progress, progress_items, ProgressItems};
pub use reader::{CallbackMetrics, MetricsReader};
pub use sync::{CrossWorkerSync, LocalGroup, SingleWorker};
pub use trainer::{FitResult, TestResult, Trainer, TrainerConfig};
