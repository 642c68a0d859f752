//! Training policies
//!
//! A policy is the task-specific part of training: how a batch becomes a loss,
//! which metric an evaluation step reports, which optimizer to use and what to
//! tell the experiment logger at the end of an epoch. Everything else
//! (looping, aggregation, synchronization, progress) belongs to the
//! [`Trainer`](crate::train::Trainer), which drives a policy through
//! [`TrainingPolicy`].
//!
//! Policies never reach into the trainer. They are handed a
//! [`MetricsReader`] and a [`MetricsLogger`] when constructed and record
//! per-step values into the [`StepLog`] the trainer passes to each step.

mod classification;
mod segmentation;


pub use classification::ClassificationPolicy;
pub use segmentation::{OverlapMetric, SegmentationPolicy};

use super::batch::SizedBatch;
use super::log::{MetricMap, StepLog};
use super::logger::{MetricsLogger, ParamMap};
use super::progress::ProgressItems;
use super::reader::MetricsReader;
use crate::error::{Error, Result};
use crate::optim::Optimizer;
use crate::Tensor;
use serde::{Deserialize, Serialize};

/// Raw training loss of the current step
pub const LOSS_STEP: &str = "loss_step";
/// Epoch mean of the training loss
pub const LOSS_EPOCH: &str = "loss_epoch";
pub const VAL_ACC: &str = "val_acc";
pub const TEST_ACC: &str = "test_acc";
pub const VAL_MIOU: &str = "val_miou";
pub const TEST_MIOU: &str = "test_miou";

/// Hyperparameters captured when a policy is built
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    pub learning_rate: f32,
}

impl Hyperparameters {
    /// Fails unless `learning_rate` is positive and finite
    pub fn new(learning_rate: f32) -> Result<Self> {
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(Error::InvalidConfig {
                field: "learning_rate".to_string(),
                message: format!("must be a positive finite number, got {learning_rate}"),
            });
        }
        Ok(Self { learning_rate })
    }

    /// Display form handed to the logger
    pub fn to_params(&self) -> ParamMap {
        ParamMap::from([("learning_rate".to_string(), self.learning_rate.to_string())])
    }
}

/// What a test step hands back to the trainer
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutput {
    Value(f32),
    Metrics(MetricMap),
}

impl StepOutput {
    /// Value under `name`; a bare value answers to any name
    pub fn get(&self, name: &str) -> Option<f32> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Metrics(m) => m.get(name).copied(),
        }
    }
}

/// Loss and metric of one evaluation step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalOutput {
    pub loss: f32,
    pub metric: f32,
}

/// Hooks the trainer calls
///
/// Object safe for a fixed batch type, e.g.
/// `&mut dyn TrainingPolicy<Batch = NamedBatch>`.
pub trait TrainingPolicy {
    type Batch: SizedBatch;

    fn hyperparameters(&self) -> &Hyperparameters;

    /// Parameters the optimizer updates
    fn parameters_mut(&mut self) -> Vec<&mut Tensor>;

    /// Forward pass and loss; the returned tensor is backpropagated by the trainer
    fn train_step(&mut self, batch: &Self::Batch, batch_idx: usize, log: &mut StepLog)
        -> Result<Tensor>;

    fn on_train_epoch_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn validation_step(
        &mut self,
        batch: &Self::Batch,
        batch_idx: usize,
        log: &mut StepLog,
    ) -> Result<MetricMap>;

    fn on_validation_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn test_step(&mut self, batch: &Self::Batch, batch_idx: usize, log: &mut StepLog)
        -> Result<StepOutput>;

    fn on_test_end(&mut self) -> Result<()> {
        Ok(())
    }

    /// Model output for a batch; no logging, no state change
    fn predict_step(&self, batch: &Self::Batch, batch_idx: usize) -> Result<Tensor>;

    /// Called once per fit
    fn configure_optimizer(&self) -> Box<dyn Optimizer>;

    /// Adjust what the progress line shows
    fn progress_items(&self, items: ProgressItems) -> ProgressItems {
        items
    }
}

/// Send the aggregated value of `name` to the logger at the current epoch
///
/// Only worker 0 writes.
pub(crate) fn mirror_to_logger(
    reader: &dyn MetricsReader,
    logger: &dyn MetricsLogger,
    name: &str,
) -> Result<()> {
    let value = reader.require(name)?;
    if !reader.is_global_zero() {
        return Ok(());
    }
    let metrics = MetricMap::from([(name.to_string(), value)]);
    logger.log_metrics(&metrics, reader.current_epoch())
}
