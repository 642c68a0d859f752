//! Trainer that drives a [`TrainingPolicy`](crate::train::TrainingPolicy)
//!
//! The trainer owns everything a policy does not: the epoch and batch loops,
//! backpropagation and optimizer steps, per-epoch aggregation of logged
//! values, cross-worker reduction, the callback-metric store policies read
//! from, and the progress line.
//!
//! # Example
//!
//! ```
//! use aprendiz::nn::Linear;
//! use aprendiz::train::{
//!     Batch, ClassificationPolicy, Hyperparameters, InMemoryLogger, SingleWorker, Trainer,
//!     TrainerConfig,
//! };
//! use aprendiz::Tensor;
//! use std::sync::Arc;
//!
//! # fn main() -> aprendiz::Result<()> {
//! let logger = Arc::new(InMemoryLogger::new());
//! let mut trainer = Trainer::new(
//!     TrainerConfig::default().with_max_epochs(2).with_progress(false),
//!     logger.clone(),
//!     Box::new(SingleWorker),
//! );
//!
//! let mut policy = ClassificationPolicy::new(
//!     Linear::new(2, 2, 7),
//!     Hyperparameters::new(0.05)?,
//!     trainer.metrics_handle(),
//!     logger.clone(),
//! );
//!
//! let batches = vec![Batch::new(
//!     Tensor::from_shape(vec![1.0, 0.0, 0.0, 1.0], &[2, 2], false),
//!     Tensor::from_vec(vec![0.0, 1.0], false),
//! )];
//! let result = trainer.fit(&mut policy, &batches, Some(batches.as_slice()))?;
//!
//! assert_eq!(result.epochs_completed, 2);
//! assert_eq!(logger.values("loss_epoch").len(), 2);
//! # Ok(())
//! # }
//! ```

mod core;
mod epoch;
mod eval;
mod fit;
mod result;

#[cfg(test)]
mod tests;

pub use core::{Trainer, TrainerConfig};
pub use result::{FitResult, TestResult};
