//! Aprendiz: training policies for classification and segmentation
//!
//! A policy owns a model and describes what happens on each training,
//! validation, test and prediction step. The [`train::Trainer`] drives the
//! policy over batches, reduces what each step logs into epoch values and
//! forwards them to an experiment logger.
//!
//! # Architecture
//!
//! - `autograd`: tape-style reverse-mode differentiation over 1-D buffers
//! - `nn`: the [`nn::Model`] seam plus `Linear` and `Identity`
//! - `optim`: the [`optim::Optimizer`] trait and Adam
//! - `train`: policies, losses, metrics, loggers and the trainer
//! - `tracking`: versioned experiment runs with JSON persistence
//! - `data`: seeded synthetic datasets
//! - `config`: YAML schema, validation and end-to-end runs
//! - `cli`: handlers for the `aprendiz` binary
//!
//! # Example
//!
//! ```
//! use aprendiz::nn::Linear;
//! use aprendiz::train::{
//!     Batch, ClassificationPolicy, Hyperparameters, InMemoryLogger, SingleWorker, Trainer,
//!     TrainerConfig, VAL_ACC,
//! };
//! use aprendiz::Tensor;
//! use std::sync::Arc;
//!
//! let logger = Arc::new(InMemoryLogger::new());
//! let config = TrainerConfig::default().with_max_epochs(20).with_progress(false);
//! let mut trainer = Trainer::new(config, logger.clone(), Box::new(SingleWorker));
//!
//! let mut policy = ClassificationPolicy::new(
//!     Linear::new(2, 2, 0),
//!     Hyperparameters::new(0.1)?,
//!     trainer.metrics_handle(),
//!     logger.clone(),
//! );
//!
//! let batches = vec![Batch::new(
//!     Tensor::from_shape(vec![-1.0, 0.0, 1.0, 0.0], &[2, 2], false),
//!     Tensor::from_vec(vec![0.0, 1.0], false),
//! )];
//! trainer.fit(&mut policy, &batches, Some(batches.as_slice()))?;
//!
//! assert_eq!(logger.values(VAL_ACC).len(), 20);
//! # Ok::<(), aprendiz::Error>(())
//! ```

pub mod autograd;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod nn;
pub mod optim;
pub mod tracking;
pub mod train;

pub use autograd::Tensor;
pub use error::{Error, Result};
