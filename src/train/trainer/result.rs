//! Result types

use crate::train::{MetricMap, ProgressItems, StepOutput};

/// Result of [`Trainer::fit`](super::Trainer::fit)
#[derive(Debug, Clone)]
pub struct FitResult {
    pub epochs_completed: usize,
    pub global_step: usize,
    /// Loss of the last training step
    pub final_loss: Option<f32>,
    /// Callback metrics after the last epoch
    pub callback_metrics: MetricMap,
    /// Items shown on the last progress line
    pub progress: ProgressItems,
    pub optimizer: String,
    pub learning_rate: f32,
    pub elapsed_secs: f64,
}

/// Result of [`Trainer::test`](super::Trainer::test)
#[derive(Debug, Clone, Default)]
pub struct TestResult {
    /// Epoch-reduced test metrics
    pub metrics: MetricMap,
    /// What each test step returned, in batch order
    pub outputs: Vec<StepOutput>,
}
