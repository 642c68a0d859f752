//! The `Metric` seam used by the evaluation steps

use crate::Tensor;

/// Scores one batch of model output against its targets
///
/// Policies call this from their shared evaluation step; the trainer then
/// averages the per-batch scores over the epoch.
pub trait Metric {
    /// Per-batch score; `predictions` are raw model outputs
    fn compute(&self, predictions: &Tensor, targets: &Tensor) -> f32;

    fn name(&self) -> &str;

    /// Accuracy and Dice both improve upwards
    fn higher_is_better(&self) -> bool {
        true
    }
}
