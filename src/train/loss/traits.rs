//! The `LossFn` seam shared by both policies

use crate::Tensor;

/// Reduces a batch of model output and targets to one scalar loss
pub trait LossFn {
    /// Mean loss over the batch as a one-element tensor
    ///
    /// When `predictions` tracks gradients the result carries the backward
    /// op, so `loss.backward()` reaches the model parameters.
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor;

    fn name(&self) -> &'static str;
}
