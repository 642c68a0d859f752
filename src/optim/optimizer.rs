//! Optimizer trait

use crate::autograd::TensorId;
use crate::Tensor;

/// Trait for optimization algorithms
///
/// Parameters stay owned by the model; the optimizer receives mutable
/// references to them on every step.
pub trait Optimizer {
    /// Perform a single optimization step
    fn step(&mut self, params: &mut [&mut Tensor]);

    /// Zero out all gradients
    fn zero_grad(&mut self, params: &mut [&mut Tensor]) {
        for param in params.iter_mut() {
            param.zero_grad();
        }
    }

    /// Get learning rate
    fn lr(&self) -> f32;

    /// Set learning rate
    fn set_lr(&mut self, lr: f32);

    /// Parameters this optimizer was configured for; empty if unbound
    fn param_ids(&self) -> &[TensorId] {
        &[]
    }

    /// Name for logs
    fn name(&self) -> &'static str {
        "Optimizer"
    }
}
