//! Loss functions for training
//!
//! - [`CrossEntropyLoss`] - softmax cross-entropy for single-label classification
//! - [`BCEWithLogitsLoss`] - sigmoid + binary cross-entropy for dense masks

mod bce_with_logits;
mod cross_entropy;
mod traits;

pub use bce_with_logits::BCEWithLogitsLoss;
pub use cross_entropy::CrossEntropyLoss;
pub use traits::LossFn;

use crate::autograd::{BackwardOp, GradCell};
use crate::Tensor;
use ndarray::Array1;

/// Backward node shared by the losses: the gradient with respect to the
/// predictions is known at forward time, scaled by the upstream gradient and
/// pushed into the prediction's tape.
struct LossBackward {
    predictions: Tensor,
    grad: Array1<f32>,
    loss_grad: GradCell,
}

impl BackwardOp for LossBackward {
    fn backward(&self) {
        let upstream = self.loss_grad.borrow().as_ref().map_or(1.0, |g| g[0]);
        self.predictions.accumulate_grad(&(&self.grad * upstream));
        if let Some(op) = self.predictions.backward_op() {
            op.backward();
        }
    }
}

/// Wrap a scalar loss value, attaching the prediction gradient when needed
fn scalar_loss(value: f32, predictions: &Tensor, grad: Array1<f32>) -> Tensor {
    let mut loss = Tensor::from_vec(vec![value], predictions.requires_grad());
    if predictions.requires_grad() {
        let loss_grad = loss.grad_cell();
        loss.set_backward_op(std::rc::Rc::new(LossBackward {
            predictions: predictions.clone(),
            grad,
            loss_grad,
        }));
    }
    loss
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loss_names() {
        assert_eq!(CrossEntropyLoss.name(), "CrossEntropy");
        assert_eq!(BCEWithLogitsLoss.name(), "BCEWithLogits");
    }

    #[test]
    fn test_loss_without_grad_has_no_tape() {
        let pred = Tensor::from_vec(vec![0.2, 0.8], false);
        let target = Tensor::from_vec(vec![0.0, 1.0], false);
        let loss = BCEWithLogitsLoss.forward(&pred, &target);
        assert!(!loss.requires_grad());
        assert!(loss.backward_op().is_none());
    }
}
