//! Binary Cross-Entropy with Logits Loss for dense binary targets
//!
//! Each output element is an independent binary decision, which is what a
//! per-pixel mask prediction needs.
//!
//! # Formula
//!
//! Numerically stable computation:
//! ```text
//! L_i = max(x_i, 0) - x_i * t_i + log(1 + exp(-|x_i|))
//! L = mean(L_i) over all i
//! ```
//!
//! Gradient: `∂L/∂x_i = (σ(x_i) - t_i) / N`

use super::{scalar_loss, LossFn};
use crate::Tensor;
use ndarray::Array1;

/// Binary Cross-Entropy with Logits Loss
///
/// # Example
///
/// ```
/// use aprendiz::train::{BCEWithLogitsLoss, LossFn};
/// use aprendiz::Tensor;
///
/// let logits = Tensor::from_vec(vec![2.0, -1.0, 0.5], true);
/// let mask = Tensor::from_vec(vec![1.0, 0.0, 1.0], false);
///
/// let loss = BCEWithLogitsLoss.forward(&logits, &mask);
/// assert!(loss.item() > 0.0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BCEWithLogitsLoss;

impl BCEWithLogitsLoss {
    /// Compute element-wise sigmoid: σ(x) = 1 / (1 + exp(-x))
    pub(crate) fn sigmoid(x: &Array1<f32>) -> Array1<f32> {
        x.mapv(|v| {
            if v >= 0.0 {
                1.0 / (1.0 + (-v).exp())
            } else {
                let exp_v = v.exp();
                exp_v / (1.0 + exp_v)
            }
        })
    }

    /// Numerically stable BCE: max(x, 0) - x*t + log(1 + exp(-|x|))
    fn stable_bce(logit: f32, target: f32) -> f32 {
        logit.max(0.0) - logit * target + (-logit.abs()).exp().ln_1p()
    }
}

impl LossFn for BCEWithLogitsLoss {
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor {
        assert_eq!(
            predictions.len(),
            targets.len(),
            "Predictions and targets must have same length"
        );

        let n = predictions.len() as f32;
        let total: f32 = predictions
            .data()
            .iter()
            .zip(targets.data().iter())
            .map(|(&logit, &target)| Self::stable_bce(logit, target))
            .sum();

        let grad = (Self::sigmoid(predictions.data()) - targets.data()) / n;
        scalar_loss(total / n, predictions, grad)
    }

    fn name(&self) -> &'static str {
        "BCEWithLogits"
    }
}
