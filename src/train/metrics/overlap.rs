//! Overlap metrics for segmentation masks

use super::Metric;
use crate::Tensor;

/// Dice coefficient between a predicted mask and a target mask
///
/// Predictions are logits; a pixel is foreground when `σ(x) >= threshold`.
///
/// dice = (2·|P ∩ T| + ε) / (|P| + |T| + ε)
///
/// Two empty masks score 1.0.
#[derive(Debug, Clone)]
pub struct DiceCoefficient {
    threshold: f32,
    epsilon: f32,
}

impl DiceCoefficient {
    pub fn new(threshold: f32, epsilon: f32) -> Self {
        Self { threshold, epsilon }
    }
}

impl Default for DiceCoefficient {
    fn default() -> Self {
        Self::new(0.5, 1e-6)
    }
}

impl Metric for DiceCoefficient {
    fn compute(&self, predictions: &Tensor, targets: &Tensor) -> f32 {
        assert_eq!(
            predictions.len(),
            targets.len(),
            "Predictions and targets must have same length"
        );

        let (mut intersection, mut predicted, mut actual) = (0.0f32, 0.0f32, 0.0f32);
        for (&logit, &target) in predictions.data().iter().zip(targets.data().iter()) {
            let p = if 1.0 / (1.0 + (-logit).exp()) >= self.threshold { 1.0 } else { 0.0 };
            let t = if target >= 0.5 { 1.0 } else { 0.0 };
            intersection += p * t;
            predicted += p;
            actual += t;
        }

        (2.0 * intersection + self.epsilon) / (predicted + actual + self.epsilon)
    }

    fn name(&self) -> &'static str {
        "Dice"
    }
}
