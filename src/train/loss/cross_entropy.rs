//! Cross Entropy Loss for classification

use super::{scalar_loss, LossFn};
use crate::Tensor;
use ndarray::{Array1, ArrayView1};

/// Cross Entropy Loss (for single-label classification)
///
/// Predictions are logits shaped `[rows, classes]` (a 1-D tensor is one row).
/// Targets are either one class index per row (`[rows]`) or a probability
/// per logit (`[rows, classes]`, e.g. one-hot). The loss is averaged over rows:
///
/// L = -1/N Σ_n Σ_c t_nc · log softmax(x_n)_c
///
/// # Example
///
/// ```
/// use aprendiz::train::{CrossEntropyLoss, LossFn};
/// use aprendiz::Tensor;
///
/// let logits = Tensor::from_shape(vec![2.0, 1.0, 0.5], &[1, 3], true);
/// let labels = Tensor::from_vec(vec![0.0], false);
///
/// let loss = CrossEntropyLoss.forward(&logits, &labels);
/// assert!(loss.item() > 0.0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossEntropyLoss;

impl CrossEntropyLoss {
    /// Compute softmax: exp(x_i) / sum(exp(x_j))
    pub(crate) fn softmax(x: ArrayView1<'_, f32>) -> Array1<f32> {
        let max = x.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        let exp_x: Array1<f32> = x.mapv(|v| (v - max).exp());
        let sum: f32 = exp_x.sum();
        exp_x / sum
    }

    /// Log-softmax computed without forming the probabilities first
    fn log_softmax(x: ArrayView1<'_, f32>) -> Array1<f32> {
        let max = x.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        let log_sum = x.iter().map(|&v| (v - max).exp()).sum::<f32>().ln();
        x.mapv(|v| v - max - log_sum)
    }

    /// Expand targets into a per-logit distribution of length `rows * classes`
    fn target_distribution(targets: &Tensor, rows: usize, classes: usize) -> Array1<f32> {
        if targets.len() == rows * classes {
            return targets.data().clone();
        }
        assert_eq!(
            targets.len(),
            rows,
            "Targets must hold one class index per row or one probability per logit"
        );

        let mut dist = Array1::zeros(rows * classes);
        for (row, &label) in targets.data().iter().enumerate() {
            let class = label as usize;
            assert!(
                class < classes,
                "Target class {class} out of range for {classes} classes"
            );
            dist[row * classes + class] = 1.0;
        }
        dist
    }
}

impl LossFn for CrossEntropyLoss {
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor {
        let rows = predictions.rows();
        let classes = predictions.row_len();
        let dist = Self::target_distribution(targets, rows, classes);

        let mut total = 0.0;
        let mut grad = Array1::zeros(predictions.len());
        for row in 0..rows {
            let span = row * classes..(row + 1) * classes;
            let logits = predictions.data().slice(ndarray::s![span.clone()]);
            let t = dist.slice(ndarray::s![span.clone()]);

            let log_probs = Self::log_softmax(logits);
            total -= t.iter().zip(log_probs.iter()).map(|(&t, &lp)| t * lp).sum::<f32>();

            // d(CE)/d(logits) = softmax - targets
            let probs = Self::softmax(logits);
            grad.slice_mut(ndarray::s![span]).assign(&(&probs - &t));
        }

        let n = rows as f32;
        scalar_loss(total / n, predictions, grad / n)
    }

    fn name(&self) -> &'static str {
        "CrossEntropy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_cross_entropy_matches_formula() {
        let logits = Tensor::from_shape(vec![2.0, 1.0, 0.5], &[1, 3], true);
        let labels = Tensor::from_vec(vec![0.0], false);

        let loss = CrossEntropyLoss.forward(&logits, &labels);

        let denom = 2.0f32.exp() + 1.0f32.exp() + 0.5f32.exp();
        let expected = -(2.0f32.exp() / denom).ln();
        assert_relative_eq!(loss.item(), expected, epsilon = 1e-6);
    }

    #[test]
    fn test_index_and_one_hot_targets_agree() {
        let logits = Tensor::from_shape(vec![0.3, -1.2, 2.0, 0.1], &[2, 2], false);
        let by_index = Tensor::from_vec(vec![1.0, 0.0], false);
        let one_hot = Tensor::from_shape(vec![0.0, 1.0, 1.0, 0.0], &[2, 2], false);

        let a = CrossEntropyLoss.forward(&logits, &by_index).item();
        let b = CrossEntropyLoss.forward(&logits, &one_hot).item();
        assert_relative_eq!(a, b, epsilon = 1e-6);
    }

    #[test]
    fn test_batch_loss_is_mean_of_rows() {
        let row_a = Tensor::from_shape(vec![1.0, 0.0], &[1, 2], false);
        let row_b = Tensor::from_shape(vec![0.0, 3.0], &[1, 2], false);
        let both = Tensor::from_shape(vec![1.0, 0.0, 0.0, 3.0], &[2, 2], false);

        let la = CrossEntropyLoss.forward(&row_a, &Tensor::from_vec(vec![1.0], false)).item();
        let lb = CrossEntropyLoss.forward(&row_b, &Tensor::from_vec(vec![0.0], false)).item();
        let lab = CrossEntropyLoss
            .forward(&both, &Tensor::from_vec(vec![1.0, 0.0], false))
            .item();

        assert_relative_eq!(lab, (la + lb) / 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_softmax() {
        let x = Array1::from(vec![1.0, 2.0, 3.0]);
        let probs = CrossEntropyLoss::softmax(x.view());

        let sum: f32 = probs.sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-5);
        for &p in &probs {
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn test_large_logits_stay_finite() {
        let logits = Tensor::from_shape(vec![1000.0, 1001.0, 1002.0], &[1, 3], false);
        let loss = CrossEntropyLoss.forward(&logits, &Tensor::from_vec(vec![0.0], false));
        assert!(loss.item().is_finite());
        assert_relative_eq!(loss.item(), 2.407_606, epsilon = 1e-4);
    }

    #[test]
    fn test_cross_entropy_gradient() {
        let logits = Tensor::from_shape(vec![2.0, 1.0, 0.5], &[1, 3], true);
        let labels = Tensor::from_vec(vec![0.0], false);

        let loss = CrossEntropyLoss.forward(&logits, &labels);
        loss.backward();

        let grad = logits.grad().unwrap();
        // softmax - onehot: negative on the target class, positive elsewhere
        assert!(grad[0] < 0.0);
        assert!(grad[1] > 0.0 && grad[2] > 0.0);
        assert_relative_eq!(grad.sum(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_gradient_scaled_by_batch_size() {
        let single = Tensor::from_shape(vec![0.5, -0.5], &[1, 2], true);
        let double = Tensor::from_shape(vec![0.5, -0.5, 0.5, -0.5], &[2, 2], true);

        CrossEntropyLoss
            .forward(&single, &Tensor::from_vec(vec![1.0], false))
            .backward();
        CrossEntropyLoss
            .forward(&double, &Tensor::from_vec(vec![1.0, 1.0], false))
            .backward();

        let g1 = single.grad().unwrap();
        let g2 = double.grad().unwrap();
        assert_relative_eq!(g2[0] * 2.0, g1[0], epsilon = 1e-6);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_label_out_of_range() {
        let logits = Tensor::from_shape(vec![0.0, 1.0], &[1, 2], false);
        CrossEntropyLoss.forward(&logits, &Tensor::from_vec(vec![2.0], false));
    }

    #[test]
    #[should_panic(expected = "one class index per row")]
    fn test_mismatched_targets() {
        let logits = Tensor::from_shape(vec![0.0; 6], &[2, 3], false);
        CrossEntropyLoss.forward(&logits, &Tensor::from_vec(vec![0.0; 4], false));
    }

    proptest! {
        #[test]
        fn prop_cross_entropy_non_negative(
            logits in proptest::collection::vec(-20.0f32..20.0, 8),
            labels in proptest::collection::vec(0usize..4, 2),
        ) {
            let pred = Tensor::from_shape(logits, &[2, 4], false);
            let targets = Tensor::from_vec(labels.iter().map(|&l| l as f32).collect(), false);
            let loss = CrossEntropyLoss.forward(&pred, &targets).item();
            prop_assert!(loss >= -1e-6);
            prop_assert!(loss.is_finite());
        }
    }
}
