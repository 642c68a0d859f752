//! Classification accuracy

use super::Metric;
use crate::Tensor;
use ndarray::ArrayView1;

/// Index of the largest value; the first one wins on ties
fn argmax(row: ArrayView1<'_, f32>) -> usize {
    row.iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best_i, best), (i, &v)| {
            if v > best {
                (i, v)
            } else {
                (best_i, best)
            }
        })
        .0
}

/// Accuracy metric for classification
///
/// Multi-class: predictions shaped `[rows, classes]`; a row is correct when
/// its arg-max equals the target class. Targets are one class index per row
/// or one-hot rows.
///
/// Binary: 1-D or single-column predictions are thresholded element-wise
/// against targets thresholded at 0.5.
///
/// # Example
///
/// ```
/// use aprendiz::train::{Accuracy, Metric};
/// use aprendiz::Tensor;
///
/// let logits = Tensor::from_shape(vec![2.0, 0.0, 0.1, 0.9], &[2, 2], false);
/// let labels = Tensor::from_vec(vec![0.0, 1.0], false);
///
/// assert_eq!(Accuracy::default().compute(&logits, &labels), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Accuracy {
    /// Threshold for binary classification
    pub(crate) threshold: f32,
}

impl Accuracy {
    /// Create new accuracy metric with given threshold for binary classification
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    fn top1(predictions: &Tensor, targets: &Tensor) -> f32 {
        let rows = predictions.rows();
        let classes = predictions.row_len();
        let data = predictions.data();

        let labels: Vec<usize> = if targets.len() == rows {
            targets.data().iter().map(|&t| t as usize).collect()
        } else {
            assert_eq!(
                targets.len(),
                predictions.len(),
                "Targets must hold one class index per row or one-hot rows"
            );
            (0..rows)
                .map(|r| argmax(targets.data().slice(ndarray::s![r * classes..(r + 1) * classes])))
                .collect()
        };

        let correct = (0..rows)
            .filter(|&r| {
                argmax(data.slice(ndarray::s![r * classes..(r + 1) * classes])) == labels[r]
            })
            .count();
        correct as f32 / rows as f32
    }

    fn thresholded(&self, predictions: &Tensor, targets: &Tensor) -> f32 {
        assert_eq!(
            predictions.len(),
            targets.len(),
            "Predictions and targets must have same length"
        );
        let correct = predictions
            .data()
            .iter()
            .zip(targets.data().iter())
            .filter(|&(&p, &t)| (p >= self.threshold) == (t >= 0.5))
            .count();
        correct as f32 / predictions.len() as f32
    }
}

impl Default for Accuracy {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl Metric for Accuracy {
    fn compute(&self, predictions: &Tensor, targets: &Tensor) -> f32 {
        if predictions.is_empty() {
            return 0.0;
        }

        if predictions.shape().len() >= 2 && predictions.row_len() > 1 {
            Self::top1(predictions, targets)
        } else {
            self.thresholded(predictions, targets)
        }
    }

    fn name(&self) -> &'static str {
        "Accuracy"
    }
}
