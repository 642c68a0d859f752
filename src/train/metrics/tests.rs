//! Tests for evaluation metrics

use crate::Tensor;

use super::{Accuracy, DiceCoefficient, Metric};
use approx::assert_relative_eq;
use proptest::prelude::*;

#[test]
fn test_accuracy_top1_perfect() {
    let logits = Tensor::from_shape(vec![2.0, 0.0, -1.0, 3.0, 0.2, 0.1], &[3, 2], false);
    let labels = Tensor::from_vec(vec![0.0, 1.0, 0.0], false);

    assert_eq!(Accuracy::default().compute(&logits, &labels), 1.0);
}

#[test]
fn test_accuracy_top1_partial() {
    let logits = Tensor::from_shape(vec![2.0, 0.0, -1.0, 3.0, 0.2, 0.1, 0.0, 1.0], &[4, 2], false);
    let labels = Tensor::from_vec(vec![1.0, 1.0, 0.0, 0.0], false);

    assert_relative_eq!(Accuracy::default().compute(&logits, &labels), 0.5);
}

#[test]
fn test_accuracy_top1_one_hot_targets() {
    let logits = Tensor::from_shape(vec![0.1, 0.7, 0.2, 0.9, 0.05, 0.05], &[2, 3], false);
    let one_hot = Tensor::from_shape(vec![0.0, 1.0, 0.0, 0.0, 0.0, 1.0], &[2, 3], false);

    assert_relative_eq!(Accuracy::default().compute(&logits, &one_hot), 0.5);
}

#[test]
fn test_accuracy_binary_threshold() {
    let metric = Accuracy::default();
    let pred = Tensor::from_vec(vec![0.9, 0.9, 0.1, 0.1], false);
    let target = Tensor::from_vec(vec![1.0, 0.0, 1.0, 0.0], false);

    assert_relative_eq!(metric.compute(&pred, &target), 0.5);
}

#[test]
fn test_accuracy_empty_is_zero() {
    let empty = Tensor::from_vec(Vec::new(), false);
    assert_eq!(Accuracy::default().compute(&empty, &empty), 0.0);
}

#[test]
fn test_dice_perfect_overlap() {
    let logits = Tensor::from_vec(vec![5.0, -5.0, 5.0, -5.0], false);
    let mask = Tensor::from_vec(vec![1.0, 0.0, 1.0, 0.0], false);

    assert_relative_eq!(DiceCoefficient::default().compute(&logits, &mask), 1.0, epsilon = 1e-6);
}

#[test]
fn test_dice_partial_overlap() {
    // P = {0, 1}, T = {1, 2}: 2·1 / (2 + 2)
    let logits = Tensor::from_vec(vec![5.0, 5.0, -5.0, -5.0], false);
    let mask = Tensor::from_vec(vec![0.0, 1.0, 1.0, 0.0], false);

    assert_relative_eq!(DiceCoefficient::default().compute(&logits, &mask), 0.5, epsilon = 1e-5);
}

#[test]
fn test_dice_empty_masks_score_one() {
    let logits = Tensor::from_vec(vec![-5.0, -5.0], false);
    let mask = Tensor::from_vec(vec![0.0, 0.0], false);

    assert_relative_eq!(DiceCoefficient::default().compute(&logits, &mask), 1.0);
}

#[test]
fn test_metric_names() {
    assert_eq!(Accuracy::default().name(), "Accuracy");
    assert_eq!(DiceCoefficient::default().name(), "Dice");
    assert!(Accuracy::default().higher_is_better());
}

proptest! {
    #[test]
    fn prop_accuracy_bounded(
        logits in proptest::collection::vec(-10.0f32..10.0, 12),
        labels in proptest::collection::vec(0usize..3, 4),
    ) {
        let pred = Tensor::from_shape(logits, &[4, 3], false);
        let targets = Tensor::from_vec(labels.iter().map(|&l| l as f32).collect(), false);
        let acc = Accuracy::default().compute(&pred, &targets);
        prop_assert!((0.0..=1.0).contains(&acc));
    }

    #[test]
    fn prop_accuracy_one_when_labels_are_argmax(
        logits in proptest::collection::vec(-10.0f32..10.0, 12),
    ) {
        let labels: Vec<f32> = logits
            .chunks(3)
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold((0, f32::NEG_INFINITY), |(bi, bv), (i, &v)| {
                        if v > bv {
                            (i, v)
                        } else {
                            (bi, bv)
                        }
                    })
                    .0 as f32
            })
            .collect();
        let pred = Tensor::from_shape(logits, &[4, 3], false);
        let acc = Accuracy::default().compute(&pred, &Tensor::from_vec(labels, false));
        prop_assert_eq!(acc, 1.0);
    }

    #[test]
    fn prop_dice_bounded(
        logits in proptest::collection::vec(-5.0f32..5.0, 16),
        mask in proptest::collection::vec(prop::bool::ANY, 16),
    ) {
        let pred = Tensor::from_vec(logits, false);
        let target = Tensor::from_vec(
            mask.iter().map(|&m| if m { 1.0 } else { 0.0 }).collect(),
            false,
        );
        let dice = DiceCoefficient::default().compute(&pred, &target);
        prop_assert!((0.0..=1.0 + 1e-6).contains(&dice));
    }
}
