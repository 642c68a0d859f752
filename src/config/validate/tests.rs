//! Tests for configuration validation

use super::*;
use crate::config::schema::TrainSpec;
use proptest::prelude::*;

fn valid_spec() -> TrainSpec {
    serde_yaml::from_str("task: classification\nlearning_rate: 0.01\n").unwrap()
}

#[test]
fn test_default_spec_is_valid() {
    assert!(validate_config(&valid_spec()).is_ok());
}

#[test]
fn test_rejects_non_positive_learning_rate() {
    let mut spec = valid_spec();
    spec.learning_rate = 0.0;
    assert!(matches!(
        validate_config(&spec),
        Err(ValidationError::InvalidLearningRate(_))
    ));

    spec.learning_rate = f32::NAN;
    assert!(matches!(
        validate_config(&spec),
        Err(ValidationError::InvalidLearningRate(_))
    ));
}

#[test]
fn test_rejects_zero_epochs() {
    let mut spec = valid_spec();
    spec.training.epochs = 0;
    assert!(matches!(
        validate_config(&spec),
        Err(ValidationError::InvalidEpochs(0))
    ));
}

#[test]
fn test_rejects_zero_intervals() {
    let mut spec = valid_spec();
    spec.training.check_val_every_n_epoch = 0;
    assert!(matches!(
        validate_config(&spec),
        Err(ValidationError::InvalidValInterval(0))
    ));

    let mut spec = valid_spec();
    spec.training.log_every_n_steps = 0;
    assert!(matches!(
        validate_config(&spec),
        Err(ValidationError::InvalidLogInterval(0))
    ));
}

#[test]
fn test_rejects_single_class() {
    let mut spec = valid_spec();
    spec.data.classes = 1;
    assert!(matches!(
        validate_config(&spec),
        Err(ValidationError::InvalidClasses(1))
    ));
}

#[test]
fn test_rejects_split_leaving_no_training_data() {
    let mut spec = valid_spec();
    spec.data.val_fraction = 0.5;
    spec.data.test_fraction = 0.5;
    assert!(matches!(
        validate_config(&spec),
        Err(ValidationError::InvalidSplit { .. })
    ));
}

#[test]
fn test_rejects_more_workers_than_samples() {
    let mut spec = valid_spec();
    spec.data.samples = 4;
    spec.training.workers = 8;
    assert!(matches!(
        validate_config(&spec),
        Err(ValidationError::TooFewSamples { .. })
    ));
}

#[test]
fn test_rejects_blank_experiment() {
    let mut spec = valid_spec();
    spec.logging.experiment = "  ".to_string();
    assert!(matches!(
        validate_config(&spec),
        Err(ValidationError::EmptyExperiment)
    ));
}

#[test]
fn test_error_message_names_value() {
    let err = ValidationError::InvalidBatchSize(0);
    assert!(err.to_string().contains("batch size: 0"));
}

proptest! {
    #[test]
    fn prop_positive_learning_rates_accepted(lr in 1e-6f32..10.0) {
        let mut spec = valid_spec();
        spec.learning_rate = lr;
        prop_assert!(validate_config(&spec).is_ok());
    }

    #[test]
    fn prop_negative_learning_rates_rejected(lr in -10.0f32..=0.0) {
        let mut spec = valid_spec();
        spec.learning_rate = lr;
        let rejected = matches!(
            validate_config(&spec),
            Err(ValidationError::InvalidLearningRate(_))
        );
        prop_assert!(rejected);
    }
}
