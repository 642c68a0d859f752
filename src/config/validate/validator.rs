//! Configuration validation logic

use super::error::ValidationError;
use crate::config::schema::TrainSpec;

/// Validate a training specification
///
/// Returns the first problem found, in field order.
pub fn validate_config(spec: &TrainSpec) -> Result<(), ValidationError> {
    let lr = spec.learning_rate;
    if !(lr > 0.0 && lr.is_finite()) {
        return Err(ValidationError::InvalidLearningRate(lr));
    }

    let training = &spec.training;
    if training.epochs == 0 {
        return Err(ValidationError::InvalidEpochs(training.epochs));
    }
    if training.check_val_every_n_epoch == 0 {
        return Err(ValidationError::InvalidValInterval(
            training.check_val_every_n_epoch,
        ));
    }
    if training.log_every_n_steps == 0 {
        return Err(ValidationError::InvalidLogInterval(training.log_every_n_steps));
    }
    if training.workers == 0 {
        return Err(ValidationError::InvalidWorkers(training.workers));
    }

    let data = &spec.data;
    if data.samples == 0 {
        return Err(ValidationError::InvalidSamples(data.samples));
    }
    if data.batch_size == 0 {
        return Err(ValidationError::InvalidBatchSize(data.batch_size));
    }
    if data.features == 0 {
        return Err(ValidationError::InvalidFeatures(data.features));
    }
    if data.classes < 2 {
        return Err(ValidationError::InvalidClasses(data.classes));
    }
    if data.pixels == 0 {
        return Err(ValidationError::InvalidPixels(data.pixels));
    }

    let in_unit = |f: f32| (0.0..1.0).contains(&f);
    if !in_unit(data.val_fraction)
        || !in_unit(data.test_fraction)
        || data.val_fraction + data.test_fraction >= 1.0
    {
        return Err(ValidationError::InvalidSplit {
            val: data.val_fraction,
            test: data.test_fraction,
        });
    }
    if !(data.noise >= 0.0 && data.noise.is_finite()) {
        return Err(ValidationError::InvalidNoise(data.noise));
    }

    // every worker needs at least one training sample
    let train_fraction = 1.0 - data.val_fraction - data.test_fraction;
    let train_samples = (data.samples as f32 * train_fraction).floor() as usize;
    if train_samples < training.workers {
        return Err(ValidationError::TooFewSamples {
            samples: data.samples,
            workers: training.workers,
        });
    }

    if spec.logging.experiment.trim().is_empty() {
        return Err(ValidationError::EmptyExperiment);
    }

    Ok(())
}
