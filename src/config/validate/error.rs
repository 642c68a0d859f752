//! Validation error types

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid learning rate: {0} (must be > 0.0 and finite)")]
    InvalidLearningRate(f32),

    #[error("Invalid epochs: {0} (must be > 0)")]
    InvalidEpochs(usize),

    #[error("Invalid validation interval: {0} (must be > 0)")]
    InvalidValInterval(usize),

    #[error("Invalid logging interval: {0} (must be > 0)")]
    InvalidLogInterval(usize),

    #[error("Invalid worker count: {0} (must be > 0)")]
    InvalidWorkers(usize),

    #[error("Invalid batch size: {0} (must be > 0)")]
    InvalidBatchSize(usize),

    #[error("Invalid sample count: {0} (must be > 0)")]
    InvalidSamples(usize),

    #[error("Invalid feature count: {0} (must be > 0)")]
    InvalidFeatures(usize),

    #[error("Invalid class count: {0} (must be >= 2)")]
    InvalidClasses(usize),

    #[error("Invalid pixel count: {0} (must be > 0)")]
    InvalidPixels(usize),

    #[error("Invalid split fractions: val {val} + test {test} (each in [0.0, 1.0), sum < 1.0)")]
    InvalidSplit { val: f32, test: f32 },

    #[error("Invalid noise amplitude: {0} (must be >= 0.0 and finite)")]
    InvalidNoise(f32),

    #[error("Not enough training samples: {samples} samples leave fewer than {workers} per worker")]
    TooFewSamples { samples: usize, workers: usize },

    #[error("Experiment name cannot be empty")]
    EmptyExperiment,
}
