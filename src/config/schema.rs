//! YAML schema for a training run
//!
//! ```yaml
//! task: segmentation
//! learning_rate: 0.001
//! seed: 7
//! training:
//!   epochs: 20
//!   workers: 2
//! data:
//!   samples: 512
//!   batch_size: 32
//!   pixels: 64
//! logging:
//!   backend: json
//!   dir: ./runs
//!   experiment: masks
//! segmentation:
//!   metric: dice
//! ```

use crate::train::{Hyperparameters, OverlapMetric, TrainerConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which policy to train
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    Classification,
    Segmentation,
}

/// Complete training specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainSpec {
    pub task: Task,

    pub learning_rate: f32,

    /// Seeds weight initialisation and data generation
    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default)]
    pub training: TrainingParams,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub segmentation: SegmentationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingParams {
    #[serde(default = "default_epochs")]
    pub epochs: usize,

    #[serde(default = "default_one")]
    pub check_val_every_n_epoch: usize,

    #[serde(default = "default_log_every")]
    pub log_every_n_steps: usize,

    /// Data-parallel workers, one thread each
    #[serde(default = "default_one")]
    pub workers: usize,

    /// Run the test partition after fitting
    #[serde(default = "default_true")]
    pub test: bool,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            check_val_every_n_epoch: 1,
            log_every_n_steps: default_log_every(),
            workers: 1,
            test: true,
        }
    }
}

/// Synthetic dataset shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_samples")]
    pub samples: usize,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Input width for classification
    #[serde(default = "default_features")]
    pub features: usize,

    /// Number of classes for classification
    #[serde(default = "default_classes")]
    pub classes: usize,

    /// Pixels per image (and mask) for segmentation
    #[serde(default = "default_pixels")]
    pub pixels: usize,

    #[serde(default = "default_val_fraction")]
    pub val_fraction: f32,

    #[serde(default = "default_test_fraction")]
    pub test_fraction: f32,

    /// Amplitude of the uniform noise added to each sample
    #[serde(default = "default_noise")]
    pub noise: f32,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            samples: default_samples(),
            batch_size: default_batch_size(),
            features: default_features(),
            classes: default_classes(),
            pixels: default_pixels(),
            val_fraction: default_val_fraction(),
            test_fraction: default_test_fraction(),
            noise: default_noise(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggerBackend {
    /// Keep metrics in memory and print a summary
    #[default]
    Memory,
    /// Emit metrics as tracing events
    Tracing,
    /// Write one JSON file per run
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub backend: LoggerBackend,

    /// Where the JSON backend writes runs
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_experiment")]
    pub experiment: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_name: Option<String>,

    /// Print the per-epoch progress line
    #[serde(default = "default_true")]
    pub progress: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            backend: LoggerBackend::default(),
            dir: default_log_dir(),
            experiment: default_experiment(),
            run_name: None,
            progress: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapMetricSpec {
    #[default]
    NegatedLoss,
    Dice,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentationConfig {
    #[serde(default)]
    pub metric: OverlapMetricSpec,
}

impl From<OverlapMetricSpec> for OverlapMetric {
    fn from(spec: OverlapMetricSpec) -> Self {
        match spec {
            OverlapMetricSpec::NegatedLoss => OverlapMetric::NegatedLoss,
            OverlapMetricSpec::Dice => OverlapMetric::Dice,
        }
    }
}

impl TrainSpec {
    /// Trainer settings derived from this spec
    pub fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig::default()
            .with_max_epochs(self.training.epochs)
            .with_check_val_every_n_epoch(self.training.check_val_every_n_epoch)
            .with_log_every_n_steps(self.training.log_every_n_steps)
            .with_progress(self.logging.progress)
    }

    pub fn hyperparameters(&self) -> crate::Result<Hyperparameters> {
        Hyperparameters::new(self.learning_rate)
    }
}

fn default_seed() -> u64 {
    42
}

fn default_epochs() -> usize {
    10
}

fn default_one() -> usize {
    1
}

fn default_log_every() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_samples() -> usize {
    256
}

fn default_batch_size() -> usize {
    32
}

fn default_features() -> usize {
    4
}

fn default_classes() -> usize {
    3
}

fn default_pixels() -> usize {
    16
}

fn default_val_fraction() -> f32 {
    0.2
}

fn default_test_fraction() -> f32 {
    0.1
}

fn default_noise() -> f32 {
    0.3
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./runs")
}

fn default_experiment() -> String {
    "aprendiz".to_string()
}
