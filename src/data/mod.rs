//! Synthetic datasets for the command-line runs
//!
//! Samples are plain `Vec<f32>` rows so a dataset can be generated once and
//! handed to worker threads; tensors are only built inside each worker.

mod synthetic;

pub use synthetic::{classification_blobs, segmentation_images, Dataset, Splits};
