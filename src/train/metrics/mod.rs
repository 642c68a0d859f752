//! Evaluation metrics for validation and testing
//!
//! - [`Accuracy`] - top-1 accuracy (multi-class) or thresholded accuracy (binary)
//! - [`DiceCoefficient`] - overlap between a predicted and a target mask

mod classification;
mod overlap;
mod trait_def;

#[cfg(test)]
mod tests;

pub use classification::Accuracy;
pub use overlap::DiceCoefficient;
pub use trait_def::Metric;
