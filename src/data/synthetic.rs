//! Seeded synthetic data
//!
//! - Classification: blobs, one fixed center per class plus uniform noise.
//!   Target is the class index.
//! - Segmentation: images with pixels in `[-1, 1]`; the mask marks the
//!   pixels whose clean value is positive. Noise is added after masking.

use crate::config::DataConfig;
use crate::error::{Error, Result};
use crate::train::{Batch, NamedBatch};
use crate::Tensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Row-major samples with a fixed input and target width
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    inputs: Vec<f32>,
    targets: Vec<f32>,
    input_width: usize,
    target_width: usize,
}

/// Train, validation and test partitions
#[derive(Debug, Clone, PartialEq)]
pub struct Splits {
    pub train: Dataset,
    pub val: Dataset,
    pub test: Dataset,
}

impl Dataset {
    pub fn new(
        inputs: Vec<f32>,
        targets: Vec<f32>,
        input_width: usize,
        target_width: usize,
    ) -> Result<Self> {
        if input_width == 0 || target_width == 0 {
            return Err(Error::InvalidConfig {
                field: "data".to_string(),
                message: "sample widths must be > 0".to_string(),
            });
        }
        if inputs.len() % input_width != 0
            || targets.len() % target_width != 0
            || inputs.len() / input_width != targets.len() / target_width
        {
            return Err(Error::InvalidConfig {
                field: "data".to_string(),
                message: format!(
                    "{} inputs of width {input_width} do not pair with \
                     {} targets of width {target_width}",
                    inputs.len(),
                    targets.len()
                ),
            });
        }
        Ok(Self {
            inputs,
            targets,
            input_width,
            target_width,
        })
    }

    pub fn len(&self) -> usize {
        if self.input_width == 0 {
            0
        } else {
            self.inputs.len() / self.input_width
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn input_width(&self) -> usize {
        self.input_width
    }

    pub fn target_width(&self) -> usize {
        self.target_width
    }

    pub fn input(&self, idx: usize) -> &[f32] {
        &self.inputs[idx * self.input_width..(idx + 1) * self.input_width]
    }

    pub fn target(&self, idx: usize) -> &[f32] {
        &self.targets[idx * self.target_width..(idx + 1) * self.target_width]
    }

    fn select(&self, indices: impl IntoIterator<Item = usize>) -> Self {
        let mut out = Self {
            inputs: Vec::new(),
            targets: Vec::new(),
            input_width: self.input_width,
            target_width: self.target_width,
        };
        for idx in indices {
            out.inputs.extend_from_slice(self.input(idx));
            out.targets.extend_from_slice(self.target(idx));
        }
        out
    }

    /// Split off validation and test partitions from the end
    ///
    /// Partition sizes are `floor(len * fraction)`; training keeps the rest.
    pub fn split(&self, val_fraction: f32, test_fraction: f32) -> Splits {
        let n = self.len();
        let n_test = ((n as f32 * test_fraction).floor() as usize).min(n);
        let n_val = ((n as f32 * val_fraction).floor() as usize).min(n - n_test);
        let n_train = n - n_val - n_test;

        Splits {
            train: self.select(0..n_train),
            val: self.select(n_train..n_train + n_val),
            test: self.select(n_train + n_val..n),
        }
    }

    /// The samples worker `rank` of `world_size` sees
    ///
    /// Like a distributed sampler, the dataset is padded by wrapping around
    /// so every rank gets `ceil(len / world_size)` samples and therefore the
    /// same number of batches. An empty dataset stays empty on every rank.
    pub fn shard(&self, rank: usize, world_size: usize) -> Self {
        let n = self.len();
        if n == 0 || world_size <= 1 {
            return self.clone();
        }
        let per_rank = n.div_ceil(world_size);
        self.select((0..per_rank).map(|i| (rank + i * world_size) % n))
    }

    fn chunks(&self, batch_size: usize) -> impl Iterator<Item = (usize, &[f32], &[f32])> {
        let batch_size = batch_size.max(1);
        self.inputs
            .chunks(batch_size * self.input_width.max(1))
            .zip(self.targets.chunks(batch_size * self.target_width.max(1)))
            .map(|(x, y)| (x.len() / self.input_width, x, y))
    }

    /// Positional batches: inputs `[rows, width]`, targets flattened
    pub fn batches(&self, batch_size: usize) -> Vec<Batch> {
        self.chunks(batch_size)
            .map(|(rows, x, y)| {
                Batch::new(
                    Tensor::from_shape(x.to_vec(), &[rows, self.input_width], false),
                    Tensor::from_vec(y.to_vec(), false),
                )
            })
            .collect()
    }

    /// Segmentation batches: `image` and `mask`, both `[rows, pixels]`
    pub fn named_batches(&self, batch_size: usize) -> Vec<NamedBatch> {
        self.chunks(batch_size)
            .map(|(rows, x, y)| {
                NamedBatch::segmentation(
                    Tensor::from_shape(x.to_vec(), &[rows, self.input_width], false),
                    Tensor::from_shape(y.to_vec(), &[rows, self.target_width], false),
                )
            })
            .collect()
    }
}

/// Center of class `class` in `features` dimensions
///
/// Classes take the axes in turn, first on the positive side then on the
/// negative side.
fn class_center(class: usize, features: usize) -> Vec<f32> {
    let axis = class % features;
    let sign = if (class / features) % 2 == 0 { 3.0 } else { -3.0 };
    (0..features)
        .map(|j| if j == axis { sign } else { 0.0 })
        .collect()
}

/// Labelled points scattered around one center per class
pub fn classification_blobs(config: &DataConfig, seed: u64) -> Result<Dataset> {
    let mut rng = StdRng::seed_from_u64(seed);
    let centers: Vec<Vec<f32>> = (0..config.classes)
        .map(|c| class_center(c, config.features))
        .collect();

    let mut inputs = Vec::with_capacity(config.samples * config.features);
    let mut targets = Vec::with_capacity(config.samples);
    for _ in 0..config.samples {
        let class = rng.random_range(0..config.classes);
        for &c in &centers[class] {
            inputs.push(c + config.noise * rng.random_range(-1.0f32..=1.0));
        }
        targets.push(class as f32);
    }

    Dataset::new(inputs, targets, config.features, 1)
}

/// Images and the masks of their positive pixels
pub fn segmentation_images(config: &DataConfig, seed: u64) -> Result<Dataset> {
    let mut rng = StdRng::seed_from_u64(seed);
    let len = config.samples * config.pixels;

    let mut inputs = Vec::with_capacity(len);
    let mut masks = Vec::with_capacity(len);
    for _ in 0..len {
        let clean: f32 = rng.random_range(-1.0..=1.0);
        masks.push(if clean > 0.0 { 1.0 } else { 0.0 });
        inputs.push(clean + config.noise * rng.random_range(-1.0f32..=1.0));
    }

    Dataset::new(inputs, masks, config.pixels, config.pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(samples: usize) -> DataConfig {
        DataConfig {
            samples,
            noise: 0.1,
            ..DataConfig::default()
        }
    }

    #[test]
    fn test_blobs_shape_and_labels() {
        let data = classification_blobs(&config(50), 1).unwrap();
        assert_eq!(data.len(), 50);
        assert_eq!(data.input_width(), 4);
        assert_eq!(data.target_width(), 1);
        for i in 0..data.len() {
            let label = data.target(i)[0];
            assert!(label == 0.0 || label == 1.0 || label == 2.0);
            // nearest axis of the point is the axis of its class
            let axis = label as usize;
            assert!(data.input(i)[axis] > 2.0);
        }
    }

    #[test]
    fn test_generation_is_seeded() {
        let a = classification_blobs(&config(20), 7).unwrap();
        let b = classification_blobs(&config(20), 7).unwrap();
        let c = classification_blobs(&config(20), 8).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_masks_mark_positive_pixels() {
        let cfg = DataConfig {
            samples: 10,
            pixels: 8,
            noise: 0.0,
            ..DataConfig::default()
        };
        let data = segmentation_images(&cfg, 3).unwrap();
        assert_eq!(data.len(), 10);
        for i in 0..data.len() {
            for (&x, &m) in data.input(i).iter().zip(data.target(i)) {
                assert!((-1.0..=1.0).contains(&x));
                assert_eq!(m, if x > 0.0 { 1.0 } else { 0.0 });
            }
        }
    }

    #[test]
    fn test_split_sizes() {
        let data = classification_blobs(&config(100), 1).unwrap();
        let splits = data.split(0.2, 0.1);
        assert_eq!(splits.train.len(), 70);
        assert_eq!(splits.val.len(), 20);
        assert_eq!(splits.test.len(), 10);
        assert_eq!(splits.test.input(9), data.input(99));
    }

    #[test]
    fn test_split_without_holdout() {
        let data = classification_blobs(&config(10), 1).unwrap();
        let splits = data.split(0.0, 0.0);
        assert_eq!(splits.train.len(), 10);
        assert!(splits.val.is_empty());
        assert!(splits.test.is_empty());
    }

    #[test]
    fn test_shard_pads_to_equal_sizes() {
        let data = classification_blobs(&config(5), 1).unwrap();
        let shards: Vec<Dataset> = (0..2).map(|r| data.shard(r, 2)).collect();
        assert_eq!(shards[0].len(), 3);
        assert_eq!(shards[1].len(), 3);
        assert_eq!(shards[0].input(0), data.input(0));
        assert_eq!(shards[1].input(0), data.input(1));
        // rank 1 wraps around to the first sample
        assert_eq!(shards[1].input(2), data.input(0));
    }

    #[test]
    fn test_shard_of_empty_dataset_is_empty() {
        let data = classification_blobs(&config(10), 1).unwrap().split(0.0, 0.0).val;
        assert!(data.shard(1, 4).is_empty());
    }

    #[test]
    fn test_batches_keep_remainder() {
        let data = classification_blobs(&config(10), 1).unwrap();
        let batches = data.batches(4);
        let sizes: Vec<usize> = batches.iter().map(Batch::size).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
        assert_eq!(batches[2].targets.len(), 2);
    }

    #[test]
    fn test_named_batches_carry_image_and_mask() {
        let cfg = DataConfig {
            samples: 5,
            pixels: 6,
            ..DataConfig::default()
        };
        let batches = segmentation_images(&cfg, 2).unwrap().named_batches(2);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].get("image").unwrap().shape(), &[2, 6]);
        assert_eq!(batches[2].get("mask").unwrap().shape(), &[1, 6]);
    }

    #[test]
    fn test_mismatched_widths_rejected() {
        let result = Dataset::new(vec![0.0; 6], vec![0.0; 4], 3, 1);
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }
}
