//! Batch data structures

use crate::error::{Error, Result};
use crate::Tensor;
use std::collections::BTreeMap;

/// Field holding the input image in a segmentation batch
pub const IMAGE_KEY: &str = "image";
/// Field holding the target mask in a segmentation batch
pub const MASK_KEY: &str = "mask";

/// Number of samples a batch contributes to an epoch mean
pub trait SizedBatch {
    fn size(&self) -> usize;
}

/// A positional training batch: `(inputs, targets)`
#[derive(Clone, Debug)]
pub struct Batch {
    /// Input features
    pub inputs: Tensor,
    /// Target labels/values
    pub targets: Tensor,
}

impl Batch {
    /// Create a new batch
    pub fn new(inputs: Tensor, targets: Tensor) -> Self {
        Self { inputs, targets }
    }

    /// Number of samples (leading dimension of the inputs)
    pub fn size(&self) -> usize {
        self.inputs.rows()
    }
}

/// A batch whose tensors are addressed by name
///
/// Segmentation data arrives as `{"image": .., "mask": ..}`.
#[derive(Clone, Debug, Default)]
pub struct NamedBatch {
    fields: BTreeMap<String, Tensor>,
}

impl NamedBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Segmentation batch with the conventional field names
    pub fn segmentation(image: Tensor, mask: Tensor) -> Self {
        Self::new().with(IMAGE_KEY, image).with(MASK_KEY, mask)
    }

    /// Add or replace a field
    pub fn with(mut self, name: impl Into<String>, tensor: Tensor) -> Self {
        self.fields.insert(name.into(), tensor);
        self
    }

    /// Look up a field, failing with the list of available names
    pub fn get(&self, name: &str) -> Result<&Tensor> {
        self.fields.get(name).ok_or_else(|| Error::MissingBatchField {
            field: name.to_string(),
            available: self.fields.keys().cloned().collect(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of samples, taken from the image field when present
    pub fn size(&self) -> usize {
        self.fields
            .get(IMAGE_KEY)
            .or_else(|| self.fields.values().next())
            .map_or(0, Tensor::rows)
    }
}

impl SizedBatch for Batch {
    fn size(&self) -> usize {
        Batch::size(self)
    }
}

impl SizedBatch for NamedBatch {
    fn size(&self) -> usize {
        NamedBatch::size(self)
    }
}
