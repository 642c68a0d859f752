//! Models wrapped by the training policies
//!
//! A policy only needs a model to map an input batch to a prediction and to
//! expose its trainable parameters for the optimizer. [`Linear`] and
//! [`Identity`] are the two models this crate ships; anything else can be
//! plugged in by implementing [`Model`].

mod identity;
mod linear;

pub use identity::Identity;
pub use linear::Linear;

use crate::Tensor;

/// Capability required from a wrapped model
pub trait Model {
    /// Map an input batch to a prediction
    fn forward(&self, input: &Tensor) -> Tensor;

    /// Trainable parameters, in a stable order
    fn parameters(&self) -> Vec<&Tensor>;

    /// Mutable access to the same parameters, in the same order
    fn parameters_mut(&mut self) -> Vec<&mut Tensor>;

    /// Model name for logs
    fn name(&self) -> &str {
        "Model"
    }

    /// Total number of trainable scalars
    fn num_parameters(&self) -> usize {
        self.parameters().iter().map(|p| p.len()).sum()
    }
}

impl<M: Model + ?Sized> Model for Box<M> {
    fn forward(&self, input: &Tensor) -> Tensor {
        (**self).forward(input)
    }

    fn parameters(&self) -> Vec<&Tensor> {
        (**self).parameters()
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        (**self).parameters_mut()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
