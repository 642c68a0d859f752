//! Parameter-free pass-through model

use super::Model;
use crate::Tensor;

/// Returns its input unchanged; has no parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Model for Identity {
    fn forward(&self, input: &Tensor) -> Tensor {
        input.clone()
    }

    fn parameters(&self) -> Vec<&Tensor> {
        Vec::new()
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        Vec::new()
    }

    fn name(&self) -> &str {
        "Identity"
    }
}
