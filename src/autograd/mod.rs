//! Tape-style autograd
//!
//! A [`Tensor`] owns flat `f32` storage and a gradient cell that every clone
//! shares. Operations that need gradients attach a [`BackwardOp`] to their
//! output; calling [`Tensor::backward`] on a scalar loss walks those ops and
//! accumulates gradients into the cells of the tensors that produced it.

mod backward;
mod tensor;

pub use backward::{accumulate_into, BackwardOp, GradCell};
pub use tensor::{Tensor, TensorId};
